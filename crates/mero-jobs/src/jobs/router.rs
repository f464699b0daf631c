use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Form, Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::access::{AccessDenied, Principal};
use super::domain::JobId;
use super::form::JobForm;
use super::identity::{current_principal, IdentityProvider};
use super::query::JobQuery;
use super::repository::{JobRepository, Notifier, RepositoryError};
use super::service::{
    JobBoardError, JobBoardService, WorkflowOutcome, CREATE_JOB_PATH, JOB_LIST_PATH, MY_JOBS_PATH,
};

pub const LOGIN_PATH: &str = "/accounts/login/";

/// Shared handler state: the workflow service plus the identity collaborator.
pub struct JobBoardState<R, N> {
    pub service: Arc<JobBoardService<R, N>>,
    pub identity: Arc<dyn IdentityProvider>,
}

impl<R, N> Clone for JobBoardState<R, N> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            identity: self.identity.clone(),
        }
    }
}

impl<R, N> JobBoardState<R, N>
where
    R: JobRepository + 'static,
    N: Notifier + 'static,
{
    fn principal(&self, headers: &HeaderMap) -> Result<Option<Principal>, JobBoardError> {
        let repository = self.service.repository();
        Ok(current_principal(self.identity.as_ref(), repository.as_ref(), headers)?)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    #[serde(default)]
    pub page: Option<String>,
}

/// Router builder exposing the public and recruiter-facing job endpoints.
pub fn job_router<R, N>(
    service: Arc<JobBoardService<R, N>>,
    identity: Arc<dyn IdentityProvider>,
) -> Router
where
    R: JobRepository + 'static,
    N: Notifier + 'static,
{
    Router::new()
        .route("/", get(home_redirect))
        .route(JOB_LIST_PATH, get(list_handler::<R, N>))
        .route(MY_JOBS_PATH, get(my_jobs_handler::<R, N>))
        .route(
            CREATE_JOB_PATH,
            get(create_form_handler::<R, N>).post(create_handler::<R, N>),
        )
        .route("/jobs/:job_id/", get(detail_handler::<R, N>))
        .route(
            "/jobs/:job_id/update/",
            get(edit_form_handler::<R, N>).post(update_handler::<R, N>),
        )
        .route(
            "/jobs/:job_id/delete/",
            get(delete_confirmation_handler::<R, N>).post(delete_handler::<R, N>),
        )
        .with_state(JobBoardState { service, identity })
}

pub(crate) async fn home_redirect() -> Response {
    (StatusCode::FOUND, [(header::LOCATION, JOB_LIST_PATH)]).into_response()
}

pub(crate) async fn list_handler<R, N>(
    State(state): State<JobBoardState<R, N>>,
    uri: Uri,
    Query(query): Query<JobQuery>,
) -> Response
where
    R: JobRepository + 'static,
    N: Notifier + 'static,
{
    match state.service.list(&query) {
        Ok(listing) => (StatusCode::OK, Json(listing)).into_response(),
        Err(err) => error_response(err, &uri),
    }
}

pub(crate) async fn my_jobs_handler<R, N>(
    State(state): State<JobBoardState<R, N>>,
    headers: HeaderMap,
    uri: Uri,
    Query(params): Query<PageParams>,
) -> Response
where
    R: JobRepository + 'static,
    N: Notifier + 'static,
{
    let principal = match state.principal(&headers) {
        Ok(principal) => principal,
        Err(err) => return error_response(err, &uri),
    };
    match state
        .service
        .my_jobs(principal.as_ref(), params.page.as_deref())
    {
        Ok(page) => (StatusCode::OK, Json(json!({ "page": page }))).into_response(),
        Err(err) => error_response(err, &uri),
    }
}

pub(crate) async fn detail_handler<R, N>(
    State(state): State<JobBoardState<R, N>>,
    uri: Uri,
    Path(job_id): Path<String>,
) -> Response
where
    R: JobRepository + 'static,
    N: Notifier + 'static,
{
    let result = parse_job_id(&job_id).and_then(|id| state.service.detail(id));
    match result {
        Ok(job) => (StatusCode::OK, Json(json!({ "job": job }))).into_response(),
        Err(err) => error_response(err, &uri),
    }
}

pub(crate) async fn create_form_handler<R, N>(
    State(state): State<JobBoardState<R, N>>,
    headers: HeaderMap,
    uri: Uri,
) -> Response
where
    R: JobRepository + 'static,
    N: Notifier + 'static,
{
    let principal = match state.principal(&headers) {
        Ok(principal) => principal,
        Err(err) => return error_response(err, &uri),
    };
    match state.service.create_form(principal.as_ref()) {
        Ok(context) => (StatusCode::OK, Json(json!({ "form": context }))).into_response(),
        Err(err) => error_response(err, &uri),
    }
}

pub(crate) async fn create_handler<R, N>(
    State(state): State<JobBoardState<R, N>>,
    headers: HeaderMap,
    uri: Uri,
    Form(form): Form<JobForm>,
) -> Response
where
    R: JobRepository + 'static,
    N: Notifier + 'static,
{
    let principal = match state.principal(&headers) {
        Ok(principal) => principal,
        Err(err) => return error_response(err, &uri),
    };
    match state.service.create(principal.as_ref(), form) {
        Ok(outcome) => redirect_response(outcome),
        Err(err) => error_response(err, &uri),
    }
}

pub(crate) async fn edit_form_handler<R, N>(
    State(state): State<JobBoardState<R, N>>,
    headers: HeaderMap,
    uri: Uri,
    Path(job_id): Path<String>,
) -> Response
where
    R: JobRepository + 'static,
    N: Notifier + 'static,
{
    let principal = match state.principal(&headers) {
        Ok(principal) => principal,
        Err(err) => return error_response(err, &uri),
    };
    let result =
        parse_job_id(&job_id).and_then(|id| state.service.edit_form(principal.as_ref(), id));
    match result {
        Ok(context) => (StatusCode::OK, Json(json!({ "form": context }))).into_response(),
        Err(err) => error_response(err, &uri),
    }
}

pub(crate) async fn update_handler<R, N>(
    State(state): State<JobBoardState<R, N>>,
    headers: HeaderMap,
    uri: Uri,
    Path(job_id): Path<String>,
    Form(form): Form<JobForm>,
) -> Response
where
    R: JobRepository + 'static,
    N: Notifier + 'static,
{
    let principal = match state.principal(&headers) {
        Ok(principal) => principal,
        Err(err) => return error_response(err, &uri),
    };
    let result =
        parse_job_id(&job_id).and_then(|id| state.service.update(principal.as_ref(), id, form));
    match result {
        Ok(outcome) => redirect_response(outcome),
        Err(err) => error_response(err, &uri),
    }
}

pub(crate) async fn delete_confirmation_handler<R, N>(
    State(state): State<JobBoardState<R, N>>,
    headers: HeaderMap,
    uri: Uri,
    Path(job_id): Path<String>,
) -> Response
where
    R: JobRepository + 'static,
    N: Notifier + 'static,
{
    let principal = match state.principal(&headers) {
        Ok(principal) => principal,
        Err(err) => return error_response(err, &uri),
    };
    let result = parse_job_id(&job_id)
        .and_then(|id| state.service.delete_confirmation(principal.as_ref(), id));
    match result {
        Ok(job) => (StatusCode::OK, Json(json!({ "job": job, "confirm": true }))).into_response(),
        Err(err) => error_response(err, &uri),
    }
}

pub(crate) async fn delete_handler<R, N>(
    State(state): State<JobBoardState<R, N>>,
    headers: HeaderMap,
    uri: Uri,
    Path(job_id): Path<String>,
) -> Response
where
    R: JobRepository + 'static,
    N: Notifier + 'static,
{
    let principal = match state.principal(&headers) {
        Ok(principal) => principal,
        Err(err) => return error_response(err, &uri),
    };
    let result = parse_job_id(&job_id).and_then(|id| state.service.delete(principal.as_ref(), id));
    match result {
        Ok(outcome) => redirect_response(outcome),
        Err(err) => error_response(err, &uri),
    }
}

/// Path segments that are not integers never name a job.
fn parse_job_id(raw: &str) -> Result<JobId, JobBoardError> {
    raw.parse::<i64>()
        .map(JobId)
        .map_err(|_| JobBoardError::NotFound("job"))
}

fn redirect_response(outcome: WorkflowOutcome) -> Response {
    (
        StatusCode::SEE_OTHER,
        [(header::LOCATION, outcome.redirect_to.clone())],
        Json(outcome),
    )
        .into_response()
}

pub(crate) fn login_redirect(uri: &Uri) -> Response {
    let location = format!("{LOGIN_PATH}?next={}", uri.path());
    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}

/// Translate a workflow error into its HTTP shape. `uri` feeds the login redirect.
pub fn error_response(err: JobBoardError, uri: &Uri) -> Response {
    match err {
        JobBoardError::Access(AccessDenied::Unauthenticated) => login_redirect(uri),
        JobBoardError::Access(AccessDenied::Forbidden) => {
            let payload = json!({ "error": AccessDenied::Forbidden.to_string() });
            (StatusCode::FORBIDDEN, Json(payload)).into_response()
        }
        JobBoardError::NotFound(_)
        | JobBoardError::Page(_)
        | JobBoardError::Repository(RepositoryError::NotFound) => {
            let payload = json!({ "error": err.to_string() });
            (StatusCode::NOT_FOUND, Json(payload)).into_response()
        }
        JobBoardError::Invalid(context) => {
            let payload = json!({
                "error": "please correct the errors below",
                "form": context,
            });
            (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response()
        }
        JobBoardError::Repository(RepositoryError::Integrity(detail)) => {
            let payload = json!({ "error": detail });
            (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response()
        }
        other => {
            tracing::error!(error = %other, "job request failed");
            let payload = json!({ "error": other.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
    }
}
