use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::service::{AdminError, AdminJobQuery, AdminOutcome, AdminService, CategoryForm};
use crate::jobs::access::{AccessDenied, Principal};
use crate::jobs::domain::{CategoryId, JobId, UserId};
use crate::jobs::identity::{current_principal, IdentityProvider};
use crate::jobs::repository::{JobRepository, RepositoryError};
use crate::jobs::router::login_redirect;

pub struct AdminState<R> {
    pub service: Arc<AdminService<R>>,
    pub identity: Arc<dyn IdentityProvider>,
}

impl<R> Clone for AdminState<R> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            identity: self.identity.clone(),
        }
    }
}

impl<R> AdminState<R>
where
    R: JobRepository + 'static,
{
    fn principal(&self, headers: &HeaderMap) -> Result<Option<Principal>, AdminError> {
        let repository = self.service.repository();
        Ok(current_principal(self.identity.as_ref(), repository.as_ref(), headers)?)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CategorySearch {
    #[serde(default)]
    pub search: Option<String>,
}

pub fn admin_router<R>(service: Arc<AdminService<R>>, identity: Arc<dyn IdentityProvider>) -> Router
where
    R: JobRepository + 'static,
{
    Router::new()
        .route("/admin/jobs/", get(job_list_handler::<R>))
        .route("/admin/jobs/:job_id/delete/", post(delete_job_handler::<R>))
        .route(
            "/admin/categories/",
            get(category_list_handler::<R>).post(create_category_handler::<R>),
        )
        .route(
            "/admin/categories/:category_id/",
            get(category_detail_handler::<R>).post(update_category_handler::<R>),
        )
        .route(
            "/admin/categories/:category_id/delete/",
            post(delete_category_handler::<R>),
        )
        .route("/admin/users/:user_id/delete/", post(delete_user_handler::<R>))
        .with_state(AdminState { service, identity })
}

async fn job_list_handler<R>(
    State(state): State<AdminState<R>>,
    headers: HeaderMap,
    uri: Uri,
    Query(query): Query<AdminJobQuery>,
) -> Response
where
    R: JobRepository + 'static,
{
    let principal = match state.principal(&headers) {
        Ok(principal) => principal,
        Err(err) => return error_response(err, &uri),
    };
    match state.service.job_list(principal.as_ref(), &query) {
        Ok(page) => {
            let scoped = principal
                .as_ref()
                .is_some_and(|principal| state.service.is_scoped(principal));
            (StatusCode::OK, Json(json!({ "page": page, "scoped": scoped }))).into_response()
        }
        Err(err) => error_response(err, &uri),
    }
}

async fn delete_job_handler<R>(
    State(state): State<AdminState<R>>,
    headers: HeaderMap,
    uri: Uri,
    Path(job_id): Path<String>,
) -> Response
where
    R: JobRepository + 'static,
{
    let principal = match state.principal(&headers) {
        Ok(principal) => principal,
        Err(err) => return error_response(err, &uri),
    };
    let result = parse_id(&job_id, "job")
        .and_then(|id| state.service.delete_job(principal.as_ref(), JobId(id)));
    match result {
        Ok(outcome) => redirect_response(outcome),
        Err(err) => error_response(err, &uri),
    }
}

async fn category_list_handler<R>(
    State(state): State<AdminState<R>>,
    headers: HeaderMap,
    uri: Uri,
    Query(params): Query<CategorySearch>,
) -> Response
where
    R: JobRepository + 'static,
{
    let principal = match state.principal(&headers) {
        Ok(principal) => principal,
        Err(err) => return error_response(err, &uri),
    };
    match state
        .service
        .category_list(principal.as_ref(), params.search.as_deref())
    {
        Ok(categories) => {
            (StatusCode::OK, Json(json!({ "categories": categories }))).into_response()
        }
        Err(err) => error_response(err, &uri),
    }
}

async fn create_category_handler<R>(
    State(state): State<AdminState<R>>,
    headers: HeaderMap,
    uri: Uri,
    Form(form): Form<CategoryForm>,
) -> Response
where
    R: JobRepository + 'static,
{
    let principal = match state.principal(&headers) {
        Ok(principal) => principal,
        Err(err) => return error_response(err, &uri),
    };
    match state.service.create_category(principal.as_ref(), &form) {
        Ok(category) => {
            let location = format!("/admin/categories/{}/", category.id);
            (
                StatusCode::CREATED,
                [(header::LOCATION, location)],
                Json(json!({ "category": category })),
            )
                .into_response()
        }
        Err(err) => error_response(err, &uri),
    }
}

async fn category_detail_handler<R>(
    State(state): State<AdminState<R>>,
    headers: HeaderMap,
    uri: Uri,
    Path(category_id): Path<String>,
) -> Response
where
    R: JobRepository + 'static,
{
    let principal = match state.principal(&headers) {
        Ok(principal) => principal,
        Err(err) => return error_response(err, &uri),
    };
    let result = parse_id(&category_id, "category").and_then(|id| {
        state
            .service
            .category_detail(principal.as_ref(), CategoryId(id))
    });
    match result {
        Ok(detail) => (StatusCode::OK, Json(detail)).into_response(),
        Err(err) => error_response(err, &uri),
    }
}

async fn update_category_handler<R>(
    State(state): State<AdminState<R>>,
    headers: HeaderMap,
    uri: Uri,
    Path(category_id): Path<String>,
    Form(form): Form<CategoryForm>,
) -> Response
where
    R: JobRepository + 'static,
{
    let principal = match state.principal(&headers) {
        Ok(principal) => principal,
        Err(err) => return error_response(err, &uri),
    };
    let result = parse_id(&category_id, "category").and_then(|id| {
        state
            .service
            .update_category(principal.as_ref(), CategoryId(id), &form)
    });
    match result {
        Ok(category) => (StatusCode::OK, Json(json!({ "category": category }))).into_response(),
        Err(err) => error_response(err, &uri),
    }
}

async fn delete_category_handler<R>(
    State(state): State<AdminState<R>>,
    headers: HeaderMap,
    uri: Uri,
    Path(category_id): Path<String>,
) -> Response
where
    R: JobRepository + 'static,
{
    let principal = match state.principal(&headers) {
        Ok(principal) => principal,
        Err(err) => return error_response(err, &uri),
    };
    let result = parse_id(&category_id, "category").and_then(|id| {
        state
            .service
            .delete_category(principal.as_ref(), CategoryId(id))
    });
    match result {
        Ok(outcome) => redirect_response(outcome),
        Err(err) => error_response(err, &uri),
    }
}

async fn delete_user_handler<R>(
    State(state): State<AdminState<R>>,
    headers: HeaderMap,
    uri: Uri,
    Path(user_id): Path<String>,
) -> Response
where
    R: JobRepository + 'static,
{
    let principal = match state.principal(&headers) {
        Ok(principal) => principal,
        Err(err) => return error_response(err, &uri),
    };
    let result = parse_id(&user_id, "user")
        .and_then(|id| state.service.delete_user(principal.as_ref(), UserId(id)));
    match result {
        Ok(outcome) => redirect_response(outcome),
        Err(err) => error_response(err, &uri),
    }
}

fn parse_id(raw: &str, entity: &'static str) -> Result<i64, AdminError> {
    raw.parse::<i64>().map_err(|_| AdminError::NotFound(entity))
}

fn redirect_response(outcome: AdminOutcome) -> Response {
    (
        StatusCode::SEE_OTHER,
        [(header::LOCATION, outcome.redirect_to.clone())],
        Json(outcome),
    )
        .into_response()
}

fn error_response(err: AdminError, uri: &Uri) -> Response {
    match err {
        AdminError::Access(AccessDenied::Unauthenticated) => login_redirect(uri),
        AdminError::Access(AccessDenied::Forbidden) => {
            let payload = json!({ "error": AccessDenied::Forbidden.to_string() });
            (StatusCode::FORBIDDEN, Json(payload)).into_response()
        }
        AdminError::NotFound(_)
        | AdminError::Page(_)
        | AdminError::Repository(RepositoryError::NotFound) => {
            let payload = json!({ "error": err.to_string() });
            (StatusCode::NOT_FOUND, Json(payload)).into_response()
        }
        AdminError::Invalid(errors) => {
            let payload = json!({ "error": "please correct the errors below", "errors": errors });
            (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response()
        }
        AdminError::Repository(RepositoryError::Integrity(detail)) => {
            let payload = json!({ "error": detail });
            (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response()
        }
        AdminError::Repository(other) => {
            tracing::error!(error = %other, "admin request failed");
            let payload = json!({ "error": other.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
    }
}
