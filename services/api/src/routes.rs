use crate::infra::AppState;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use mero_jobs::admin::{admin_router, AdminService};
use mero_jobs::jobs::{
    job_router, principal_from_headers, IdentityProvider, InMemoryNotifier, JobBoardService,
    JobRepository,
};
use serde_json::json;
use std::sync::Arc;

#[derive(Clone)]
struct NoticeState {
    notifier: Arc<InMemoryNotifier>,
    identity: Arc<dyn IdentityProvider>,
}

/// Public board, admin back office, notice inbox and the operational probes on one router.
pub(crate) fn with_job_board_routes<R>(
    store: Arc<R>,
    notifier: Arc<InMemoryNotifier>,
    identity: Arc<dyn IdentityProvider>,
) -> Router
where
    R: JobRepository + 'static,
{
    let jobs = Arc::new(JobBoardService::new(store.clone(), notifier.clone()));
    let admin = Arc::new(AdminService::new(store));
    let notices = Router::new()
        .route("/notices/", get(notices_endpoint))
        .with_state(NoticeState {
            notifier,
            identity: identity.clone(),
        });

    job_router(jobs, identity.clone())
        .merge(admin_router(admin, identity))
        .merge(notices)
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// One-shot success messages: reading them clears them.
async fn notices_endpoint(
    State(state): State<NoticeState>,
    headers: HeaderMap,
) -> Json<serde_json::Value> {
    let notices = principal_from_headers(state.identity.as_ref(), &headers)
        .map(|principal| state.notifier.take_for(principal.id))
        .unwrap_or_default();
    Json(json!({ "notices": notices }))
}
