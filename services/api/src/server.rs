use crate::cli::ServeArgs;
use crate::infra::{existing_demo_accounts, register_accounts, seed_demo, AppState};
use crate::routes::with_job_board_routes;
use axum::{Extension, Router};
use axum_prometheus::PrometheusMetricLayer;
use mero_jobs::config::AppConfig;
use mero_jobs::error::AppError;
use mero_jobs::jobs::{
    InMemoryJobStore, InMemoryNotifier, JobRepository, SqliteJobStore, TokenRegistry,
};
use mero_jobs::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    if let Some(database) = args.database.take() {
        config.storage.database_path = Some(database);
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let tokens = Arc::new(TokenRegistry::default());
    let notifier = Arc::new(InMemoryNotifier::default());
    let routes = match &config.storage.database_path {
        Some(path) => {
            let store = Arc::new(SqliteJobStore::open(path)?);
            board_routes(store, notifier, tokens, args.seed_demo)?
        }
        None => {
            let store = Arc::new(InMemoryJobStore::default());
            board_routes(store, notifier, tokens, args.seed_demo)?
        }
    };

    let app = routes
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "job board ready");

    axum::serve(listener, app).await?;
    Ok(())
}

fn board_routes<R>(
    store: Arc<R>,
    notifier: Arc<InMemoryNotifier>,
    tokens: Arc<TokenRegistry>,
    seed: bool,
) -> Result<Router, AppError>
where
    R: JobRepository + 'static,
{
    let accounts = if seed {
        seed_demo(store.as_ref())?
    } else {
        existing_demo_accounts(store.as_ref())?
    };
    register_accounts(&tokens, &accounts);
    for account in &accounts {
        info!(
            token = account.token,
            email = %account.principal.email,
            agency = account.principal.is_agency,
            superuser = account.principal.is_superuser,
            "demo account registered"
        );
    }

    Ok(with_job_board_routes(store, notifier, tokens))
}
