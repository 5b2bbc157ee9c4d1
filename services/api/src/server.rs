use crate::cli::ServeArgs;
use crate::infra::{AppState, Backend};
use crate::routes::with_crm_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use chrono::Local;
use realty_analytics::config::AppConfig;
use realty_analytics::error::AppError;
use realty_analytics::store::CrmStore;
use realty_analytics::telemetry;
use std::sync::atomic::{AtomicBool, Ordering};
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
        config.store.database_path = Some(database);
    }

    telemetry::init(&config.telemetry)?;

    let backend = Backend::open(
        config.store.database_path.as_deref(),
        Local::now().naive_local(),
    )?;
    match backend {
        Backend::Sqlite(store) => serve(store, config).await,
        Backend::Memory(store) => serve(store, config).await,
    }
}

async fn serve<S>(store: Arc<S>, config: AppConfig) -> Result<(), AppError>
where
    S: CrmStore + 'static,
{
    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let app = with_crm_routes(store, config.analytics)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "team analytics service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
