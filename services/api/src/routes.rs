use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use realty_analytics::analytics::{analytics_router, AnalyticsService};
use realty_analytics::config::AnalyticsConfig;
use realty_analytics::ledger::{commission_router, CommissionLedger};
use realty_analytics::pipeline::{pipeline_router, PipelineService};
use realty_analytics::store::CrmStore;
use serde_json::json;
use std::sync::atomic::Ordering;
use std::sync::Arc;

/// Analytics, commission and pipeline routes over one store, plus the
/// operational endpoints.
pub(crate) fn with_crm_routes<S>(store: Arc<S>, analytics: AnalyticsConfig) -> Router
where
    S: CrmStore + 'static,
{
    let analytics_service = Arc::new(AnalyticsService::new(Arc::clone(&store), analytics));
    let ledger = Arc::new(CommissionLedger::new(Arc::clone(&store)));
    let pipeline = Arc::new(PipelineService::new(store));

    analytics_router(analytics_service)
        .merge(commission_router(ledger))
        .merge(pipeline_router(pipeline))
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
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
