use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{Datelike, Local};
use serde::Deserialize;

use super::{CommissionLedger, CommissionStatusUpdate, NewCommission};
use crate::analytics::{error_response, AnalyticsError};
use crate::domain::{AgentId, CommissionId, CommissionStatus};
use crate::store::{CommissionQuery, CrmStore};

#[derive(Debug, Default, Deserialize)]
pub struct CommissionFilter {
    pub agent_id: Option<String>,
    pub status: Option<String>,
    pub year: Option<i32>,
}

/// Router builder exposing commission recording and reporting.
pub fn commission_router<S>(ledger: Arc<CommissionLedger<S>>) -> Router
where
    S: CrmStore + 'static,
{
    Router::new()
        .route(
            "/api/v1/commissions",
            get(list_handler::<S>).post(record_handler::<S>),
        )
        .route("/api/v1/commissions/summary", get(summary_handler::<S>))
        .route("/api/v1/commissions/monthly", get(monthly_handler::<S>))
        .route(
            "/api/v1/commissions/:commission_id/status",
            post(status_handler::<S>),
        )
        .with_state(ledger)
}

pub(crate) async fn record_handler<S>(
    State(ledger): State<Arc<CommissionLedger<S>>>,
    Json(new): Json<NewCommission>,
) -> Response
where
    S: CrmStore + 'static,
{
    match ledger.record(new, Local::now().naive_local()).await {
        Ok(commission) => (StatusCode::CREATED, Json(commission)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn status_handler<S>(
    State(ledger): State<Arc<CommissionLedger<S>>>,
    Path(commission_id): Path<String>,
    Json(update): Json<CommissionStatusUpdate>,
) -> Response
where
    S: CrmStore + 'static,
{
    match ledger
        .update_status(&CommissionId(commission_id), update)
        .await
    {
        Ok(commission) => (StatusCode::OK, Json(commission)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn list_handler<S>(
    State(ledger): State<Arc<CommissionLedger<S>>>,
    Query(filter): Query<CommissionFilter>,
) -> Response
where
    S: CrmStore + 'static,
{
    let mut query = CommissionQuery::default();
    if let Some(agent_id) = filter.agent_id {
        query = query.agent(&AgentId(agent_id));
    }
    if let Some(raw) = filter.status.as_deref() {
        match CommissionStatus::parse(raw) {
            Some(status) => query = query.statuses(&[status]),
            None => {
                return error_response(AnalyticsError::InvalidInput(format!(
                    "unknown commission status '{raw}'"
                )))
            }
        }
    }
    match ledger.list(query).await {
        Ok(commissions) => (StatusCode::OK, Json(commissions)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn summary_handler<S>(
    State(ledger): State<Arc<CommissionLedger<S>>>,
    Query(filter): Query<CommissionFilter>,
) -> Response
where
    S: CrmStore + 'static,
{
    match ledger.summary(filter.agent_id.map(AgentId)).await {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn monthly_handler<S>(
    State(ledger): State<Arc<CommissionLedger<S>>>,
    Query(filter): Query<CommissionFilter>,
) -> Response
where
    S: CrmStore + 'static,
{
    let year = filter.year.unwrap_or_else(|| Local::now().year());
    match ledger.monthly(year).await {
        Ok(monthly) => (StatusCode::OK, Json(monthly)).into_response(),
        Err(err) => error_response(err),
    }
}
