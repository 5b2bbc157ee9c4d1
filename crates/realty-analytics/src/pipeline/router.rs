use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Local;
use serde::Deserialize;

use super::{PipelineService, StatusMove};
use crate::analytics::error_response;
use crate::domain::{AgentId, LeadId};
use crate::store::CrmStore;

#[derive(Debug, Default, Deserialize)]
pub struct BoardFilter {
    pub agent_id: Option<String>,
}

/// Router builder exposing the pipeline board and status moves.
pub fn pipeline_router<S>(service: Arc<PipelineService<S>>) -> Router
where
    S: CrmStore + 'static,
{
    Router::new()
        .route("/api/v1/pipeline", get(board_handler::<S>))
        .route(
            "/api/v1/pipeline/leads/:lead_id/status",
            post(move_handler::<S>),
        )
        .with_state(service)
}

pub(crate) async fn board_handler<S>(
    State(service): State<Arc<PipelineService<S>>>,
    Query(filter): Query<BoardFilter>,
) -> Response
where
    S: CrmStore + 'static,
{
    match service.board(filter.agent_id.map(AgentId)).await {
        Ok(columns) => (StatusCode::OK, Json(columns)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn move_handler<S>(
    State(service): State<Arc<PipelineService<S>>>,
    Path(lead_id): Path<String>,
    Json(request): Json<StatusMove>,
) -> Response
where
    S: CrmStore + 'static,
{
    match service
        .move_lead(&LeadId(lead_id), request, Local::now().naive_local())
        .await
    {
        Ok(lead) => (StatusCode::OK, Json(lead)).into_response(),
        Err(err) => error_response(err),
    }
}
