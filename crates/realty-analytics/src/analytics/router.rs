use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use super::leaderboard::LeaderboardMetric;
use super::period::{check_year, Period, PeriodRequest};
use super::service::{AnalyticsError, AnalyticsService};
use crate::domain::AgentId;
use crate::store::{CrmStore, DateRange, StoreError};

/// Query string accepted by every analytics endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct PeriodQuery {
    pub period: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub metric: Option<String>,
}

impl PeriodQuery {
    /// Builds the period request, using `fallback` when no tag was sent.
    pub fn request(&self, fallback: Period) -> Result<PeriodRequest, AnalyticsError> {
        let period = self
            .period
            .as_deref()
            .map(Period::from_tag)
            .unwrap_or(fallback);
        let request = PeriodRequest {
            period,
            start: self.start.as_deref().map(parse_date).transpose()?,
            end: self.end.as_deref().map(parse_date).transpose()?,
        };
        request.validate()?;
        Ok(request)
    }

    pub fn metric(&self) -> Result<LeaderboardMetric, AnalyticsError> {
        match self.metric.as_deref() {
            None => Ok(LeaderboardMetric::default()),
            Some(raw) => LeaderboardMetric::parse(raw).ok_or_else(|| {
                AnalyticsError::InvalidInput(format!(
                    "unknown leaderboard metric '{raw}', expected revenue, deals or conversion"
                ))
            }),
        }
    }
}

/// Parses a `YYYY-MM-DD` bound, rejecting years outside [`MIN_YEAR`]..=[`MAX_YEAR`].
///
/// [`MIN_YEAR`]: super::period::MIN_YEAR
/// [`MAX_YEAR`]: super::period::MAX_YEAR
pub fn parse_date(raw: &str) -> Result<NaiveDate, AnalyticsError> {
    let date = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|err| {
        AnalyticsError::InvalidInput(format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
    })?;
    check_year(date)
}

/// Router builder exposing the read-only analytics endpoints.
pub fn analytics_router<S>(service: Arc<AnalyticsService<S>>) -> Router
where
    S: CrmStore + 'static,
{
    Router::new()
        .route("/api/v1/analytics/agents", get(agents_handler::<S>))
        .route(
            "/api/v1/analytics/agents/:agent_id",
            get(agent_detail_handler::<S>),
        )
        .route("/api/v1/analytics/team", get(team_handler::<S>))
        .route("/api/v1/analytics/leaderboard", get(leaderboard_handler::<S>))
        .route("/api/v1/analytics/velocity", get(velocity_handler::<S>))
        .route("/api/v1/analytics/trends", get(trends_handler::<S>))
        .route("/api/v1/analytics/sources", get(sources_handler::<S>))
        .with_state(service)
}

fn resolve<S>(
    service: &AnalyticsService<S>,
    query: &PeriodQuery,
    fallback: Period,
) -> Result<DateRange, AnalyticsError>
where
    S: CrmStore + 'static,
{
    let request = query.request(fallback)?;
    Ok(service.resolve(&request, Local::now().naive_local()))
}

fn respond<T: serde::Serialize>(result: Result<T, AnalyticsError>) -> Response {
    match result {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(err) => error_response(err),
    }
}

/// Maps service errors onto status codes with a JSON `error` body.
pub(crate) fn error_response(err: AnalyticsError) -> Response {
    let status = match &err {
        AnalyticsError::AgentNotFound(_)
        | AnalyticsError::LeadNotFound(_)
        | AnalyticsError::CommissionNotFound(_) => StatusCode::NOT_FOUND,
        AnalyticsError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        AnalyticsError::Store(StoreError::Conflict) => StatusCode::CONFLICT,
        AnalyticsError::Store(_) | AnalyticsError::Task(_) => {
            error!(error = %err, "analytics request failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    let payload = json!({ "error": err.to_string() });
    (status, Json(payload)).into_response()
}

pub(crate) async fn agents_handler<S>(
    State(service): State<Arc<AnalyticsService<S>>>,
    Query(query): Query<PeriodQuery>,
) -> Response
where
    S: CrmStore + 'static,
{
    let result = match resolve(&service, &query, Period::Month) {
        Ok(range) => service.agent_performance(range).await,
        Err(err) => Err(err),
    };
    respond(result)
}

pub(crate) async fn agent_detail_handler<S>(
    State(service): State<Arc<AnalyticsService<S>>>,
    Path(agent_id): Path<String>,
    Query(query): Query<PeriodQuery>,
) -> Response
where
    S: CrmStore + 'static,
{
    let agent_id = AgentId(agent_id);
    let result = match resolve(&service, &query, Period::Month) {
        Ok(range) => service.agent_detail(&agent_id, range).await,
        Err(err) => Err(err),
    };
    respond(result)
}

pub(crate) async fn team_handler<S>(
    State(service): State<Arc<AnalyticsService<S>>>,
    Query(query): Query<PeriodQuery>,
) -> Response
where
    S: CrmStore + 'static,
{
    let result = match resolve(&service, &query, Period::Month) {
        Ok(range) => service.team_overview(range).await,
        Err(err) => Err(err),
    };
    respond(result)
}

pub(crate) async fn leaderboard_handler<S>(
    State(service): State<Arc<AnalyticsService<S>>>,
    Query(query): Query<PeriodQuery>,
) -> Response
where
    S: CrmStore + 'static,
{
    let prepared = query
        .metric()
        .and_then(|metric| Ok((metric, resolve(&service, &query, Period::Month)?)));
    let result = match prepared {
        Ok((metric, range)) => service.leaderboard(metric, range).await,
        Err(err) => Err(err),
    };
    respond(result)
}

pub(crate) async fn velocity_handler<S>(
    State(service): State<Arc<AnalyticsService<S>>>,
    Query(query): Query<PeriodQuery>,
) -> Response
where
    S: CrmStore + 'static,
{
    let result = match resolve(&service, &query, Period::Month) {
        Ok(range) => service.pipeline_velocity(range).await,
        Err(err) => Err(err),
    };
    respond(result)
}

pub(crate) async fn trends_handler<S>(
    State(service): State<Arc<AnalyticsService<S>>>,
    Query(query): Query<PeriodQuery>,
) -> Response
where
    S: CrmStore + 'static,
{
    let result = match resolve(&service, &query, Period::Year) {
        Ok(range) => service.deal_trends(range).await,
        Err(err) => Err(err),
    };
    respond(result)
}

pub(crate) async fn sources_handler<S>(
    State(service): State<Arc<AnalyticsService<S>>>,
    Query(query): Query<PeriodQuery>,
) -> Response
where
    S: CrmStore + 'static,
{
    let result = match resolve(&service, &query, Period::Month) {
        Ok(range) => service.source_performance(range).await,
        Err(err) => Err(err),
    };
    respond(result)
}
