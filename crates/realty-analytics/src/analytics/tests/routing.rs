use super::common::*;
use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{Request, StatusCode};
use chrono::Local;
use std::sync::Arc;
use tower::ServiceExt;

use crate::analytics::router::{agent_detail_handler, agents_handler, leaderboard_handler};
use crate::analytics::{analytics_router, AnalyticsService, PeriodQuery};
use crate::config::AnalyticsConfig;
use crate::store::InMemoryCrmStore;

fn live_service() -> Arc<AnalyticsService<InMemoryCrmStore>> {
    Arc::new(AnalyticsService::new(
        seeded_store(Local::now().naive_local()),
        AnalyticsConfig::default(),
    ))
}

fn all_time() -> PeriodQuery {
    PeriodQuery {
        period: Some("all".to_string()),
        ..PeriodQuery::default()
    }
}

async fn get(uri: &str) -> axum::response::Response {
    analytics_router(live_service())
        .oneshot(Request::get(uri).body(Body::empty()).expect("request builds"))
        .await
        .expect("router responds")
}

#[tokio::test]
async fn agents_handler_returns_every_agent() {
    let response = agents_handler::<InMemoryCrmStore>(State(live_service()), Query(all_time())).await;

    assert_eq!(response.status(), StatusCode::OK);
    let payload = response_json(response).await;
    let agents = payload.as_array().expect("array body");
    assert_eq!(agents.len(), 4);
    assert_eq!(agents[0]["agent_name"], "Andi Pratama");
    assert_eq!(agents[0]["closed_deals"], 2);
}

#[tokio::test]
async fn agents_handler_rejects_malformed_dates() {
    let query = PeriodQuery {
        start: Some("2025-13-01".to_string()),
        end: Some("2025-12-31".to_string()),
        ..PeriodQuery::default()
    };

    let response = agents_handler::<InMemoryCrmStore>(State(live_service()), Query(query)).await;

    assert_error_response(response, StatusCode::BAD_REQUEST).await;
}

#[tokio::test]
async fn agents_handler_returns_internal_error_when_store_is_down() {
    let service = Arc::new(AnalyticsService::new(
        Arc::new(UnavailableStore),
        AnalyticsConfig::default(),
    ));

    let response = agents_handler::<UnavailableStore>(State(service), Query(all_time())).await;

    assert_error_response(response, StatusCode::INTERNAL_SERVER_ERROR).await;
}

#[tokio::test]
async fn agent_detail_handler_returns_not_found_for_admins() {
    let response = agent_detail_handler::<InMemoryCrmStore>(
        State(live_service()),
        Path("admin-1".to_string()),
        Query(all_time()),
    )
    .await;

    assert_error_response(response, StatusCode::NOT_FOUND).await;
}

#[tokio::test]
async fn leaderboard_handler_rejects_unknown_metric() {
    let query = PeriodQuery {
        metric: Some("listings".to_string()),
        ..all_time()
    };

    let response = leaderboard_handler::<InMemoryCrmStore>(State(live_service()), Query(query)).await;

    assert_error_response(response, StatusCode::BAD_REQUEST).await;
}

#[tokio::test]
async fn leaderboard_route_ranks_by_requested_metric() {
    let response = get("/api/v1/analytics/leaderboard?period=all&metric=deals").await;

    assert_eq!(response.status(), StatusCode::OK);
    let payload = response_json(response).await;
    assert_eq!(payload[0]["agent_id"], "agent-andi");
    assert_eq!(payload[0]["metric"], "deals");
    assert_eq!(payload[0]["rank"], 1);
}

#[tokio::test]
async fn agent_detail_route_returns_breakdowns() {
    let response = get("/api/v1/analytics/agents/agent-andi?period=all").await;

    assert_eq!(response.status(), StatusCode::OK);
    let payload = response_json(response).await;
    assert_eq!(payload["agent"]["email"], "andi@example.com");
    assert_eq!(payload["funnel_breakdown"].as_array().map(Vec::len), Some(6));
    assert!(payload["activity_breakdown"][0]["type"].is_string());
    assert!(payload["comparison_with_team"]["revenue_diff"].is_i64());
}

#[tokio::test]
async fn team_route_uses_default_period_when_tag_is_unknown() {
    let response = get("/api/v1/analytics/team?period=fortnight").await;

    assert_eq!(response.status(), StatusCode::OK);
    let payload = response_json(response).await;
    assert!(payload["team_conversion_rate"].is_number());
    assert!(payload["active_deals"].is_u64());
}

#[tokio::test]
async fn velocity_sources_and_trends_routes_respond() {
    for uri in [
        "/api/v1/analytics/velocity?period=all",
        "/api/v1/analytics/sources?period=all",
        "/api/v1/analytics/trends",
    ] {
        let response = get(uri).await;
        assert_eq!(response.status(), StatusCode::OK, "{uri}");
        let payload = response_json(response).await;
        assert!(payload.as_array().is_some_and(|rows| !rows.is_empty()), "{uri}");
    }
}

#[tokio::test]
async fn custom_ranges_at_the_calendar_edges_are_rejected() {
    for uri in [
        "/api/v1/analytics/agents?start=+262142-12-31&end=+262142-12-31",
        "/api/v1/analytics/agents/agent-andi?start=-262143-01-01&end=2025-01-01",
        "/api/v1/analytics/trends?start=+262142-12-01&end=+262142-12-30",
        "/api/v1/analytics/team?start=10000-01-01&end=10000-01-31",
    ] {
        let response = get(uri).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
        let payload = response_json(response).await;
        assert!(payload["error"].is_string(), "{uri}");
    }
}

#[tokio::test]
async fn reversed_custom_range_is_rejected() {
    let response = get("/api/v1/analytics/agents?start=2025-03-01&end=2025-01-31").await;

    assert_error_response(response, StatusCode::BAD_REQUEST).await;
}

#[tokio::test]
async fn widest_supported_range_is_served() {
    for uri in [
        "/api/v1/analytics/agents/agent-andi?start=0001-01-01&end=9999-12-31",
        "/api/v1/analytics/trends?start=9999-12-01&end=9999-12-31",
    ] {
        let response = get(uri).await;
        assert_eq!(response.status(), StatusCode::OK, "{uri}");
    }
}
