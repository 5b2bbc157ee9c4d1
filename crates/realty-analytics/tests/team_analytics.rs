//! End-to-end scenarios over the public service facades and HTTP routers,
//! run against both store backends.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use chrono::{Local, NaiveDate, NaiveDateTime};
use serde_json::{json, Value};
use tower::ServiceExt;

use realty_analytics::analytics::{
    analytics_router, AnalyticsService, LeaderboardMetric, Period, PeriodRequest,
};
use realty_analytics::config::AnalyticsConfig;
use realty_analytics::domain::{AgentId, LeadId, LeadStatus};
use realty_analytics::ledger::{commission_router, CommissionLedger};
use realty_analytics::pipeline::{pipeline_router, PipelineService, StatusMove};
use realty_analytics::seed::seed_demo;
use realty_analytics::store::{CrmStore, InMemoryCrmStore, SqliteCrmStore};

fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 7, 15)
        .expect("valid date")
        .and_hms_opt(12, 0, 0)
        .expect("valid time")
}

fn sqlite_store(at: NaiveDateTime) -> Arc<SqliteCrmStore> {
    let store = Arc::new(SqliteCrmStore::open_in_memory().expect("sqlite opens"));
    seed_demo(store.as_ref(), at).expect("seed loads");
    store
}

fn memory_store(at: NaiveDateTime) -> Arc<InMemoryCrmStore> {
    let store = Arc::new(InMemoryCrmStore::new());
    seed_demo(store.as_ref(), at).expect("seed loads");
    store
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json payload")
}

#[tokio::test]
async fn sqlite_and_memory_stores_agree_on_team_reports() {
    let memory = AnalyticsService::new(memory_store(now()), AnalyticsConfig::default());
    let sqlite = AnalyticsService::new(sqlite_store(now()), AnalyticsConfig::default());
    let range = memory.resolve(&PeriodRequest::new(Period::Month), now());

    assert_eq!(
        memory.agent_performance(range).await.expect("memory"),
        sqlite.agent_performance(range).await.expect("sqlite")
    );
    assert_eq!(
        memory.team_overview(range).await.expect("memory"),
        sqlite.team_overview(range).await.expect("sqlite")
    );
    assert_eq!(
        memory
            .leaderboard(LeaderboardMetric::Conversion, range)
            .await
            .expect("memory"),
        sqlite
            .leaderboard(LeaderboardMetric::Conversion, range)
            .await
            .expect("sqlite")
    );
    assert_eq!(
        memory.pipeline_velocity(range).await.expect("memory"),
        sqlite.pipeline_velocity(range).await.expect("sqlite")
    );
    let andi = AgentId("agent-andi".to_string());
    assert_eq!(
        memory.agent_detail(&andi, range).await.expect("memory"),
        sqlite.agent_detail(&andi, range).await.expect("sqlite")
    );
}

#[tokio::test]
async fn pipeline_moves_feed_measured_velocity() {
    let store = sqlite_store(now());
    let pipeline = PipelineService::new(Arc::clone(&store));
    let analytics = AnalyticsService::new(Arc::clone(&store), AnalyticsConfig::default());
    let range = analytics.resolve(&PeriodRequest::new(Period::Month), now());

    let before = analytics.pipeline_velocity(range).await.expect("velocity");
    let citra_before = before
        .iter()
        .find(|entry| entry.agent_id.0 == "agent-citra")
        .expect("citra present")
        .clone();

    pipeline
        .move_lead(
            &LeadId("lead-011".to_string()),
            StatusMove {
                status: LeadStatus::Closed,
                actor: AgentId("agent-citra".to_string()),
            },
            now(),
        )
        .await
        .expect("lead closes");

    let history = store
        .stage_transitions(&LeadId("lead-011".to_string()))
        .expect("history");
    assert_eq!(history.last().map(|t| t.to), Some(LeadStatus::Closed));

    let after = analytics.pipeline_velocity(range).await.expect("velocity");
    let citra_after = after
        .iter()
        .find(|entry| entry.agent_id.0 == "agent-citra")
        .expect("citra present");
    assert_eq!(citra_after.measured_leads, citra_before.measured_leads + 1);
    assert_eq!(citra_after.estimated_leads, 0);
}

#[tokio::test]
async fn recorded_commission_appears_in_summary_and_revenue() {
    let at = Local::now().naive_local();
    let store = memory_store(at);
    let router = commission_router(Arc::new(CommissionLedger::new(Arc::clone(&store))));

    let response = router
        .clone()
        .oneshot(
            Request::post("/api/v1/commissions")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({
                        "agent_id": "agent-dewi",
                        "property_id": "prop-bsd",
                        "lead_id": "lead-013",
                        "deal_value": 1_000_000_000,
                        "commission_rate": 0.025,
                        "split_percentage": 40.0
                    })
                    .to_string(),
                ))
                .expect("request builds"),
        )
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    assert_eq!(created["commission_amount"], 25_000_000);
    assert_eq!(created["split_amount"], 10_000_000);
    assert_eq!(created["status"], "PENDING");
    let id = created["id"].as_str().expect("id").to_string();

    let response = router
        .clone()
        .oneshot(
            Request::post(format!("/api/v1/commissions/{id}/status"))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json!({ "status": "APPROVED" }).to_string()))
                .expect("request builds"),
        )
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::OK);

    let response = router
        .oneshot(
            Request::get("/api/v1/commissions/summary?agent_id=agent-dewi")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("router responds");
    let summary = body_json(response).await;
    assert_eq!(summary["approved"], 25_000_000);
    assert_eq!(summary["closed_deals"], 1);

    let analytics = analytics_router(Arc::new(AnalyticsService::new(
        store,
        AnalyticsConfig::default(),
    )));
    let response = analytics
        .oneshot(
            Request::get("/api/v1/analytics/agents/agent-dewi?period=all")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::OK);
    let detail = body_json(response).await;
    assert_eq!(detail["current_period"]["total_commission"], 25_000_000);
}

#[tokio::test]
async fn invalid_commission_is_rejected_with_bad_request() {
    let store = memory_store(now());
    let router = commission_router(Arc::new(CommissionLedger::new(store)));

    let response = router
        .oneshot(
            Request::post("/api/v1/commissions")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({
                        "agent_id": "agent-andi",
                        "property_id": "prop-kemang",
                        "deal_value": 1_000_000,
                        "commission_rate": 2.5
                    })
                    .to_string(),
                ))
                .expect("request builds"),
        )
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn pipeline_board_lists_open_columns() {
    let router = pipeline_router(Arc::new(PipelineService::new(memory_store(now()))));

    let response = router
        .oneshot(
            Request::get("/api/v1/pipeline?agent_id=agent-andi")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::OK);
    let columns = body_json(response).await;
    let counts: Vec<usize> = columns
        .as_array()
        .expect("columns")
        .iter()
        .map(|column| column["leads"].as_array().map(Vec::len).unwrap_or(0))
        .collect();
    assert_eq!(counts, vec![1, 0, 1, 1]);
}

#[tokio::test]
async fn status_move_by_unknown_actor_is_not_found() {
    let store = memory_store(now());
    let router = pipeline_router(Arc::new(PipelineService::new(Arc::clone(&store))));

    let response = router
        .oneshot(
            Request::post("/api/v1/pipeline/leads/lead-005/status")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({ "status": "CONTACTED", "actor": "agent-ghost" }).to_string(),
                ))
                .expect("request builds"),
        )
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let payload = body_json(response).await;
    assert!(payload["error"]
        .as_str()
        .is_some_and(|message| message.contains("agent-ghost")));
    assert!(store
        .stage_transitions(&LeadId("lead-005".to_string()))
        .expect("history")
        .is_empty());
}
