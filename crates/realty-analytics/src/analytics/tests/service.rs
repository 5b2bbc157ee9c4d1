use super::common::*;
use std::sync::Arc;

use crate::analytics::{AnalyticsError, AnalyticsService, LeaderboardMetric, Period, PeriodRequest};
use crate::config::AnalyticsConfig;
use crate::domain::{LeadId, LeadSource, LeadStatus};
use crate::store::InMemoryCrmStore;

#[tokio::test]
async fn agent_performance_reports_every_agent_in_name_order() {
    let (service, range) = build_service();

    let performance = service
        .agent_performance(range)
        .await
        .expect("performance aggregates");

    let names: Vec<&str> = performance.iter().map(|p| p.agent_name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "Andi Pratama",
            "Budi Santoso",
            "Citra Lestari",
            "Dewi Anggraini"
        ]
    );

    let andi = &performance[0];
    assert_eq!(andi.total_leads, 5);
    assert_eq!(andi.closed_deals, 2);
    assert_eq!(andi.conversion_rate, 40.0);
    assert_eq!(andi.total_revenue, 6_600_000_000);
    assert_eq!(andi.total_commission, 165_000_000);
    assert_eq!(andi.activities_count, 9);
    assert_eq!(andi.appointments_count, 2);

    let citra = &performance[2];
    assert_eq!(citra.conversion_rate, 33.3);
    assert_eq!(citra.total_revenue, 0, "pending commissions are not revenue");
}

#[tokio::test]
async fn agent_performance_is_empty_outside_the_seeded_period() {
    let (service, _) = build_service();
    let earlier = service.resolve(
        &PeriodRequest::custom(
            chrono::NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid date"),
            chrono::NaiveDate::from_ymd_opt(2024, 1, 31).expect("valid date"),
        ),
        now(),
    );

    let performance = service
        .agent_performance(earlier)
        .await
        .expect("performance aggregates");

    assert_eq!(performance.len(), 4);
    assert!(performance
        .iter()
        .all(|p| p.total_leads == 0 && p.conversion_rate == 0.0 && p.avg_days_to_close == 0));
}

#[tokio::test]
async fn single_agent_lookup_rejects_admins() {
    let (service, range) = build_service();

    let err = service
        .agent_performance_for(&agent_id("admin-1"), range)
        .await
        .expect_err("admins are not reported");
    assert!(matches!(err, AnalyticsError::AgentNotFound(_)));

    let budi = service
        .agent_performance_for(&agent_id("agent-budi"), range)
        .await
        .expect("agent resolves");
    assert_eq!(budi.lost_deals, 1);
    assert_eq!(budi.conversion_rate, 25.0);
}

#[tokio::test]
async fn leaderboard_ranks_by_each_metric() {
    let (service, range) = build_service();

    let revenue = service
        .leaderboard(LeaderboardMetric::Revenue, range)
        .await
        .expect("leaderboard ranks");
    assert_eq!(revenue.len(), 4);
    assert_eq!(revenue[0].agent_id, agent_id("agent-andi"));
    assert_eq!(revenue[0].value, 165_000_000.0);
    assert_eq!(revenue[1].agent_id, agent_id("agent-budi"));
    assert_eq!(
        revenue.iter().map(|entry| entry.rank).collect::<Vec<_>>(),
        vec![1, 2, 3, 4]
    );

    let deals = service
        .leaderboard(LeaderboardMetric::Deals, range)
        .await
        .expect("leaderboard ranks");
    assert_eq!(deals[0].value, 2.0);
    // Budi and Citra tie on one deal and keep name order.
    assert_eq!(deals[1].agent_id, agent_id("agent-budi"));
    assert_eq!(deals[2].agent_id, agent_id("agent-citra"));

    let conversion = service
        .leaderboard(LeaderboardMetric::Conversion, range)
        .await
        .expect("leaderboard ranks");
    let ranked: Vec<_> = conversion.iter().map(|e| e.agent_id.0.as_str()).collect();
    assert_eq!(ranked, vec!["agent-andi", "agent-citra", "agent-budi"]);
}

#[tokio::test]
async fn leaderboard_threshold_follows_configuration() {
    let store = seeded_store(now());
    let service = AnalyticsService::new(
        store,
        AnalyticsConfig {
            leaderboard_min_leads: 1,
            ..AnalyticsConfig::default()
        },
    );
    let range = service.resolve(&PeriodRequest::new(Period::Month), now());

    let conversion = service
        .leaderboard(LeaderboardMetric::Conversion, range)
        .await
        .expect("leaderboard ranks");
    assert_eq!(conversion.len(), 4);
    assert_eq!(conversion[3].agent_id, agent_id("agent-dewi"));
}

#[tokio::test]
async fn team_overview_sums_the_period() {
    let (service, range) = build_service();

    let overview = service.team_overview(range).await.expect("overview builds");

    assert_eq!(overview.total_leads, 14);
    assert_eq!(overview.total_closed, 4);
    assert_eq!(overview.team_conversion_rate, 28.6);
    assert_eq!(overview.total_revenue, 8_250_000_000);
    assert_eq!(overview.total_commission, 214_500_000);
    assert_eq!(overview.active_deals, 4);
    assert_eq!(overview.new_leads_this_period, 3);
}

#[tokio::test]
async fn agent_detail_compares_against_the_team() {
    let (service, range) = build_service();

    let detail = service
        .agent_detail(&agent_id("agent-andi"), range)
        .await
        .expect("detail builds");

    assert_eq!(detail.agent.name, "Andi Pratama");
    assert_eq!(detail.current_period.closed_deals, 2);
    assert_eq!(detail.previous_period.total_leads, 0);

    let funnel_total: usize = detail.funnel_breakdown.iter().map(|s| s.count).sum();
    assert_eq!(funnel_total, 5);
    let percentages: u32 = detail.funnel_breakdown.iter().map(|s| s.percentage).sum();
    assert_eq!(percentages, 100);

    assert!(detail.activity_breakdown.iter().all(|entry| entry.count > 0));
    let activity_total: usize = detail.activity_breakdown.iter().map(|e| e.count).sum();
    assert_eq!(activity_total, 9);

    let website = detail
        .best_sources
        .iter()
        .find(|row| row.source == LeadSource::Website)
        .expect("website source present");
    assert_eq!((website.leads, website.closed), (2, 1));
    assert_eq!(website.conversion_rate, 50);
    assert_eq!(detail.best_sources[0].conversion_rate, 100);

    assert_eq!(detail.closed_deals.len(), 2);
    assert_eq!(detail.closed_deals[0].lead_id, LeadId("lead-001".to_string()));
    assert_eq!(detail.closed_deals[0].property_title, "Villa Kemang 3BR");
    assert_eq!(detail.closed_deals[0].commission_amount, 112_500_000);

    assert_eq!(detail.comparison_with_team.conversion_rate_diff, 15.4);
    assert_eq!(detail.comparison_with_team.revenue_diff, 111_375_000);
    assert_eq!(detail.comparison_with_team.deals_diff, 1.0);
}

#[tokio::test]
async fn agent_detail_for_unknown_agent_is_not_found() {
    let (service, range) = build_service();

    let err = service
        .agent_detail(&agent_id("agent-ghost"), range)
        .await
        .expect_err("unknown agent");
    assert!(matches!(err, AnalyticsError::AgentNotFound(id) if id.0 == "agent-ghost"));
}

#[tokio::test]
async fn closed_deal_links_property_through_pending_commission() {
    let (service, range) = build_service();

    let detail = service
        .agent_detail(&agent_id("agent-citra"), range)
        .await
        .expect("detail builds");

    // lead-010 has a pending commission, which still links the property.
    assert_eq!(detail.closed_deals.len(), 1);
    assert_eq!(detail.closed_deals[0].property_title, "Ruko Gading Serpong");
    assert_eq!(detail.funnel_breakdown[0].stage, LeadStatus::New);
}

#[tokio::test]
async fn pipeline_velocity_separates_measured_and_estimated_leads() {
    let (service, range) = build_service();

    let velocity = service
        .pipeline_velocity(range)
        .await
        .expect("velocity computes");

    assert_eq!(velocity.len(), 4);
    let andi = velocity
        .iter()
        .find(|entry| entry.agent_id == agent_id("agent-andi"))
        .expect("andi present");
    assert_eq!((andi.measured_leads, andi.estimated_leads), (2, 0));

    let budi = velocity
        .iter()
        .find(|entry| entry.agent_id == agent_id("agent-budi"))
        .expect("budi present");
    assert_eq!((budi.measured_leads, budi.estimated_leads), (0, 1));

    let dewi = velocity
        .iter()
        .find(|entry| entry.agent_id == agent_id("agent-dewi"))
        .expect("dewi present");
    assert_eq!(dewi.total_avg_days, 0);

    assert!(velocity
        .windows(2)
        .all(|pair| pair[0].total_avg_days <= pair[1].total_avg_days));
}

#[tokio::test]
async fn deal_trends_cover_each_month_for_each_agent() {
    let (service, _) = build_service();
    let range = service.resolve(&PeriodRequest::new(Period::Quarter), now());

    let points = service.deal_trends(range).await.expect("trends compute");

    // Three months of the third quarter for four agents.
    assert_eq!(points.len(), 12);
    let andi: Vec<(&str, usize)> = points
        .iter()
        .filter(|point| point.agent_id == agent_id("agent-andi"))
        .map(|point| (point.month.as_str(), point.deals))
        .collect();
    assert_eq!(andi, vec![("Jul 2025", 2), ("Aug 2025", 0), ("Sep 2025", 0)]);
}

#[tokio::test]
async fn source_performance_attributes_earned_revenue() {
    let (service, range) = build_service();

    let sources = service
        .source_performance(range)
        .await
        .expect("sources compute");

    assert_eq!(sources[0].source, LeadSource::Referral);
    assert_eq!(sources[0].revenue, 112_500_000);
    let open_house = sources
        .iter()
        .find(|row| row.source == LeadSource::OpenHouse)
        .expect("open house present");
    assert_eq!(open_house.revenue, 0, "pending commission is not revenue");
    assert_eq!(open_house.closed, 1);
}

#[tokio::test]
async fn store_failures_surface_as_store_errors() {
    let service = AnalyticsService::new(Arc::new(UnavailableStore), AnalyticsConfig::default());
    let range = service.resolve(&PeriodRequest::new(Period::Month), now());

    let err = service
        .agent_performance(range)
        .await
        .expect_err("store is offline");
    assert!(matches!(err, AnalyticsError::Store(_)));
}

#[tokio::test]
async fn empty_store_produces_zeroed_reports() {
    let service = AnalyticsService::new(
        Arc::new(InMemoryCrmStore::new()),
        AnalyticsConfig::default(),
    );
    let range = service.resolve(&PeriodRequest::new(Period::Year), now());

    assert!(service
        .agent_performance(range)
        .await
        .expect("empty")
        .is_empty());
    let overview = service.team_overview(range).await.expect("overview");
    assert_eq!(overview.team_conversion_rate, 0.0);
    assert_eq!(overview.avg_days_to_close, 0);
}
