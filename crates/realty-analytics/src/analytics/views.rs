use chrono::NaiveDateTime;
use serde::Serialize;

use super::leaderboard::LeaderboardMetric;
use crate::domain::{ActivityType, Agent, AgentId, LeadId, LeadSource, LeadStatus};

/// Headline numbers for one agent over one period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentPerformance {
    pub agent_id: AgentId,
    pub agent_name: String,
    pub agent_email: String,
    pub total_leads: usize,
    pub new_leads: usize,
    pub contacted_leads: usize,
    pub viewing_leads: usize,
    pub negotiation_leads: usize,
    pub closed_deals: usize,
    pub lost_deals: usize,
    /// Percentage of the period's leads that closed, one decimal place.
    pub conversion_rate: f64,
    pub total_revenue: i64,
    pub total_commission: i64,
    pub avg_days_to_close: i64,
    pub activities_count: usize,
    pub appointments_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub agent_id: AgentId,
    pub agent_name: String,
    pub value: f64,
    pub metric: LeaderboardMetric,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamOverview {
    pub total_leads: usize,
    pub total_closed: usize,
    pub team_conversion_rate: f64,
    pub total_revenue: i64,
    pub total_commission: i64,
    pub active_deals: usize,
    pub avg_days_to_close: i64,
    pub new_leads_this_period: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunnelStage {
    pub stage: LeadStatus,
    pub label: &'static str,
    pub count: usize,
    pub percentage: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityBreakdownEntry {
    #[serde(rename = "type")]
    pub kind: ActivityType,
    pub label: &'static str,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourcePerformance {
    pub source: LeadSource,
    pub label: &'static str,
    pub leads: usize,
    pub closed: usize,
    pub conversion_rate: i64,
}

/// Team-wide source row with commission revenue attributed through the lead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamSourcePerformance {
    pub source: LeadSource,
    pub label: &'static str,
    pub leads: usize,
    pub closed: usize,
    pub conversion_rate: i64,
    pub revenue: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineVelocity {
    pub agent_id: AgentId,
    pub agent_name: String,
    pub avg_days_in_new: i64,
    pub avg_days_in_contacted: i64,
    pub avg_days_in_viewing: i64,
    pub avg_days_in_negotiation: i64,
    pub total_avg_days: i64,
    /// Closed leads whose stage history was recorded.
    pub measured_leads: usize,
    /// Closed leads whose stage time was split evenly for lack of history.
    pub estimated_leads: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DealTrendPoint {
    pub month: String,
    pub agent_id: AgentId,
    pub agent_name: String,
    pub deals: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClosedDeal {
    pub lead_id: LeadId,
    pub lead_name: String,
    pub property_title: String,
    pub deal_value: i64,
    pub commission_amount: i64,
    pub closed_date: NaiveDateTime,
    pub days_to_close: i64,
}

/// Signed distance between an agent and the team mean.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamComparison {
    pub conversion_rate_diff: f64,
    pub revenue_diff: i64,
    pub deals_diff: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentProfile {
    pub id: AgentId,
    pub name: String,
    pub email: String,
}

impl From<&Agent> for AgentProfile {
    fn from(agent: &Agent) -> Self {
        Self {
            id: agent.id.clone(),
            name: agent.display_name(),
            email: agent.display_email(),
        }
    }
}

/// Full profile for a single agent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentDetail {
    pub agent: AgentProfile,
    pub current_period: AgentPerformance,
    pub previous_period: AgentPerformance,
    pub funnel_breakdown: Vec<FunnelStage>,
    pub activity_breakdown: Vec<ActivityBreakdownEntry>,
    pub best_sources: Vec<SourcePerformance>,
    pub closed_deals: Vec<ClosedDeal>,
    pub comparison_with_team: TeamComparison,
}
