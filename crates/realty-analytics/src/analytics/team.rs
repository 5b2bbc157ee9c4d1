use crate::domain::{Commission, Lead};

use super::performance::{average_days_to_close, conversion_rate, round_tenths};
use super::views::{AgentPerformance, TeamComparison, TeamOverview};

/// Inputs for [`team_overview`], all scoped to one period except
/// `active_deals`, which counts leads currently viewing or negotiating.
#[derive(Debug, Clone, Default)]
pub struct TeamFacts {
    pub total_leads: usize,
    pub closed_leads: Vec<Lead>,
    pub active_deals: usize,
    pub new_leads: usize,
    pub commissions: Vec<Commission>,
}

pub fn team_overview(facts: &TeamFacts) -> TeamOverview {
    let total_closed = facts.closed_leads.len();
    TeamOverview {
        total_leads: facts.total_leads,
        total_closed,
        team_conversion_rate: conversion_rate(total_closed, facts.total_leads),
        total_revenue: facts.commissions.iter().map(|c| c.deal_value).sum(),
        total_commission: facts
            .commissions
            .iter()
            .map(|c| c.commission_amount)
            .sum(),
        active_deals: facts.active_deals,
        avg_days_to_close: average_days_to_close(&facts.closed_leads),
        new_leads_this_period: facts.new_leads,
    }
}

/// How far `agent` sits from the team mean. Means are zero for an empty team.
pub fn compare_with_team(agent: &AgentPerformance, team: &[AgentPerformance]) -> TeamComparison {
    let size = team.len() as f64;
    let mean = |value: fn(&AgentPerformance) -> f64| {
        if team.is_empty() {
            0.0
        } else {
            team.iter().map(value).sum::<f64>() / size
        }
    };
    let avg_conversion = mean(|p| p.conversion_rate);
    let avg_commission = mean(|p| p.total_commission as f64);
    let avg_deals = mean(|p| p.closed_deals as f64);

    TeamComparison {
        conversion_rate_diff: round_tenths(agent.conversion_rate - avg_conversion),
        revenue_diff: (agent.total_commission as f64 - avg_commission).round() as i64,
        deals_diff: round_tenths(agent.closed_deals as f64 - avg_deals),
    }
}
