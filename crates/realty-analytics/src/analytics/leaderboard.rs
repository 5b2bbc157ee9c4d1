use serde::{Deserialize, Serialize};
use std::fmt;

use super::views::{AgentPerformance, LeaderboardEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaderboardMetric {
    Revenue,
    Deals,
    Conversion,
}

impl LeaderboardMetric {
    pub const fn ordered() -> [Self; 3] {
        [Self::Revenue, Self::Deals, Self::Conversion]
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Revenue => "revenue",
            Self::Deals => "deals",
            Self::Conversion => "conversion",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ordered()
            .into_iter()
            .find(|metric| metric.as_str().eq_ignore_ascii_case(raw.trim()))
    }

    fn value(self, performance: &AgentPerformance) -> f64 {
        match self {
            Self::Revenue => performance.total_commission as f64,
            Self::Deals => performance.closed_deals as f64,
            Self::Conversion => performance.conversion_rate,
        }
    }
}

impl Default for LeaderboardMetric {
    fn default() -> Self {
        Self::Revenue
    }
}

impl fmt::Display for LeaderboardMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ranks agents by `metric`, best first.
///
/// Ties keep the incoming order. For [`LeaderboardMetric::Conversion`] agents
/// with fewer than `min_leads` leads are left out.
pub fn rank_agents(
    performance: &[AgentPerformance],
    metric: LeaderboardMetric,
    min_leads: usize,
) -> Vec<LeaderboardEntry> {
    let mut eligible: Vec<(&AgentPerformance, f64)> = performance
        .iter()
        .filter(|agent| metric != LeaderboardMetric::Conversion || agent.total_leads >= min_leads)
        .map(|agent| (agent, metric.value(agent)))
        .collect();
    eligible.sort_by(|a, b| b.1.total_cmp(&a.1));

    eligible
        .into_iter()
        .enumerate()
        .map(|(index, (agent, value))| LeaderboardEntry {
            rank: index + 1,
            agent_id: agent.agent_id.clone(),
            agent_name: agent.agent_name.clone(),
            value,
            metric,
        })
        .collect()
}
