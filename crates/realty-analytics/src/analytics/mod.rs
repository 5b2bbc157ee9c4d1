//! Team and agent performance analytics.
//!
//! A request resolves a [`Period`] into a [`DateRange`](crate::store::DateRange),
//! gathers [`AgentFacts`] per agent from the store, and reduces them into the
//! serializable records in [`views`].

pub mod breakdown;
pub mod detail;
pub mod export;
pub mod leaderboard;
pub mod performance;
pub mod period;
pub mod router;
pub mod service;
pub mod team;
pub mod trends;
pub mod velocity;
pub mod views;

#[cfg(test)]
mod tests;

pub use export::write_csv;
pub use leaderboard::{rank_agents, LeaderboardMetric};
pub use performance::AgentFacts;
pub use period::{default_epoch, Period, PeriodRequest, PeriodResolver, MAX_YEAR, MIN_YEAR};
pub use router::{analytics_router, parse_date, PeriodQuery};
pub use service::{AnalyticsError, AnalyticsService};
pub use views::{
    ActivityBreakdownEntry, AgentDetail, AgentPerformance, AgentProfile, ClosedDeal,
    DealTrendPoint, FunnelStage, LeaderboardEntry, PipelineVelocity, SourcePerformance,
    TeamComparison, TeamOverview, TeamSourcePerformance,
};

pub(crate) use period::{end_of_day, start_of_day};
pub(crate) use router::error_response;
pub(crate) use service::run_blocking;
