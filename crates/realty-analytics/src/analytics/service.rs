use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::NaiveDateTime;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, info};

use super::breakdown::{activity_breakdown, funnel, source_breakdown, team_source_performance};
use super::detail::{closed_deals, ClosedDealFacts};
use super::leaderboard::{rank_agents, LeaderboardMetric};
use super::performance::AgentFacts;
use super::period::{PeriodRequest, PeriodResolver};
use super::team::{compare_with_team, team_overview, TeamFacts};
use super::trends::{deal_trends, months_in_range, whole_month_range};
use super::velocity::{agent_velocity, sort_by_total, ClosedLeadHistory};
use super::views::{
    AgentDetail, AgentPerformance, AgentProfile, DealTrendPoint, LeaderboardEntry,
    PipelineVelocity, TeamOverview, TeamSourcePerformance,
};
use crate::config::AnalyticsConfig;
use crate::domain::{Agent, AgentId, CommissionId, Lead, LeadId, LeadStatus};
use crate::store::{ActivityQuery, CommissionQuery, CrmStore, DateRange, LeadQuery, StoreError};

/// Read-side service computing team and agent analytics from a [`CrmStore`].
///
/// Store calls are synchronous, so per-agent work runs on the blocking pool
/// and is joined back in agent order.
pub struct AnalyticsService<S> {
    store: Arc<S>,
    resolver: PeriodResolver,
    config: AnalyticsConfig,
}

impl<S> AnalyticsService<S>
where
    S: CrmStore + 'static,
{
    pub fn new(store: Arc<S>, config: AnalyticsConfig) -> Self {
        Self {
            store,
            resolver: PeriodResolver::new(config.epoch),
            config,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    pub fn resolve(&self, request: &PeriodRequest, now: NaiveDateTime) -> DateRange {
        self.resolver.resolve(request, now)
    }

    /// Aggregates every agent over `range`, in name order.
    pub async fn agent_performance(
        &self,
        range: DateRange,
    ) -> Result<Vec<AgentPerformance>, AnalyticsError> {
        let started = Instant::now();
        let agents = self.blocking(|store| Ok(store.agents()?)).await?;
        let agent_count = agents.len();

        let performance = self
            .fan_out(agents, move |store, agent| {
                AgentFacts::collect(store, agent, range).map(|facts| facts.aggregate())
            })
            .await?;

        info!(
            agents = agent_count,
            start = %range.start,
            end = %range.end,
            "agent performance aggregated"
        );
        debug!(elapsed_ms = started.elapsed().as_millis() as u64, "agent performance timing");
        Ok(performance)
    }

    /// Aggregates one agent; admins and unknown ids are reported as not found.
    pub async fn agent_performance_for(
        &self,
        agent_id: &AgentId,
        range: DateRange,
    ) -> Result<AgentPerformance, AnalyticsError> {
        let agent = self.require_agent(agent_id).await?;
        self.blocking(move |store| Ok(AgentFacts::collect(store, agent, range)?.aggregate()))
            .await
    }

    pub async fn leaderboard(
        &self,
        metric: LeaderboardMetric,
        range: DateRange,
    ) -> Result<Vec<LeaderboardEntry>, AnalyticsError> {
        let performance = self.agent_performance(range).await?;
        let entries = rank_agents(&performance, metric, self.config.leaderboard_min_leads);
        info!(metric = %metric, ranked = entries.len(), "leaderboard ranked");
        Ok(entries)
    }

    pub async fn team_overview(&self, range: DateRange) -> Result<TeamOverview, AnalyticsError> {
        let facts = self
            .blocking(move |store| {
                Ok(TeamFacts {
                    total_leads: store.count_leads(&LeadQuery::default().created_within(range))?,
                    closed_leads: store.leads(
                        &LeadQuery::default()
                            .status(LeadStatus::Closed)
                            .updated_within(range),
                    )?,
                    active_deals: store.count_leads(
                        &LeadQuery::default()
                            .statuses(&[LeadStatus::Viewing, LeadStatus::Negotiation]),
                    )?,
                    new_leads: store.count_leads(
                        &LeadQuery::default()
                            .status(LeadStatus::New)
                            .created_within(range),
                    )?,
                    commissions: store.commissions(
                        &CommissionQuery::default().earned().closed_within(range),
                    )?,
                })
            })
            .await?;
        let overview = team_overview(&facts);
        info!(
            leads = overview.total_leads,
            closed = overview.total_closed,
            "team overview computed"
        );
        Ok(overview)
    }

    /// Full profile for one agent, including the previous period and the
    /// distance from the team mean over the same range.
    pub async fn agent_detail(
        &self,
        agent_id: &AgentId,
        range: DateRange,
    ) -> Result<AgentDetail, AnalyticsError> {
        let agent = self.require_agent(agent_id).await?;
        let previous = range.previous().ok_or_else(|| {
            AnalyticsError::InvalidInput(format!("no period precedes {}", range.start))
        })?;

        let subject = agent.clone();
        let (current, previous_facts, activities, deals) = self
            .blocking(move |store| {
                let current = AgentFacts::collect(store, subject.clone(), range)?;
                let previous_facts = AgentFacts::collect(store, subject.clone(), previous)?;
                let activities = store.activities(
                    &ActivityQuery::default()
                        .created_by(&subject.id)
                        .created_within(range),
                )?;
                let deals = current
                    .closed_leads
                    .iter()
                    .map(|lead| closed_deal_facts(store, lead.clone()))
                    .collect::<Result<Vec<_>, StoreError>>()?;
                Ok((current, previous_facts, activities, deals))
            })
            .await?;

        let team = self.agent_performance(range).await?;
        let current_period = current.aggregate();
        let comparison_with_team = compare_with_team(&current_period, &team);

        info!(agent = %agent.id, "agent detail assembled");
        Ok(AgentDetail {
            agent: AgentProfile::from(&agent),
            funnel_breakdown: funnel(&current.leads),
            activity_breakdown: activity_breakdown(&activities),
            best_sources: source_breakdown(&current.leads),
            closed_deals: closed_deals(deals),
            previous_period: previous_facts.aggregate(),
            current_period,
            comparison_with_team,
        })
    }

    /// Stage velocity per agent, fastest first.
    pub async fn pipeline_velocity(
        &self,
        range: DateRange,
    ) -> Result<Vec<PipelineVelocity>, AnalyticsError> {
        let agents = self.blocking(|store| Ok(store.agents()?)).await?;
        let mut velocity = self
            .fan_out(agents, move |store, agent| {
                let closed = store.leads(
                    &LeadQuery::default()
                        .assigned_to(&agent.id)
                        .status(LeadStatus::Closed)
                        .updated_within(range),
                )?;
                let histories = closed
                    .into_iter()
                    .map(|lead| -> Result<ClosedLeadHistory, StoreError> {
                        let transitions = store.stage_transitions(&lead.id)?;
                        Ok(ClosedLeadHistory { lead, transitions })
                    })
                    .collect::<Result<Vec<_>, StoreError>>()?;
                Ok(agent_velocity(&agent, &histories))
            })
            .await?;
        sort_by_total(&mut velocity);

        let estimated: usize = velocity.iter().map(|entry| entry.estimated_leads).sum();
        info!(agents = velocity.len(), estimated_leads = estimated, "pipeline velocity computed");
        Ok(velocity)
    }

    /// Monthly closed-deal counts for every agent over the months `range` touches.
    pub async fn deal_trends(
        &self,
        range: DateRange,
    ) -> Result<Vec<DealTrendPoint>, AnalyticsError> {
        let months = months_in_range(range);
        let window = whole_month_range(range);
        let agents = self.blocking(|store| Ok(store.agents()?)).await?;
        let closed = self
            .fan_out(agents, move |store, agent| {
                let leads = store.leads(
                    &LeadQuery::default()
                        .assigned_to(&agent.id)
                        .status(LeadStatus::Closed)
                        .updated_within(window),
                )?;
                Ok((agent, leads))
            })
            .await?;

        let points = deal_trends(&months, &closed);
        info!(months = months.len(), points = points.len(), "deal trends computed");
        Ok(points)
    }

    /// Source performance over every lead created in `range`, highest revenue first.
    pub async fn source_performance(
        &self,
        range: DateRange,
    ) -> Result<Vec<TeamSourcePerformance>, AnalyticsError> {
        let rows = self
            .blocking(move |store| {
                let leads = store.leads(&LeadQuery::default().created_within(range))?;
                let commissions =
                    store.commissions(&CommissionQuery::default().earned().closed_within(range))?;

                let mut sources: HashMap<LeadId, _> = leads
                    .iter()
                    .map(|lead| (lead.id.clone(), lead.source))
                    .collect();
                for lead_id in commissions.iter().filter_map(|c| c.lead_id.as_ref()) {
                    if !sources.contains_key(lead_id) {
                        if let Some(lead) = store.lead(lead_id)? {
                            sources.insert(lead.id, lead.source);
                        }
                    }
                }
                Ok(team_source_performance(&leads, &commissions, &sources))
            })
            .await?;
        info!(sources = rows.len(), "source performance computed");
        Ok(rows)
    }

    async fn require_agent(&self, agent_id: &AgentId) -> Result<Agent, AnalyticsError> {
        let id = agent_id.clone();
        self.blocking(move |store| {
            store
                .agent(&id)?
                .filter(Agent::is_agent)
                .ok_or(AnalyticsError::AgentNotFound(id))
        })
        .await
    }

    async fn blocking<T, F>(&self, work: F) -> Result<T, AnalyticsError>
    where
        T: Send + 'static,
        F: FnOnce(&S) -> Result<T, AnalyticsError> + Send + 'static,
    {
        run_blocking(&self.store, work).await
    }

    async fn fan_out<T, F>(&self, agents: Vec<Agent>, work: F) -> Result<Vec<T>, AnalyticsError>
    where
        T: Send + 'static,
        F: Fn(&S, Agent) -> Result<T, StoreError> + Send + Sync + 'static,
    {
        let work = Arc::new(work);
        let mut tasks = JoinSet::new();
        for (index, agent) in agents.into_iter().enumerate() {
            let store = Arc::clone(&self.store);
            let work = Arc::clone(&work);
            tasks.spawn_blocking(move || (index, (*work)(store.as_ref(), agent)));
        }

        let mut results = Vec::with_capacity(tasks.len());
        while let Some(joined) = tasks.join_next().await {
            let (index, outcome) = joined?;
            results.push((index, outcome?));
        }
        results.sort_by_key(|(index, _)| *index);
        Ok(results.into_iter().map(|(_, value)| value).collect())
    }
}

/// Runs synchronous store work on the blocking pool.
pub(crate) async fn run_blocking<S, T, F>(store: &Arc<S>, work: F) -> Result<T, AnalyticsError>
where
    S: CrmStore + 'static,
    T: Send + 'static,
    F: FnOnce(&S) -> Result<T, AnalyticsError> + Send + 'static,
{
    let store = Arc::clone(store);
    tokio::task::spawn_blocking(move || work(store.as_ref())).await?
}

fn closed_deal_facts<S>(store: &S, lead: Lead) -> Result<ClosedDealFacts, StoreError>
where
    S: CrmStore + ?Sized,
{
    let commission = store
        .commissions(&CommissionQuery::default().lead(&lead.id))?
        .into_iter()
        .next();
    let property_title = match &commission {
        Some(commission) => store
            .property(&commission.property_id)?
            .map(|property| property.title),
        None => None,
    };
    Ok(ClosedDealFacts {
        lead,
        commission,
        property_title,
    })
}

/// Error raised by the analytics, pipeline and commission services.
#[derive(Debug, thiserror::Error)]
pub enum AnalyticsError {
    #[error("agent {0} not found")]
    AgentNotFound(AgentId),
    #[error("lead {0} not found")]
    LeadNotFound(LeadId),
    #[error("commission {0} not found")]
    CommissionNotFound(CommissionId),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("analytics task failed: {0}")]
    Task(#[from] JoinError),
}
