use crate::domain::{Agent, Commission, Lead, LeadStatus};
use crate::store::{
    ActivityQuery, AppointmentQuery, CommissionQuery, CrmStore, DateRange, LeadQuery, StoreError,
};

use super::views::AgentPerformance;

/// Raw records gathered for one agent and one period.
#[derive(Debug, Clone)]
pub struct AgentFacts {
    pub agent: Agent,
    /// Leads assigned to the agent and created in the range.
    pub leads: Vec<Lead>,
    /// Leads assigned to the agent that are closed with `updated_at` in the range.
    pub closed_leads: Vec<Lead>,
    /// Approved or paid commissions closed in the range.
    pub commissions: Vec<Commission>,
    pub activities_count: usize,
    pub appointments_count: usize,
}

impl AgentFacts {
    pub fn collect<S>(store: &S, agent: Agent, range: DateRange) -> Result<Self, StoreError>
    where
        S: CrmStore + ?Sized,
    {
        let leads = store.leads(
            &LeadQuery::default()
                .assigned_to(&agent.id)
                .created_within(range),
        )?;
        let closed_leads = store.leads(
            &LeadQuery::default()
                .assigned_to(&agent.id)
                .status(LeadStatus::Closed)
                .updated_within(range),
        )?;
        let commissions = store.commissions(
            &CommissionQuery::default()
                .agent(&agent.id)
                .earned()
                .closed_within(range),
        )?;
        let activities_count = store.count_activities(
            &ActivityQuery::default()
                .created_by(&agent.id)
                .created_within(range),
        )?;
        let appointments_count = store.count_appointments(
            &AppointmentQuery::default()
                .created_by(&agent.id)
                .starting_within(range),
        )?;

        Ok(Self {
            agent,
            leads,
            closed_leads,
            commissions,
            activities_count,
            appointments_count,
        })
    }

    pub fn aggregate(&self) -> AgentPerformance {
        let count = |status: LeadStatus| {
            self.leads
                .iter()
                .filter(|lead| lead.status == status)
                .count()
        };
        let total_leads = self.leads.len();
        let closed_deals = self.closed_leads.len();

        AgentPerformance {
            agent_id: self.agent.id.clone(),
            agent_name: self.agent.display_name(),
            agent_email: self.agent.display_email(),
            total_leads,
            new_leads: count(LeadStatus::New),
            contacted_leads: count(LeadStatus::Contacted),
            viewing_leads: count(LeadStatus::Viewing),
            negotiation_leads: count(LeadStatus::Negotiation),
            closed_deals,
            lost_deals: count(LeadStatus::Lost),
            conversion_rate: conversion_rate(closed_deals, total_leads),
            total_revenue: self.commissions.iter().map(|c| c.deal_value).sum(),
            total_commission: self
                .commissions
                .iter()
                .map(|c| c.commission_amount)
                .sum(),
            avg_days_to_close: average_days_to_close(&self.closed_leads),
            activities_count: self.activities_count,
            appointments_count: self.appointments_count,
        }
    }
}

/// `closed / total` as a percentage with one decimal; zero for an empty base.
pub fn conversion_rate(closed: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round_tenths(closed as f64 / total as f64 * 100.0)
}

/// `closed / total` as a whole percentage; zero for an empty base.
pub fn whole_percent(closed: usize, total: usize) -> i64 {
    if total == 0 {
        return 0;
    }
    (closed as f64 / total as f64 * 100.0).round() as i64
}

/// Mean of each lead's floored day span, rounded to the nearest day.
pub fn average_days_to_close(closed: &[Lead]) -> i64 {
    if closed.is_empty() {
        return 0;
    }
    let total: i64 = closed.iter().map(Lead::days_open).sum();
    (total as f64 / closed.len() as f64).round() as i64
}

pub(crate) fn round_tenths(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
