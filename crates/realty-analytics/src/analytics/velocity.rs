//! Time spent in each open pipeline stage by leads that closed.

use chrono::NaiveDateTime;

use crate::domain::{Agent, Lead, LeadStatus, StageTransition};

use super::views::PipelineVelocity;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Days per open stage, indexed like [`LeadStatus::open_stages`].
pub type StageDays = [f64; 4];

fn stage_slot(status: LeadStatus) -> Option<usize> {
    LeadStatus::open_stages()
        .iter()
        .position(|stage| *stage == status)
}

/// Per-stage days replayed from a recorded status history.
///
/// The lead starts in the first transition's `from` stage (NEW when unknown)
/// at `created_at`. Time after the last transition counts toward the final
/// stage up to `updated_at` if that stage is still open. Returns `None` when
/// no history exists.
pub fn measured_stage_days(lead: &Lead, transitions: &[StageTransition]) -> Option<StageDays> {
    let first = transitions.first()?;
    let mut days = [0.0; 4];
    let mut stage = first.from.unwrap_or(LeadStatus::New);
    let mut entered = lead.created_at;

    let mut accrue = |stage: LeadStatus, from: NaiveDateTime, to: NaiveDateTime| {
        if let Some(slot) = stage_slot(stage) {
            let seconds = (to - from).num_seconds().max(0);
            days[slot] += seconds as f64 / SECONDS_PER_DAY;
        }
    };

    for transition in transitions {
        accrue(stage, entered, transition.changed_at);
        stage = transition.to;
        entered = transition.changed_at.max(entered);
    }
    accrue(stage, entered, lead.updated_at);

    Some(days)
}

/// Whole days open split evenly across the four open stages.
pub fn estimated_stage_days(lead: &Lead) -> StageDays {
    [lead.days_open() as f64 / 4.0; 4]
}

/// A closed lead together with its recorded status history.
#[derive(Debug, Clone)]
pub struct ClosedLeadHistory {
    pub lead: Lead,
    pub transitions: Vec<StageTransition>,
}

pub fn agent_velocity(agent: &Agent, closed: &[ClosedLeadHistory]) -> PipelineVelocity {
    let mut totals = [0.0; 4];
    let mut measured_leads = 0;

    for history in closed {
        let days = match measured_stage_days(&history.lead, &history.transitions) {
            Some(days) => {
                measured_leads += 1;
                days
            }
            None => estimated_stage_days(&history.lead),
        };
        for (total, stage_days) in totals.iter_mut().zip(days) {
            *total += stage_days;
        }
    }

    let count = closed.len();
    let average = |sum: f64| {
        if count == 0 {
            0
        } else {
            (sum / count as f64).round() as i64
        }
    };

    PipelineVelocity {
        agent_id: agent.id.clone(),
        agent_name: agent.display_name(),
        avg_days_in_new: average(totals[0]),
        avg_days_in_contacted: average(totals[1]),
        avg_days_in_viewing: average(totals[2]),
        avg_days_in_negotiation: average(totals[3]),
        total_avg_days: average(totals.iter().sum()),
        measured_leads,
        estimated_leads: count - measured_leads,
    }
}

/// Orders agents fastest first; ties keep the incoming order.
pub fn sort_by_total(velocity: &mut [PipelineVelocity]) {
    velocity.sort_by_key(|entry| entry.total_avg_days);
}
