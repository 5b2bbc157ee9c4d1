use chrono::{Duration, NaiveDateTime};
use serde::Serialize;

use crate::domain::{
    Activity, ActivityType, AgentId, Appointment, Commission, CommissionStatus, Lead, LeadId,
    LeadStatus,
};

/// Inclusive `[start, end]` timestamp window used by every range predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl DateRange {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, at: NaiveDateTime) -> bool {
        self.start <= at && at <= self.end
    }

    pub fn length(&self) -> Duration {
        self.end - self.start
    }

    /// Window of equal length that ends one day before this one starts;
    /// `None` when that window falls before the earliest representable date.
    pub fn previous(&self) -> Option<Self> {
        let end = self.start.checked_sub_signed(Duration::days(1))?;
        let start = end.checked_sub_signed(self.length())?;
        Some(Self { start, end })
    }
}

/// Filter over leads; `None` fields do not constrain the result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeadQuery {
    pub assigned_to: Option<AgentId>,
    pub statuses: Option<Vec<LeadStatus>>,
    pub created: Option<DateRange>,
    pub updated: Option<DateRange>,
}

impl LeadQuery {
    pub fn assigned_to(mut self, agent: &AgentId) -> Self {
        self.assigned_to = Some(agent.clone());
        self
    }

    pub fn status(self, status: LeadStatus) -> Self {
        self.statuses(&[status])
    }

    pub fn statuses(mut self, statuses: &[LeadStatus]) -> Self {
        self.statuses = Some(statuses.to_vec());
        self
    }

    pub fn created_within(mut self, range: DateRange) -> Self {
        self.created = Some(range);
        self
    }

    pub fn updated_within(mut self, range: DateRange) -> Self {
        self.updated = Some(range);
        self
    }

    pub fn matches(&self, lead: &Lead) -> bool {
        if let Some(agent) = &self.assigned_to {
            if lead.assigned_to.as_ref() != Some(agent) {
                return false;
            }
        }
        if let Some(statuses) = &self.statuses {
            if !statuses.contains(&lead.status) {
                return false;
            }
        }
        if let Some(range) = &self.created {
            if !range.contains(lead.created_at) {
                return false;
            }
        }
        if let Some(range) = &self.updated {
            if !range.contains(lead.updated_at) {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommissionQuery {
    pub agent_id: Option<AgentId>,
    pub lead_id: Option<LeadId>,
    pub statuses: Option<Vec<CommissionStatus>>,
    pub closed: Option<DateRange>,
}

impl CommissionQuery {
    pub fn agent(mut self, agent: &AgentId) -> Self {
        self.agent_id = Some(agent.clone());
        self
    }

    pub fn lead(mut self, lead: &LeadId) -> Self {
        self.lead_id = Some(lead.clone());
        self
    }

    pub fn statuses(mut self, statuses: &[CommissionStatus]) -> Self {
        self.statuses = Some(statuses.to_vec());
        self
    }

    /// Restricts to approved and paid commissions.
    pub fn earned(self) -> Self {
        self.statuses(&[CommissionStatus::Approved, CommissionStatus::Paid])
    }

    pub fn closed_within(mut self, range: DateRange) -> Self {
        self.closed = Some(range);
        self
    }

    pub fn matches(&self, commission: &Commission) -> bool {
        if let Some(agent) = &self.agent_id {
            if &commission.agent_id != agent {
                return false;
            }
        }
        if let Some(lead) = &self.lead_id {
            if commission.lead_id.as_ref() != Some(lead) {
                return false;
            }
        }
        if let Some(statuses) = &self.statuses {
            if !statuses.contains(&commission.status) {
                return false;
            }
        }
        if let Some(range) = &self.closed {
            if !range.contains(commission.closed_date) {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivityQuery {
    pub created_by: Option<AgentId>,
    pub lead_id: Option<LeadId>,
    pub kind: Option<ActivityType>,
    pub created: Option<DateRange>,
}

impl ActivityQuery {
    pub fn created_by(mut self, agent: &AgentId) -> Self {
        self.created_by = Some(agent.clone());
        self
    }

    pub fn lead(mut self, lead: &LeadId) -> Self {
        self.lead_id = Some(lead.clone());
        self
    }

    pub fn kind(mut self, kind: ActivityType) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn created_within(mut self, range: DateRange) -> Self {
        self.created = Some(range);
        self
    }

    pub fn matches(&self, activity: &Activity) -> bool {
        if let Some(agent) = &self.created_by {
            if &activity.created_by != agent {
                return false;
            }
        }
        if let Some(lead) = &self.lead_id {
            if &activity.lead_id != lead {
                return false;
            }
        }
        if let Some(kind) = self.kind {
            if activity.kind != kind {
                return false;
            }
        }
        if let Some(range) = &self.created {
            if !range.contains(activity.created_at) {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppointmentQuery {
    pub created_by: Option<AgentId>,
    pub starting: Option<DateRange>,
}

impl AppointmentQuery {
    pub fn created_by(mut self, agent: &AgentId) -> Self {
        self.created_by = Some(agent.clone());
        self
    }

    pub fn starting_within(mut self, range: DateRange) -> Self {
        self.starting = Some(range);
        self
    }

    pub fn matches(&self, appointment: &Appointment) -> bool {
        if let Some(agent) = &self.created_by {
            if &appointment.created_by != agent {
                return false;
            }
        }
        if let Some(range) = &self.starting {
            if !range.contains(appointment.start_time) {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, day)
            .expect("valid date")
            .and_hms_opt(0, 0, 0)
            .expect("valid time")
    }

    #[test]
    fn range_bounds_are_inclusive() {
        let range = DateRange::new(at(1), at(10));
        assert!(range.contains(at(1)));
        assert!(range.contains(at(10)));
        assert!(!range.contains(at(11)));
    }

    #[test]
    fn previous_range_ends_a_day_before_start() {
        let range = DateRange::new(at(11), at(20));
        let previous = range.previous().expect("previous window exists");
        assert_eq!(previous.end, at(10));
        assert_eq!(previous.start, at(1));
        assert_eq!(previous.length(), range.length());
    }

    #[test]
    fn previous_range_is_none_before_the_earliest_date() {
        let earliest = NaiveDate::MIN.and_hms_opt(0, 0, 0).expect("valid time");
        assert_eq!(DateRange::new(earliest, at(1)).previous(), None);
    }
}
