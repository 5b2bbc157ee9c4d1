//! Data-access layer consumed by the analytics service.
//!
//! [`CrmStore`] is the seam between aggregation logic and persistence. The
//! in-memory implementation backs tests and demos; the SQLite implementation
//! is used when the service is pointed at a database file.

mod memory;
mod query;
mod sqlite;

pub use memory::InMemoryCrmStore;
pub use query::{ActivityQuery, AppointmentQuery, CommissionQuery, DateRange, LeadQuery};
pub use sqlite::SqliteCrmStore;

use chrono::NaiveDateTime;

use crate::domain::{
    Activity, Agent, AgentId, Appointment, Commission, CommissionId, Lead, LeadId, LeadStatus,
    Property, PropertyId, StageTransition,
};

/// Storage abstraction so the analytics service can be exercised in isolation.
pub trait CrmStore: Send + Sync {
    /// Users with the agent role, ordered by name.
    fn agents(&self) -> Result<Vec<Agent>, StoreError>;
    fn agent(&self, id: &AgentId) -> Result<Option<Agent>, StoreError>;

    fn leads(&self, query: &LeadQuery) -> Result<Vec<Lead>, StoreError>;
    fn lead(&self, id: &LeadId) -> Result<Option<Lead>, StoreError>;
    fn count_leads(&self, query: &LeadQuery) -> Result<usize, StoreError> {
        self.leads(query).map(|leads| leads.len())
    }

    /// Matching commissions, newest closed date first.
    fn commissions(&self, query: &CommissionQuery) -> Result<Vec<Commission>, StoreError>;
    fn commission(&self, id: &CommissionId) -> Result<Option<Commission>, StoreError>;

    fn activities(&self, query: &ActivityQuery) -> Result<Vec<Activity>, StoreError>;
    fn count_activities(&self, query: &ActivityQuery) -> Result<usize, StoreError> {
        self.activities(query).map(|activities| activities.len())
    }

    fn count_appointments(&self, query: &AppointmentQuery) -> Result<usize, StoreError>;

    fn property(&self, id: &PropertyId) -> Result<Option<Property>, StoreError>;

    /// Status history of a lead, oldest first.
    fn stage_transitions(&self, lead: &LeadId) -> Result<Vec<StageTransition>, StoreError>;

    fn insert_agent(&self, agent: Agent) -> Result<(), StoreError>;
    fn insert_property(&self, property: Property) -> Result<(), StoreError>;
    fn insert_lead(&self, lead: Lead) -> Result<(), StoreError>;
    fn insert_activity(&self, activity: Activity) -> Result<(), StoreError>;
    fn insert_appointment(&self, appointment: Appointment) -> Result<(), StoreError>;
    fn insert_transition(&self, transition: StageTransition) -> Result<(), StoreError>;
    fn insert_commission(&self, commission: Commission) -> Result<Commission, StoreError>;
    fn update_commission(&self, commission: &Commission) -> Result<(), StoreError>;

    /// Sets the lead status and appends the matching transition and
    /// status-change activity as one unit.
    fn apply_status_change(&self, change: &LeadStatusChange) -> Result<Lead, StoreError>;
}

/// A pipeline move requested by an agent.
#[derive(Debug, Clone, PartialEq)]
pub struct LeadStatusChange {
    pub lead_id: LeadId,
    pub to: LeadStatus,
    pub actor: AgentId,
    pub at: NaiveDateTime,
}

impl LeadStatusChange {
    pub fn activity_description(&self) -> String {
        format!("Status changed to {}", self.to.as_str())
    }
}

/// Error enumeration for store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("stored data is invalid: {0}")]
    Corrupt(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Self::NotFound,
            rusqlite::Error::FromSqlConversionFailure(_, _, err) => Self::Corrupt(err.to_string()),
            rusqlite::Error::SqliteFailure(code, _)
                if code.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Self::Conflict
            }
            other => Self::Unavailable(other.to_string()),
        }
    }
}
