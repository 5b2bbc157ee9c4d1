//! CRM entities consumed by the analytics and pipeline modules.
//!
//! Records are owned by a [`CrmStore`](crate::store::CrmStore); this module
//! only describes their shape and the enumerations shared across the crate.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier wrapper for CRM users (agents and admins).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(pub String);

/// Identifier wrapper for leads.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LeadId(pub String);

/// Identifier wrapper for commissions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CommissionId(pub String);

/// Identifier wrapper for property listings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PropertyId(pub String);

macro_rules! display_id {
    ($($ty:ty),+) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(&self.0)
                }
            }
        )+
    };
}

display_id!(AgentId, LeadId, CommissionId, PropertyId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Admin,
    Agent,
}

impl UserRole {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::Agent => "AGENT",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "ADMIN" => Some(Self::Admin),
            "AGENT" => Some(Self::Agent),
            _ => None,
        }
    }
}

/// A CRM user. Only users with [`UserRole::Agent`] appear in team reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: UserRole,
}

impl Agent {
    pub fn display_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| "Unknown".to_string())
    }

    pub fn display_email(&self) -> String {
        self.email.clone().unwrap_or_default()
    }

    pub fn is_agent(&self) -> bool {
        self.role == UserRole::Agent
    }
}

/// Pipeline position of a lead. Any status may be set to any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeadStatus {
    New,
    Contacted,
    Viewing,
    Negotiation,
    Closed,
    Lost,
}

impl LeadStatus {
    pub const fn ordered() -> [Self; 6] {
        [
            Self::New,
            Self::Contacted,
            Self::Viewing,
            Self::Negotiation,
            Self::Closed,
            Self::Lost,
        ]
    }

    /// Stages a lead passes through before it closes.
    pub const fn open_stages() -> [Self; 4] {
        [Self::New, Self::Contacted, Self::Viewing, Self::Negotiation]
    }

    pub const fn is_open(self) -> bool {
        matches!(
            self,
            Self::New | Self::Contacted | Self::Viewing | Self::Negotiation
        )
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::New => "New",
            Self::Contacted => "Contacted",
            Self::Viewing => "Viewing",
            Self::Negotiation => "Negotiation",
            Self::Closed => "Closed",
            Self::Lost => "Lost",
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::New => "NEW",
            Self::Contacted => "CONTACTED",
            Self::Viewing => "VIEWING",
            Self::Negotiation => "NEGOTIATION",
            Self::Closed => "CLOSED",
            Self::Lost => "LOST",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ordered()
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(raw.trim()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeadSource {
    Website,
    Rumah123,
    Lamudi,
    Olx,
    Referral,
    OpenHouse,
    WalkIn,
    SocialMedia,
    WaBlast,
    Other,
}

impl LeadSource {
    pub const fn ordered() -> [Self; 10] {
        [
            Self::Website,
            Self::Rumah123,
            Self::Lamudi,
            Self::Olx,
            Self::Referral,
            Self::OpenHouse,
            Self::WalkIn,
            Self::SocialMedia,
            Self::WaBlast,
            Self::Other,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Website => "Website",
            Self::Rumah123 => "Rumah123",
            Self::Lamudi => "Lamudi",
            Self::Olx => "OLX",
            Self::Referral => "Referral",
            Self::OpenHouse => "Open House",
            Self::WalkIn => "Walk In",
            Self::SocialMedia => "Social Media",
            Self::WaBlast => "WhatsApp Blast",
            Self::Other => "Other",
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Website => "WEBSITE",
            Self::Rumah123 => "RUMAH123",
            Self::Lamudi => "LAMUDI",
            Self::Olx => "OLX",
            Self::Referral => "REFERRAL",
            Self::OpenHouse => "OPEN_HOUSE",
            Self::WalkIn => "WALK_IN",
            Self::SocialMedia => "SOCIAL_MEDIA",
            Self::WaBlast => "WA_BLAST",
            Self::Other => "OTHER",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ordered()
            .into_iter()
            .find(|source| source.as_str().eq_ignore_ascii_case(raw.trim()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub id: LeadId,
    pub name: String,
    pub status: LeadStatus,
    pub source: LeadSource,
    pub assigned_to: Option<AgentId>,
    pub budget_min: Option<i64>,
    pub budget_max: Option<i64>,
    pub created_at: NaiveDateTime,
    /// Doubles as the close timestamp once the lead is [`LeadStatus::Closed`].
    pub updated_at: NaiveDateTime,
}

impl Lead {
    /// Whole days between creation and the last update, floored.
    pub fn days_open(&self) -> i64 {
        (self.updated_at - self.created_at).num_days().max(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommissionStatus {
    Pending,
    Approved,
    Paid,
}

impl CommissionStatus {
    pub const fn ordered() -> [Self; 3] {
        [Self::Pending, Self::Approved, Self::Paid]
    }

    /// Approved and paid commissions count as earned.
    pub const fn is_earned(self) -> bool {
        matches!(self, Self::Approved | Self::Paid)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Approved => "Approved",
            Self::Paid => "Paid",
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Paid => "PAID",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ordered()
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(raw.trim()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commission {
    pub id: CommissionId,
    pub agent_id: AgentId,
    pub property_id: PropertyId,
    /// Buyer lead the deal closed with, when known.
    pub lead_id: Option<LeadId>,
    pub deal_value: i64,
    pub commission_rate: f64,
    pub commission_amount: i64,
    pub split_percentage: Option<f64>,
    pub split_amount: Option<i64>,
    pub status: CommissionStatus,
    pub closed_date: NaiveDateTime,
    pub paid_date: Option<NaiveDateTime>,
    pub paid_amount: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub id: PropertyId,
    pub title: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityType {
    Call,
    Email,
    Sms,
    Meeting,
    Note,
    StatusChange,
    ViewingScheduled,
    PropertyMatched,
    EmailSent,
    ReminderSent,
}

impl ActivityType {
    pub const fn ordered() -> [Self; 10] {
        [
            Self::Call,
            Self::Email,
            Self::Sms,
            Self::Meeting,
            Self::Note,
            Self::StatusChange,
            Self::ViewingScheduled,
            Self::PropertyMatched,
            Self::EmailSent,
            Self::ReminderSent,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Call => "Call",
            Self::Email => "Email",
            Self::Sms => "SMS",
            Self::Meeting => "Meeting",
            Self::Note => "Note",
            Self::StatusChange => "Status Change",
            Self::ViewingScheduled => "Viewing Scheduled",
            Self::PropertyMatched => "Property Matched",
            Self::EmailSent => "Email Sent",
            Self::ReminderSent => "Reminder Sent",
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Call => "CALL",
            Self::Email => "EMAIL",
            Self::Sms => "SMS",
            Self::Meeting => "MEETING",
            Self::Note => "NOTE",
            Self::StatusChange => "STATUS_CHANGE",
            Self::ViewingScheduled => "VIEWING_SCHEDULED",
            Self::PropertyMatched => "PROPERTY_MATCHED",
            Self::EmailSent => "EMAIL_SENT",
            Self::ReminderSent => "REMINDER_SENT",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ordered()
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(raw.trim()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: String,
    pub kind: ActivityType,
    pub lead_id: LeadId,
    pub created_by: AgentId,
    pub description: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentStatus {
    Scheduled,
    Confirmed,
    Completed,
    Cancelled,
    NoShow,
}

impl AppointmentStatus {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::Scheduled,
            Self::Confirmed,
            Self::Completed,
            Self::Cancelled,
            Self::NoShow,
        ]
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Scheduled => "SCHEDULED",
            Self::Confirmed => "CONFIRMED",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
            Self::NoShow => "NO_SHOW",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ordered()
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(raw.trim()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: String,
    pub lead_id: Option<LeadId>,
    pub property_id: Option<PropertyId>,
    pub created_by: AgentId,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub status: AppointmentStatus,
}

/// One entry of a lead's status history, appended on every pipeline move.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageTransition {
    pub lead_id: LeadId,
    pub from: Option<LeadStatus>,
    pub to: LeadStatus,
    pub changed_at: NaiveDateTime,
    pub changed_by: AgentId,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn status_round_trips_through_storage_names() {
        for status in LeadStatus::ordered() {
            assert_eq!(LeadStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(LeadStatus::parse(" closed "), Some(LeadStatus::Closed));
        assert_eq!(LeadStatus::parse("WON"), None);
    }

    #[test]
    fn days_open_floors_partial_days() {
        let created = NaiveDate::from_ymd_opt(2025, 3, 1)
            .expect("valid date")
            .and_hms_opt(9, 0, 0)
            .expect("valid time");
        let lead = Lead {
            id: LeadId("lead-1".to_string()),
            name: "Budi".to_string(),
            status: LeadStatus::Closed,
            source: LeadSource::Website,
            assigned_to: None,
            budget_min: None,
            budget_max: None,
            created_at: created,
            updated_at: created + chrono::Duration::hours(47),
        };
        assert_eq!(lead.days_open(), 1);
    }

    #[test]
    fn agent_display_fields_fall_back() {
        let agent = Agent {
            id: AgentId("a".to_string()),
            name: None,
            email: None,
            role: UserRole::Agent,
        };
        assert_eq!(agent.display_name(), "Unknown");
        assert_eq!(agent.display_email(), "");
    }
}
