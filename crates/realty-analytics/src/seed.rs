//! Deterministic sample team used by the demo command, the in-memory server
//! mode and the integration tests.
//!
//! Timestamps are offsets from the supplied `now`, so the data always lands in
//! the current reporting periods.

use chrono::{Duration, NaiveDateTime};

use crate::domain::{
    Activity, ActivityType, Agent, AgentId, Appointment, AppointmentStatus, Commission,
    CommissionId, CommissionStatus, Lead, LeadId, LeadSource, LeadStatus, Property, PropertyId,
    StageTransition, UserRole,
};
use crate::store::{CrmStore, StoreError};

const AGENTS: &[(&str, &str, &str)] = &[
    ("agent-andi", "Andi Pratama", "andi@example.com"),
    ("agent-budi", "Budi Santoso", "budi@example.com"),
    ("agent-citra", "Citra Lestari", "citra@example.com"),
    ("agent-dewi", "Dewi Anggraini", "dewi@example.com"),
];

const PROPERTIES: &[(&str, &str)] = &[
    ("prop-kemang", "Villa Kemang 3BR"),
    ("prop-bsd", "Rumah BSD City Cluster Anggrek"),
    ("prop-menteng", "Apartemen Menteng Park 2BR"),
    ("prop-serpong", "Ruko Gading Serpong"),
];

/// id, agent, status, source, hours since creation, hours since last update.
type LeadRow = (&'static str, &'static str, LeadStatus, LeadSource, i64, i64);

const LEADS: &[LeadRow] = &[
    ("lead-001", "agent-andi", LeadStatus::Closed, LeadSource::Referral, 48, 5),
    ("lead-002", "agent-andi", LeadStatus::Closed, LeadSource::Website, 43, 7),
    ("lead-003", "agent-andi", LeadStatus::Negotiation, LeadSource::Rumah123, 38, 10),
    ("lead-004", "agent-andi", LeadStatus::Viewing, LeadSource::Website, 29, 14),
    ("lead-005", "agent-andi", LeadStatus::New, LeadSource::SocialMedia, 12, 12),
    ("lead-006", "agent-budi", LeadStatus::Closed, LeadSource::Lamudi, 53, 2),
    ("lead-007", "agent-budi", LeadStatus::Contacted, LeadSource::Lamudi, 34, 24),
    ("lead-008", "agent-budi", LeadStatus::Lost, LeadSource::Olx, 31, 19),
    ("lead-009", "agent-budi", LeadStatus::New, LeadSource::WaBlast, 7, 7),
    ("lead-010", "agent-citra", LeadStatus::Closed, LeadSource::OpenHouse, 50, 10),
    ("lead-011", "agent-citra", LeadStatus::Negotiation, LeadSource::Referral, 36, 5),
    ("lead-012", "agent-citra", LeadStatus::Viewing, LeadSource::WalkIn, 22, 10),
    ("lead-013", "agent-dewi", LeadStatus::Contacted, LeadSource::Website, 14, 5),
    ("lead-014", "agent-dewi", LeadStatus::New, LeadSource::Other, 5, 5),
];

/// lead, property, deal value, rate, status.
const COMMISSIONS: &[(&str, &str, i64, f64, CommissionStatus)] = &[
    ("lead-001", "prop-kemang", 4_500_000_000, 0.025, CommissionStatus::Paid),
    ("lead-002", "prop-menteng", 2_100_000_000, 0.025, CommissionStatus::Approved),
    ("lead-006", "prop-bsd", 1_650_000_000, 0.03, CommissionStatus::Approved),
    ("lead-010", "prop-serpong", 3_200_000_000, 0.02, CommissionStatus::Pending),
];

/// Loads the sample team into `store`.
pub fn seed_demo<S>(store: &S, now: NaiveDateTime) -> Result<(), StoreError>
where
    S: CrmStore + ?Sized,
{
    for (id, name, email) in AGENTS {
        store.insert_agent(Agent {
            id: AgentId(id.to_string()),
            name: Some(name.to_string()),
            email: Some(email.to_string()),
            role: UserRole::Agent,
        })?;
    }
    store.insert_agent(Agent {
        id: AgentId("admin-1".to_string()),
        name: Some("Office Admin".to_string()),
        email: Some("admin@example.com".to_string()),
        role: UserRole::Admin,
    })?;

    for (id, title) in PROPERTIES {
        store.insert_property(Property {
            id: PropertyId(id.to_string()),
            title: title.to_string(),
        })?;
    }

    for &(id, agent, status, source, created_hours, updated_hours) in LEADS {
        let created_at = now - Duration::hours(created_hours);
        let updated_at = now - Duration::hours(updated_hours);
        let lead = Lead {
            id: LeadId(id.to_string()),
            name: format!("Prospect {}", &id[5..]),
            status,
            source,
            assigned_to: Some(AgentId(agent.to_string())),
            budget_min: Some(800_000_000),
            budget_max: Some(5_000_000_000),
            created_at,
            updated_at,
        };
        // lead-006 closes without recorded history
        let history = if status == LeadStatus::Closed && id != "lead-006" {
            walk_pipeline(&lead, AgentId(agent.to_string()))
        } else {
            Vec::new()
        };
        store.insert_lead(lead)?;
        for transition in history {
            store.insert_transition(transition)?;
        }
    }

    for (index, &(lead, property, deal_value, rate, status)) in COMMISSIONS.iter().enumerate() {
        let agent = LEADS
            .iter()
            .find(|row| row.0 == lead)
            .map(|row| row.1)
            .unwrap_or("agent-andi");
        let closed_date = now - Duration::hours(2 + index as i64);
        let commission_amount = (deal_value as f64 * rate).round() as i64;
        store.insert_commission(Commission {
            id: CommissionId(format!("com-demo-{:02}", index + 1)),
            agent_id: AgentId(agent.to_string()),
            property_id: PropertyId(property.to_string()),
            lead_id: Some(LeadId(lead.to_string())),
            deal_value,
            commission_rate: rate,
            commission_amount,
            split_percentage: None,
            split_amount: None,
            status,
            closed_date,
            paid_date: (status == CommissionStatus::Paid).then_some(closed_date),
            paid_amount: (status == CommissionStatus::Paid).then_some(commission_amount),
        })?;
    }

    let activity_kinds = [
        ActivityType::Call,
        ActivityType::Email,
        ActivityType::Call,
        ActivityType::Meeting,
        ActivityType::Note,
    ];
    for (index, &(lead, agent, ..)) in LEADS.iter().enumerate() {
        for offset in 0..(index % 3 + 1) {
            let kind = activity_kinds[(index + offset) % activity_kinds.len()];
            store.insert_activity(Activity {
                id: format!("act-demo-{index:02}-{offset}"),
                kind,
                lead_id: LeadId(lead.to_string()),
                created_by: AgentId(agent.to_string()),
                description: format!("{} with prospect", kind.label()),
                created_at: now - Duration::hours(3 + (index + offset) as i64),
            })?;
        }
    }

    for (index, &(lead, agent, status, ..)) in LEADS.iter().enumerate() {
        if !matches!(status, LeadStatus::Viewing | LeadStatus::Negotiation) {
            continue;
        }
        let start_time = now - Duration::hours(5 + index as i64);
        store.insert_appointment(Appointment {
            id: format!("appt-demo-{index:02}"),
            lead_id: Some(LeadId(lead.to_string())),
            property_id: Some(PropertyId(PROPERTIES[index % PROPERTIES.len()].0.to_string())),
            created_by: AgentId(agent.to_string()),
            start_time,
            end_time: start_time + Duration::hours(1),
            status: AppointmentStatus::Completed,
        })?;
    }

    Ok(())
}

/// Forward history through every open stage, spread over the lead's lifetime.
fn walk_pipeline(lead: &Lead, actor: AgentId) -> Vec<StageTransition> {
    let span = lead.updated_at - lead.created_at;
    let step = span / 4;
    let stages = LeadStatus::open_stages();
    let mut transitions = Vec::with_capacity(stages.len());
    for (index, from) in stages.iter().enumerate() {
        let to = stages.get(index + 1).copied().unwrap_or(lead.status);
        let changed_at = if index + 1 == stages.len() {
            lead.updated_at
        } else {
            lead.created_at + step * (index as i32 + 1)
        };
        transitions.push(StageTransition {
            lead_id: lead.id.clone(),
            from: Some(*from),
            to,
            changed_at,
            changed_by: actor.clone(),
        });
    }
    transitions
}
