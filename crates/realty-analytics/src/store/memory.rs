use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::query::{ActivityQuery, AppointmentQuery, CommissionQuery, LeadQuery};
use super::{CrmStore, LeadStatusChange, StoreError};
use crate::domain::{
    Activity, ActivityType, Agent, AgentId, Appointment, Commission, CommissionId, Lead, LeadId,
    Property, PropertyId, StageTransition,
};

#[derive(Debug, Default)]
struct Tables {
    agents: HashMap<AgentId, Agent>,
    properties: HashMap<PropertyId, Property>,
    leads: Vec<Lead>,
    commissions: Vec<Commission>,
    activities: Vec<Activity>,
    appointments: Vec<Appointment>,
    transitions: Vec<StageTransition>,
}

/// Process-local store guarded by a single lock.
#[derive(Debug, Default)]
pub struct InMemoryCrmStore {
    tables: RwLock<Tables>,
    activity_sequence: AtomicU64,
}

impl InMemoryCrmStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, StoreError> {
        self.tables
            .read()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, StoreError> {
        self.tables
            .write()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".to_string()))
    }

    fn next_activity_id(&self) -> String {
        let id = self.activity_sequence.fetch_add(1, Ordering::Relaxed) + 1;
        format!("act-{id:06}")
    }
}

impl CrmStore for InMemoryCrmStore {
    fn agents(&self) -> Result<Vec<Agent>, StoreError> {
        let tables = self.read()?;
        let mut agents: Vec<Agent> = tables
            .agents
            .values()
            .filter(|agent| agent.is_agent())
            .cloned()
            .collect();
        agents.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(agents)
    }

    fn agent(&self, id: &AgentId) -> Result<Option<Agent>, StoreError> {
        Ok(self.read()?.agents.get(id).cloned())
    }

    fn leads(&self, query: &LeadQuery) -> Result<Vec<Lead>, StoreError> {
        Ok(self
            .read()?
            .leads
            .iter()
            .filter(|lead| query.matches(lead))
            .cloned()
            .collect())
    }

    fn lead(&self, id: &LeadId) -> Result<Option<Lead>, StoreError> {
        Ok(self.read()?.leads.iter().find(|lead| &lead.id == id).cloned())
    }

    fn count_leads(&self, query: &LeadQuery) -> Result<usize, StoreError> {
        Ok(self
            .read()?
            .leads
            .iter()
            .filter(|lead| query.matches(lead))
            .count())
    }

    fn commissions(&self, query: &CommissionQuery) -> Result<Vec<Commission>, StoreError> {
        let mut commissions: Vec<Commission> = self
            .read()?
            .commissions
            .iter()
            .filter(|commission| query.matches(commission))
            .cloned()
            .collect();
        commissions.sort_by(|a, b| b.closed_date.cmp(&a.closed_date));
        Ok(commissions)
    }

    fn commission(&self, id: &CommissionId) -> Result<Option<Commission>, StoreError> {
        Ok(self
            .read()?
            .commissions
            .iter()
            .find(|commission| &commission.id == id)
            .cloned())
    }

    fn activities(&self, query: &ActivityQuery) -> Result<Vec<Activity>, StoreError> {
        let mut activities: Vec<Activity> = self
            .read()?
            .activities
            .iter()
            .filter(|activity| query.matches(activity))
            .cloned()
            .collect();
        activities.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(activities)
    }

    fn count_activities(&self, query: &ActivityQuery) -> Result<usize, StoreError> {
        Ok(self
            .read()?
            .activities
            .iter()
            .filter(|activity| query.matches(activity))
            .count())
    }

    fn count_appointments(&self, query: &AppointmentQuery) -> Result<usize, StoreError> {
        Ok(self
            .read()?
            .appointments
            .iter()
            .filter(|appointment| query.matches(appointment))
            .count())
    }

    fn property(&self, id: &PropertyId) -> Result<Option<Property>, StoreError> {
        Ok(self.read()?.properties.get(id).cloned())
    }

    fn stage_transitions(&self, lead: &LeadId) -> Result<Vec<StageTransition>, StoreError> {
        let mut transitions: Vec<StageTransition> = self
            .read()?
            .transitions
            .iter()
            .filter(|transition| &transition.lead_id == lead)
            .cloned()
            .collect();
        transitions.sort_by(|a, b| a.changed_at.cmp(&b.changed_at));
        Ok(transitions)
    }

    fn insert_agent(&self, agent: Agent) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        if tables.agents.contains_key(&agent.id) {
            return Err(StoreError::Conflict);
        }
        tables.agents.insert(agent.id.clone(), agent);
        Ok(())
    }

    fn insert_property(&self, property: Property) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        if tables.properties.contains_key(&property.id) {
            return Err(StoreError::Conflict);
        }
        tables.properties.insert(property.id.clone(), property);
        Ok(())
    }

    fn insert_lead(&self, lead: Lead) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        if tables.leads.iter().any(|existing| existing.id == lead.id) {
            return Err(StoreError::Conflict);
        }
        tables.leads.push(lead);
        Ok(())
    }

    fn insert_activity(&self, activity: Activity) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        if tables.activities.iter().any(|existing| existing.id == activity.id) {
            return Err(StoreError::Conflict);
        }
        tables.activities.push(activity);
        Ok(())
    }

    fn insert_appointment(&self, appointment: Appointment) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        if tables
            .appointments
            .iter()
            .any(|existing| existing.id == appointment.id)
        {
            return Err(StoreError::Conflict);
        }
        tables.appointments.push(appointment);
        Ok(())
    }

    fn insert_transition(&self, transition: StageTransition) -> Result<(), StoreError> {
        self.write()?.transitions.push(transition);
        Ok(())
    }

    fn insert_commission(&self, commission: Commission) -> Result<Commission, StoreError> {
        let mut tables = self.write()?;
        if tables
            .commissions
            .iter()
            .any(|existing| existing.id == commission.id)
        {
            return Err(StoreError::Conflict);
        }
        tables.commissions.push(commission.clone());
        Ok(commission)
    }

    fn update_commission(&self, commission: &Commission) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        let slot = tables
            .commissions
            .iter_mut()
            .find(|existing| existing.id == commission.id)
            .ok_or(StoreError::NotFound)?;
        *slot = commission.clone();
        Ok(())
    }

    fn apply_status_change(&self, change: &LeadStatusChange) -> Result<Lead, StoreError> {
        let activity_id = self.next_activity_id();
        let mut tables = self.write()?;

        let lead = tables
            .leads
            .iter_mut()
            .find(|lead| lead.id == change.lead_id)
            .ok_or(StoreError::NotFound)?;
        let from = lead.status;
        lead.status = change.to;
        lead.updated_at = change.at;
        let updated = lead.clone();

        tables.transitions.push(StageTransition {
            lead_id: change.lead_id.clone(),
            from: Some(from),
            to: change.to,
            changed_at: change.at,
            changed_by: change.actor.clone(),
        });
        tables.activities.push(Activity {
            id: activity_id,
            kind: ActivityType::StatusChange,
            lead_id: change.lead_id.clone(),
            created_by: change.actor.clone(),
            description: change.activity_description(),
            created_at: change.at,
        });

        Ok(updated)
    }
}
