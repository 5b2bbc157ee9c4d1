//! Kanban view of open leads and the status move that feeds stage history.

pub mod router;

use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::analytics::{run_blocking, AnalyticsError};
use crate::domain::{AgentId, Lead, LeadId, LeadStatus};
use crate::store::{CrmStore, LeadQuery, LeadStatusChange, StoreError};

pub use router::pipeline_router;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineColumn {
    pub status: LeadStatus,
    pub label: &'static str,
    pub leads: Vec<Lead>,
}

/// Body of a status move request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StatusMove {
    pub status: LeadStatus,
    /// Agent performing the move.
    pub actor: AgentId,
}

/// Groups open leads into one column per open stage, newest activity first.
pub fn board(leads: Vec<Lead>) -> Vec<PipelineColumn> {
    let mut columns: Vec<PipelineColumn> = LeadStatus::open_stages()
        .into_iter()
        .map(|status| PipelineColumn {
            status,
            label: status.label(),
            leads: Vec::new(),
        })
        .collect();
    for lead in leads {
        if let Some(column) = columns.iter_mut().find(|column| column.status == lead.status) {
            column.leads.push(lead);
        }
    }
    for column in &mut columns {
        column.leads.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    }
    columns
}

pub struct PipelineService<S> {
    store: Arc<S>,
}

impl<S> PipelineService<S>
where
    S: CrmStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Open leads by stage, optionally narrowed to one agent.
    pub async fn board(
        &self,
        assigned_to: Option<AgentId>,
    ) -> Result<Vec<PipelineColumn>, AnalyticsError> {
        let mut query = LeadQuery::default().statuses(&LeadStatus::open_stages());
        if let Some(agent) = &assigned_to {
            query = query.assigned_to(agent);
        }
        let leads = run_blocking(&self.store, move |store| Ok(store.leads(&query)?)).await?;
        Ok(board(leads))
    }

    /// Moves a lead to any status on behalf of a known user. The store appends
    /// the stage transition and the status-change activity alongside the update.
    pub async fn move_lead(
        &self,
        lead_id: &LeadId,
        request: StatusMove,
        at: NaiveDateTime,
    ) -> Result<Lead, AnalyticsError> {
        let change = LeadStatusChange {
            lead_id: lead_id.clone(),
            to: request.status,
            actor: request.actor,
            at,
        };
        let (lead, change) = run_blocking(&self.store, move |store| {
            if store.agent(&change.actor)?.is_none() {
                return Err(AnalyticsError::AgentNotFound(change.actor));
            }
            let lead = store
                .apply_status_change(&change)
                .map_err(|err| match err {
                    StoreError::NotFound => AnalyticsError::LeadNotFound(change.lead_id.clone()),
                    other => AnalyticsError::Store(other),
                })?;
            Ok((lead, change))
        })
        .await?;
        info!(lead = %lead.id, status = lead.status.as_str(), actor = %change.actor, "lead moved");
        Ok(lead)
    }
}
