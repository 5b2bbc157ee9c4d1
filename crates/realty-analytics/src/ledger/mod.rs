//! Commission ledger: recording closed deals and moving commissions through
//! PENDING, APPROVED and PAID.

pub mod router;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::analytics::{run_blocking, AnalyticsError};
use crate::domain::{AgentId, Commission, CommissionId, CommissionStatus, LeadId, PropertyId};
use crate::store::{CommissionQuery, CrmStore, DateRange};

pub use router::commission_router;

static COMMISSION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_commission_id(at: NaiveDateTime) -> CommissionId {
    let sequence = COMMISSION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    CommissionId(format!("com-{}-{sequence:04}", at.format("%Y%m%d%H%M%S")))
}

/// A deal to record against an agent.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewCommission {
    pub agent_id: AgentId,
    pub property_id: PropertyId,
    #[serde(default)]
    pub lead_id: Option<LeadId>,
    pub deal_value: i64,
    /// Fraction of the deal value, e.g. `0.025`.
    pub commission_rate: f64,
    /// Share of the commission passed on, in percent.
    #[serde(default)]
    pub split_percentage: Option<f64>,
    #[serde(default)]
    pub closed_date: Option<NaiveDateTime>,
}

impl NewCommission {
    fn validate(&self) -> Result<(), AnalyticsError> {
        if self.deal_value < 0 {
            return Err(AnalyticsError::InvalidInput(
                "deal_value must not be negative".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.commission_rate) {
            return Err(AnalyticsError::InvalidInput(format!(
                "commission_rate {} must be a fraction between 0 and 1",
                self.commission_rate
            )));
        }
        if let Some(split) = self.split_percentage {
            if !(0.0..=100.0).contains(&split) {
                return Err(AnalyticsError::InvalidInput(format!(
                    "split_percentage {split} must be between 0 and 100"
                )));
            }
        }
        Ok(())
    }

    /// Builds the pending commission with computed amounts.
    pub fn into_commission(self, id: CommissionId, now: NaiveDateTime) -> Commission {
        let commission_amount = (self.deal_value as f64 * self.commission_rate).round() as i64;
        let split_amount = self
            .split_percentage
            .filter(|split| *split != 0.0)
            .map(|split| (commission_amount as f64 * split / 100.0).round() as i64);

        Commission {
            id,
            agent_id: self.agent_id,
            property_id: self.property_id,
            lead_id: self.lead_id,
            deal_value: self.deal_value,
            commission_rate: self.commission_rate,
            commission_amount,
            split_percentage: self.split_percentage,
            split_amount,
            status: CommissionStatus::Pending,
            closed_date: self.closed_date.unwrap_or(now),
            paid_date: None,
            paid_amount: None,
        }
    }
}

/// Status change for an existing commission.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CommissionStatusUpdate {
    pub status: CommissionStatus,
    #[serde(default)]
    pub paid_date: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommissionSummary {
    pub pending: i64,
    pub approved: i64,
    pub paid: i64,
    pub total: i64,
    /// Approved or paid commissions.
    pub closed_deals: usize,
}

impl CommissionSummary {
    pub fn from_commissions(commissions: &[Commission]) -> Self {
        let mut summary = Self::default();
        for commission in commissions {
            let amount = commission.commission_amount;
            match commission.status {
                CommissionStatus::Pending => summary.pending += amount,
                CommissionStatus::Approved => summary.approved += amount,
                CommissionStatus::Paid => summary.paid += amount,
            }
            summary.total += amount;
            if commission.status.is_earned() {
                summary.closed_deals += 1;
            }
        }
        summary
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyCommission {
    /// Calendar month, 1 through 12.
    pub month: u32,
    pub amount: i64,
}

/// Twelve buckets of earned commission for `year`, keyed by closed month.
pub fn monthly_commissions(commissions: &[Commission], year: i32) -> Vec<MonthlyCommission> {
    let mut buckets: Vec<MonthlyCommission> = (1..=12)
        .map(|month| MonthlyCommission { month, amount: 0 })
        .collect();
    for commission in commissions
        .iter()
        .filter(|c| c.status.is_earned() && c.closed_date.year() == year)
    {
        buckets[commission.closed_date.month0() as usize].amount += commission.commission_amount;
    }
    buckets
}

/// Service recording commissions and reporting on them.
///
/// Store calls run on the blocking pool, like the analytics service.
pub struct CommissionLedger<S> {
    store: Arc<S>,
}

impl<S> CommissionLedger<S>
where
    S: CrmStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Records a new pending commission with its amount computed from the deal.
    pub async fn record(
        &self,
        new: NewCommission,
        now: NaiveDateTime,
    ) -> Result<Commission, AnalyticsError> {
        new.validate()?;
        let stored = run_blocking(&self.store, move |store| {
            if store.agent(&new.agent_id)?.is_none() {
                return Err(AnalyticsError::AgentNotFound(new.agent_id));
            }
            if let Some(lead_id) = &new.lead_id {
                if store.lead(lead_id)?.is_none() {
                    return Err(AnalyticsError::LeadNotFound(lead_id.clone()));
                }
            }
            let commission = new.into_commission(next_commission_id(now), now);
            Ok(store.insert_commission(commission)?)
        })
        .await?;
        info!(
            commission = %stored.id,
            agent = %stored.agent_id,
            amount = stored.commission_amount,
            "commission recorded"
        );
        Ok(stored)
    }

    /// Sets the status. A paid date also records the full commission as paid.
    pub async fn update_status(
        &self,
        id: &CommissionId,
        update: CommissionStatusUpdate,
    ) -> Result<Commission, AnalyticsError> {
        let id = id.clone();
        let commission = run_blocking(&self.store, move |store| {
            let mut commission = store
                .commission(&id)?
                .ok_or(AnalyticsError::CommissionNotFound(id))?;
            commission.status = update.status;
            if let Some(paid_date) = update.paid_date {
                commission.paid_date = Some(paid_date);
                commission.paid_amount = Some(commission.commission_amount);
            }
            store.update_commission(&commission)?;
            Ok(commission)
        })
        .await?;
        info!(commission = %commission.id, status = commission.status.as_str(), "commission status updated");
        Ok(commission)
    }

    pub async fn list(&self, query: CommissionQuery) -> Result<Vec<Commission>, AnalyticsError> {
        run_blocking(&self.store, move |store| Ok(store.commissions(&query)?)).await
    }

    pub async fn summary(
        &self,
        agent: Option<AgentId>,
    ) -> Result<CommissionSummary, AnalyticsError> {
        let query = match agent {
            Some(agent) => CommissionQuery::default().agent(&agent),
            None => CommissionQuery::default(),
        };
        let commissions = self.list(query).await?;
        Ok(CommissionSummary::from_commissions(&commissions))
    }

    pub async fn monthly(&self, year: i32) -> Result<Vec<MonthlyCommission>, AnalyticsError> {
        let range = year_range(year)?;
        let commissions = self
            .list(CommissionQuery::default().earned().closed_within(range))
            .await?;
        Ok(monthly_commissions(&commissions, year))
    }
}

fn year_range(year: i32) -> Result<DateRange, AnalyticsError> {
    let invalid = || AnalyticsError::InvalidInput(format!("year {year} is out of range"));
    let start = NaiveDate::from_ymd_opt(year, 1, 1).ok_or_else(invalid)?;
    let end = NaiveDate::from_ymd_opt(year, 12, 31).ok_or_else(invalid)?;
    Ok(DateRange::new(
        crate::analytics::start_of_day(start),
        crate::analytics::end_of_day(end),
    ))
}
