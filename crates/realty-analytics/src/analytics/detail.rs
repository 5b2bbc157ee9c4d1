use crate::domain::{Commission, Lead};

use super::views::ClosedDeal;

const NO_PROPERTY: &str = "N/A";

/// A lead closed in the period with the commission recorded against it.
#[derive(Debug, Clone)]
pub struct ClosedDealFacts {
    pub lead: Lead,
    pub commission: Option<Commission>,
    pub property_title: Option<String>,
}

/// Closed deals newest first. Deals without a linked commission report "N/A"
/// and zero amounts.
pub fn closed_deals(facts: Vec<ClosedDealFacts>) -> Vec<ClosedDeal> {
    let mut deals: Vec<ClosedDeal> = facts
        .into_iter()
        .map(|fact| {
            let days_to_close = fact.lead.days_open();
            let (deal_value, commission_amount) = fact
                .commission
                .as_ref()
                .map(|c| (c.deal_value, c.commission_amount))
                .unwrap_or((0, 0));
            let property_title = match (&fact.commission, fact.property_title) {
                (Some(_), Some(title)) => title,
                _ => NO_PROPERTY.to_string(),
            };
            ClosedDeal {
                lead_id: fact.lead.id,
                lead_name: fact.lead.name,
                property_title,
                deal_value,
                commission_amount,
                closed_date: fact.lead.updated_at,
                days_to_close,
            }
        })
        .collect();
    deals.sort_by(|a, b| b.closed_date.cmp(&a.closed_date));
    deals
}
