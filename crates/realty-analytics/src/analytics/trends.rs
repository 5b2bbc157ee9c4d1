use chrono::{Datelike, NaiveDate};

use crate::domain::{Agent, Lead};
use crate::store::DateRange;

use super::period::{end_of_day, first_of_month, last_of_month, next_month, start_of_day};
use super::views::DealTrendPoint;

/// First day of every calendar month the range touches.
pub fn months_in_range(range: DateRange) -> Vec<NaiveDate> {
    let last = first_of_month(range.end.date());
    let mut month = first_of_month(range.start.date());
    let mut months = Vec::new();
    while month <= last {
        months.push(month);
        match next_month(month) {
            Some(next) => month = next,
            None => break,
        }
    }
    months
}

/// Range widened to whole calendar months so every bucket is complete.
pub fn whole_month_range(range: DateRange) -> DateRange {
    let start = first_of_month(range.start.date());
    let end = last_of_month(range.end.date());
    DateRange::new(start_of_day(start), end_of_day(end))
}

/// Closed-deal counts per agent per month, agent-major, months ascending.
///
/// `closed` pairs each agent with the leads they closed inside
/// [`whole_month_range`].
pub fn deal_trends(months: &[NaiveDate], closed: &[(Agent, Vec<Lead>)]) -> Vec<DealTrendPoint> {
    closed
        .iter()
        .flat_map(|(agent, leads)| {
            months.iter().map(move |month| DealTrendPoint {
                month: month.format("%b %Y").to_string(),
                agent_id: agent.id.clone(),
                agent_name: agent.display_name(),
                deals: leads
                    .iter()
                    .filter(|lead| {
                        let closed_on = lead.updated_at.date();
                        closed_on.year() == month.year() && closed_on.month() == month.month()
                    })
                    .count(),
            })
        })
        .collect()
}
