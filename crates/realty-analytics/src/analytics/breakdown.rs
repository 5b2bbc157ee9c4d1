//! Distribution views over a period's leads and activities.

use std::collections::HashMap;

use crate::domain::{Activity, ActivityType, Commission, Lead, LeadId, LeadSource, LeadStatus};

use super::performance::whole_percent;
use super::views::{ActivityBreakdownEntry, FunnelStage, SourcePerformance, TeamSourcePerformance};

/// Stage counts in pipeline order with whole-number shares.
///
/// Shares use largest-remainder apportionment, so they sum to exactly 100
/// whenever `leads` is non-empty and are all zero otherwise.
pub fn funnel(leads: &[Lead]) -> Vec<FunnelStage> {
    let stages = LeadStatus::ordered();
    let counts: Vec<usize> = stages
        .iter()
        .map(|stage| leads.iter().filter(|lead| lead.status == *stage).count())
        .collect();
    let percentages = apportion(&counts);

    stages
        .into_iter()
        .zip(counts)
        .zip(percentages)
        .map(|((stage, count), percentage)| FunnelStage {
            stage,
            label: stage.label(),
            count,
            percentage,
        })
        .collect()
}

fn apportion(counts: &[usize]) -> Vec<u32> {
    let total: usize = counts.iter().sum();
    if total == 0 {
        return vec![0; counts.len()];
    }

    let mut shares: Vec<u32> = counts
        .iter()
        .map(|count| (count * 100 / total) as u32)
        .collect();
    let assigned: u32 = shares.iter().sum();

    let mut by_remainder: Vec<usize> = (0..counts.len()).collect();
    by_remainder.sort_by_key(|&index| std::cmp::Reverse(counts[index] * 100 % total));
    for &index in by_remainder.iter().take((100 - assigned) as usize) {
        shares[index] += 1;
    }
    shares
}

/// Activity counts per type, most frequent first.
pub fn activity_breakdown(activities: &[Activity]) -> Vec<ActivityBreakdownEntry> {
    let mut entries: Vec<ActivityBreakdownEntry> = ActivityType::ordered()
        .into_iter()
        .map(|kind| ActivityBreakdownEntry {
            kind,
            label: kind.label(),
            count: activities
                .iter()
                .filter(|activity| activity.kind == kind)
                .count(),
        })
        .filter(|entry| entry.count > 0)
        .collect();
    entries.sort_by(|a, b| b.count.cmp(&a.count));
    entries
}

struct SourceTally {
    source: LeadSource,
    leads: usize,
    closed: usize,
}

fn tally_sources(leads: &[Lead]) -> Vec<SourceTally> {
    LeadSource::ordered()
        .into_iter()
        .map(|source| {
            let from_source = leads.iter().filter(|lead| lead.source == source);
            SourceTally {
                source,
                leads: from_source.clone().count(),
                closed: from_source
                    .filter(|lead| lead.status == LeadStatus::Closed)
                    .count(),
            }
        })
        .filter(|tally| tally.leads > 0)
        .collect()
}

/// Per-source lead and close counts, best converting first.
pub fn source_breakdown(leads: &[Lead]) -> Vec<SourcePerformance> {
    let mut rows: Vec<SourcePerformance> = tally_sources(leads)
        .into_iter()
        .map(|tally| SourcePerformance {
            source: tally.source,
            label: tally.source.label(),
            leads: tally.leads,
            closed: tally.closed,
            conversion_rate: whole_percent(tally.closed, tally.leads),
        })
        .collect();
    rows.sort_by(|a, b| b.conversion_rate.cmp(&a.conversion_rate));
    rows
}

/// Team-wide source rows with earned commission attributed through each
/// commission's lead, highest revenue first.
///
/// `sources` resolves a commission's lead to its source; commissions without
/// a known lead contribute no revenue.
pub fn team_source_performance(
    leads: &[Lead],
    commissions: &[Commission],
    sources: &HashMap<LeadId, LeadSource>,
) -> Vec<TeamSourcePerformance> {
    let mut revenue: HashMap<LeadSource, i64> = HashMap::new();
    for commission in commissions.iter().filter(|c| c.status.is_earned()) {
        if let Some(source) = commission
            .lead_id
            .as_ref()
            .and_then(|lead_id| sources.get(lead_id))
        {
            *revenue.entry(*source).or_default() += commission.commission_amount;
        }
    }

    let mut rows: Vec<TeamSourcePerformance> = tally_sources(leads)
        .into_iter()
        .map(|tally| TeamSourcePerformance {
            source: tally.source,
            label: tally.source.label(),
            leads: tally.leads,
            closed: tally.closed,
            conversion_rate: whole_percent(tally.closed, tally.leads),
            revenue: revenue.get(&tally.source).copied().unwrap_or(0),
        })
        .collect();
    rows.sort_by(|a, b| b.revenue.cmp(&a.revenue));
    rows
}
