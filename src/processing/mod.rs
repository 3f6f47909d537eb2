//! Row-level pipeline stages: cleaning, enrichment and agent filtering.
//!
//! Every stage consumes its input and returns the surviving rows in their
//! original order.

pub mod categorizer;

pub use categorizer::{category_distribution, Categorizer};

use crate::models::{CoordinatorMap, EnrichedRecord, IncidentRecord};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::{debug, info};

/// Unmatched plant codes quoted in the join statistics.
const UNMATCHED_EXAMPLES: usize = 5;

/// Result of the exclusion-marker cleaning pass.
#[derive(Debug, Clone)]
pub struct CleanOutcome {
    pub kept: Vec<IncidentRecord>,
    pub removed: usize,
}

/// Drop every record whose work-item text contains `marker`.
///
/// The match is a case-sensitive substring test; an empty work-item cell
/// never matches.
pub fn clean_records(records: Vec<IncidentRecord>, marker: &str) -> CleanOutcome {
    let before = records.len();
    let kept: Vec<IncidentRecord> = records
        .into_iter()
        .filter(|r| !r.work_item_text.contains(marker))
        .collect();
    let removed = before - kept.len();

    info!(
        "Cleaning removed {} rows containing '{}' ({} kept)",
        removed,
        marker,
        kept.len()
    );

    CleanOutcome { kept, removed }
}

/// Statistics of the plant inner join.
#[derive(Debug, Clone, Default, Serialize)]
pub struct JoinStats {
    pub rows_before: usize,
    pub rows_after: usize,
    /// Distinct incident plants with no coordinator.
    pub unmatched_plants: usize,
    /// A few of those plants, sorted.
    pub unmatched_examples: Vec<String>,
}

impl JoinStats {
    pub fn rows_dropped(&self) -> usize {
        self.rows_before - self.rows_after
    }

    /// Share of rows that found a coordinator, in percent.
    pub fn match_rate(&self) -> f64 {
        if self.rows_before == 0 {
            0.0
        } else {
            self.rows_after as f64 / self.rows_before as f64 * 100.0
        }
    }
}

/// Inner join of incidents with the coordinator mapping on plant code.
///
/// Rows whose plant has no mapping entry are dropped. An empty result is
/// not an error.
pub fn enrich(
    records: Vec<IncidentRecord>,
    mapping: &CoordinatorMap,
) -> (Vec<EnrichedRecord>, JoinStats) {
    let rows_before = records.len();
    let mut unmatched = BTreeSet::new();
    let mut enriched = Vec::with_capacity(rows_before);

    for incident in records {
        match mapping.get(&incident.plant) {
            Some(info) => enriched.push(EnrichedRecord {
                coordinator: info.clone(),
                incident,
            }),
            None => {
                unmatched.insert(incident.plant);
            }
        }
    }

    let stats = JoinStats {
        rows_before,
        rows_after: enriched.len(),
        unmatched_plants: unmatched.len(),
        unmatched_examples: unmatched.into_iter().take(UNMATCHED_EXAMPLES).collect(),
    };

    info!(
        "Inner join kept {} of {} rows ({:.1}% matched)",
        stats.rows_after,
        stats.rows_before,
        stats.match_rate()
    );
    if stats.unmatched_plants > 0 {
        debug!(
            "{} plants without coordinator, e.g. {:?}",
            stats.unmatched_plants, stats.unmatched_examples
        );
    }

    (enriched, stats)
}

/// Keep rows whose agent is exactly one of `agents`.
pub fn filter_by_agents(records: Vec<EnrichedRecord>, agents: &[String]) -> Vec<EnrichedRecord> {
    let allowed: HashSet<&str> = agents.iter().map(String::as_str).collect();
    let before = records.len();

    let kept: Vec<EnrichedRecord> = records
        .into_iter()
        .filter(|r| allowed.contains(r.incident.agent.as_str()))
        .collect();

    info!(
        "Agent filter kept {} of {} rows ({} agents allowed)",
        kept.len(),
        before,
        allowed.len()
    );

    kept
}

/// Row count per agent, agents ascending.
pub fn agent_counts(records: &[EnrichedRecord]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for record in records {
        *counts.entry(record.incident.agent.clone()).or_default() += 1;
    }
    counts
}
