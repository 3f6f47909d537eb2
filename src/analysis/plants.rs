//! Top plant/category pairs per agent ("Plants" sheet).

use super::aggregator::{group_by_agent, share, Tally};
use crate::models::{CategorizedRecord, Category};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlantRow {
    pub agent: String,
    pub plant: String,
    pub category: Category,
    /// Share of the agent's rows, in percent.
    pub percentage: f64,
    pub count: usize,
}

/// The `top_n` most frequent (plant, category) pairs of each agent.
///
/// Agents are ascending; inside an agent pairs go by count descending and
/// equal counts keep the order in which the pair first appeared.
pub fn top_plants(records: &[CategorizedRecord], top_n: usize) -> Vec<PlantRow> {
    let mut rows = Vec::new();

    for (agent, group) in group_by_agent(records) {
        let total = group.len();
        let pairs: Tally<(&str, Category)> = group.iter().map(|r| (r.plant(), r.category)).collect();

        rows.extend(
            pairs
                .ranked()
                .into_iter()
                .take(top_n)
                .map(|((plant, category), count)| PlantRow {
                    agent: agent.to_string(),
                    plant: plant.to_string(),
                    category,
                    percentage: share(count, total),
                    count,
                }),
        );
    }

    rows
}
