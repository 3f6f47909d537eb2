//! Category distribution per agent ("Issues" sheet).

use super::aggregator::{group_by_agent, round2, share, Tally};
use crate::models::{CategorizedRecord, Category};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IssueRow {
    pub agent: String,
    /// One percentage per entry of [`Category::ALL`], in that order.
    pub shares: Vec<(Category, f64)>,
    /// Sum of the rounded shares.
    pub total: f64,
}

impl IssueRow {
    pub fn share(&self, category: Category) -> f64 {
        self.shares
            .iter()
            .find(|(c, _)| *c == category)
            .map_or(0.0, |(_, pct)| *pct)
    }
}

/// Percentage of each agent's rows falling into every category.
///
/// Categories an agent never hit are reported as 0 so every row has the
/// same columns.
pub fn issue_distribution(records: &[CategorizedRecord]) -> Vec<IssueRow> {
    group_by_agent(records)
        .into_iter()
        .map(|(agent, group)| {
            let counts: Tally<Category> = group.iter().map(|r| r.category).collect();
            let shares: Vec<(Category, f64)> = Category::ALL
                .iter()
                .map(|c| (*c, share(counts.count(c), group.len())))
                .collect();
            let total = round2(shares.iter().map(|(_, pct)| pct).sum());

            IssueRow {
                agent: agent.to_string(),
                shares,
                total,
            }
        })
        .collect()
}
