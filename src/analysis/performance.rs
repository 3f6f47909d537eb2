//! Per-agent performance view ("Billing Coordinators" sheet).

use super::aggregator::{group_by_agent, share, Tally};
use crate::models::{CategorizedRecord, Category};
use serde::Serialize;
use std::collections::HashSet;

/// Label used when an agent only has Inventory rows.
pub const NO_CATEGORY: &str = "No Category";

/// Label used when no issue text can be selected.
pub const UNKNOWN_ISSUE: &str = "Unknown";

/// One agent's performance figures.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceRow {
    pub agent: String,
    /// Mean days between start and end, negatives counted as 0.
    pub average_days_spent: f64,
    /// Distinct non-empty ticket ids.
    pub unique_tickets: usize,
    pub plant_count: usize,
    /// Most frequent category other than Inventory.
    pub main_category: Option<Category>,
    /// Rows of the agent in `main_category`.
    pub category_count: usize,
    /// `category_count` as a share of the agent's rows.
    pub category_percentage: f64,
    /// Most frequent description inside `main_category`.
    pub issue: Option<String>,
    /// Rows with both `main_category` and `issue`.
    pub occurrences: usize,
    pub total_rows: usize,
}

impl PerformanceRow {
    pub fn main_category_label(&self) -> &str {
        self.main_category.map_or(NO_CATEGORY, |c| c.as_str())
    }

    pub fn issue_label(&self) -> &str {
        self.issue.as_deref().unwrap_or(UNKNOWN_ISSUE)
    }
}

/// Compute one [`PerformanceRow`] per agent, agents ascending.
pub fn coordinator_performance(records: &[CategorizedRecord]) -> Vec<PerformanceRow> {
    group_by_agent(records)
        .into_iter()
        .map(|(agent, rows)| agent_performance(agent, &rows))
        .collect()
}

fn agent_performance(agent: &str, rows: &[&CategorizedRecord]) -> PerformanceRow {
    let total_rows = rows.len();

    let days: f64 = rows.iter().map(|r| r.incident.days_spent()).sum();
    let average_days_spent = if total_rows == 0 {
        0.0
    } else {
        days / total_rows as f64
    };

    let unique_tickets = rows
        .iter()
        .map(|r| r.incident.ticket_id.as_str())
        .filter(|id| !id.is_empty())
        .collect::<HashSet<_>>()
        .len();
    let plant_count = rows.iter().map(|r| r.plant()).collect::<HashSet<_>>().len();

    let categories: Tally<Category> = rows
        .iter()
        .map(|r| r.category)
        .filter(|c| *c != Category::Inventory)
        .collect();
    let main_category = categories.most_common().map(|(c, _)| *c);

    let (category_count, issue, occurrences) = match main_category {
        Some(main) => {
            let in_main: Vec<&&CategorizedRecord> =
                rows.iter().filter(|r| r.category == main).collect();
            let issues: Tally<&str> = in_main.iter().map(|r| r.description()).collect();
            let (issue, occurrences) = issues
                .most_common()
                .map(|(text, n)| (Some(text.to_string()), n))
                .unwrap_or((None, 0));
            (in_main.len(), issue, occurrences)
        }
        None => (0, None, 0),
    };

    PerformanceRow {
        agent: agent.to_string(),
        average_days_spent,
        unique_tickets,
        plant_count,
        main_category,
        category_count,
        category_percentage: share(category_count, total_rows),
        issue,
        occurrences,
        total_rows,
    }
}
