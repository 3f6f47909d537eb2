//! Rule-based incident categorization.

use crate::config::CategoryRule;
use crate::models::{CategorizedRecord, Category, EnrichedRecord};
use std::collections::BTreeMap;
use tracing::info;

/// Ordered trigger table. The first rule with a matching trigger wins.
#[derive(Debug, Clone)]
pub struct Categorizer<'a> {
    rules: &'a [CategoryRule],
}

impl<'a> Categorizer<'a> {
    pub fn new(rules: &'a [CategoryRule]) -> Self {
        Self { rules }
    }

    /// Category for a description; case-sensitive substring match.
    pub fn classify(&self, description: &str) -> Category {
        self.rules
            .iter()
            .find(|rule| rule.triggers.iter().any(|t| description.contains(t.as_str())))
            .map(|rule| rule.category)
            .unwrap_or(Category::Other)
    }

    /// Attach a category to every record, keeping order.
    pub fn categorize(&self, records: Vec<EnrichedRecord>) -> Vec<CategorizedRecord> {
        let categorized: Vec<CategorizedRecord> = records
            .into_iter()
            .map(|r| {
                let category = self.classify(&r.incident.description);
                CategorizedRecord {
                    incident: r.incident,
                    coordinator: r.coordinator,
                    category,
                }
            })
            .collect();

        let other = categorized
            .iter()
            .filter(|r| r.category == Category::Other)
            .count();
        info!(
            "Categorized {} rows ({} without a matching rule)",
            categorized.len(),
            other
        );

        categorized
    }
}

/// Row count per category, in category order.
pub fn category_distribution(records: &[CategorizedRecord]) -> BTreeMap<Category, usize> {
    let mut dist = BTreeMap::new();
    for record in records {
        *dist.entry(record.category).or_default() += 1;
    }
    dist
}
