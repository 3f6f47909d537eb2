//! Data quality figures reported alongside the run statistics.

use crate::models::CategorizedRecord;
use serde::Serialize;
use std::collections::HashSet;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QualityMetrics {
    pub total_records: usize,
    /// Rows whose cells repeat an earlier row exactly.
    pub duplicate_rows: usize,
    pub unique_plants: usize,
    pub unique_descriptions: usize,
}

pub fn quality_metrics(records: &[CategorizedRecord]) -> QualityMetrics {
    let mut seen = HashSet::new();
    let duplicate_rows = records
        .iter()
        .filter(|r| !seen.insert(&r.incident.cells))
        .count();

    QualityMetrics {
        total_records: records.len(),
        duplicate_rows,
        unique_plants: records.iter().map(|r| r.plant()).collect::<HashSet<_>>().len(),
        unique_descriptions: records
            .iter()
            .map(|r| r.description())
            .collect::<HashSet<_>>()
            .len(),
    }
}
