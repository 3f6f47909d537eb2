//! Aggregated views over the categorized records.
//!
//! Each view is a pure function of the record slice and produces rows that
//! the report layer turns into sheets.

pub mod aggregator;
pub mod inventory;
pub mod issues;
pub mod performance;
pub mod plants;
pub mod quality;

pub use inventory::{inventory_by_unit, InventoryRow, InventoryView};
pub use issues::{issue_distribution, IssueRow};
pub use performance::{coordinator_performance, PerformanceRow};
pub use plants::{top_plants, PlantRow};
pub use quality::{quality_metrics, QualityMetrics};
