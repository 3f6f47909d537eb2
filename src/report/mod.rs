//! Report generation.

pub mod generator;
pub mod table;
pub mod workbook;

pub use generator::{build_tables, write_json_report, Report, ReportMetadata};
pub use workbook::write_workbook;
