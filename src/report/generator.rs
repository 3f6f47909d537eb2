//! Report assembly.
//!
//! Turns the pipeline output into the seven report tables and renders them
//! either as a workbook or as a JSON document with run metadata.

use super::table::{headers, Cell, Table};
use crate::analysis::{
    coordinator_performance, inventory_by_unit, issue_distribution, top_plants, InventoryView,
    IssueRow, PerformanceRow, PlantRow,
};
use crate::config::Config;
use crate::models::{CategorizedRecord, Category};
use crate::pipeline::{PipelineOutput, PipelineStats};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;

pub const RESUMEN_SHEET: &str = "Resumen";
pub const APEX_SHEET: &str = "APEX";
pub const COMMAND_SHEET: &str = "COMMAND";
pub const PERFORMANCE_SHEET: &str = "Billing Coordinators";
pub const PLANTS_SHEET: &str = "Plants";
pub const ISSUES_SHEET: &str = "Issues";
pub const INVENTORY_SHEET: &str = "Inventory";

/// Run information carried by the JSON report.
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    pub generated_at: DateTime<Utc>,
    pub incidents_file: String,
    pub coordinators_file: String,
    pub duration_seconds: f64,
    pub stats: PipelineStats,
}

/// A complete report: metadata plus every table in sheet order.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub tables: Vec<Table>,
}

/// Build all seven tables in sheet order.
pub fn build_tables(output: &PipelineOutput, config: &Config) -> Vec<Table> {
    let records = &output.records;
    let report = &config.report;

    let apex: Vec<&CategorizedRecord> =
        records.iter().filter(|r| r.mentions(&report.apex_keyword)).collect();
    let command: Vec<&CategorizedRecord> =
        records.iter().filter(|r| r.mentions(&report.command_keyword)).collect();

    vec![
        detail_table(RESUMEN_SHEET, &output.headers, records.iter(), config),
        detail_table(APEX_SHEET, &output.headers, apex.into_iter(), config),
        detail_table(COMMAND_SHEET, &output.headers, command.into_iter(), config),
        performance_table(&coordinator_performance(records)),
        plants_table(&top_plants(records, report.top_plants)),
        issues_table(&issue_distribution(records)),
        inventory_table(&inventory_by_unit(records, &config.inventory)),
    ]
}

/// Suffix for mapping columns whose name already exists in the incident table.
const MAPPING_SUFFIX: &str = "_coord";

/// Enriched detail rows: source columns, coordinator columns, category.
fn detail_table<'a>(
    name: &str,
    source_headers: &[String],
    records: impl Iterator<Item = &'a CategorizedRecord>,
    config: &Config,
) -> Table {
    let columns = &config.columns;
    let mut cols = source_headers.to_vec();
    for name in [
        &columns.coordinator,
        &columns.region,
        &columns.market,
        &columns.stronghold,
    ] {
        if source_headers.contains(name) {
            cols.push(format!("{}{}", name, MAPPING_SUFFIX));
        } else {
            cols.push(name.clone());
        }
    }
    cols.push("Category".to_string());

    let mut table = Table::new(name, cols);
    for record in records {
        let mut row: Vec<Cell> = record.incident.cells.iter().map(|c| Cell::from_raw(c)).collect();
        let info = &record.coordinator;
        row.extend([
            Cell::from(info.coordinator.as_str()),
            Cell::from(info.region.as_str()),
            Cell::from(info.market.as_str()),
            Cell::from(info.stronghold.as_str()),
            Cell::from(record.category.as_str()),
        ]);
        table.push(row);
    }
    table
}

fn performance_table(rows: &[PerformanceRow]) -> Table {
    let mut table = Table::new(
        PERFORMANCE_SHEET,
        headers(&[
            "Agent",
            "Average_Days_Spent",
            "Unique_Tickets_Processed",
            "Plant_Count",
            "Main_Category",
            "Category_Count",
            "Category_Percentage",
            "Issue",
            "Occurrences",
        ]),
    );
    for p in rows {
        table.push(vec![
            Cell::from(p.agent.as_str()),
            Cell::Decimal(p.average_days_spent),
            Cell::Count(p.unique_tickets),
            Cell::Count(p.plant_count),
            Cell::from(p.main_category_label()),
            Cell::Count(p.category_count),
            Cell::Percent(p.category_percentage),
            Cell::from(p.issue_label()),
            Cell::Count(p.occurrences),
        ]);
    }
    table
}

fn plants_table(rows: &[PlantRow]) -> Table {
    let mut table = Table::new(
        PLANTS_SHEET,
        headers(&["Agent", "Plant", "Category", "Percentage", "Count"]),
    );
    for p in rows {
        table.push(vec![
            Cell::from(p.agent.as_str()),
            Cell::from_raw(&p.plant),
            Cell::from(p.category.as_str()),
            Cell::Percent(p.percentage),
            Cell::Count(p.count),
        ]);
    }
    table
}

fn issues_table(rows: &[IssueRow]) -> Table {
    let mut cols = vec!["Agent".to_string()];
    cols.extend(Category::ALL.iter().map(|c| c.to_string()));
    cols.push("Total".to_string());

    let mut table = Table::new(ISSUES_SHEET, cols);
    for issue in rows {
        let mut row = vec![Cell::from(issue.agent.as_str())];
        row.extend(Category::ALL.iter().map(|c| Cell::Percent(issue.share(*c))));
        row.push(Cell::Percent(issue.total));
        table.push(row);
    }
    table
}

fn inventory_table(view: &InventoryView) -> Table {
    let mut cols = headers(&["Region", "Plant", "Agent"]);
    cols.extend(view.units.iter().cloned());
    cols.extend(view.units.iter().map(|u| format!("{}_%", u)));

    let mut table = Table::new(INVENTORY_SHEET, cols);
    for inv in &view.rows {
        let mut row = vec![
            Cell::from(inv.region.as_str()),
            Cell::from_raw(&inv.plant),
            Cell::from(inv.agent.as_str()),
        ];
        row.extend(inv.quantities.iter().map(|q| Cell::Number(*q)));
        row.extend(inv.percentages.iter().map(|p| Cell::Percent(*p)));
        table.push(row);
    }
    table
}

/// Serialize a report as pretty JSON.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Write a report as JSON to a file.
pub fn write_json_report(report: &Report, path: &Path) -> Result<()> {
    let json = generate_json_report(report)?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write report to {}", path.display()))?;
    Ok(())
}
