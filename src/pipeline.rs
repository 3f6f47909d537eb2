//! End-to-end transformation from loaded tables to categorized records.

use crate::analysis::{quality_metrics, QualityMetrics};
use crate::config::Config;
use crate::models::{CategorizedRecord, Category, CoordinatorMap, IncidentTable};
use crate::processing::{
    agent_counts, category_distribution, clean_records, enrich, filter_by_agents, Categorizer,
    JoinStats,
};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Counters collected while the pipeline runs.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineStats {
    pub rows_loaded: usize,
    pub rows_removed_by_marker: usize,
    pub join: JoinStats,
    pub mapping_rows: usize,
    pub duplicate_mapping_plants: Vec<String>,
    pub rows_after_agent_filter: usize,
    pub agent_counts: BTreeMap<String, usize>,
    pub category_distribution: BTreeMap<Category, usize>,
    pub apex_rows: usize,
    pub command_rows: usize,
    pub quality: QualityMetrics,
}

/// Categorized rows plus the incident headers they came with.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub headers: Vec<String>,
    pub records: Vec<CategorizedRecord>,
    pub stats: PipelineStats,
}

/// Clean, join, filter and categorize the incident table.
pub fn run(config: &Config, incidents: IncidentTable, mapping: &CoordinatorMap) -> PipelineOutput {
    let IncidentTable { headers, records } = incidents;
    let rows_loaded = records.len();

    let cleaned = clean_records(records, &config.rules.exclusion_marker);

    if !mapping.duplicate_plants().is_empty() {
        warn!(
            "{} plants appear on several mapping rows; the first row is used",
            mapping.duplicate_plants().len()
        );
    }
    let (enriched, join) = enrich(cleaned.kept, mapping);
    if enriched.is_empty() {
        warn!("No incident plant matched the coordinator mapping");
    }

    let filtered = filter_by_agents(enriched, &config.rules.agents);
    let agents = agent_counts(&filtered);
    let rows_after_agent_filter = filtered.len();

    let records = Categorizer::new(&config.rules.categories).categorize(filtered);

    let quality = quality_metrics(&records);
    info!(
        "Quality: {} records, {} duplicate rows, {} plants, {} distinct descriptions",
        quality.total_records, quality.duplicate_rows, quality.unique_plants, quality.unique_descriptions
    );

    let stats = PipelineStats {
        rows_loaded,
        rows_removed_by_marker: cleaned.removed,
        join,
        mapping_rows: mapping.row_count(),
        duplicate_mapping_plants: mapping.duplicate_plants().to_vec(),
        rows_after_agent_filter,
        agent_counts: agents,
        category_distribution: category_distribution(&records),
        apex_rows: records.iter().filter(|r| r.mentions(&config.report.apex_keyword)).count(),
        command_rows: records
            .iter()
            .filter(|r| r.mentions(&config.report.command_keyword))
            .count(),
        quality,
    };

    PipelineOutput {
        headers,
        records,
        stats,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{coordinator_performance, inventory_by_unit, issue_distribution, top_plants};
    use crate::loader::{read_coordinators, read_incidents, LoadOptions};

    const INCIDENTS: &str = "\
ID,Task text,Plant,Actual (last) agent,Work item text,Delivery quantity,Base Unit of Measure,Date,OK - Actual End Date of Work Item
1,COMMAND - Assign Contract,100,CAMVELEZ,Assign,1,YD3,2025-08-01,2025-08-03
2,COMMAND - Assign Contract,100,CAMVELEZ,Assign,1,YD3,2025-08-01,2025-08-05
3,JWS/APEX - Pricing Incomplete,200,CAMVELEZ,Price,2,TON,2025-08-02,2025-08-02
4,JWS/APEX - Ticket not Goods Issued,200,CAMVELEZ,Goods,30,TON,,
5,COMMAND - Ticket not Goods Issued,100,SRUGELES,Goods,12,YD3,,
6,COMMAND - Ticket not Goods Issued,300,SRUGELES,Goods,4,YD3,,
7,JWS/APEX - STPO Errors,100,SRUGELES,Order is currently being processed,1,TON,,
8,JWS/APEX - Interface Errors,999,CAMVELEZ,Iface,1,TON,,
9,Unknown text,100,NOBODY,Other,1,TON,,
10,JWS/APEX - Interface Errors,300,SRUGELES,Iface,1,TON,2025-08-01,2025-07-20
";

    const MAPPING: &str = "\
Plant,BILLING COORDINATORS,Region,Market Name
100,Ana,South,Houston
200,Luis,North,Dallas
300,Marta,South,Austin
100,Pedro,West,Phoenix
";

    fn output() -> PipelineOutput {
        let mut config = Config::default();
        config.rules.agents = vec!["CAMVELEZ".to_string(), "SRUGELES".to_string()];
        let incidents = read_incidents(
            INCIDENTS.as_bytes(),
            &config.columns,
            &LoadOptions::default(),
            None,
        )
        .unwrap();
        let mapping = read_coordinators(MAPPING.as_bytes(), &config.columns, None).unwrap();
        run(&config, incidents, &mapping)
    }

    #[test]
    fn test_pipeline_stats() {
        let out = output();
        let stats = &out.stats;

        assert_eq!(stats.rows_loaded, 10);
        assert_eq!(stats.rows_removed_by_marker, 1);
        assert_eq!(stats.join.rows_before, 9);
        assert_eq!(stats.join.rows_after, 8);
        assert_eq!(stats.join.unmatched_examples, vec!["999"]);
        assert_eq!(stats.duplicate_mapping_plants, vec!["100"]);
        assert_eq!(stats.rows_after_agent_filter, 7);
        assert_eq!(stats.agent_counts.get("CAMVELEZ"), Some(&4));
        assert_eq!(stats.agent_counts.get("SRUGELES"), Some(&3));
        assert_eq!(stats.category_distribution.get(&Category::Inventory), Some(&3));
        assert_eq!(stats.apex_rows, 3);
        assert_eq!(stats.command_rows, 4);
        assert_eq!(stats.quality.total_records, 7);

        assert_eq!(out.headers.len(), 9);
        assert!(out
            .records
            .iter()
            .all(|r| !r.incident.work_item_text.contains("is currently being processed")));
        assert_eq!(out.records[0].coordinator.coordinator, "Ana");
    }

    #[test]
    fn test_pipeline_views() {
        let out = output();

        let perf = coordinator_performance(&out.records);
        assert_eq!(perf.len(), 2);
        let cam = &perf[0];
        assert_eq!(cam.agent, "CAMVELEZ");
        assert_eq!(cam.main_category, Some(Category::Contract));
        assert_eq!(cam.category_count, 2);
        assert_eq!(cam.category_percentage, 50.0);
        assert_eq!(cam.issue.as_deref(), Some("COMMAND - Assign Contract"));
        assert_eq!(cam.unique_tickets, 4);
        // (2 + 4 + 0 + 0) / 4
        assert!((cam.average_days_spent - 1.5).abs() < 1e-9);

        let sru = &perf[1];
        assert_eq!(sru.main_category, Some(Category::Interface));
        assert_eq!(sru.average_days_spent, 0.0);

        let plants = top_plants(&out.records, 3);
        for agent in ["CAMVELEZ", "SRUGELES"] {
            assert!(plants.iter().filter(|p| p.agent == agent).count() <= 3);
        }
        assert_eq!(plants[0].plant, "100");
        assert_eq!(plants[0].count, 2);

        for row in issue_distribution(&out.records) {
            assert!(row.total >= 99.9 && row.total <= 100.1);
        }

        let inventory = inventory_by_unit(&out.records, &Config::default().inventory);
        // keyword and unit decide, so Contract/Pricing/Interface rows count too
        assert_eq!(inventory.rows.len(), 4);
        assert_eq!(inventory.totals, vec![33.0, 0.0, 18.0]);
        for column in 0..inventory.units.len() {
            let sum: f64 = inventory.rows.iter().map(|r| r.percentages[column]).sum();
            if inventory.totals[column] > 0.0 {
                assert!((sum - 100.0).abs() < 0.05);
            }
        }
    }
}
