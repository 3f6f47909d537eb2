//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.billing-kpi.toml` files. Every rule the pipeline applies (exclusion
//! marker, agent allow-list, category triggers, inventory filters) lives
//! here as data.

use crate::error::ConfigError;
use crate::models::Category;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Default configuration file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".billing-kpi.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Filtering and categorization rules.
    #[serde(default)]
    pub rules: RulesConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,

    /// Inventory view settings.
    #[serde(default)]
    pub inventory: InventoryConfig,

    /// Input column names.
    #[serde(default)]
    pub columns: ColumnsConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Directory the report is written to when no output path is given.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Report file name prefix; the month name is appended.
    #[serde(default = "default_report_prefix")]
    pub report_prefix: String,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            report_prefix: default_report_prefix(),
            verbose: false,
        }
    }
}

fn default_output_dir() -> String {
    "output".to_string()
}

fn default_report_prefix() -> String {
    "Performance".to_string()
}

/// Row filtering and categorization rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulesConfig {
    /// Work-item text marker of system-generated rows (BATCHMAN).
    #[serde(default = "default_exclusion_marker")]
    pub exclusion_marker: String,

    /// Agents kept by the agent filter.
    #[serde(default = "default_agents")]
    pub agents: Vec<String>,

    /// Lowercase and strip codes from work-item text at load time.
    #[serde(default)]
    pub normalize_work_item_text: bool,

    /// Category rules in priority order; the first match wins.
    #[serde(default = "default_categories")]
    pub categories: Vec<CategoryRule>,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            exclusion_marker: default_exclusion_marker(),
            agents: default_agents(),
            normalize_work_item_text: false,
            categories: default_categories(),
        }
    }
}

/// One category and the description substrings that select it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRule {
    pub category: Category,
    pub triggers: Vec<String>,
}

impl CategoryRule {
    fn new(category: Category, triggers: &[&str]) -> Self {
        Self {
            category,
            triggers: triggers.iter().map(|t| t.to_string()).collect(),
        }
    }
}

fn default_exclusion_marker() -> String {
    "is currently being processed".to_string()
}

fn default_agents() -> Vec<String> {
    vec![
        "SRUGELES", "CAMVELEZ", "JUAHENA", "JUANRUIZ", "REGARCI1", "SPINEDAA", "MPEREZPA",
        "CHREVANS",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_categories() -> Vec<CategoryRule> {
    vec![
        CategoryRule::new(
            Category::Contract,
            &[
                "Error Shipto related to Contract",
                "JWS/APEX - Assign Contract",
                "COMMAND - Assign Contract",
                "COMMAND - Process Error Shipto/Contract",
                "JWS/APEX - Process Error Shipto/Contract",
            ],
        ),
        CategoryRule::new(
            Category::Pricing,
            &[
                "COMMAND - Pricing Incomplete",
                "JWS/APEX - Pricing Incomplete",
                "JWS/APEX - Shipment cost not transferred",
                "COMMAND - Shipment cost not transferred",
                "No Accounting Document for Billing Doc",
            ],
        ),
        CategoryRule::new(
            Category::Interface,
            &[
                "JWS/APEX - Interface Errors",
                "COMMAND - Interface Errors",
                "JWS/APEX - Process Valuation type error",
            ],
        ),
        CategoryRule::new(
            Category::Incomplete,
            &[
                "JWS/APEX - Incomplete Deliveries",
                "JWS/APEX - Incomplete Orders",
                "JWS/APEX - Ticket Inco Terms",
                "COMMAND - Incomplete Orders",
                "COMMAND - Ticket Inco Terms",
                "COMMAND - Incomplete Deliveries",
            ],
        ),
        CategoryRule::new(
            Category::Inventory,
            &[
                "COMMAND - Ticket not Goods Issued",
                "JWS/APEX - Ticket not Goods Issued",
            ],
        ),
        CategoryRule::new(Category::Stpo, &["JWS/APEX - STPO Errors"]),
    ]
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Plant/category combinations listed per agent on the Plants sheet.
    #[serde(default = "default_top_plants")]
    pub top_plants: usize,

    /// Description keyword selecting the APEX sheet (case-insensitive).
    #[serde(default = "default_apex_keyword")]
    pub apex_keyword: String,

    /// Description keyword selecting the COMMAND sheet (case-insensitive).
    #[serde(default = "default_command_keyword")]
    pub command_keyword: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            top_plants: default_top_plants(),
            apex_keyword: default_apex_keyword(),
            command_keyword: default_command_keyword(),
        }
    }
}

fn default_top_plants() -> usize {
    3
}

fn default_apex_keyword() -> String {
    "APEX".to_string()
}

fn default_command_keyword() -> String {
    "COMMAND".to_string()
}

/// Inventory view settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryConfig {
    /// Sub-filters combined into the inventory row set, checked in order.
    #[serde(default = "default_inventory_filters")]
    pub filters: Vec<InventoryFilter>,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            filters: default_inventory_filters(),
        }
    }
}

/// Rows whose description contains `keyword` and whose unit is in `units`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryFilter {
    pub keyword: String,
    pub units: Vec<String>,
}

impl InventoryConfig {
    /// Units in pivot column order: first appearance across the filters.
    pub fn units(&self) -> Vec<String> {
        let mut units: Vec<String> = Vec::new();
        for unit in self.filters.iter().flat_map(|f| f.units.iter()) {
            if !units.contains(unit) {
                units.push(unit.clone());
            }
        }
        units
    }
}

fn default_inventory_filters() -> Vec<InventoryFilter> {
    vec![
        InventoryFilter {
            keyword: "APEX".to_string(),
            units: vec!["TON".to_string(), "TO".to_string()],
        },
        InventoryFilter {
            keyword: "COMMAND".to_string(),
            units: vec!["YD3".to_string()],
        },
    ]
}

/// Column names in the two input tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnsConfig {
    #[serde(default = "default_description_col")]
    pub description: String,
    #[serde(default = "default_plant_col")]
    pub plant: String,
    #[serde(default = "default_agent_col")]
    pub agent: String,
    #[serde(default = "default_work_item_col")]
    pub work_item_text: String,
    #[serde(default = "default_ticket_col")]
    pub ticket_id: String,
    #[serde(default = "default_quantity_col")]
    pub delivery_quantity: String,
    #[serde(default = "default_unit_col")]
    pub base_unit: String,
    #[serde(default = "default_start_col")]
    pub start_date: String,
    #[serde(default = "default_end_col")]
    pub end_date: String,

    /// Plant column in the coordinator mapping.
    #[serde(default = "default_plant_col")]
    pub mapping_plant: String,
    #[serde(default = "default_coordinator_col")]
    pub coordinator: String,
    #[serde(default = "default_region_col")]
    pub region: String,
    #[serde(default = "default_market_col")]
    pub market: String,
    /// Optional in the mapping file.
    #[serde(default = "default_stronghold_col")]
    pub stronghold: String,
}

impl Default for ColumnsConfig {
    fn default() -> Self {
        Self {
            description: default_description_col(),
            plant: default_plant_col(),
            agent: default_agent_col(),
            work_item_text: default_work_item_col(),
            ticket_id: default_ticket_col(),
            delivery_quantity: default_quantity_col(),
            base_unit: default_unit_col(),
            start_date: default_start_col(),
            end_date: default_end_col(),
            mapping_plant: default_plant_col(),
            coordinator: default_coordinator_col(),
            region: default_region_col(),
            market: default_market_col(),
            stronghold: default_stronghold_col(),
        }
    }
}

fn default_description_col() -> String {
    "Task text".to_string()
}

fn default_plant_col() -> String {
    "Plant".to_string()
}

fn default_agent_col() -> String {
    "Actual (last) agent".to_string()
}

fn default_work_item_col() -> String {
    "Work item text".to_string()
}

fn default_ticket_col() -> String {
    "ID".to_string()
}

fn default_quantity_col() -> String {
    "Delivery quantity".to_string()
}

fn default_unit_col() -> String {
    "Base Unit of Measure".to_string()
}

fn default_start_col() -> String {
    "Date".to_string()
}

fn default_end_col() -> String {
    "OK - Actual End Date of Work Item".to_string()
}

fn default_coordinator_col() -> String {
    "BILLING COORDINATORS".to_string()
}

fn default_region_col() -> String {
    "Region".to_string()
}

fn default_market_col() -> String {
    "Market Name".to_string()
}

fn default_stronghold_col() -> String {
    "Stronghold".to_string()
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load `.billing-kpi.toml` from a directory.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(DEFAULT_CONFIG_FILE);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Resolve the configuration for a run.
    ///
    /// An explicit path must load. Otherwise `.billing-kpi.toml` in
    /// `search_dir` is used when present and built-in defaults when absent;
    /// a file that exists but fails to parse is an error, never a fallback.
    pub fn resolve(explicit: Option<&Path>, search_dir: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        let found = Self::load_from_dir(search_dir)
            .with_context(|| format!("Failed to load {}", DEFAULT_CONFIG_FILE))?;
        Ok(found.unwrap_or_default())
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were given explicitly.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref agents) = args.agents {
            self.rules.agents = agents.iter().map(|a| a.trim().to_string()).collect();
        }
        if let Some(ref marker) = args.marker {
            self.rules.exclusion_marker = marker.clone();
        }
        if let Some(top) = args.top_plants {
            self.report.top_plants = top;
        }
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Check the rule tables for contradictions the pipeline cannot resolve.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.rules.exclusion_marker.is_empty() {
            return Err(ConfigError::EmptyMarker);
        }

        let mut seen = HashSet::new();
        for rule in &self.rules.categories {
            if rule.category == Category::Other {
                return Err(ConfigError::OtherHasTriggers);
            }
            if !seen.insert(rule.category) {
                return Err(ConfigError::DuplicateCategory(rule.category.to_string()));
            }
            if rule.triggers.iter().any(|t| t.is_empty()) {
                return Err(ConfigError::EmptyTrigger(rule.category.to_string()));
            }
        }

        if self.report.top_plants == 0 {
            return Err(ConfigError::ZeroTopPlants);
        }

        for (i, filter) in self.inventory.filters.iter().enumerate() {
            if filter.keyword.is_empty() || filter.units.is_empty() {
                return Err(ConfigError::InvalidInventoryFilter(i + 1));
            }
        }

        Ok(())
    }

    /// Report path used when no `--output` is given:
    /// `<output_dir>/<prefix>_<Month>.<extension>`.
    pub fn default_output_path(&self, month: &str, extension: &str) -> PathBuf {
        Path::new(&self.general.output_dir).join(format!(
            "{}_{}.{}",
            self.general.report_prefix, month, extension
        ))
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.rules.exclusion_marker, "is currently being processed");
        assert_eq!(config.rules.agents.len(), 8);
        assert!(config.rules.agents.contains(&"CAMVELEZ".to_string()));
        assert_eq!(config.report.top_plants, 3);
        assert_eq!(config.columns.coordinator, "BILLING COORDINATORS");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_category_priority() {
        let order: Vec<Category> = Config::default()
            .rules
            .categories
            .iter()
            .map(|r| r.category)
            .collect();
        assert_eq!(
            order,
            vec![
                Category::Contract,
                Category::Pricing,
                Category::Interface,
                Category::Incomplete,
                Category::Inventory,
                Category::Stpo,
            ]
        );
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
output_dir = "reports"
verbose = true

[rules]
exclusion_marker = "BATCHMAN"
agents = ["AGENT1", "AGENT2"]

[[rules.categories]]
category = "STPO"
triggers = ["STPO"]

[[rules.categories]]
category = "Contract"
triggers = ["Contract"]

[report]
top_plants = 5

[columns]
description = "Description"
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.general.output_dir, "reports");
        assert!(config.general.verbose);
        assert_eq!(config.rules.exclusion_marker, "BATCHMAN");
        assert_eq!(config.rules.agents, vec!["AGENT1", "AGENT2"]);
        assert_eq!(config.rules.categories[0].category, Category::Stpo);
        assert_eq!(config.rules.categories[1].category, Category::Contract);
        assert_eq!(config.report.top_plants, 5);
        assert_eq!(config.columns.description, "Description");
        assert_eq!(config.columns.plant, "Plant");
        assert_eq!(config.inventory.filters.len(), 2);
    }

    #[test]
    fn test_validate_rejects_bad_rules() {
        let mut config = Config::default();
        config.rules.categories.push(CategoryRule::new(Category::Contract, &["x"]));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DuplicateCategory(_))
        ));

        let mut config = Config::default();
        config.rules.categories.push(CategoryRule::new(Category::Other, &["x"]));
        assert!(matches!(config.validate(), Err(ConfigError::OtherHasTriggers)));

        let mut config = Config::default();
        config.report.top_plants = 0;
        assert!(matches!(config.validate(), Err(ConfigError::ZeroTopPlants)));

        let mut config = Config::default();
        config.rules.exclusion_marker.clear();
        assert!(matches!(config.validate(), Err(ConfigError::EmptyMarker)));
    }

    #[test]
    fn test_inventory_units_in_order() {
        let config = Config::default();
        assert_eq!(config.inventory.units(), vec!["TON", "TO", "YD3"]);
    }

    #[test]
    fn test_default_output_path() {
        let config = Config::default();
        let path = config.default_output_path("August", "xlsx");
        assert_eq!(path, Path::new("output").join("Performance_August.xlsx"));
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(!toml_str.is_empty());
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[rules]"));
        assert!(toml_str.contains("[[rules.categories]]"));
        assert!(toml_str.contains("[columns]"));

        let reparsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(reparsed.rules.categories.len(), 6);
    }

    #[test]
    fn test_resolve_rejects_malformed_default_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(DEFAULT_CONFIG_FILE), "[rules]\nagents = 42\n").unwrap();

        let err = Config::resolve(None, dir.path()).unwrap_err();
        assert!(format!("{:#}", err).contains(DEFAULT_CONFIG_FILE));
    }

    #[test]
    fn test_resolve_default_file_and_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::resolve(None, dir.path()).unwrap();
        assert_eq!(config.report.top_plants, 3);

        std::fs::write(dir.path().join(DEFAULT_CONFIG_FILE), "[report]\ntop_plants = 7\n").unwrap();
        let config = Config::resolve(None, dir.path()).unwrap();
        assert_eq!(config.report.top_plants, 7);

        let missing = dir.path().join("missing.toml");
        assert!(Config::resolve(Some(&missing), dir.path()).is_err());
    }

    #[test]
    fn test_merge_trims_agent_list() {
        use clap::Parser;

        let args = crate::cli::Args::try_parse_from([
            "billing-kpi",
            "-i",
            "db.csv",
            "--coordinators",
            "coord.csv",
            "--agents",
            "CAMVELEZ, SRUGELES",
        ])
        .unwrap();

        let mut config = Config::default();
        config.merge_with_args(&args);
        assert_eq!(config.rules.agents, vec!["CAMVELEZ", "SRUGELES"]);
    }
}
