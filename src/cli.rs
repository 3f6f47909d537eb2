//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// Billing KPI - incident ETL for billing coordinators
///
/// Cleans the incident export, joins it with the billing coordinator
/// mapping, categorizes every incident and writes a seven-sheet KPI report.
///
/// Examples:
///   billing-kpi --incidents db.csv --coordinators coordinators.csv
///   billing-kpi -i db.csv --coordinators coordinators.csv --format json -o kpi.json
///   billing-kpi -i db.csv --coordinators coordinators.csv --dry-run
///   billing-kpi --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Incident export (CSV with a header row)
    #[arg(
        short,
        long,
        value_name = "FILE",
        required_unless_present = "init_config",
        env = "BILLING_KPI_INCIDENTS"
    )]
    pub incidents: Option<PathBuf>,

    /// Plant to billing coordinator mapping (CSV with a header row)
    #[arg(
        long,
        value_name = "FILE",
        required_unless_present = "init_config",
        env = "BILLING_KPI_COORDINATORS"
    )]
    pub coordinators: Option<PathBuf>,

    /// Output file path for the report
    ///
    /// Defaults to <output_dir>/Performance_<Month>.<ext> from the config.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (xlsx, json)
    #[arg(long, default_value = "xlsx", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Path to configuration file
    ///
    /// If not specified, looks for .billing-kpi.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Agents to keep (comma-separated), replacing the configured list
    ///
    /// Example: --agents CAMVELEZ,SRUGELES
    #[arg(long, value_name = "AGENTS", value_delimiter = ',')]
    pub agents: Option<Vec<String>>,

    /// Work-item text marker of rows to discard
    #[arg(long, value_name = "TEXT")]
    pub marker: Option<String>,

    /// Plant/category combinations listed per agent on the Plants sheet
    #[arg(long, value_name = "COUNT")]
    pub top_plants: Option<usize>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Dry run: run the pipeline and print statistics without writing a report
    #[arg(long)]
    pub dry_run: bool,

    /// Generate a default .billing-kpi.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Excel workbook, one sheet per table (default)
    #[default]
    Xlsx,
    /// JSON document with metadata and every table
    Json,
}

impl OutputFormat {
    /// File extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Xlsx => "xlsx",
            OutputFormat::Json => "json",
        }
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        for (label, path) in [
            ("Incident file", &self.incidents),
            ("Coordinator file", &self.coordinators),
        ] {
            match path {
                None => return Err(format!("{} is required", label)),
                Some(p) if !p.is_file() => {
                    return Err(format!("{} does not exist: {}", label, p.display()));
                }
                Some(_) => {}
            }
        }

        if self.top_plants == Some(0) {
            return Err("Top plants must be at least 1".to_string());
        }

        if let Some(ref marker) = self.marker {
            if marker.is_empty() {
                return Err("Marker must not be empty".to_string());
            }
        }

        if let Some(ref agents) = self.agents {
            if agents.iter().any(|a| a.trim().is_empty()) {
                return Err("Agent list contains an empty entry".to_string());
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
