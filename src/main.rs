//! Billing KPI - incident ETL for billing coordinators
//!
//! Loads the incident export and the plant to coordinator mapping, drops
//! automated work items, joins, filters to the tracked agents, categorizes
//! every incident and writes a seven-sheet KPI report.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Any error (missing input, bad config, write failure, etc.)

mod analysis;
mod cli;
mod config;
mod error;
mod loader;
mod models;
mod pipeline;
mod processing;
mod report;

use anyhow::{Context, Result};
use chrono::{Local, Utc};
use cli::{Args, OutputFormat};
use config::{Config, DEFAULT_CONFIG_FILE};
use loader::LoadOptions;
use pipeline::PipelineOutput;
use report::{Report, ReportMetadata};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    init_logging(&args)?;

    info!("Billing KPI v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    if let Err(e) = run(args) {
        error!("Run failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .billing-kpi.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            DEFAULT_CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", DEFAULT_CONFIG_FILE);
    println!("   Edit it to customize agents, category triggers, columns, and more.");
    Ok(())
}

/// Initialize logging; `RUST_LOG` overrides the CLI level.
fn init_logging(args: &Args) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.log_level().to_string()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}

/// Run the complete ETL workflow.
fn run(args: Args) -> Result<()> {
    let start_time = Instant::now();

    let mut config = load_config(&args)?;
    config.merge_with_args(&args);
    config.validate().context("Invalid configuration")?;

    let incidents_path = args
        .incidents
        .clone()
        .context("Incident file is required")?;
    let coordinators_path = args
        .coordinators
        .clone()
        .context("Coordinator file is required")?;

    let options = LoadOptions {
        normalize_work_item_text: config.rules.normalize_work_item_text,
        show_progress: !args.quiet,
    };

    // Step 1: Load both tables
    println!("📥 Loading incidents: {}", incidents_path.display());
    let incidents = loader::load_incidents(&incidents_path, &config.columns, &options)
        .context("Failed to load incident file")?;
    if incidents.is_empty() {
        warn!("Incident file has no data rows");
    }
    println!("📥 Loading coordinators: {}", coordinators_path.display());
    let mapping = loader::load_coordinators(&coordinators_path, &config.columns, &options)
        .context("Failed to load coordinator file")?;

    // Step 2: Clean, join, filter, categorize
    println!("\n🔬 Processing {} incident rows...", incidents.len());
    let output = pipeline::run(&config, incidents, &mapping);

    if args.dry_run {
        print_statistics(&output, &config);
        println!("\n✅ Dry run complete. No report was written.");
        return Ok(());
    }

    // Step 3: Build and save the report
    println!("\n📝 Generating report...");
    let tables = report::build_tables(&output, &config);

    let output_path = resolve_output_path(&args, &config);
    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create output directory {}", parent.display())
            })?;
        }
    }

    match args.format {
        OutputFormat::Xlsx => report::write_workbook(&tables, &output_path)?,
        OutputFormat::Json => {
            let report = Report {
                metadata: ReportMetadata {
                    generated_at: Utc::now(),
                    incidents_file: incidents_path.display().to_string(),
                    coordinators_file: coordinators_path.display().to_string(),
                    duration_seconds: start_time.elapsed().as_secs_f64(),
                    stats: output.stats.clone(),
                },
                tables,
            };
            report::write_json_report(&report, &output_path)?;
        }
    }

    print_statistics(&output, &config);
    println!("   Duration: {:.1}s", start_time.elapsed().as_secs_f64());
    println!(
        "\n✅ Report complete! Saved to: {}",
        output_path.display()
    );

    Ok(())
}

/// `--output` if given, otherwise the month-named default.
fn resolve_output_path(args: &Args, config: &Config) -> PathBuf {
    match args.output {
        Some(ref path) => path.clone(),
        None => {
            let month = Local::now().format("%B").to_string();
            config.default_output_path(&month, args.format.extension())
        }
    }
}

fn print_statistics(output: &PipelineOutput, config: &Config) {
    let stats = &output.stats;

    println!("\n📊 Pipeline Summary:");
    println!("   Rows loaded: {}", stats.rows_loaded);
    println!("   Removed by marker: {}", stats.rows_removed_by_marker);
    println!(
        "   Joined: {} of {} ({:.1}% matched, {} dropped, {} plants without coordinator)",
        stats.join.rows_after,
        stats.join.rows_before,
        stats.join.match_rate(),
        stats.join.rows_dropped(),
        stats.join.unmatched_plants
    );
    println!("   After agent filter: {}", stats.rows_after_agent_filter);
    println!(
        "   APEX rows: {} | COMMAND rows: {}",
        stats.apex_rows, stats.command_rows
    );
    println!(
        "   Quality: {} duplicate rows, {} plants, {} distinct descriptions",
        stats.quality.duplicate_rows, stats.quality.unique_plants, stats.quality.unique_descriptions
    );

    if config.general.verbose {
        println!("\n   Rows per agent:");
        for (agent, count) in &stats.agent_counts {
            println!("     👤 {}: {}", agent, count);
        }
        println!("\n   Rows per category:");
        for (category, count) in &stats.category_distribution {
            println!("     🏷️  {}: {}", category, count);
        }
        if !stats.join.unmatched_examples.is_empty() {
            println!(
                "\n   Unmatched plants (sample): {}",
                stats.join.unmatched_examples.join(", ")
            );
        }
    }
}

/// Load configuration from `--config`, the default file, or defaults.
fn load_config(args: &Args) -> Result<Config> {
    match args.config {
        Some(ref config_path) => info!("Loading config from: {}", config_path.display()),
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
            info!("Loading default config from {}", DEFAULT_CONFIG_FILE)
        }
        None => debug!("No config file found, using defaults"),
    }

    Config::resolve(args.config.as_deref(), Path::new("."))
}
