//! Error types for input loading and configuration.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure while reading one of the two input tables.
///
/// Any of these aborts the run before a single transformation executes.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("input file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("{table} is missing required column '{column}'")]
    MissingColumn { table: &'static str, column: String },
    #[error("{table} row {row}: column '{column}' has malformed number '{value}'")]
    MalformedNumber {
        table: &'static str,
        row: usize,
        column: String,
        value: String,
    },
    #[error("failed to parse {table}: {source}")]
    Csv {
        table: &'static str,
        #[source]
        source: csv::Error,
    },
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Configuration that parses but cannot drive the pipeline.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("category '{0}' is listed more than once in the rule table")]
    DuplicateCategory(String),
    #[error("category 'Other' is the fallback and cannot carry triggers")]
    OtherHasTriggers,
    #[error("category '{0}' has an empty trigger")]
    EmptyTrigger(String),
    #[error("exclusion marker must not be empty")]
    EmptyMarker,
    #[error("top plants must be at least 1")]
    ZeroTopPlants,
    #[error("inventory filter #{0} needs a keyword and at least one unit")]
    InvalidInventoryFilter(usize),
}
