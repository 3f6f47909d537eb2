//! CSV loaders for the incident export and the coordinator mapping.
//!
//! Both loaders resolve their columns by header name, fail fast on a
//! missing column and keep every raw cell so the report can reproduce the
//! source table.

pub mod normalize;

use crate::config::ColumnsConfig;
use crate::error::InputError;
use crate::models::{CoordinatorInfo, CoordinatorMap, IncidentRecord, IncidentTable};
use csv::{ByteRecord, ReaderBuilder, StringRecord};
use indicatif::{ProgressBar, ProgressStyle};
use normalize::{normalize_plant_code, normalize_text, parse_date, parse_quantity};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

const INCIDENT_TABLE: &str = "incident table";
const MAPPING_TABLE: &str = "coordinator mapping";

/// Loader behaviour shared by both tables.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Lowercase and strip codes from the work-item text column.
    pub normalize_work_item_text: bool,
    /// Show a row-count spinner while reading.
    pub show_progress: bool,
}

/// Resolved positions of the incident columns.
struct IncidentColumns {
    description: usize,
    plant: usize,
    agent: usize,
    work_item_text: usize,
    ticket_id: usize,
    delivery_quantity: usize,
    base_unit: usize,
    start_date: usize,
    end_date: usize,
}

impl IncidentColumns {
    fn resolve(headers: &[String], columns: &ColumnsConfig) -> Result<Self, InputError> {
        let find = |name: &str| column_index(headers, name, INCIDENT_TABLE);
        Ok(Self {
            description: find(&columns.description)?,
            plant: find(&columns.plant)?,
            agent: find(&columns.agent)?,
            work_item_text: find(&columns.work_item_text)?,
            ticket_id: find(&columns.ticket_id)?,
            delivery_quantity: find(&columns.delivery_quantity)?,
            base_unit: find(&columns.base_unit)?,
            start_date: find(&columns.start_date)?,
            end_date: find(&columns.end_date)?,
        })
    }
}

fn column_index(headers: &[String], name: &str, table: &'static str) -> Result<usize, InputError> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| InputError::MissingColumn {
            table,
            column: name.to_string(),
        })
}

fn read_headers<R: Read>(
    reader: &mut csv::Reader<R>,
    table: &'static str,
) -> Result<Vec<String>, InputError> {
    let headers: &StringRecord = reader
        .headers()
        .map_err(|source| InputError::Csv { table, source })?;
    Ok(headers.iter().map(|h| h.trim().to_string()).collect())
}

/// Decode a raw record, replacing invalid UTF-8 instead of failing.
fn decode_record(record: &ByteRecord, width: usize) -> Vec<String> {
    (0..width)
        .map(|idx| {
            record
                .get(idx)
                .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
                .unwrap_or_default()
        })
        .collect()
}

fn csv_reader<R: Read>(input: R) -> csv::Reader<R> {
    ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(input)
}

fn open(path: &Path) -> Result<File, InputError> {
    if !path.is_file() {
        return Err(InputError::NotFound(path.to_path_buf()));
    }
    Ok(File::open(path)?)
}

/// Spinner counting rows while a table is read.
pub fn row_spinner(label: &str, visible: bool) -> Option<ProgressBar> {
    if !visible {
        return None;
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg} [{elapsed_precise}] {pos} rows")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(label.to_string());
    Some(pb)
}

/// Load the incident export from a CSV file.
pub fn load_incidents(
    path: &Path,
    columns: &ColumnsConfig,
    options: &LoadOptions,
) -> Result<IncidentTable, InputError> {
    info!("Loading incidents from: {}", path.display());
    let file = open(path)?;
    let spinner = row_spinner("Reading incidents", options.show_progress);
    let table = read_incidents(file, columns, options, spinner.as_ref());
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    table
}

/// Read incident rows from any CSV source.
pub fn read_incidents<R: Read>(
    input: R,
    columns: &ColumnsConfig,
    options: &LoadOptions,
    progress: Option<&ProgressBar>,
) -> Result<IncidentTable, InputError> {
    let mut reader = csv_reader(input);
    let headers = read_headers(&mut reader, INCIDENT_TABLE)?;
    let idx = IncidentColumns::resolve(&headers, columns)?;

    let mut records = Vec::new();
    let mut raw = ByteRecord::new();
    let mut row = 0;

    while reader
        .read_byte_record(&mut raw)
        .map_err(|source| InputError::Csv {
            table: INCIDENT_TABLE,
            source,
        })?
    {
        row += 1;
        let mut cells = decode_record(&raw, headers.len());

        if options.normalize_work_item_text {
            cells[idx.work_item_text] = normalize_text(&cells[idx.work_item_text]);
        }

        let quantity_raw = &cells[idx.delivery_quantity];
        let delivery_quantity =
            parse_quantity(quantity_raw).ok_or_else(|| InputError::MalformedNumber {
                table: INCIDENT_TABLE,
                row,
                column: columns.delivery_quantity.clone(),
                value: quantity_raw.clone(),
            })?;

        records.push(IncidentRecord {
            row,
            description: cells[idx.description].clone(),
            plant: normalize_plant_code(&cells[idx.plant]),
            agent: cells[idx.agent].trim().to_string(),
            work_item_text: cells[idx.work_item_text].clone(),
            ticket_id: cells[idx.ticket_id].trim().to_string(),
            delivery_quantity,
            base_unit: cells[idx.base_unit].trim().to_string(),
            start_date: parse_date(&cells[idx.start_date]),
            end_date: parse_date(&cells[idx.end_date]),
            cells,
        });

        if let Some(pb) = progress {
            pb.inc(1);
        }
    }

    let mut undated = records
        .iter()
        .filter(|r| r.start_date.is_none() || r.end_date.is_none());
    if let Some(first) = undated.next() {
        debug!(
            "{} incident rows have a missing or unreadable date (first at row {})",
            undated.count() + 1,
            first.row
        );
    }
    info!("Loaded {} incident rows ({} columns)", records.len(), headers.len());

    Ok(IncidentTable { headers, records })
}

/// Load the plant to coordinator mapping from a CSV file.
pub fn load_coordinators(
    path: &Path,
    columns: &ColumnsConfig,
    options: &LoadOptions,
) -> Result<CoordinatorMap, InputError> {
    info!("Loading coordinator mapping from: {}", path.display());
    let file = open(path)?;
    let spinner = row_spinner("Reading coordinators", options.show_progress);
    let map = read_coordinators(file, columns, spinner.as_ref());
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    map
}

/// Read mapping rows from any CSV source.
///
/// Rows with an empty plant code cannot join and are skipped.
pub fn read_coordinators<R: Read>(
    input: R,
    columns: &ColumnsConfig,
    progress: Option<&ProgressBar>,
) -> Result<CoordinatorMap, InputError> {
    let mut reader = csv_reader(input);
    let headers = read_headers(&mut reader, MAPPING_TABLE)?;

    let plant = column_index(&headers, &columns.mapping_plant, MAPPING_TABLE)?;
    let coordinator = column_index(&headers, &columns.coordinator, MAPPING_TABLE)?;
    let region = column_index(&headers, &columns.region, MAPPING_TABLE)?;
    let market = column_index(&headers, &columns.market, MAPPING_TABLE)?;
    let stronghold = headers.iter().position(|h| h == &columns.stronghold);
    if stronghold.is_none() {
        debug!("Coordinator mapping has no '{}' column", columns.stronghold);
    }

    let mut rows = Vec::new();
    let mut raw = ByteRecord::new();
    let mut skipped = 0;

    while reader
        .read_byte_record(&mut raw)
        .map_err(|source| InputError::Csv {
            table: MAPPING_TABLE,
            source,
        })?
    {
        let cells = decode_record(&raw, headers.len());
        if let Some(pb) = progress {
            pb.inc(1);
        }

        let plant_code = normalize_plant_code(&cells[plant]);
        if plant_code.is_empty() {
            skipped += 1;
            continue;
        }

        rows.push((
            plant_code,
            CoordinatorInfo {
                coordinator: cells[coordinator].trim().to_string(),
                region: cells[region].trim().to_string(),
                market: cells[market].trim().to_string(),
                stronghold: stronghold
                    .map(|i| cells[i].trim().to_string())
                    .unwrap_or_default(),
            },
        ));
    }

    if skipped > 0 {
        warn!("Skipped {} coordinator rows without a plant code", skipped);
    }

    let map = CoordinatorMap::from_rows(rows);
    for dup in map.duplicate_plants() {
        warn!("Plant {} is mapped more than once; keeping the first row", dup);
    }
    info!(
        "Loaded {} coordinator rows covering {} plants",
        map.row_count(),
        map.plant_count()
    );

    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    const HEADER: &str = "Task text,Plant,Sales Office,Work item text,ID,Date,Delivery quantity,Base Unit of Measure,Actual (last) agent,OK - Actual End Date of Work Item";

    fn incidents(body: &str) -> String {
        format!("{}\n{}", HEADER, body)
    }

    #[test]
    fn test_read_incidents() {
        let csv = incidents(
            "JWS/APEX - STPO Errors,1234.0,SO1,Order 55 is open,T-1,2025-08-01,12.5,TON,CAMVELEZ,2025-08-03\n\
             COMMAND - Assign Contract, 77 ,SO2,,T-2,,,YD3, SRUGELES ,\n",
        );
        let table =
            read_incidents(csv.as_bytes(), &ColumnsConfig::default(), &LoadOptions::default(), None)
                .unwrap();

        assert_eq!(table.headers.len(), 10);
        assert_eq!(table.len(), 2);

        let first = &table.records[0];
        assert_eq!(first.row, 1);
        assert_eq!(first.description, "JWS/APEX - STPO Errors");
        assert_eq!(first.plant, "1234");
        assert_eq!(first.cells[1], "1234.0");
        assert_eq!(first.delivery_quantity, 12.5);
        assert_eq!(first.days_spent(), 2.0);

        let second = &table.records[1];
        assert_eq!(second.plant, "77");
        assert_eq!(second.agent, "SRUGELES");
        assert_eq!(second.delivery_quantity, 0.0);
        assert_eq!(second.start_date, None);
    }

    #[test]
    fn test_missing_column_is_fatal() {
        let csv = "Task text,Plant\nfoo,1\n";
        let err = read_incidents(
            csv.as_bytes(),
            &ColumnsConfig::default(),
            &LoadOptions::default(),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, InputError::MissingColumn { .. }));
        assert!(err.to_string().contains("Actual (last) agent"));
    }

    #[test]
    fn test_malformed_quantity_is_fatal() {
        let csv = incidents("x,1,SO,w,T,2025-01-01,lots,TON,A,2025-01-02\n");
        let err = read_incidents(
            csv.as_bytes(),
            &ColumnsConfig::default(),
            &LoadOptions::default(),
            None,
        )
        .unwrap_err();
        match err {
            InputError::MalformedNumber { row, value, .. } => {
                assert_eq!(row, 1);
                assert_eq!(value, "lots");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_work_item_normalization() {
        let csv = incidents("x,1,SO,Order 820235055 Is Currently Being Processed,T,,,TON,A,\n");
        let options = LoadOptions {
            normalize_work_item_text: true,
            show_progress: false,
        };
        let table =
            read_incidents(csv.as_bytes(), &ColumnsConfig::default(), &options, None).unwrap();
        assert_eq!(
            table.records[0].work_item_text,
            "order is currently being processed"
        );
        assert_eq!(table.records[0].cells[3], "order is currently being processed");
    }

    #[test]
    fn test_read_coordinators() {
        let csv = "Plant,BILLING COORDINATORS,Market Name,Region\n\
                   100,Ana,Texas,South\n\
                   ,Nobody,None,None\n\
                   100.0,Pedro,Texas,South\n\
                   200,Luis,Ohio,North\n";
        let map = read_coordinators(csv.as_bytes(), &ColumnsConfig::default(), None).unwrap();

        assert_eq!(map.plant_count(), 2);
        assert_eq!(map.row_count(), 3);
        let ana = map.get("100").unwrap();
        assert_eq!(ana.coordinator, "Ana");
        assert_eq!(ana.market, "Texas");
        assert_eq!(ana.stronghold, "");
        assert_eq!(map.duplicate_plants().to_vec(), vec!["100".to_string()]);
    }

    #[test]
    fn test_load_from_files() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("coordinators.csv");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "Plant,BILLING COORDINATORS,Market Name,Region,Stronghold").unwrap();
        writeln!(file, "300,Maria,Utah,West,Yes").unwrap();
        drop(file);

        let map =
            load_coordinators(&path, &ColumnsConfig::default(), &LoadOptions::default()).unwrap();
        assert_eq!(map.get("300").unwrap().stronghold, "Yes");

        let missing = dir.path().join("missing.csv");
        let err = load_incidents(&missing, &ColumnsConfig::default(), &LoadOptions::default())
            .unwrap_err();
        assert!(matches!(err, InputError::NotFound(_)));
    }
}
