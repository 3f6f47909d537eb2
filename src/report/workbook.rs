//! XLSX rendering of report tables.

use super::table::{Cell, Table};
use anyhow::{Context, Result};
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use std::path::Path;

struct Formats {
    header: Format,
    decimal: Format,
    percent: Format,
}

impl Formats {
    fn new() -> Self {
        Self {
            header: Format::new().set_bold(),
            decimal: Format::new().set_num_format("0.00"),
            percent: Format::new().set_num_format("0.00\"%\""),
        }
    }
}

/// Build a workbook with one worksheet per table, in order.
pub fn build_workbook(tables: &[Table]) -> Result<Workbook> {
    let formats = Formats::new();
    let mut workbook = Workbook::new();

    for table in tables {
        let sheet = workbook.add_worksheet();
        sheet
            .set_name(&table.name)
            .with_context(|| format!("Invalid sheet name '{}'", table.name))?;
        write_table(sheet, table, &formats)
            .with_context(|| format!("Failed to write sheet '{}'", table.name))?;
    }

    Ok(workbook)
}

/// Write all tables to an `.xlsx` file.
pub fn write_workbook(tables: &[Table], path: &Path) -> Result<()> {
    let mut workbook = build_workbook(tables)?;
    workbook
        .save(path)
        .with_context(|| format!("Failed to save workbook to {}", path.display()))?;
    Ok(())
}

fn write_table(sheet: &mut Worksheet, table: &Table, formats: &Formats) -> Result<()> {
    let (headers, rows) = table.rendered();

    for (col, header) in headers.iter().enumerate() {
        sheet.write_with_format(0, col as u16, header.as_str(), &formats.header)?;
    }

    for (i, row) in rows.iter().enumerate() {
        let r = i as u32 + 1;
        for (col, cell) in row.iter().enumerate() {
            let c = col as u16;
            match cell {
                Cell::Empty => {}
                Cell::Text(text) => {
                    sheet.write_string(r, c, text)?;
                }
                Cell::Count(n) => {
                    sheet.write_number(r, c, *n as f64)?;
                }
                Cell::Number(n) => {
                    sheet.write_number(r, c, *n)?;
                }
                Cell::Decimal(n) => {
                    sheet.write_number_with_format(r, c, *n, &formats.decimal)?;
                }
                Cell::Percent(n) => {
                    sheet.write_number_with_format(r, c, *n, &formats.percent)?;
                }
            }
        }
    }

    sheet.autofit();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::table::headers;
    use tempfile::TempDir;

    fn sample_tables() -> Vec<Table> {
        let mut plants = Table::new("Plants", headers(&["Agent", "Plant", "Percentage", "Count"]));
        plants.push(vec![
            Cell::from("CAMVELEZ"),
            Cell::from_raw("1234"),
            Cell::Percent(42.64),
            Cell::Count(2),
        ]);
        let empty = Table::new("APEX", headers(&["Agent"]));
        vec![plants, empty]
    }

    #[test]
    fn test_write_workbook() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.xlsx");

        write_workbook(&sample_tables(), &path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        // xlsx is a zip container
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn test_invalid_sheet_name_is_an_error() {
        let tables = vec![Table::new("bad/name", headers(&["A"]))];
        assert!(build_workbook(&tables).is_err());
    }
}
