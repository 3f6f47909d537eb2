//! Format-neutral sheet model shared by the XLSX and JSON writers.

use serde::Serialize;

/// Header of the single column shown when a sheet has no rows.
pub const MESSAGE_HEADER: &str = "Message";

/// One typed cell. The variant decides the number format in the workbook.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Empty,
    Text(String),
    /// Integral count.
    Count(usize),
    /// Numeric source value, general format.
    Number(f64),
    /// Two-decimal value such as an average.
    Decimal(f64),
    /// Percentage already scaled to 0..100.
    Percent(f64),
}

impl Cell {
    /// Coerce a raw CSV cell: blanks become empty, numbers become numeric.
    ///
    /// Codes with a leading zero stay text so "0105" keeps its zero.
    pub fn from_raw(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Cell::Empty;
        }

        let leading_zero = trimmed.len() > 1 && trimmed.starts_with('0') && !trimmed.starts_with("0.");
        if !leading_zero {
            if let Ok(n) = trimmed.parse::<f64>() {
                if n.is_finite() {
                    return Cell::Number(n);
                }
            }
        }

        Cell::Text(raw.to_string())
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<usize> for Cell {
    fn from(value: usize) -> Self {
        Cell::Count(value)
    }
}

/// A named sheet: header row plus data rows of equal width.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(name: impl Into<String>, headers: Vec<String>) -> Self {
        Self {
            name: name.into(),
            headers,
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: Vec<Cell>) {
        debug_assert_eq!(row.len(), self.headers.len(), "row width in {}", self.name);
        self.rows.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Headers and rows as written: an empty table collapses to a single
    /// `Message` column.
    pub fn rendered(&self) -> (Vec<String>, Vec<Vec<Cell>>) {
        if self.is_empty() {
            (
                vec![MESSAGE_HEADER.to_string()],
                vec![vec![Cell::Text(format!("No rows found for {}", self.name))]],
            )
        } else {
            (self.headers.clone(), self.rows.clone())
        }
    }
}

/// Owned header list from string literals.
pub fn headers(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_raw() {
        assert_eq!(Cell::from_raw(""), Cell::Empty);
        assert_eq!(Cell::from_raw("   "), Cell::Empty);
        assert_eq!(Cell::from_raw("1234"), Cell::Number(1234.0));
        assert_eq!(Cell::from_raw("12.5"), Cell::Number(12.5));
        assert_eq!(Cell::from_raw("0"), Cell::Number(0.0));
        assert_eq!(Cell::from_raw("0.25"), Cell::Number(0.25));
        assert_eq!(Cell::from_raw("0105"), Cell::Text("0105".to_string()));
        assert_eq!(Cell::from_raw("TON"), Cell::Text("TON".to_string()));
        assert_eq!(Cell::from_raw("NaN"), Cell::Text("NaN".to_string()));
    }

    #[test]
    fn test_empty_table_renders_message() {
        let table = Table::new("APEX", headers(&["Agent", "Plant"]));
        let (cols, rows) = table.rendered();
        assert_eq!(cols, vec![MESSAGE_HEADER]);
        assert_eq!(rows.len(), 1);
        assert!(matches!(&rows[0][0], Cell::Text(t) if t.contains("APEX")));
    }

    #[test]
    fn test_cells_serialize_untagged() {
        let row = vec![
            Cell::from("CAMVELEZ"),
            Cell::Count(3),
            Cell::Percent(42.64),
            Cell::Empty,
        ];
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"["CAMVELEZ",3,42.64,null]"#);
    }
}
