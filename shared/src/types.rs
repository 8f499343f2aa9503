//! Spreadsheet value types shared by the reader, validator and browser preview

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// A single raw cell as read from a workbook or CSV file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDate),
}

impl CellValue {
    /// True for null cells and whitespace-only text
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Render the cell the way a spreadsheet would display it
    pub fn to_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.trim().to_string(),
            CellValue::Number(n) => format_number(*n),
            CellValue::Bool(b) => b.to_string(),
            CellValue::Date(d) => d.format("%Y-%m-%d").to_string(),
        }
    }
}

impl From<&serde_json::Value> for CellValue {
    fn from(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => CellValue::Empty,
            serde_json::Value::Bool(b) => CellValue::Bool(*b),
            serde_json::Value::Number(n) => n.as_f64().map_or(CellValue::Empty, CellValue::Number),
            serde_json::Value::String(s) => CellValue::Text(s.clone()),
            other => CellValue::Text(other.to_string()),
        }
    }
}

/// Whole numbers print without a trailing ".0" so SKUs like 10023 survive
fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// A data row together with its 1-based row number in the source file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetRow {
    pub line: usize,
    pub cells: Vec<CellValue>,
}

/// A parsed sheet: one header row followed by non-empty data rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sheet {
    pub headers: Vec<String>,
    pub rows: Vec<SheetRow>,
}

impl Sheet {
    /// Build a sheet from raw rows in file order.
    ///
    /// The first row that is not entirely blank becomes the header row. Every
    /// later row that is entirely blank is dropped; the rest are padded or
    /// truncated to the header width.
    pub fn from_raw_rows(raw: Vec<Vec<CellValue>>) -> Result<Self, PipelineError> {
        let mut numbered = raw
            .into_iter()
            .enumerate()
            .filter(|(_, cells)| !cells.iter().all(CellValue::is_blank));

        let (_, header_cells) = numbered
            .next()
            .ok_or_else(|| PipelineError::parse("the file contains no rows"))?;

        let headers = normalize_headers(&header_cells);
        let width = headers.len();

        let rows = numbered
            .map(|(idx, mut cells)| {
                cells.resize(width, CellValue::Empty);
                SheetRow {
                    line: idx + 1,
                    cells,
                }
            })
            .collect();

        Ok(Self { headers, rows })
    }

    pub fn column_index(&self, header: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == header)
    }

    /// Cell of `row` under `header`, or `Empty` when the column is unknown
    pub fn cell<'a>(&self, row: &'a SheetRow, header: &str) -> &'a CellValue {
        const EMPTY: &CellValue = &CellValue::Empty;
        self.column_index(header)
            .and_then(|idx| row.cells.get(idx))
            .unwrap_or(EMPTY)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Header texts are trimmed; blanks get a positional name and duplicates a
/// numeric suffix so every header addresses exactly one column.
fn normalize_headers(cells: &[CellValue]) -> Vec<String> {
    let mut headers: Vec<String> = Vec::with_capacity(cells.len());
    for (idx, cell) in cells.iter().enumerate() {
        let mut name = cell.to_text();
        if name.is_empty() {
            name = format!("Column {}", idx + 1);
        }
        if headers.contains(&name) {
            let mut n = 2;
            while headers.contains(&format!("{} ({})", name, n)) {
                n += 1;
            }
            name = format!("{} ({})", name, n);
        }
        headers.push(name);
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    #[test]
    fn test_blank_cells() {
        assert!(CellValue::Empty.is_blank());
        assert!(text("   ").is_blank());
        assert!(!text("A1").is_blank());
        assert!(!CellValue::Number(0.0).is_blank());
    }

    #[test]
    fn test_number_rendering() {
        assert_eq!(CellValue::Number(10023.0).to_text(), "10023");
        assert_eq!(CellValue::Number(2.5).to_text(), "2.5");
    }

    #[test]
    fn test_first_non_empty_row_is_header() {
        let sheet = Sheet::from_raw_rows(vec![
            vec![CellValue::Empty, text("")],
            vec![text("SKU"), text("Name")],
            vec![text("A1"), text("Widget")],
        ])
        .unwrap();

        assert_eq!(sheet.headers, vec!["SKU", "Name"]);
        assert_eq!(sheet.rows.len(), 1);
        assert_eq!(sheet.rows[0].line, 3);
    }

    #[test]
    fn test_blank_rows_dropped() {
        let sheet = Sheet::from_raw_rows(vec![
            vec![text("SKU"), text("Name")],
            vec![text("A1"), text("Widget")],
            vec![CellValue::Empty, text("  ")],
            vec![text("B2"), CellValue::Empty],
        ])
        .unwrap();

        assert_eq!(sheet.row_count(), 2);
        assert_eq!(sheet.rows[1].line, 4);
    }

    #[test]
    fn test_zero_rows_is_parse_error() {
        let err = Sheet::from_raw_rows(vec![]).unwrap_err();
        assert_eq!(err.code(), "PARSE_ERROR");

        let err = Sheet::from_raw_rows(vec![vec![CellValue::Empty]]).unwrap_err();
        assert_eq!(err.code(), "PARSE_ERROR");
    }

    #[test]
    fn test_short_rows_padded() {
        let sheet = Sheet::from_raw_rows(vec![
            vec![text("SKU"), text("Name"), text("Qty")],
            vec![text("A1")],
        ])
        .unwrap();

        let row = &sheet.rows[0];
        assert_eq!(row.cells.len(), 3);
        assert_eq!(sheet.cell(row, "Qty"), &CellValue::Empty);
        assert_eq!(sheet.cell(row, "Missing"), &CellValue::Empty);
    }

    #[test]
    fn test_header_normalization() {
        let sheet = Sheet::from_raw_rows(vec![vec![
            text(" Name "),
            CellValue::Empty,
            text("Name"),
        ]])
        .unwrap();

        assert_eq!(sheet.headers, vec!["Name", "Column 2", "Name (2)"]);
    }

    #[test]
    fn test_cell_from_json() {
        assert_eq!(CellValue::from(&serde_json::json!(null)), CellValue::Empty);
        assert_eq!(CellValue::from(&serde_json::json!(3)), CellValue::Number(3.0));
        assert_eq!(CellValue::from(&serde_json::json!("x")), text("x"));
    }
}
