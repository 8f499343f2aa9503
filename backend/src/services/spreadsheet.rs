//! Spreadsheet reader for uploaded files
//!
//! Turns uploaded bytes into a [`Sheet`]: workbooks (xlsx, xlsm, xlsb, xls,
//! ods) through calamine, first worksheet only, and CSV through the csv
//! crate. Anything that cannot be read fails with `PipelineError::Parse`.

use calamine::{open_workbook_auto_from_rs, Data, DataType, Reader};
use chrono::NaiveDate;
use sha2::{Digest, Sha256};
use std::io::Cursor;
use std::path::Path;

use crate::error::{AppError, AppResult};
use shared::{CellValue, PipelineError, Sheet};

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// A file received in a multipart upload
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }

    /// Hex SHA-256 of the file contents
    pub fn fingerprint(&self) -> String {
        format!("{:x}", Sha256::digest(&self.bytes))
    }

    /// Refuse uploads larger than `max_bytes`
    pub fn ensure_within(&self, max_bytes: usize) -> AppResult<()> {
        if self.bytes.len() > max_bytes {
            return Err(AppError::Validation {
                field: "file".to_string(),
                message: format!(
                    "File is {} bytes; the limit is {} bytes",
                    self.bytes.len(),
                    max_bytes
                ),
                message_zh: "文件过大".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetFormat {
    Workbook,
    Csv,
}

/// Pick the reader from the extension, then from the leading bytes
pub fn detect_format(file_name: &str, bytes: &[u8]) -> SheetFormat {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match extension.as_deref() {
        Some("xlsx" | "xlsm" | "xlsb" | "xls" | "ods") => SheetFormat::Workbook,
        Some("csv" | "txt") => SheetFormat::Csv,
        _ if bytes.starts_with(ZIP_MAGIC) || bytes.starts_with(OLE_MAGIC) => SheetFormat::Workbook,
        _ => SheetFormat::Csv,
    }
}

/// Read the uploaded file into headers and data rows
pub fn read_sheet(file: &UploadedFile) -> Result<Sheet, PipelineError> {
    let raw = match detect_format(&file.file_name, &file.bytes) {
        SheetFormat::Workbook => read_workbook(&file.bytes)?,
        SheetFormat::Csv => read_csv(&file.bytes)?,
    };

    let sheet = Sheet::from_raw_rows(raw)?;
    tracing::debug!(
        file = %file.file_name,
        columns = sheet.headers.len(),
        rows = sheet.row_count(),
        "spreadsheet parsed"
    );
    Ok(sheet)
}

fn read_workbook(bytes: &[u8]) -> Result<Vec<Vec<CellValue>>, PipelineError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| PipelineError::parse(e.to_string()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| PipelineError::parse("the workbook has no worksheets"))?
        .map_err(|e| PipelineError::parse(e.to_string()))?;

    // The range starts at the first used cell; keep row numbers true to the file
    let leading_rows = range.start().map_or(0, |(row, _)| row as usize);
    let mut rows: Vec<Vec<CellValue>> = vec![Vec::new(); leading_rows];
    rows.extend(
        range
            .rows()
            .map(|cells| cells.iter().map(convert_cell).collect()),
    );
    Ok(rows)
}

fn convert_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty | Data::Error(_) => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(_) => cell
            .as_date()
            .map_or_else(|| CellValue::Text(cell.to_string()), CellValue::Date),
        Data::DateTimeIso(s) => iso_date(s).map_or_else(|| CellValue::Text(s.clone()), CellValue::Date),
        Data::DurationIso(s) => CellValue::Text(s.clone()),
    }
}

fn read_csv(bytes: &[u8]) -> Result<Vec<Vec<CellValue>>, PipelineError> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    reader
        .records()
        .map(|record| -> Result<Vec<CellValue>, PipelineError> {
            let record = record.map_err(|e| PipelineError::parse(e.to_string()))?;
            Ok(record.iter().map(csv_cell).collect())
        })
        .collect()
}

fn csv_cell(field: &str) -> CellValue {
    if field.trim().is_empty() {
        CellValue::Empty
    } else {
        CellValue::Text(field.to_string())
    }
}

/// Date cells stored as ISO text (ods)
fn iso_date(text: &str) -> Option<NaiveDate> {
    let date_part = text.split(['T', ' ']).next()?;
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}
