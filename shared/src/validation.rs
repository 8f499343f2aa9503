//! Row validation for spreadsheet imports
//!
//! Turns raw sheet rows into typed records using a confirmed column mapping.
//! Rows missing a SKU or product name, or with a non-positive or non-numeric
//! quantity or cost, are rejected and left out of the parsed count.

use chrono::{Duration, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::PipelineError;
use crate::models::{
    ColumnMapping, CostSheetRow, InventoryImportRow, QuantitySource, SemanticField,
    SettlementField, SettlementMapping, SettlementRow, COST_SHEET_REQUIRED_FIELDS,
    INVENTORY_REQUIRED_FIELDS,
};
use crate::types::{CellValue, Sheet, SheetRow};

// ============================================================================
// Cell parsing
// ============================================================================

const CURRENCY_SYMBOLS: &[char] = &['$', '¥', '￥', '€', '£', '元'];

/// Numeric value of a cell; text is cleaned of separators and currency marks
pub fn parse_decimal(cell: &CellValue) -> Option<Decimal> {
    match cell {
        CellValue::Number(n) => Decimal::try_from(*n).ok().map(|d| d.normalize()),
        CellValue::Text(s) => {
            let cleaned: String = s
                .chars()
                .filter(|c| !c.is_whitespace() && *c != ',' && !CURRENCY_SYMBOLS.contains(c))
                .collect();
            if cleaned.is_empty() {
                return None;
            }
            Decimal::from_str(&cleaned).ok()
        }
        _ => None,
    }
}

/// Positive whole-number quantity
pub fn parse_quantity(cell: &CellValue) -> Option<i64> {
    let value = parse_decimal(cell)?;
    if value <= Decimal::ZERO || !value.fract().is_zero() {
        return None;
    }
    value.to_i64()
}

/// Decimal places stored for unit costs (`NUMERIC(14, 4)`)
pub const COST_SCALE: u32 = 4;

/// Smallest cost that no longer fits ten integer digits
const COST_LIMIT: Decimal = Decimal::from_parts(1_410_065_408, 2, 0, false, 0);

/// Strictly positive cost rounded half away from zero to [`COST_SCALE`] places.
///
/// Values that round to zero or exceed the stored precision are rejected.
pub fn parse_positive_amount(cell: &CellValue) -> Option<Decimal> {
    parse_decimal(cell)
        .map(|d| d.round_dp_with_strategy(COST_SCALE, RoundingStrategy::MidpointAwayFromZero))
        .filter(|d| *d > Decimal::ZERO && *d < COST_LIMIT)
}

/// Date from a date cell, a spreadsheet serial number or common text forms
pub fn parse_date(cell: &CellValue) -> Option<NaiveDate> {
    match cell {
        CellValue::Date(d) => Some(*d),
        CellValue::Number(n) => date_from_number(*n),
        CellValue::Text(s) => date_from_text(s.trim()),
        _ => None,
    }
}

fn date_from_number(n: f64) -> Option<NaiveDate> {
    if !n.is_finite() || n < 1.0 {
        return None;
    }
    // 20240131 typed as a plain number
    if (19000101.0..=29991231.0).contains(&n) && n.fract() == 0.0 {
        return NaiveDate::parse_from_str(&format!("{}", n as i64), "%Y%m%d").ok();
    }
    // Workbook serial dates count days from 1899-12-30
    if n < 2_958_466.0 {
        let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
        return epoch.checked_add_signed(Duration::days(n.trunc() as i64));
    }
    None
}

fn date_from_text(s: &str) -> Option<NaiveDate> {
    if s.is_empty() {
        return None;
    }
    // Drop a trailing time component such as "2024-01-31 00:00:00"
    let date_part = s.split_whitespace().next().unwrap_or(s);
    ["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d", "%Y%m%d"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
}

fn optional_text(cell: &CellValue) -> Option<String> {
    let text = cell.to_text();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

// ============================================================================
// Row validation
// ============================================================================

/// Why a row was left out of an import
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    MissingSku,
    MissingProductName,
    InvalidQuantity,
    InvalidUnitCost,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectReason::MissingSku => write!(f, "SKU is empty"),
            RejectReason::MissingProductName => write!(f, "Product name is empty"),
            RejectReason::InvalidQuantity => write!(f, "Quantity must be a positive whole number"),
            RejectReason::InvalidUnitCost => write!(f, "Unit cost must be a positive number"),
        }
    }
}

/// A rejected row, kept for display only
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedRow {
    pub line: usize,
    pub reason: RejectReason,
}

/// Accepted records and the rows that were dropped
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport<T> {
    pub accepted: Vec<T>,
    pub rejected: Vec<RejectedRow>,
}

impl<T> ValidationReport<T> {
    pub fn parsed_count(&self) -> usize {
        self.accepted.len()
    }

    fn into_non_empty(self) -> Result<Self, PipelineError> {
        if self.accepted.is_empty() {
            Err(PipelineError::NoValidData)
        } else {
            Ok(self)
        }
    }
}

fn mapped_cell<'a>(
    sheet: &Sheet,
    row: &'a SheetRow,
    mapping: &ColumnMapping,
    field: SemanticField,
) -> &'a CellValue {
    const EMPTY: &CellValue = &CellValue::Empty;
    match mapping.header(field) {
        Some(header) => sheet.cell(row, header),
        None => EMPTY,
    }
}

fn validate_inventory_row(
    sheet: &Sheet,
    row: &SheetRow,
    mapping: &ColumnMapping,
) -> Result<InventoryImportRow, RejectReason> {
    let sku = mapped_cell(sheet, row, mapping, SemanticField::Sku).to_text();
    if sku.is_empty() {
        return Err(RejectReason::MissingSku);
    }

    let product_name = mapped_cell(sheet, row, mapping, SemanticField::ProductName).to_text();
    if product_name.is_empty() {
        return Err(RejectReason::MissingProductName);
    }

    let quantity = match &mapping.quantity {
        Some(QuantitySource::DefaultOne) => 1,
        _ => parse_quantity(mapped_cell(sheet, row, mapping, SemanticField::Quantity))
            .ok_or(RejectReason::InvalidQuantity)?,
    };

    let unit_cost = parse_positive_amount(mapped_cell(sheet, row, mapping, SemanticField::UnitCost))
        .ok_or(RejectReason::InvalidUnitCost)?;

    Ok(InventoryImportRow {
        line: row.line,
        sku,
        product_name,
        quantity,
        unit_cost,
        batch_number: optional_text(mapped_cell(sheet, row, mapping, SemanticField::BatchNumber)),
        expiration_date: parse_date(mapped_cell(
            sheet,
            row,
            mapping,
            SemanticField::ExpirationDate,
        )),
    })
}

/// Validate an inventory sheet against a confirmed mapping.
///
/// Fails with `MappingIncomplete` before looking at any row, and with
/// `NoValidData` when every row is rejected.
pub fn validate_inventory_rows(
    sheet: &Sheet,
    mapping: &ColumnMapping,
) -> Result<ValidationReport<InventoryImportRow>, PipelineError> {
    screen_inventory_rows(sheet, mapping)?.into_non_empty()
}

/// Sort inventory rows into accepted and rejected; the report may be empty
pub fn screen_inventory_rows(
    sheet: &Sheet,
    mapping: &ColumnMapping,
) -> Result<ValidationReport<InventoryImportRow>, PipelineError> {
    mapping.ensure_complete(INVENTORY_REQUIRED_FIELDS, &sheet.headers)?;

    let mut report = ValidationReport {
        accepted: Vec::new(),
        rejected: Vec::new(),
    };
    for row in &sheet.rows {
        match validate_inventory_row(sheet, row, mapping) {
            Ok(record) => report.accepted.push(record),
            Err(reason) => report.rejected.push(RejectedRow {
                line: row.line,
                reason,
            }),
        }
    }

    Ok(report)
}

/// Validate a cost sheet; only SKU and a positive cost are required
pub fn validate_cost_rows(
    sheet: &Sheet,
    mapping: &ColumnMapping,
) -> Result<ValidationReport<CostSheetRow>, PipelineError> {
    screen_cost_rows(sheet, mapping)?.into_non_empty()
}

pub fn screen_cost_rows(
    sheet: &Sheet,
    mapping: &ColumnMapping,
) -> Result<ValidationReport<CostSheetRow>, PipelineError> {
    mapping.ensure_complete(COST_SHEET_REQUIRED_FIELDS, &sheet.headers)?;

    let mut report = ValidationReport {
        accepted: Vec::new(),
        rejected: Vec::new(),
    };
    for row in &sheet.rows {
        let sku = mapped_cell(sheet, row, mapping, SemanticField::Sku).to_text();
        if sku.is_empty() {
            report.rejected.push(RejectedRow {
                line: row.line,
                reason: RejectReason::MissingSku,
            });
            continue;
        }
        match parse_positive_amount(mapped_cell(sheet, row, mapping, SemanticField::UnitCost)) {
            Some(cost) => report.accepted.push(CostSheetRow {
                line: row.line,
                sku,
                cost,
                notes: optional_text(mapped_cell(sheet, row, mapping, SemanticField::Notes)),
            }),
            None => report.rejected.push(RejectedRow {
                line: row.line,
                reason: RejectReason::InvalidUnitCost,
            }),
        }
    }

    Ok(report)
}

/// Settlement lines with a numeric amount; negative amounts (refunds) are kept.
///
/// An empty result is valid and yields an all-zero profit analysis.
pub fn validate_settlement_rows(
    sheet: &Sheet,
    mapping: &SettlementMapping,
) -> Result<Vec<SettlementRow>, PipelineError> {
    mapping.ensure_complete(&sheet.headers)?;

    let cell = |row: &SheetRow, field: SettlementField| -> CellValue {
        mapping
            .header(field)
            .map(|h| sheet.cell(row, h).clone())
            .unwrap_or_default()
    };

    Ok(sheet
        .rows
        .iter()
        .filter_map(|row| {
            let amount = parse_decimal(&cell(row, SettlementField::SettlementAmount))?;
            Some(SettlementRow {
                statement_date: parse_date(&cell(row, SettlementField::StatementDate)),
                settlement_amount: amount,
                sku: optional_text(&cell(row, SettlementField::Sku)),
                quantity: parse_quantity(&cell(row, SettlementField::Quantity)),
            })
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn inventory_sheet(rows: Vec<Vec<CellValue>>) -> Sheet {
        let mut raw = vec![vec![text("SKU"), text("Name"), text("Qty"), text("Cost")]];
        raw.extend(rows);
        Sheet::from_raw_rows(raw).unwrap()
    }

    fn inventory_mapping() -> ColumnMapping {
        let mut mapping = ColumnMapping::default();
        mapping.set(SemanticField::Sku, "SKU");
        mapping.set(SemanticField::ProductName, "Name");
        mapping.set(SemanticField::Quantity, "Qty");
        mapping.set(SemanticField::UnitCost, "Cost");
        mapping
    }

    // ========================================================================
    // Cell Parsing Tests
    // ========================================================================

    #[test]
    fn test_parse_decimal_variants() {
        assert_eq!(parse_decimal(&CellValue::Number(2.5)), Some(dec("2.5")));
        assert_eq!(parse_decimal(&text(" 1,200.50 ")), Some(dec("1200.50")));
        assert_eq!(parse_decimal(&text("$3.00")), Some(dec("3.00")));
        assert_eq!(parse_decimal(&text("¥12")), Some(dec("12")));
        assert_eq!(parse_decimal(&text("-40")), Some(dec("-40")));
        assert_eq!(parse_decimal(&text("abc")), None);
        assert_eq!(parse_decimal(&text("")), None);
        assert_eq!(parse_decimal(&CellValue::Empty), None);
        assert_eq!(parse_decimal(&CellValue::Bool(true)), None);
    }

    #[test]
    fn test_costs_rounded_to_stored_scale() {
        assert_eq!(parse_positive_amount(&text("1.23456")), Some(dec("1.2346")));
        assert_eq!(parse_positive_amount(&text("0.00005")), Some(dec("0.0001")));
        assert_eq!(parse_positive_amount(&text("2.5")), Some(dec("2.5")));
        assert_eq!(parse_positive_amount(&text("0.00004")), None);
        assert_eq!(parse_positive_amount(&text("9999999999.9999")), Some(dec("9999999999.9999")));
        assert_eq!(parse_positive_amount(&text("10000000000")), None);
        assert_eq!(parse_positive_amount(&text("-3")), None);
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity(&CellValue::Number(5.0)), Some(5));
        assert_eq!(parse_quantity(&text("12")), Some(12));
        assert_eq!(parse_quantity(&CellValue::Number(0.0)), None);
        assert_eq!(parse_quantity(&CellValue::Number(-3.0)), None);
        assert_eq!(parse_quantity(&CellValue::Number(2.5)), None);
        assert_eq!(parse_quantity(&text("many")), None);
    }

    #[test]
    fn test_parse_date_variants() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        assert_eq!(parse_date(&CellValue::Date(expected)), Some(expected));
        assert_eq!(parse_date(&text("2024-01-31")), Some(expected));
        assert_eq!(parse_date(&text("2024/01/31")), Some(expected));
        assert_eq!(parse_date(&text("2024.01.31")), Some(expected));
        assert_eq!(parse_date(&text("20240131")), Some(expected));
        assert_eq!(parse_date(&text("2024-01-31 08:30:00")), Some(expected));
        assert_eq!(parse_date(&CellValue::Number(20240131.0)), Some(expected));
        // Serial 45322 is 2024-01-31
        assert_eq!(parse_date(&CellValue::Number(45322.0)), Some(expected));
        assert_eq!(parse_date(&text("next tuesday")), None);
    }

    // ========================================================================
    // Inventory Row Tests
    // ========================================================================

    #[test]
    fn test_valid_row_accepted() {
        let sheet = inventory_sheet(vec![vec![
            text("A1"),
            text("Widget"),
            CellValue::Number(5.0),
            CellValue::Number(2.5),
        ]]);

        let report = validate_inventory_rows(&sheet, &inventory_mapping()).unwrap();
        assert_eq!(report.parsed_count(), 1);
        let row = &report.accepted[0];
        assert_eq!(row.sku, "A1");
        assert_eq!(row.quantity, 5);
        assert_eq!(row.unit_cost, dec("2.50"));
        assert_eq!(row.line, 2);
    }

    #[test]
    fn test_invalid_rows_rejected_with_reasons() {
        let sheet = inventory_sheet(vec![
            vec![text("  "), text("Widget"), text("1"), text("1")],
            vec![text("A2"), text(""), text("1"), text("1")],
            vec![text("A3"), text("Gadget"), text("zero"), text("1")],
            vec![text("A4"), text("Gadget"), text("2"), text("-1")],
            vec![text("A5"), text("Gadget"), text("2"), text("4.25")],
        ]);

        let report = validate_inventory_rows(&sheet, &inventory_mapping()).unwrap();
        assert_eq!(report.parsed_count(), 1);
        assert_eq!(report.accepted[0].sku, "A5");

        let reasons: Vec<RejectReason> = report.rejected.iter().map(|r| r.reason).collect();
        assert_eq!(
            reasons,
            vec![
                RejectReason::MissingSku,
                RejectReason::MissingProductName,
                RejectReason::InvalidQuantity,
                RejectReason::InvalidUnitCost,
            ]
        );
    }

    #[test]
    fn test_default_quantity_is_one() {
        let sheet = inventory_sheet(vec![vec![
            text("A1"),
            text("Widget"),
            CellValue::Empty,
            text("2"),
        ]]);
        let mut mapping = inventory_mapping();
        mapping.quantity = Some(QuantitySource::DefaultOne);

        let report = validate_inventory_rows(&sheet, &mapping).unwrap();
        assert_eq!(report.accepted[0].quantity, 1);
    }

    #[test]
    fn test_all_rows_rejected_is_no_valid_data() {
        let sheet = inventory_sheet(vec![
            vec![text(""), text("Widget"), text("1"), text("1")],
            vec![text("A2"), text("Gadget"), text("0"), text("1")],
        ]);

        let err = validate_inventory_rows(&sheet, &inventory_mapping()).unwrap_err();
        assert_eq!(err, PipelineError::NoValidData);

        let report = screen_inventory_rows(&sheet, &inventory_mapping()).unwrap();
        assert!(report.accepted.is_empty());
        assert_eq!(report.rejected.len(), 2);
    }

    #[test]
    fn test_incomplete_mapping_blocks_validation() {
        let sheet = inventory_sheet(vec![vec![text("A1"), text("W"), text("1"), text("1")]]);
        let mut mapping = inventory_mapping();
        mapping.unit_cost = None;

        let err = validate_inventory_rows(&sheet, &mapping).unwrap_err();
        assert_eq!(err, PipelineError::mapping_incomplete("unit_cost"));
    }

    #[test]
    fn test_optional_fields_parsed() {
        let sheet = Sheet::from_raw_rows(vec![
            vec![text("SKU"), text("Name"), text("Qty"), text("Cost"), text("Batch"), text("Expiry")],
            vec![
                text("A1"),
                text("Widget"),
                text("3"),
                text("1.5"),
                text("B-01"),
                text("2025-06-30"),
            ],
            vec![text("A2"), text("Gadget"), text("3"), text("1.5"), text(""), text("soon")],
        ])
        .unwrap();
        let mut mapping = inventory_mapping();
        mapping.set(SemanticField::BatchNumber, "Batch");
        mapping.set(SemanticField::ExpirationDate, "Expiry");

        let report = validate_inventory_rows(&sheet, &mapping).unwrap();
        assert_eq!(report.accepted[0].batch_number.as_deref(), Some("B-01"));
        assert_eq!(
            report.accepted[0].expiration_date,
            NaiveDate::from_ymd_opt(2025, 6, 30)
        );
        // Unparsable dates do not reject the row
        assert_eq!(report.accepted[1].batch_number, None);
        assert_eq!(report.accepted[1].expiration_date, None);
    }

    // ========================================================================
    // Cost Sheet And Settlement Tests
    // ========================================================================

    #[test]
    fn test_cost_rows() {
        let sheet = Sheet::from_raw_rows(vec![
            vec![text("SKU"), text("Cost"), text("Notes")],
            vec![text("A1"), text("2.75"), text("new supplier")],
            vec![text("A2"), text("free"), text("")],
            vec![text(""), text("1"), text("")],
        ])
        .unwrap();
        let mut mapping = ColumnMapping::default();
        mapping.set(SemanticField::Sku, "SKU");
        mapping.set(SemanticField::UnitCost, "Cost");
        mapping.set(SemanticField::Notes, "Notes");

        let report = validate_cost_rows(&sheet, &mapping).unwrap();
        assert_eq!(report.parsed_count(), 1);
        assert_eq!(report.accepted[0].notes.as_deref(), Some("new supplier"));
        assert_eq!(report.rejected.len(), 2);
    }

    #[test]
    fn test_settlement_rows_keep_negatives_and_skip_non_numeric() {
        let sheet = Sheet::from_raw_rows(vec![
            vec![text("Date"), text("Amount")],
            vec![text("2024-03-01"), text("100.00")],
            vec![text("2024-03-02"), text("-20")],
            vec![text("2024-03-03"), text("n/a")],
        ])
        .unwrap();
        let mut mapping = SettlementMapping::default();
        mapping.set(SettlementField::StatementDate, "Date");
        mapping.set(SettlementField::SettlementAmount, "Amount");

        let rows = validate_settlement_rows(&sheet, &mapping).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].settlement_amount, dec("-20"));
        assert_eq!(rows[0].statement_date, NaiveDate::from_ymd_opt(2024, 3, 1));
    }

    // ========================================================================
    // Property-Based Tests
    // ========================================================================

    fn blank_text() -> impl Strategy<Value = String> {
        "[ \t]{0,4}"
    }

    fn bad_number() -> impl Strategy<Value = CellValue> {
        prop_oneof![
            (-10000i64..=0).prop_map(|n| CellValue::Number(n as f64)),
            "[a-z]{1,8}".prop_map(CellValue::Text),
            Just(CellValue::Empty),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Rows whose SKU or name is blank never reach the accepted set
        #[test]
        fn prop_blank_identity_rejected(
            blank in blank_text(),
            blank_sku in any::<bool>(),
            qty in 1i64..1000,
        ) {
            let (sku, name) = if blank_sku {
                (text(&blank), text("Widget"))
            } else {
                (text("A1"), text(&blank))
            };
            let sheet = inventory_sheet(vec![
                vec![sku, name, CellValue::Number(qty as f64), text("1")],
                vec![text("KEEP"), text("Keeper"), text("1"), text("1")],
            ]);

            let report = validate_inventory_rows(&sheet, &inventory_mapping()).unwrap();
            prop_assert_eq!(report.parsed_count(), 1);
            prop_assert_eq!(report.accepted[0].sku.as_str(), "KEEP");
        }

        /// Non-numeric or non-positive quantity or cost rejects the row
        #[test]
        fn prop_bad_numbers_rejected(
            bad in bad_number(),
            bad_qty in any::<bool>(),
        ) {
            let (qty, cost) = if bad_qty {
                (bad, text("1"))
            } else {
                (text("1"), bad)
            };
            let sheet = inventory_sheet(vec![
                vec![text("A1"), text("Widget"), qty, cost],
                vec![text("KEEP"), text("Keeper"), text("1"), text("1")],
            ]);

            let report = validate_inventory_rows(&sheet, &inventory_mapping()).unwrap();
            prop_assert_eq!(report.parsed_count(), 1);
            prop_assert_eq!(report.rejected.len(), 1);
        }

        /// Positive quantities and costs always pass
        #[test]
        fn prop_positive_values_accepted(
            qty in 1i64..100_000,
            cents in 1i64..10_000_000,
        ) {
            let cost = Decimal::new(cents, 2);
            let sheet = inventory_sheet(vec![vec![
                text("A1"),
                text("Widget"),
                CellValue::Number(qty as f64),
                text(&cost.to_string()),
            ]]);

            let report = validate_inventory_rows(&sheet, &inventory_mapping()).unwrap();
            prop_assert_eq!(report.accepted[0].quantity, qty);
            prop_assert_eq!(report.accepted[0].unit_cost, cost);
        }
    }
}
