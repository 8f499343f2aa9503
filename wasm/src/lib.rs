//! WebAssembly module for the Ops Portal
//!
//! Runs the pure pipeline stages in the browser so an upload can be previewed
//! before it is sent:
//! - Column mapping suggestion
//! - Inventory row validation
//! - Profit analysis of a settlement sheet
//!
//! The browser reads the file itself and passes rows as JSON arrays of cell
//! values. Errors come back as JSON `{ "code", "message" }` strings.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

use shared::models::{
    ColumnMapping, FixedCost, InReason, PayrollEntry, ProfitAnalysis, SettlementMapping,
};
use shared::{CellValue, PipelineError, ProfitAggregator, Sheet};

// Re-export shared types for use in JavaScript
pub use shared::models::*;
pub use shared::types::*;

/// Announce the module in the browser console
#[wasm_bindgen(start)]
pub fn init() {
    web_sys::console::debug_1(&JsValue::from_str("ops portal wasm loaded"));
}

/// Error payload handed back to JavaScript
#[derive(Debug, Serialize, PartialEq)]
struct WasmError {
    code: &'static str,
    message: String,
}

impl WasmError {
    fn bad_input(e: serde_json::Error) -> Self {
        Self {
            code: "INVALID_INPUT",
            message: e.to_string(),
        }
    }
}

impl From<PipelineError> for WasmError {
    fn from(err: PipelineError) -> Self {
        Self {
            code: err.code(),
            message: err.to_string(),
        }
    }
}

fn to_js(err: WasmError) -> JsValue {
    web_sys::console::warn_1(&JsValue::from_str(&err.message));
    let body = serde_json::to_string(&err).unwrap_or_else(|_| err.message.clone());
    JsValue::from_str(&body)
}

fn to_json<T: Serialize>(value: &T) -> Result<String, WasmError> {
    serde_json::to_string(value).map_err(WasmError::bad_input)
}

fn sheet_from_json(rows: &[Vec<serde_json::Value>]) -> Result<Sheet, PipelineError> {
    let raw = rows
        .iter()
        .map(|row| row.iter().map(CellValue::from).collect())
        .collect();
    Sheet::from_raw_rows(raw)
}

// ============================================================================
// Mapping suggestion
// ============================================================================

fn suggest(headers_json: &str) -> Result<String, WasmError> {
    let headers: Vec<String> = serde_json::from_str(headers_json).map_err(WasmError::bad_input)?;
    to_json(&shared::infer_mapping(&headers))
}

/// Suggest a column mapping for a JSON array of header strings
#[wasm_bindgen]
pub fn suggest_column_mapping(headers_json: &str) -> Result<String, JsValue> {
    suggest(headers_json).map_err(to_js)
}

// ============================================================================
// Row validation
// ============================================================================

#[derive(Deserialize)]
struct InventoryInput {
    /// Header row first, as read from the file
    rows: Vec<Vec<serde_json::Value>>,
    mapping: ColumnMapping,
}

fn validate_inventory(input_json: &str) -> Result<String, WasmError> {
    let input: InventoryInput = serde_json::from_str(input_json).map_err(WasmError::bad_input)?;
    let sheet = sheet_from_json(&input.rows)?;
    let report = shared::validate_inventory_rows(&sheet, &input.mapping)?;
    to_json(&report)
}

/// Validate inventory rows against a confirmed mapping.
///
/// Input: `{ "rows": [[...], ...], "mapping": {...} }`. Returns the accepted
/// rows and the rejected row numbers with their reasons.
#[wasm_bindgen]
pub fn validate_inventory_rows(input_json: &str) -> Result<String, JsValue> {
    validate_inventory(input_json).map_err(to_js)
}

// ============================================================================
// Profit analysis
// ============================================================================

#[derive(Deserialize)]
struct ProfitInput {
    rows: Vec<Vec<serde_json::Value>>,
    mapping: Option<SettlementMapping>,
    #[serde(default)]
    fixed_costs: Vec<FixedCost>,
    #[serde(default)]
    payroll: Vec<PayrollEntry>,
    ratio: Option<Decimal>,
}

fn analyze(input_json: &str) -> Result<ProfitAnalysis, WasmError> {
    let input: ProfitInput = serde_json::from_str(input_json).map_err(WasmError::bad_input)?;
    let sheet = sheet_from_json(&input.rows)?;
    let mapping = input
        .mapping
        .unwrap_or_else(|| shared::infer_settlement_mapping(&sheet.headers));
    let settlements = shared::validate_settlement_rows(&sheet, &mapping)?;

    let aggregator = input
        .ratio
        .map_or_else(ProfitAggregator::default, ProfitAggregator::flat_ratio);
    Ok(aggregator.analyze(&settlements, &input.fixed_costs, &input.payroll)?)
}

/// Flat-ratio profit analysis of settlement rows.
///
/// Input: `{ "rows": [[...]], "mapping"?: {...}, "fixed_costs"?: [...],
/// "payroll"?: [...], "ratio"?: "0.6" }`.
#[wasm_bindgen]
pub fn analyze_profit(input_json: &str) -> Result<String, JsValue> {
    analyze(input_json).and_then(|a| to_json(&a)).map_err(to_js)
}

fn reason_names() -> Vec<&'static str> {
    InReason::ALL.iter().map(InReason::as_str).collect()
}

/// In-reasons offered when confirming an inventory import
#[wasm_bindgen]
pub fn in_reasons() -> js_sys::Array {
    reason_names().into_iter().map(JsValue::from_str).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_suggest_column_mapping() {
        let json = suggest(r#"["SKU","Product Name","Qty","Unit Cost"]"#).unwrap();
        let mapping: ColumnMapping = serde_json::from_str(&json).unwrap();

        assert_eq!(mapping.sku.as_deref(), Some("SKU"));
        assert_eq!(mapping.quantity, Some(QuantitySource::Column("Qty".to_string())));
    }

    #[test]
    fn test_suggest_rejects_bad_json() {
        assert_eq!(suggest("{").unwrap_err().code, "INVALID_INPUT");
    }

    #[test]
    fn test_validate_inventory() {
        let input = r#"{
            "rows": [["SKU","Product Name","Quantity","Unit Cost"],
                     ["A1","Widget",5,2.5],
                     ["B2","Gadget","x",1]],
            "mapping": {"sku":"SKU","product_name":"Product Name",
                        "quantity":{"source":"column","column":"Quantity"},
                        "unit_cost":"Unit Cost"}
        }"#;

        let report: serde_json::Value =
            serde_json::from_str(&validate_inventory(input).unwrap()).unwrap();
        assert_eq!(report["accepted"].as_array().unwrap().len(), 1);
        assert_eq!(report["rejected"][0]["line"], 3);
    }

    #[test]
    fn test_validate_inventory_incomplete_mapping() {
        let input = r#"{"rows": [["SKU"],["A1"]], "mapping": {"sku":"SKU"}}"#;
        assert_eq!(validate_inventory(input).unwrap_err().code, "MAPPING_INCOMPLETE");
    }

    #[test]
    fn test_analyze_profit() {
        let input = r#"{
            "rows": [["Statement Date","Settlement Amount"],
                     ["2024-03-01",6000],
                     ["2024-03-15",4000]]
        }"#;

        let analysis = analyze(input).unwrap();
        assert_eq!(analysis.estimated_product_costs, Decimal::from_str("6000").unwrap());
        assert_eq!(analysis.profit_margin, Decimal::from_str("40").unwrap());
        assert_eq!(analysis.periods.len(), 1);
    }

    #[test]
    fn test_analyze_profit_overflow() {
        let input = format!(
            r#"{{"rows": [["Settlement Amount"],["{max}"],["{max}"]]}}"#,
            max = Decimal::MAX
        );
        assert_eq!(analyze(&input).unwrap_err().code, "AMOUNT_OVERFLOW");
    }

    #[test]
    fn test_reason_names() {
        let names = reason_names();
        assert_eq!(names.len(), 6);
        assert!(names.contains(&"stocktake"));
    }
}
