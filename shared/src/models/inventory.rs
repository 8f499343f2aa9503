//! Inventory management models

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Why stock came in; selected once per import run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InReason {
    Purchase,
    Return,
    Gift,
    Stocktake,
    Transfer,
    Other,
}

impl InReason {
    pub const ALL: [InReason; 6] = [
        InReason::Purchase,
        InReason::Return,
        InReason::Gift,
        InReason::Stocktake,
        InReason::Transfer,
        InReason::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InReason::Purchase => "purchase",
            InReason::Return => "return",
            InReason::Gift => "gift",
            InReason::Stocktake => "stocktake",
            InReason::Transfer => "transfer",
            InReason::Other => "other",
        }
    }

    /// Free-text reason written to every history entry of an import
    pub fn history_text(&self, file_name: &str) -> String {
        format!("{}: spreadsheet import ({})", self.as_str(), file_name)
    }
}

impl std::str::FromStr for InReason {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        InReason::ALL
            .into_iter()
            .find(|r| r.as_str() == s.trim())
            .ok_or_else(|| format!("Unknown in-reason: {}", s))
    }
}

/// Direction of a stock movement recorded in history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    In,
    Out,
    Adjust,
}

impl OperationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationType::In => "in",
            OperationType::Out => "out",
            OperationType::Adjust => "adjust",
        }
    }
}

impl std::str::FromStr for OperationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in" => Ok(OperationType::In),
            "out" => Ok(OperationType::Out),
            "adjust" => Ok(OperationType::Adjust),
            other => Err(format!("Unknown operation type: {}", other)),
        }
    }
}

/// Current stock for one SKU; exactly one record exists per SKU
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub sku: String,
    pub product_name: String,
    pub quantity: i64,
    pub unit_cost: Decimal,
    pub batch_number: Option<String>,
    pub expiration_date: Option<NaiveDate>,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<Uuid>,
}

impl InventoryRecord {
    /// Record created by the first import of a SKU
    pub fn from_import(row: &InventoryImportRow, user_id: Option<Uuid>, now: DateTime<Utc>) -> Self {
        Self {
            sku: row.sku.clone(),
            product_name: row.product_name.clone(),
            quantity: row.quantity,
            unit_cost: row.unit_cost,
            batch_number: row.batch_number.clone(),
            expiration_date: row.expiration_date,
            updated_at: now,
            updated_by: user_id,
        }
    }

    /// Apply a later import of the same SKU.
    ///
    /// Quantity accumulates; cost, name and the optional fields are replaced
    /// by the incoming row, including clearing them when the row has none.
    pub fn apply_inbound(&mut self, row: &InventoryImportRow, user_id: Option<Uuid>, now: DateTime<Utc>) {
        self.quantity += row.quantity;
        self.product_name = row.product_name.clone();
        self.unit_cost = row.unit_cost;
        self.batch_number = row.batch_number.clone();
        self.expiration_date = row.expiration_date;
        self.updated_at = now;
        self.updated_by = user_id;
    }
}

/// Append-only movement log; `quantity` is the delta of one operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryHistoryEntry {
    pub id: Uuid,
    pub batch_id: Option<Uuid>,
    pub sku: String,
    pub product_name: String,
    pub quantity: i64,
    pub operation_type: OperationType,
    pub unit_cost: Decimal,
    pub reason: String,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
}

impl InventoryHistoryEntry {
    pub fn inbound(
        row: &InventoryImportRow,
        batch_id: Uuid,
        reason: String,
        user_id: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            batch_id: Some(batch_id),
            sku: row.sku.clone(),
            product_name: row.product_name.clone(),
            quantity: row.quantity,
            operation_type: OperationType::In,
            unit_cost: row.unit_cost,
            reason,
            created_at: now,
            created_by: user_id,
        }
    }
}

/// A validated inventory row ready for reconciliation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryImportRow {
    /// 1-based row number in the uploaded file
    pub line: usize,
    pub sku: String,
    pub product_name: String,
    pub quantity: i64,
    pub unit_cost: Decimal,
    pub batch_number: Option<String>,
    pub expiration_date: Option<NaiveDate>,
}

/// Whether an upsert created or updated the record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}
