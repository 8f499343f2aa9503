//! Cost sheet models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unit cost of a SKU as last uploaded on a cost sheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostRecord {
    pub sku: String,
    pub cost: Decimal,
    pub notes: Option<String>,
    pub uploaded_by: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
}

impl CostRecord {
    pub fn from_row(row: &CostSheetRow, user_id: Option<Uuid>, now: DateTime<Utc>) -> Self {
        Self {
            sku: row.sku.clone(),
            cost: row.cost,
            notes: row.notes.clone(),
            uploaded_by: user_id,
            updated_at: now,
        }
    }
}

/// A validated cost sheet row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostSheetRow {
    pub line: usize,
    pub sku: String,
    pub cost: Decimal,
    pub notes: Option<String>,
}
