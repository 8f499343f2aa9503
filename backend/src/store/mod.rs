//! Persistence seams for the import pipeline
//!
//! Services are generic over these traits so the reconciler can run against
//! PostgreSQL in production and an in-memory store in tests.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::AppResult;
use shared::models::{
    CostFrequency, CostRecord, CostSheetRow, FixedCost, ImportBatch, ImportKind,
    InventoryHistoryEntry, InventoryImportRow, InventoryRecord, NotificationCursor, PayrollEntry,
    UpsertOutcome, UserRole,
};

pub mod postgres;

pub use postgres::PgStore;

/// Everything one inbound row needs besides the row itself
#[derive(Debug, Clone)]
pub struct InboundContext {
    pub batch_id: Uuid,
    pub reason: String,
    pub user_id: Option<Uuid>,
}

/// Paging for list endpoints
#[derive(Debug, Clone, Copy)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            limit: 100,
            offset: 0,
        }
    }
}

/// Inventory, its movement history, cost records and import batches
#[axum::async_trait]
pub trait InventoryStore: Send + Sync {
    /// Upsert one row and append its history entry in a single transaction.
    ///
    /// The quantity increment happens inside the store so concurrent imports
    /// of the same SKU never lose an update.
    async fn apply_inbound(
        &self,
        row: &InventoryImportRow,
        ctx: &InboundContext,
    ) -> AppResult<UpsertOutcome>;

    /// Apply every row in one transaction; on failure nothing is written and
    /// the error is `AppError::ImportFailed` naming the failing SKU.
    async fn apply_inbound_all(
        &self,
        rows: &[InventoryImportRow],
        ctx: &InboundContext,
    ) -> AppResult<Vec<UpsertOutcome>>;

    async fn get_inventory(&self, sku: &str) -> AppResult<Option<InventoryRecord>>;

    async fn list_inventory(&self, page: Page) -> AppResult<Vec<InventoryRecord>>;

    async fn history_for_sku(&self, sku: &str, page: Page) -> AppResult<Vec<InventoryHistoryEntry>>;

    async fn upsert_cost(&self, row: &CostSheetRow, user_id: Option<Uuid>) -> AppResult<UpsertOutcome>;

    async fn upsert_costs_all(
        &self,
        rows: &[CostSheetRow],
        user_id: Option<Uuid>,
    ) -> AppResult<Vec<UpsertOutcome>>;

    async fn list_cost_records(&self, page: Page) -> AppResult<Vec<CostRecord>>;

    /// Latest uploaded cost per SKU
    async fn unit_costs(&self) -> AppResult<HashMap<String, Decimal>>;

    async fn create_batch(&self, batch: &ImportBatch) -> AppResult<()>;

    async fn finish_batch(&self, batch_id: Uuid, committed: i32, failed: i32) -> AppResult<()>;

    /// Whether a batch of `kind` with this file fingerprint already exists
    async fn batch_exists(&self, kind: ImportKind, file_sha256: &str) -> AppResult<bool>;

    /// Batches that committed rows, created by anyone but `exclude_user`
    /// after `since` (all of them when `since` is `None`)
    async fn count_batches_since(
        &self,
        kind: ImportKind,
        exclude_user: Uuid,
        since: Option<DateTime<Utc>>,
    ) -> AppResult<u64>;
}

/// Input for a new fixed cost
#[derive(Debug, Clone)]
pub struct NewFixedCost {
    pub name: String,
    pub amount: Decimal,
    pub frequency: CostFrequency,
    pub is_active: bool,
}

/// Partial update of a fixed cost
#[derive(Debug, Clone, Default)]
pub struct FixedCostChanges {
    pub name: Option<String>,
    pub amount: Option<Decimal>,
    pub frequency: Option<CostFrequency>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct NewPayrollEntry {
    pub employee_name: String,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub total: Decimal,
}

/// Fixed costs and payroll read fresh by every profit analysis
#[axum::async_trait]
pub trait LedgerStore: Send + Sync {
    async fn list_fixed_costs(&self) -> AppResult<Vec<FixedCost>>;

    async fn create_fixed_cost(&self, input: NewFixedCost) -> AppResult<FixedCost>;

    async fn update_fixed_cost(
        &self,
        id: Uuid,
        changes: FixedCostChanges,
    ) -> AppResult<Option<FixedCost>>;

    async fn list_payroll(&self) -> AppResult<Vec<PayrollEntry>>;

    async fn create_payroll(&self, input: NewPayrollEntry) -> AppResult<PayrollEntry>;
}

/// Stored login data for one account
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub role: UserRole,
    pub is_active: bool,
}

/// Accounts and per-user notification cursors
#[axum::async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<UserCredentials>>;

    async fn notification_cursor(&self, user_id: Uuid) -> AppResult<NotificationCursor>;

    async fn save_notification_cursor(&self, cursor: &NotificationCursor) -> AppResult<()>;
}
