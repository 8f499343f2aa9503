//! In-memory store used by the integration tests

#![allow(dead_code)]

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use ops_portal_backend::services::UploadedFile;
use ops_portal_backend::store::{
    AccountStore, FixedCostChanges, InboundContext, InventoryStore, LedgerStore, NewFixedCost,
    NewPayrollEntry, Page, UserCredentials,
};
use ops_portal_backend::{AppError, AppResult};
use shared::models::{
    CostRecord, CostSheetRow, FixedCost, ImportBatch, ImportKind, InventoryHistoryEntry,
    InventoryImportRow, InventoryRecord, NotificationCursor, PayrollEntry, UpsertOutcome,
};

pub fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

pub fn csv_file(name: &str, text: &str) -> UploadedFile {
    UploadedFile::new(name, text.as_bytes().to_vec())
}

#[derive(Clone, Default)]
struct State {
    inventory: BTreeMap<String, InventoryRecord>,
    history: Vec<InventoryHistoryEntry>,
    costs: BTreeMap<String, CostRecord>,
    batches: Vec<ImportBatch>,
    fixed_costs: Vec<FixedCost>,
    payroll: Vec<PayrollEntry>,
    users: Vec<UserCredentials>,
    cursors: HashMap<Uuid, DateTime<Utc>>,
}

/// Store double with per-SKU failure injection
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
    failing_skus: Arc<Mutex<HashSet<String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every later write of `sku` fails
    pub fn fail_on(&self, sku: &str) {
        self.failing_skus.lock().unwrap().insert(sku.to_string());
    }

    pub fn inventory(&self, sku: &str) -> Option<InventoryRecord> {
        self.state.lock().unwrap().inventory.get(sku).cloned()
    }

    pub fn inventory_count(&self) -> usize {
        self.state.lock().unwrap().inventory.len()
    }

    pub fn history(&self) -> Vec<InventoryHistoryEntry> {
        self.state.lock().unwrap().history.clone()
    }

    pub fn cost(&self, sku: &str) -> Option<CostRecord> {
        self.state.lock().unwrap().costs.get(sku).cloned()
    }

    pub fn batches(&self) -> Vec<ImportBatch> {
        self.state.lock().unwrap().batches.clone()
    }

    pub fn add_user(&self, user: UserCredentials) {
        self.state.lock().unwrap().users.push(user);
    }

    /// Seed a batch as if another import had already finished
    pub fn add_batch(&self, batch: ImportBatch) {
        self.state.lock().unwrap().batches.push(batch);
    }

    fn check(&self, sku: &str) -> AppResult<()> {
        if self.failing_skus.lock().unwrap().contains(sku) {
            return Err(AppError::Internal(format!("simulated write failure for {}", sku)));
        }
        Ok(())
    }

    fn inbound(&self, state: &mut State, row: &InventoryImportRow, ctx: &InboundContext) -> AppResult<UpsertOutcome> {
        self.check(&row.sku)?;
        let now = Utc::now();

        let outcome = match state.inventory.get_mut(&row.sku) {
            Some(record) => {
                record.apply_inbound(row, ctx.user_id, now);
                UpsertOutcome::Updated
            }
            None => {
                state
                    .inventory
                    .insert(row.sku.clone(), InventoryRecord::from_import(row, ctx.user_id, now));
                UpsertOutcome::Inserted
            }
        };
        state.history.push(InventoryHistoryEntry::inbound(
            row,
            ctx.batch_id,
            ctx.reason.clone(),
            ctx.user_id,
            now,
        ));
        Ok(outcome)
    }

    fn cost_row(&self, state: &mut State, row: &CostSheetRow, user_id: Option<Uuid>) -> AppResult<UpsertOutcome> {
        self.check(&row.sku)?;
        let outcome = if state.costs.contains_key(&row.sku) {
            UpsertOutcome::Updated
        } else {
            UpsertOutcome::Inserted
        };
        state
            .costs
            .insert(row.sku.clone(), CostRecord::from_row(row, user_id, Utc::now()));
        Ok(outcome)
    }
}

fn failed(sku: &str, err: AppError) -> AppError {
    AppError::ImportFailed {
        sku: sku.to_string(),
        message: err.to_string(),
    }
}

#[axum::async_trait]
impl InventoryStore for MemoryStore {
    async fn apply_inbound(&self, row: &InventoryImportRow, ctx: &InboundContext) -> AppResult<UpsertOutcome> {
        let mut state = self.state.lock().unwrap();
        self.inbound(&mut state, row, ctx)
    }

    async fn apply_inbound_all(
        &self,
        rows: &[InventoryImportRow],
        ctx: &InboundContext,
    ) -> AppResult<Vec<UpsertOutcome>> {
        let mut state = self.state.lock().unwrap();
        let mut staged = state.clone();
        let mut outcomes = Vec::new();
        for row in rows {
            outcomes.push(self.inbound(&mut staged, row, ctx).map_err(|e| failed(&row.sku, e))?);
        }
        *state = staged;
        Ok(outcomes)
    }

    async fn get_inventory(&self, sku: &str) -> AppResult<Option<InventoryRecord>> {
        Ok(self.inventory(sku))
    }

    async fn list_inventory(&self, page: Page) -> AppResult<Vec<InventoryRecord>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .inventory
            .values()
            .skip(page.offset as usize)
            .take(page.limit as usize)
            .cloned()
            .collect())
    }

    async fn history_for_sku(&self, sku: &str, page: Page) -> AppResult<Vec<InventoryHistoryEntry>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .history
            .iter()
            .rev()
            .filter(|h| h.sku == sku)
            .skip(page.offset as usize)
            .take(page.limit as usize)
            .cloned()
            .collect())
    }

    async fn upsert_cost(&self, row: &CostSheetRow, user_id: Option<Uuid>) -> AppResult<UpsertOutcome> {
        let mut state = self.state.lock().unwrap();
        self.cost_row(&mut state, row, user_id)
    }

    async fn upsert_costs_all(
        &self,
        rows: &[CostSheetRow],
        user_id: Option<Uuid>,
    ) -> AppResult<Vec<UpsertOutcome>> {
        let mut state = self.state.lock().unwrap();
        let mut staged = state.clone();
        let mut outcomes = Vec::new();
        for row in rows {
            outcomes.push(self.cost_row(&mut staged, row, user_id).map_err(|e| failed(&row.sku, e))?);
        }
        *state = staged;
        Ok(outcomes)
    }

    async fn list_cost_records(&self, page: Page) -> AppResult<Vec<CostRecord>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .costs
            .values()
            .skip(page.offset as usize)
            .take(page.limit as usize)
            .cloned()
            .collect())
    }

    async fn unit_costs(&self) -> AppResult<HashMap<String, Decimal>> {
        let state = self.state.lock().unwrap();
        Ok(state.costs.values().map(|c| (c.sku.clone(), c.cost)).collect())
    }

    async fn create_batch(&self, batch: &ImportBatch) -> AppResult<()> {
        self.state.lock().unwrap().batches.push(batch.clone());
        Ok(())
    }

    async fn finish_batch(&self, batch_id: Uuid, committed: i32, failed: i32) -> AppResult<()> {
        let mut state = self.state.lock().unwrap();
        let batch = state
            .batches
            .iter_mut()
            .find(|b| b.id == batch_id)
            .ok_or_else(|| AppError::NotFound("Import batch".to_string()))?;
        batch.rows_committed = committed;
        batch.rows_failed = failed;
        Ok(())
    }

    async fn batch_exists(&self, kind: ImportKind, file_sha256: &str) -> AppResult<bool> {
        let state = self.state.lock().unwrap();
        Ok(state
            .batches
            .iter()
            .any(|b| b.kind == kind && b.file_sha256 == file_sha256))
    }

    async fn count_batches_since(
        &self,
        kind: ImportKind,
        exclude_user: Uuid,
        since: Option<DateTime<Utc>>,
    ) -> AppResult<u64> {
        let state = self.state.lock().unwrap();
        Ok(state
            .batches
            .iter()
            .filter(|b| b.kind == kind && b.rows_committed > 0)
            .filter(|b| b.created_by != Some(exclude_user))
            .filter(|b| since.map_or(true, |s| b.created_at > s))
            .count() as u64)
    }
}

#[axum::async_trait]
impl LedgerStore for MemoryStore {
    async fn list_fixed_costs(&self) -> AppResult<Vec<FixedCost>> {
        Ok(self.state.lock().unwrap().fixed_costs.clone())
    }

    async fn create_fixed_cost(&self, input: NewFixedCost) -> AppResult<FixedCost> {
        let now = Utc::now();
        let cost = FixedCost {
            id: Uuid::new_v4(),
            name: input.name,
            amount: input.amount,
            frequency: input.frequency,
            is_active: input.is_active,
            created_at: now,
            updated_at: now,
        };
        self.state.lock().unwrap().fixed_costs.push(cost.clone());
        Ok(cost)
    }

    async fn update_fixed_cost(&self, id: Uuid, changes: FixedCostChanges) -> AppResult<Option<FixedCost>> {
        let mut state = self.state.lock().unwrap();
        Ok(state.fixed_costs.iter_mut().find(|c| c.id == id).map(|cost| {
            if let Some(name) = changes.name {
                cost.name = name;
            }
            if let Some(amount) = changes.amount {
                cost.amount = amount;
            }
            if let Some(frequency) = changes.frequency {
                cost.frequency = frequency;
            }
            if let Some(is_active) = changes.is_active {
                cost.is_active = is_active;
            }
            cost.updated_at = Utc::now();
            cost.clone()
        }))
    }

    async fn list_payroll(&self) -> AppResult<Vec<PayrollEntry>> {
        Ok(self.state.lock().unwrap().payroll.clone())
    }

    async fn create_payroll(&self, input: NewPayrollEntry) -> AppResult<PayrollEntry> {
        let entry = PayrollEntry {
            id: Uuid::new_v4(),
            employee_name: input.employee_name,
            period_start: input.period_start,
            period_end: input.period_end,
            total: input.total,
            created_at: Utc::now(),
        };
        self.state.lock().unwrap().payroll.push(entry.clone());
        Ok(entry)
    }
}

#[axum::async_trait]
impl AccountStore for MemoryStore {
    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<UserCredentials>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn notification_cursor(&self, user_id: Uuid) -> AppResult<NotificationCursor> {
        let state = self.state.lock().unwrap();
        Ok(NotificationCursor {
            user_id,
            last_checked_at: state.cursors.get(&user_id).copied(),
        })
    }

    async fn save_notification_cursor(&self, cursor: &NotificationCursor) -> AppResult<()> {
        if let Some(at) = cursor.last_checked_at {
            self.state.lock().unwrap().cursors.insert(cursor.user_id, at);
        }
        Ok(())
    }
}
