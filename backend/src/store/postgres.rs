//! PostgreSQL implementation of the store traits

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgConnection, PgPool};
use std::collections::HashMap;
use std::str::FromStr;
use uuid::Uuid;

use super::{
    AccountStore, FixedCostChanges, InboundContext, InventoryStore, LedgerStore, NewFixedCost,
    NewPayrollEntry, Page, UserCredentials,
};
use crate::error::{AppError, AppResult};
use shared::models::{
    CostFrequency, CostRecord, CostSheetRow, FixedCost, ImportBatch, ImportKind,
    InventoryHistoryEntry, InventoryImportRow, InventoryRecord, NotificationCursor, OperationType,
    PayrollEntry, UpsertOutcome, UserRole,
};

/// Store backed by a PostgreSQL pool
#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

/// Parse a TEXT enum column
fn parse_column<T: FromStr<Err = String>>(value: &str) -> AppResult<T> {
    T::from_str(value).map_err(AppError::Internal)
}

fn outcome(inserted: bool) -> UpsertOutcome {
    if inserted {
        UpsertOutcome::Inserted
    } else {
        UpsertOutcome::Updated
    }
}

#[derive(Debug, FromRow)]
struct InventoryRow {
    sku: String,
    product_name: String,
    quantity: i64,
    unit_cost: Decimal,
    batch_number: Option<String>,
    expiration_date: Option<NaiveDate>,
    updated_at: DateTime<Utc>,
    updated_by: Option<Uuid>,
}

impl From<InventoryRow> for InventoryRecord {
    fn from(row: InventoryRow) -> Self {
        Self {
            sku: row.sku,
            product_name: row.product_name,
            quantity: row.quantity,
            unit_cost: row.unit_cost,
            batch_number: row.batch_number,
            expiration_date: row.expiration_date,
            updated_at: row.updated_at,
            updated_by: row.updated_by,
        }
    }
}

#[derive(Debug, FromRow)]
struct HistoryRow {
    id: Uuid,
    batch_id: Option<Uuid>,
    sku: String,
    product_name: String,
    quantity: i64,
    operation_type: String,
    unit_cost: Decimal,
    reason: String,
    created_at: DateTime<Utc>,
    created_by: Option<Uuid>,
}

impl TryFrom<HistoryRow> for InventoryHistoryEntry {
    type Error = AppError;

    fn try_from(row: HistoryRow) -> AppResult<Self> {
        Ok(Self {
            id: row.id,
            batch_id: row.batch_id,
            sku: row.sku,
            product_name: row.product_name,
            quantity: row.quantity,
            operation_type: parse_column::<OperationType>(&row.operation_type)?,
            unit_cost: row.unit_cost,
            reason: row.reason,
            created_at: row.created_at,
            created_by: row.created_by,
        })
    }
}

#[derive(Debug, FromRow)]
struct CostRow {
    sku: String,
    cost: Decimal,
    notes: Option<String>,
    uploaded_by: Option<Uuid>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct FixedCostRow {
    id: Uuid,
    name: String,
    amount: Decimal,
    frequency: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<FixedCostRow> for FixedCost {
    type Error = AppError;

    fn try_from(row: FixedCostRow) -> AppResult<Self> {
        Ok(Self {
            id: row.id,
            name: row.name,
            amount: row.amount,
            frequency: parse_column::<CostFrequency>(&row.frequency)?,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct PayrollRow {
    id: Uuid,
    employee_name: String,
    period_start: NaiveDate,
    period_end: NaiveDate,
    total: Decimal,
    created_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    name: String,
    password_hash: String,
    role: String,
    is_active: bool,
}

/// Atomic upsert of one inventory row plus its history entry on `conn`
async fn upsert_inbound(
    conn: &mut PgConnection,
    row: &InventoryImportRow,
    ctx: &InboundContext,
) -> Result<UpsertOutcome, sqlx::Error> {
    let inserted = sqlx::query_scalar::<_, bool>(
        r#"
        INSERT INTO inventory (sku, product_name, quantity, unit_cost, batch_number, expiration_date, updated_at, updated_by)
        VALUES ($1, $2, $3, $4, $5, $6, NOW(), $7)
        ON CONFLICT (sku) DO UPDATE SET
            quantity = inventory.quantity + EXCLUDED.quantity,
            product_name = EXCLUDED.product_name,
            unit_cost = EXCLUDED.unit_cost,
            batch_number = EXCLUDED.batch_number,
            expiration_date = EXCLUDED.expiration_date,
            updated_at = EXCLUDED.updated_at,
            updated_by = EXCLUDED.updated_by
        RETURNING (xmax = 0) AS inserted
        "#,
    )
    .bind(&row.sku)
    .bind(&row.product_name)
    .bind(row.quantity)
    .bind(row.unit_cost)
    .bind(&row.batch_number)
    .bind(row.expiration_date)
    .bind(ctx.user_id)
    .fetch_one(&mut *conn)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO inventory_history (batch_id, sku, product_name, quantity, operation_type, unit_cost, reason, created_by)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(ctx.batch_id)
    .bind(&row.sku)
    .bind(&row.product_name)
    .bind(row.quantity)
    .bind(OperationType::In.as_str())
    .bind(row.unit_cost)
    .bind(&ctx.reason)
    .bind(ctx.user_id)
    .execute(&mut *conn)
    .await?;

    Ok(outcome(inserted))
}

async fn upsert_cost_row(
    conn: &mut PgConnection,
    row: &CostSheetRow,
    user_id: Option<Uuid>,
) -> Result<UpsertOutcome, sqlx::Error> {
    let inserted = sqlx::query_scalar::<_, bool>(
        r#"
        INSERT INTO cost_records (sku, cost, notes, uploaded_by, updated_at)
        VALUES ($1, $2, $3, $4, NOW())
        ON CONFLICT (sku) DO UPDATE SET
            cost = EXCLUDED.cost,
            notes = EXCLUDED.notes,
            uploaded_by = EXCLUDED.uploaded_by,
            updated_at = EXCLUDED.updated_at
        RETURNING (xmax = 0) AS inserted
        "#,
    )
    .bind(&row.sku)
    .bind(row.cost)
    .bind(&row.notes)
    .bind(user_id)
    .fetch_one(&mut *conn)
    .await?;

    Ok(outcome(inserted))
}

fn import_failed(sku: &str, err: sqlx::Error) -> AppError {
    AppError::ImportFailed {
        sku: sku.to_string(),
        message: err.to_string(),
    }
}

#[axum::async_trait]
impl InventoryStore for PgStore {
    async fn apply_inbound(
        &self,
        row: &InventoryImportRow,
        ctx: &InboundContext,
    ) -> AppResult<UpsertOutcome> {
        let mut tx = self.db.begin().await?;
        let result = upsert_inbound(&mut *tx, row, ctx).await?;
        tx.commit().await?;
        Ok(result)
    }

    async fn apply_inbound_all(
        &self,
        rows: &[InventoryImportRow],
        ctx: &InboundContext,
    ) -> AppResult<Vec<UpsertOutcome>> {
        let mut tx = self.db.begin().await?;
        let mut outcomes = Vec::with_capacity(rows.len());
        for row in rows {
            // Dropping the transaction on error rolls back every earlier row
            let result = upsert_inbound(&mut *tx, row, ctx)
                .await
                .map_err(|e| import_failed(&row.sku, e))?;
            outcomes.push(result);
        }
        tx.commit().await?;
        Ok(outcomes)
    }

    async fn get_inventory(&self, sku: &str) -> AppResult<Option<InventoryRecord>> {
        let row = sqlx::query_as::<_, InventoryRow>(
            r#"
            SELECT sku, product_name, quantity, unit_cost, batch_number, expiration_date, updated_at, updated_by
            FROM inventory
            WHERE sku = $1
            "#,
        )
        .bind(sku)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn list_inventory(&self, page: Page) -> AppResult<Vec<InventoryRecord>> {
        let rows = sqlx::query_as::<_, InventoryRow>(
            r#"
            SELECT sku, product_name, quantity, unit_cost, batch_number, expiration_date, updated_at, updated_by
            FROM inventory
            ORDER BY sku
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn history_for_sku(&self, sku: &str, page: Page) -> AppResult<Vec<InventoryHistoryEntry>> {
        let rows = sqlx::query_as::<_, HistoryRow>(
            r#"
            SELECT id, batch_id, sku, product_name, quantity, operation_type, unit_cost, reason, created_at, created_by
            FROM inventory_history
            WHERE sku = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(sku)
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(InventoryHistoryEntry::try_from).collect()
    }

    async fn upsert_cost(&self, row: &CostSheetRow, user_id: Option<Uuid>) -> AppResult<UpsertOutcome> {
        let mut conn = self.db.acquire().await?;
        Ok(upsert_cost_row(&mut *conn, row, user_id).await?)
    }

    async fn upsert_costs_all(
        &self,
        rows: &[CostSheetRow],
        user_id: Option<Uuid>,
    ) -> AppResult<Vec<UpsertOutcome>> {
        let mut tx = self.db.begin().await?;
        let mut outcomes = Vec::with_capacity(rows.len());
        for row in rows {
            let result = upsert_cost_row(&mut *tx, row, user_id)
                .await
                .map_err(|e| import_failed(&row.sku, e))?;
            outcomes.push(result);
        }
        tx.commit().await?;
        Ok(outcomes)
    }

    async fn list_cost_records(&self, page: Page) -> AppResult<Vec<CostRecord>> {
        let rows = sqlx::query_as::<_, CostRow>(
            r#"
            SELECT sku, cost, notes, uploaded_by, updated_at
            FROM cost_records
            ORDER BY sku
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| CostRecord {
                sku: r.sku,
                cost: r.cost,
                notes: r.notes,
                uploaded_by: r.uploaded_by,
                updated_at: r.updated_at,
            })
            .collect())
    }

    async fn unit_costs(&self) -> AppResult<HashMap<String, Decimal>> {
        let rows = sqlx::query_as::<_, (String, Decimal)>("SELECT sku, cost FROM cost_records")
            .fetch_all(&self.db)
            .await?;

        Ok(rows.into_iter().collect())
    }

    async fn create_batch(&self, batch: &ImportBatch) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO import_batches (id, kind, file_name, file_sha256, reason, rows_total, rows_committed, rows_failed, created_by, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(batch.id)
        .bind(batch.kind.as_str())
        .bind(&batch.file_name)
        .bind(&batch.file_sha256)
        .bind(batch.reason.map(|r| r.as_str()))
        .bind(batch.rows_total)
        .bind(batch.rows_committed)
        .bind(batch.rows_failed)
        .bind(batch.created_by)
        .bind(batch.created_at)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    async fn finish_batch(&self, batch_id: Uuid, committed: i32, failed: i32) -> AppResult<()> {
        sqlx::query("UPDATE import_batches SET rows_committed = $2, rows_failed = $3 WHERE id = $1")
            .bind(batch_id)
            .bind(committed)
            .bind(failed)
            .execute(&self.db)
            .await?;

        Ok(())
    }

    async fn batch_exists(&self, kind: ImportKind, file_sha256: &str) -> AppResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM import_batches WHERE kind = $1 AND file_sha256 = $2)",
        )
        .bind(kind.as_str())
        .bind(file_sha256)
        .fetch_one(&self.db)
        .await?;

        Ok(exists)
    }

    async fn count_batches_since(
        &self,
        kind: ImportKind,
        exclude_user: Uuid,
        since: Option<DateTime<Utc>>,
    ) -> AppResult<u64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM import_batches
            WHERE kind = $1
              AND rows_committed > 0
              AND created_by IS DISTINCT FROM $2
              AND ($3::timestamptz IS NULL OR created_at > $3)
            "#,
        )
        .bind(kind.as_str())
        .bind(exclude_user)
        .bind(since)
        .fetch_one(&self.db)
        .await?;

        Ok(count.max(0) as u64)
    }
}

#[axum::async_trait]
impl LedgerStore for PgStore {
    async fn list_fixed_costs(&self) -> AppResult<Vec<FixedCost>> {
        let rows = sqlx::query_as::<_, FixedCostRow>(
            r#"
            SELECT id, name, amount, frequency, is_active, created_at, updated_at
            FROM fixed_costs
            ORDER BY name
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(FixedCost::try_from).collect()
    }

    async fn create_fixed_cost(&self, input: NewFixedCost) -> AppResult<FixedCost> {
        let row = sqlx::query_as::<_, FixedCostRow>(
            r#"
            INSERT INTO fixed_costs (name, amount, frequency, is_active)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, amount, frequency, is_active, created_at, updated_at
            "#,
        )
        .bind(&input.name)
        .bind(input.amount)
        .bind(input.frequency.as_str())
        .bind(input.is_active)
        .fetch_one(&self.db)
        .await?;

        row.try_into()
    }

    async fn update_fixed_cost(
        &self,
        id: Uuid,
        changes: FixedCostChanges,
    ) -> AppResult<Option<FixedCost>> {
        let row = sqlx::query_as::<_, FixedCostRow>(
            r#"
            UPDATE fixed_costs SET
                name = COALESCE($2, name),
                amount = COALESCE($3, amount),
                frequency = COALESCE($4, frequency),
                is_active = COALESCE($5, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, amount, frequency, is_active, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&changes.name)
        .bind(changes.amount)
        .bind(changes.frequency.map(|f| f.as_str()))
        .bind(changes.is_active)
        .fetch_optional(&self.db)
        .await?;

        row.map(FixedCost::try_from).transpose()
    }

    async fn list_payroll(&self) -> AppResult<Vec<PayrollEntry>> {
        let rows = sqlx::query_as::<_, PayrollRow>(
            r#"
            SELECT id, employee_name, period_start, period_end, total, created_at
            FROM payroll
            ORDER BY period_start DESC, employee_name
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| PayrollEntry {
                id: r.id,
                employee_name: r.employee_name,
                period_start: r.period_start,
                period_end: r.period_end,
                total: r.total,
                created_at: r.created_at,
            })
            .collect())
    }

    async fn create_payroll(&self, input: NewPayrollEntry) -> AppResult<PayrollEntry> {
        let r = sqlx::query_as::<_, PayrollRow>(
            r#"
            INSERT INTO payroll (employee_name, period_start, period_end, total)
            VALUES ($1, $2, $3, $4)
            RETURNING id, employee_name, period_start, period_end, total, created_at
            "#,
        )
        .bind(&input.employee_name)
        .bind(input.period_start)
        .bind(input.period_end)
        .bind(input.total)
        .fetch_one(&self.db)
        .await?;

        Ok(PayrollEntry {
            id: r.id,
            employee_name: r.employee_name,
            period_start: r.period_start,
            period_end: r.period_end,
            total: r.total,
            created_at: r.created_at,
        })
    }
}

#[axum::async_trait]
impl AccountStore for PgStore {
    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<UserCredentials>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, name, password_hash, role, is_active
            FROM users
            WHERE LOWER(email) = LOWER($1)
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;

        row.map(|u| -> AppResult<UserCredentials> {
            Ok(UserCredentials {
                id: u.id,
                email: u.email,
                name: u.name,
                password_hash: u.password_hash,
                role: parse_column::<UserRole>(&u.role)?,
                is_active: u.is_active,
            })
        })
        .transpose()
    }

    async fn notification_cursor(&self, user_id: Uuid) -> AppResult<NotificationCursor> {
        let last_checked_at = sqlx::query_scalar::<_, DateTime<Utc>>(
            "SELECT last_checked_at FROM notification_cursors WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(NotificationCursor {
            user_id,
            last_checked_at,
        })
    }

    async fn save_notification_cursor(&self, cursor: &NotificationCursor) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO notification_cursors (user_id, last_checked_at)
            VALUES ($1, $2)
            ON CONFLICT (user_id) DO UPDATE SET last_checked_at = EXCLUDED.last_checked_at
            "#,
        )
        .bind(cursor.user_id)
        .bind(cursor.last_checked_at)
        .execute(&self.db)
        .await?;

        Ok(())
    }
}
