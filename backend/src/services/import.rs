//! Import service: preview, reconcile and export uploaded spreadsheets
//!
//! Reconciliation order for one upload:
//! 1. Read the sheet and validate rows against the confirmed mapping
//! 2. Open an import batch carrying the file fingerprint
//! 3. Upsert rows per the commit mode, one history entry per inventory row
//! 4. Close the batch with committed / failed counts

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::ImportConfig;
use crate::error::{AppError, AppResult};
use crate::services::spreadsheet::{read_sheet, UploadedFile};
use crate::store::{InboundContext, InventoryStore};
use shared::models::{
    ColumnMapping, CommitMode, ImportBatch, ImportKind, InReason, ReconcileSummary, RowFailure,
    SemanticField, UpsertOutcome, COST_SHEET_REQUIRED_FIELDS, INVENTORY_REQUIRED_FIELDS,
};
use shared::{
    infer_mapping, screen_cost_rows, screen_inventory_rows, validate_cost_rows,
    validate_inventory_rows, PipelineError, RejectedRow, Sheet,
};

const SAMPLE_ROWS: usize = 5;

/// What the user sees before confirming an import
#[derive(Debug, Clone, Serialize)]
pub struct ImportPreview {
    pub kind: ImportKind,
    pub file_name: String,
    pub headers: Vec<String>,
    pub row_count: usize,
    pub suggested_mapping: ColumnMapping,
    /// Required fields the suggestion could not fill
    pub missing_fields: Vec<SemanticField>,
    pub sample_rows: Vec<Vec<String>>,
    /// Rows the suggested mapping would accept / reject, when it is complete
    pub accepted_rows: Option<usize>,
    pub rejected_rows: Vec<RejectedRow>,
    pub previously_imported: bool,
}

/// A confirmed inventory import
#[derive(Debug, Clone, Deserialize)]
pub struct InventoryCommit {
    pub mapping: ColumnMapping,
    pub reason: InReason,
    pub mode: Option<CommitMode>,
}

/// A confirmed cost sheet import
#[derive(Debug, Clone, Deserialize)]
pub struct CostSheetCommit {
    pub mapping: ColumnMapping,
    pub mode: Option<CommitMode>,
}

/// Import service generic over the inventory store
#[derive(Clone)]
pub struct ImportService<S> {
    store: S,
    config: ImportConfig,
}

impl<S: InventoryStore> ImportService<S> {
    pub fn new(store: S, config: &ImportConfig) -> Self {
        Self {
            store,
            config: config.clone(),
        }
    }

    fn load(&self, file: &UploadedFile) -> AppResult<Sheet> {
        file.ensure_within(self.config.max_upload_bytes)?;
        Ok(read_sheet(file)?)
    }

    /// Parse the file and suggest a column mapping
    pub async fn preview(&self, file: &UploadedFile, kind: ImportKind) -> AppResult<ImportPreview> {
        let sheet = self.load(file)?;
        let suggested_mapping = infer_mapping(&sheet.headers);

        let required = match kind {
            ImportKind::Inventory => INVENTORY_REQUIRED_FIELDS,
            ImportKind::CostSheet => COST_SHEET_REQUIRED_FIELDS,
        };
        let missing_fields: Vec<SemanticField> = required
            .iter()
            .copied()
            .filter(|f| !suggested_mapping.is_mapped(*f))
            .collect();

        let (accepted_rows, rejected_rows) = if missing_fields.is_empty() {
            let (accepted, rejected) = match kind {
                ImportKind::Inventory => screen_inventory_rows(&sheet, &suggested_mapping)
                    .map(|r| (r.parsed_count(), r.rejected))?,
                ImportKind::CostSheet => screen_cost_rows(&sheet, &suggested_mapping)
                    .map(|r| (r.parsed_count(), r.rejected))?,
            };
            (Some(accepted), rejected)
        } else {
            (None, Vec::new())
        };

        let sample_rows: Vec<Vec<String>> = sheet
            .rows
            .iter()
            .take(SAMPLE_ROWS)
            .map(|row| row.cells.iter().map(|c| c.to_text()).collect())
            .collect();

        let previously_imported = self.store.batch_exists(kind, &file.fingerprint()).await?;

        Ok(ImportPreview {
            kind,
            file_name: file.file_name.clone(),
            row_count: sheet.row_count(),
            headers: sheet.headers,
            suggested_mapping,
            missing_fields,
            sample_rows,
            accepted_rows,
            rejected_rows,
            previously_imported,
        })
    }

    async fn open_batch(
        &self,
        kind: ImportKind,
        file: &UploadedFile,
        reason: Option<InReason>,
        rows_total: usize,
        user_id: Option<Uuid>,
    ) -> AppResult<(ImportBatch, bool)> {
        let sha = file.fingerprint();
        let previously_imported = self.store.batch_exists(kind, &sha).await?;
        if previously_imported {
            tracing::warn!(
                file = %file.file_name,
                kind = kind.as_str(),
                "file with the same fingerprint was imported before; quantities will add again"
            );
        }

        let batch = ImportBatch::start(kind, &file.file_name, &sha, reason, rows_total, user_id);
        self.store.create_batch(&batch).await?;
        Ok((batch, previously_imported))
    }

    /// Validate and reconcile an inventory sheet
    pub async fn commit_inventory(
        &self,
        file: &UploadedFile,
        request: InventoryCommit,
        user_id: Option<Uuid>,
    ) -> AppResult<ReconcileSummary> {
        let sheet = self.load(file)?;
        let report = validate_inventory_rows(&sheet, &request.mapping)?;
        let mode = request.mode.unwrap_or(self.config.default_mode);

        let (batch, previously_imported) = self
            .open_batch(
                ImportKind::Inventory,
                file,
                Some(request.reason),
                report.accepted.len(),
                user_id,
            )
            .await?;
        let ctx = InboundContext {
            batch_id: batch.id,
            reason: request.reason.history_text(&file.file_name),
            user_id,
        };

        let mut tally = Tally::new(
            &batch,
            mode,
            previously_imported,
            report.parsed_count(),
            report.rejected.len(),
        );
        match mode {
            CommitMode::PerRow => {
                for row in &report.accepted {
                    match self.store.apply_inbound(row, &ctx).await {
                        Ok(outcome) => tally.record(outcome),
                        Err(err) => tally.fail(row.line, &row.sku, &err),
                    }
                }
            }
            CommitMode::AllOrNothing => {
                match self.store.apply_inbound_all(&report.accepted, &ctx).await {
                    Ok(outcomes) => outcomes.into_iter().for_each(|o| tally.record(o)),
                    Err(err) => return self.abort(&batch, report.accepted.len(), err).await,
                }
            }
        }

        self.close(&batch, tally.finish()).await
    }

    /// Validate and reconcile a cost sheet; cost records carry no history
    pub async fn commit_cost_sheet(
        &self,
        file: &UploadedFile,
        request: CostSheetCommit,
        user_id: Option<Uuid>,
    ) -> AppResult<ReconcileSummary> {
        let sheet = self.load(file)?;
        let report = validate_cost_rows(&sheet, &request.mapping)?;
        let mode = request.mode.unwrap_or(self.config.default_mode);

        let (batch, previously_imported) = self
            .open_batch(ImportKind::CostSheet, file, None, report.accepted.len(), user_id)
            .await?;

        let mut tally = Tally::new(
            &batch,
            mode,
            previously_imported,
            report.parsed_count(),
            report.rejected.len(),
        );
        match mode {
            CommitMode::PerRow => {
                for row in &report.accepted {
                    match self.store.upsert_cost(row, user_id).await {
                        Ok(outcome) => tally.record(outcome),
                        Err(err) => tally.fail(row.line, &row.sku, &err),
                    }
                }
            }
            CommitMode::AllOrNothing => {
                match self.store.upsert_costs_all(&report.accepted, user_id).await {
                    Ok(outcomes) => outcomes.into_iter().for_each(|o| tally.record(o)),
                    Err(err) => return self.abort(&batch, report.accepted.len(), err).await,
                }
            }
        }

        self.close(&batch, tally.finish()).await
    }

    /// Cleaned inventory rows as CSV, without touching the store
    pub fn export_csv(&self, file: &UploadedFile, mapping: &ColumnMapping) -> AppResult<String> {
        let sheet = self.load(file)?;
        let report = validate_inventory_rows(&sheet, mapping)?;
        export_to_csv(&report.accepted)
    }

    async fn close(&self, batch: &ImportBatch, summary: ReconcileSummary) -> AppResult<ReconcileSummary> {
        self.store
            .finish_batch(batch.id, summary.committed as i32, summary.failed as i32)
            .await?;

        tracing::info!(
            batch_id = %batch.id,
            kind = batch.kind.as_str(),
            file = %batch.file_name,
            committed = summary.committed,
            inserted = summary.inserted,
            updated = summary.updated,
            failed = summary.failed,
            rejected = summary.rejected,
            "import batch finished"
        );
        Ok(summary)
    }

    async fn abort(&self, batch: &ImportBatch, rows: usize, err: AppError) -> AppResult<ReconcileSummary> {
        tracing::warn!(batch_id = %batch.id, error = %err, "import batch rolled back");
        self.store.finish_batch(batch.id, 0, rows as i32).await?;

        Err(match err {
            AppError::ImportFailed { .. } => err,
            other => AppError::ImportFailed {
                sku: String::new(),
                message: other.to_string(),
            },
        })
    }
}

/// Running counts for one batch
struct Tally {
    summary: ReconcileSummary,
}

impl Tally {
    fn new(
        batch: &ImportBatch,
        mode: CommitMode,
        previously_imported: bool,
        parsed: usize,
        rejected: usize,
    ) -> Self {
        Self {
            summary: ReconcileSummary {
                batch_id: batch.id,
                mode,
                previously_imported,
                parsed,
                rejected,
                committed: 0,
                failed: 0,
                inserted: 0,
                updated: 0,
                failures: Vec::new(),
            },
        }
    }

    fn record(&mut self, outcome: UpsertOutcome) {
        self.summary.committed += 1;
        match outcome {
            UpsertOutcome::Inserted => self.summary.inserted += 1,
            UpsertOutcome::Updated => self.summary.updated += 1,
        }
    }

    fn fail(&mut self, line: usize, sku: &str, err: &AppError) {
        let failure = PipelineError::row_commit(sku, err.to_string());
        tracing::warn!(
            batch_id = %self.summary.batch_id,
            line,
            error = %failure,
            "row failed to commit"
        );
        self.summary.failed += 1;
        self.summary.failures.push(RowFailure::new(line, &failure));
    }

    fn finish(self) -> ReconcileSummary {
        self.summary
    }
}

/// Export any serializable rows to CSV text
pub fn export_to_csv<T: Serialize>(data: &[T]) -> AppResult<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for record in data {
        wtr.serialize(record)
            .map_err(|e| AppError::Internal(format!("CSV serialization error: {}", e)))?;
    }
    let bytes = wtr
        .into_inner()
        .map_err(|e| AppError::Internal(format!("CSV writer error: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| AppError::Internal(format!("UTF-8 conversion error: {}", e)))
}
