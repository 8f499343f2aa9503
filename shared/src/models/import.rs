//! Import batch and reconciliation result models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::InReason;
use crate::error::PipelineError;

/// What an import batch wrote to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportKind {
    Inventory,
    CostSheet,
}

impl ImportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportKind::Inventory => "inventory",
            ImportKind::CostSheet => "cost_sheet",
        }
    }
}

impl std::str::FromStr for ImportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "inventory" => Ok(ImportKind::Inventory),
            "cost_sheet" => Ok(ImportKind::CostSheet),
            other => Err(format!("Unknown import kind: {}", other)),
        }
    }
}

/// How rows of one import are grouped into store transactions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitMode {
    /// Each row commits on its own; failed rows are counted and skipped
    #[default]
    PerRow,
    /// One transaction for the whole file; any failure rolls everything back
    AllOrNothing,
}

impl std::str::FromStr for CommitMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "per_row" => Ok(CommitMode::PerRow),
            "all_or_nothing" => Ok(CommitMode::AllOrNothing),
            other => Err(format!("Unknown commit mode: {}", other)),
        }
    }
}

/// One run of an import, stamped on every history entry it produces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportBatch {
    pub id: Uuid,
    pub kind: ImportKind,
    pub file_name: String,
    /// Hex SHA-256 of the uploaded bytes
    pub file_sha256: String,
    pub reason: Option<InReason>,
    pub rows_total: i32,
    pub rows_committed: i32,
    pub rows_failed: i32,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl ImportBatch {
    pub fn start(
        kind: ImportKind,
        file_name: &str,
        file_sha256: &str,
        reason: Option<InReason>,
        rows_total: usize,
        created_by: Option<Uuid>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            file_name: file_name.to_string(),
            file_sha256: file_sha256.to_string(),
            reason,
            rows_total: rows_total as i32,
            rows_committed: 0,
            rows_failed: 0,
            created_by,
            created_at: Utc::now(),
        }
    }
}

/// A row that failed to commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowFailure {
    pub line: usize,
    pub sku: String,
    pub code: String,
    pub message: String,
}

impl RowFailure {
    pub fn new(line: usize, err: &PipelineError) -> Self {
        let sku = match err {
            PipelineError::RowCommit { sku, .. } => sku.clone(),
            _ => String::new(),
        };
        Self {
            line,
            sku,
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

/// Outcome of reconciling one file against the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconcileSummary {
    pub batch_id: Uuid,
    pub mode: CommitMode,
    /// A batch with the same file fingerprint already existed
    pub previously_imported: bool,
    pub parsed: usize,
    pub rejected: usize,
    pub committed: usize,
    pub failed: usize,
    pub inserted: usize,
    pub updated: usize,
    pub failures: Vec<RowFailure>,
}

impl ReconcileSummary {
    pub fn is_complete(&self) -> bool {
        self.failed == 0
    }
}
