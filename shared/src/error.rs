//! Errors raised by the ingestion pipeline stages

use thiserror::Error;

/// Failures of the read → map → validate → commit pipeline.
///
/// `Parse`, `MappingIncomplete` and `NoValidData` abort a run before any
/// state changes. `RowCommit` describes a single row that could not be
/// written; it never stops the remaining rows of a per-row import.
/// `Overflow` is raised when a profit total leaves the decimal range.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error("Could not read spreadsheet: {0}")]
    Parse(String),

    #[error("Required column is not mapped: {field}")]
    MappingIncomplete { field: String },

    #[error("No valid rows found in the uploaded file")]
    NoValidData,

    #[error("Failed to commit row for SKU {sku}: {message}")]
    RowCommit { sku: String, message: String },

    #[error("Amount out of range while computing {0}")]
    Overflow(String),
}

impl PipelineError {
    pub fn parse(message: impl Into<String>) -> Self {
        PipelineError::Parse(message.into())
    }

    pub fn mapping_incomplete(field: impl Into<String>) -> Self {
        PipelineError::MappingIncomplete {
            field: field.into(),
        }
    }

    pub fn row_commit(sku: impl Into<String>, message: impl Into<String>) -> Self {
        PipelineError::RowCommit {
            sku: sku.into(),
            message: message.into(),
        }
    }

    pub fn overflow(what: impl Into<String>) -> Self {
        PipelineError::Overflow(what.into())
    }

    /// Stable machine-readable code for API responses and the browser
    pub fn code(&self) -> &'static str {
        match self {
            PipelineError::Parse(_) => "PARSE_ERROR",
            PipelineError::MappingIncomplete { .. } => "MAPPING_INCOMPLETE",
            PipelineError::NoValidData => "NO_VALID_DATA",
            PipelineError::RowCommit { .. } => "ROW_COMMIT_ERROR",
            PipelineError::Overflow(_) => "AMOUNT_OVERFLOW",
        }
    }
}
