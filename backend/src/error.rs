//! Error handling for the Ops Portal
//!
//! Provides consistent error responses in English and Chinese

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use shared::PipelineError;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Authentication errors
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Insufficient permissions")]
    InsufficientPermissions,

    #[error("Unauthorized: {message}")]
    Unauthorized {
        message: String,
        message_zh: String,
    },

    // Validation errors
    #[error("Validation error: {message}")]
    Validation {
        field: String,
        message: String,
        message_zh: String,
    },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Import pipeline errors
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Required column is not mapped: {field}")]
    MappingIncomplete { field: String },

    #[error("No valid rows found")]
    NoValidData,

    #[error("Import failed at SKU {sku}: {message}")]
    ImportFailed { sku: String, message: String },

    #[error("Amount out of range: {0}")]
    AmountOverflow(String),

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Parse(msg) => AppError::ParseError(msg),
            PipelineError::MappingIncomplete { field } => AppError::MappingIncomplete { field },
            PipelineError::NoValidData => AppError::NoValidData,
            PipelineError::RowCommit { sku, message } => AppError::ImportFailed { sku, message },
            PipelineError::Overflow(what) => AppError::AmountOverflow(what),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let field = errors
            .field_errors()
            .keys()
            .next()
            .map(|k| k.to_string())
            .unwrap_or_default();
        AppError::Validation {
            message: errors.to_string(),
            message_zh: format!("字段 {} 无效", field),
            field,
        }
    }
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message_en: String,
    pub message_zh: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidCredentials | AppError::InvalidToken | AppError::Unauthorized { .. } => {
                StatusCode::UNAUTHORIZED
            }
            AppError::InsufficientPermissions => StatusCode::FORBIDDEN,
            AppError::Validation { .. }
            | AppError::ValidationError(_)
            | AppError::ParseError(_)
            | AppError::AmountOverflow(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::MappingIncomplete { .. } | AppError::NoValidData => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::ImportFailed { .. } | AppError::DatabaseError(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn detail(&self) -> ErrorDetail {
        match self {
            AppError::InvalidCredentials => ErrorDetail {
                code: "INVALID_CREDENTIALS".to_string(),
                message_en: "Invalid email or password".to_string(),
                message_zh: "邮箱或密码错误".to_string(),
                field: None,
            },
            AppError::InvalidToken => ErrorDetail {
                code: "INVALID_TOKEN".to_string(),
                message_en: "Invalid token".to_string(),
                message_zh: "令牌无效".to_string(),
                field: None,
            },
            AppError::InsufficientPermissions => ErrorDetail {
                code: "FORBIDDEN".to_string(),
                message_en: "You do not have permission to perform this action".to_string(),
                message_zh: "您没有执行此操作的权限".to_string(),
                field: None,
            },
            AppError::Unauthorized { message, message_zh } => ErrorDetail {
                code: "UNAUTHORIZED".to_string(),
                message_en: message.clone(),
                message_zh: message_zh.clone(),
                field: None,
            },
            AppError::Validation {
                field,
                message,
                message_zh,
            } => ErrorDetail {
                code: "VALIDATION_ERROR".to_string(),
                message_en: message.clone(),
                message_zh: message_zh.clone(),
                field: Some(field.clone()),
            },
            AppError::ValidationError(msg) => ErrorDetail {
                code: "VALIDATION_ERROR".to_string(),
                message_en: msg.clone(),
                message_zh: format!("数据无效: {}", msg),
                field: None,
            },
            AppError::NotFound(resource) => ErrorDetail {
                code: "NOT_FOUND".to_string(),
                message_en: format!("{} not found", resource),
                message_zh: format!("未找到 {}", resource),
                field: None,
            },
            AppError::ParseError(msg) => ErrorDetail {
                code: "PARSE_ERROR".to_string(),
                message_en: format!("Could not read spreadsheet: {}", msg),
                message_zh: "无法读取表格文件".to_string(),
                field: None,
            },
            AppError::MappingIncomplete { field } => ErrorDetail {
                code: "MAPPING_INCOMPLETE".to_string(),
                message_en: format!("Please map a column to {}", field),
                message_zh: format!("请为 {} 选择对应的列", field),
                field: Some(field.clone()),
            },
            AppError::NoValidData => ErrorDetail {
                code: "NO_VALID_DATA".to_string(),
                message_en: "No valid rows found in the uploaded file".to_string(),
                message_zh: "上传的文件中没有有效数据".to_string(),
                field: None,
            },
            AppError::ImportFailed { sku, message } => ErrorDetail {
                code: "IMPORT_FAILED".to_string(),
                message_en: format!("Import rolled back at SKU {}: {}", sku, message),
                message_zh: format!("导入已回滚 (SKU {})", sku),
                field: None,
            },
            AppError::AmountOverflow(what) => ErrorDetail {
                code: "AMOUNT_OVERFLOW".to_string(),
                message_en: format!("Amounts are too large to compute {}", what),
                message_zh: "金额超出可计算范围".to_string(),
                field: None,
            },
            AppError::DatabaseError(_) => ErrorDetail {
                code: "DATABASE_ERROR".to_string(),
                message_en: "A database error occurred".to_string(),
                message_zh: "数据库错误".to_string(),
                field: None,
            },
            AppError::Internal(msg) => ErrorDetail {
                code: "INTERNAL_ERROR".to_string(),
                message_en: msg.clone(),
                message_zh: "服务器内部错误".to_string(),
                field: None,
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_detail = self.detail();

        // Log the error for debugging
        tracing::error!("Error: {:?}", self);

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;
