//! Multipart upload form parsing shared by the import and report handlers

use axum::extract::multipart::{Multipart, MultipartError};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::str::FromStr;

use crate::error::{AppError, AppResult};
use crate::services::UploadedFile;

const FILE_FIELD: &str = "file";

fn bad_multipart(err: MultipartError) -> AppError {
    AppError::ValidationError(format!("Malformed upload: {}", err))
}

fn invalid_field(field: &str, message: String) -> AppError {
    AppError::Validation {
        field: field.to_string(),
        message_zh: format!("字段 {} 无效", field),
        message,
    }
}

/// The `file` part of an upload plus its text fields
#[derive(Debug, Default)]
pub struct UploadForm {
    file: Option<UploadedFile>,
    fields: HashMap<String, String>,
}

impl UploadForm {
    pub async fn read(mut multipart: Multipart) -> AppResult<Self> {
        let mut form = UploadForm::default();

        while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
            let name = field.name().unwrap_or_default().to_string();
            if name == FILE_FIELD {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let bytes = field.bytes().await.map_err(bad_multipart)?;
                form.file = Some(UploadedFile::new(file_name, bytes.to_vec()));
            } else {
                let text = field.text().await.map_err(bad_multipart)?;
                form.fields.insert(name, text);
            }
        }

        Ok(form)
    }

    /// The uploaded file; the form must contain one
    pub fn take_file(&mut self) -> AppResult<UploadedFile> {
        self.file.take().ok_or_else(|| AppError::Validation {
            field: FILE_FIELD.to_string(),
            message: "A spreadsheet file is required".to_string(),
            message_zh: "请上传表格文件".to_string(),
        })
    }

    fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
    }

    /// A field holding JSON, e.g. a confirmed column mapping
    pub fn json<T: DeserializeOwned>(&self, name: &str) -> AppResult<Option<T>> {
        self.text(name)
            .map(|raw| serde_json::from_str(raw).map_err(|e| invalid_field(name, e.to_string())))
            .transpose()
    }

    /// A field holding a plain value such as a reason or commit mode
    pub fn parsed<T: FromStr<Err = String>>(&self, name: &str) -> AppResult<Option<T>> {
        self.text(name)
            .map(|raw| T::from_str(raw).map_err(|e| invalid_field(name, e)))
            .transpose()
    }

    pub fn required<T>(value: Option<T>, name: &str) -> AppResult<T> {
        value.ok_or_else(|| invalid_field(name, format!("{} is required", name)))
    }
}
