//! Profit report handlers

use axum::{
    extract::{Multipart, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

use crate::error::AppError;
use crate::handlers::upload::UploadForm;
use crate::middleware::CurrentUser;
use crate::services::reporting::ProfitRequest;
use crate::services::ReportingService;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    pub download: Option<String>,
}

impl ReportQuery {
    fn wants_download(&self) -> bool {
        matches!(self.download.as_deref(), Some("1" | "true"))
    }
}

/// Profit analysis of an uploaded settlement sheet
pub async fn analyze_profit(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ReportQuery>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    current_user.0.require_finance_access()?;
    let mut form = UploadForm::read(multipart).await?;
    let file = form.take_file()?;
    let request = ProfitRequest {
        mapping: form.json("mapping")?,
        basis: form.parsed("basis")?.unwrap_or_default(),
    };

    let service = ReportingService::new(
        state.store(),
        &state.config.reports,
        state.config.import.max_upload_bytes,
    );
    let analysis = service.analyze_settlements(&file, request).await?;

    if query.wants_download() {
        return Ok((
            [(
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"profit-analysis.json\"",
            )],
            Json(analysis),
        )
            .into_response());
    }
    Ok(Json(analysis).into_response())
}
