//! Spreadsheet import handlers

use axum::{
    extract::{Multipart, State},
    http::header,
    response::IntoResponse,
    Json,
};

use crate::error::AppError;
use crate::handlers::upload::UploadForm;
use crate::middleware::CurrentUser;
use crate::services::import::{CostSheetCommit, ImportPreview, InventoryCommit};
use crate::services::ImportService;
use crate::AppState;
use shared::models::{ImportKind, ReconcileSummary};

/// Preview an inventory sheet with a suggested mapping
pub async fn preview_inventory(
    State(state): State<AppState>,
    current_user: CurrentUser,
    multipart: Multipart,
) -> Result<Json<ImportPreview>, AppError> {
    current_user.0.require_inventory_access()?;
    let mut form = UploadForm::read(multipart).await?;
    let file = form.take_file()?;

    let service = ImportService::new(state.store(), &state.config.import);
    let preview = service.preview(&file, ImportKind::Inventory).await?;
    Ok(Json(preview))
}

/// Commit an inventory sheet with the confirmed mapping and in-reason
pub async fn commit_inventory(
    State(state): State<AppState>,
    current_user: CurrentUser,
    multipart: Multipart,
) -> Result<Json<ReconcileSummary>, AppError> {
    current_user.0.require_inventory_access()?;
    let mut form = UploadForm::read(multipart).await?;
    let file = form.take_file()?;
    let request = InventoryCommit {
        mapping: UploadForm::required(form.json("mapping")?, "mapping")?,
        reason: UploadForm::required(form.parsed("reason")?, "reason")?,
        mode: form.parsed("mode")?,
    };

    let service = ImportService::new(state.store(), &state.config.import);
    let summary = service
        .commit_inventory(&file, request, Some(current_user.0.user_id))
        .await?;
    Ok(Json(summary))
}

/// Cleaned inventory rows as a CSV download
pub async fn export_inventory(
    State(state): State<AppState>,
    current_user: CurrentUser,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    current_user.0.require_inventory_access()?;
    let mut form = UploadForm::read(multipart).await?;
    let file = form.take_file()?;
    let mapping = UploadForm::required(form.json("mapping")?, "mapping")?;

    let service = ImportService::new(state.store(), &state.config.import);
    let csv = service.export_csv(&file, &mapping)?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"inventory-clean.csv\"",
            ),
        ],
        csv,
    ))
}

/// Preview a cost sheet
pub async fn preview_cost_sheet(
    State(state): State<AppState>,
    current_user: CurrentUser,
    multipart: Multipart,
) -> Result<Json<ImportPreview>, AppError> {
    current_user.0.require_finance_access()?;
    let mut form = UploadForm::read(multipart).await?;
    let file = form.take_file()?;

    let service = ImportService::new(state.store(), &state.config.import);
    let preview = service.preview(&file, ImportKind::CostSheet).await?;
    Ok(Json(preview))
}

/// Commit a cost sheet
pub async fn commit_cost_sheet(
    State(state): State<AppState>,
    current_user: CurrentUser,
    multipart: Multipart,
) -> Result<Json<ReconcileSummary>, AppError> {
    current_user.0.require_finance_access()?;
    let mut form = UploadForm::read(multipart).await?;
    let file = form.take_file()?;
    let request = CostSheetCommit {
        mapping: UploadForm::required(form.json("mapping")?, "mapping")?,
        mode: form.parsed("mode")?,
    };

    let service = ImportService::new(state.store(), &state.config.import);
    let summary = service
        .commit_cost_sheet(&file, request, Some(current_user.0.user_id))
        .await?;
    Ok(Json(summary))
}
