//! Notification handlers

use axum::{extract::State, Json};

use crate::error::AppError;
use crate::middleware::CurrentUser;
use crate::services::NotificationService;
use crate::AppState;
use shared::models::{NotificationCursor, UnreadSummary};

/// Imports by other users since the caller last checked
pub async fn get_unread_count(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> Result<Json<UnreadSummary>, AppError> {
    let service = NotificationService::new(state.store());
    Ok(Json(service.unread_count(current_user.0.user_id).await?))
}

pub async fn mark_checked(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> Result<Json<NotificationCursor>, AppError> {
    let service = NotificationService::new(state.store());
    Ok(Json(service.mark_checked(current_user.0.user_id).await?))
}
