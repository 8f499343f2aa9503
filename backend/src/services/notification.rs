//! Notification service
//!
//! Unread counts are computed from import batches created by other users
//! after the caller's cursor. The cursor is stored per user and only moves
//! when the user marks notifications as checked.

use chrono::Utc;
use uuid::Uuid;

use crate::error::AppResult;
use crate::store::{AccountStore, InventoryStore};
use shared::models::{ImportKind, NotificationCursor, UnreadSummary};

/// Notification service
#[derive(Clone)]
pub struct NotificationService<S> {
    store: S,
}

impl<S: AccountStore + InventoryStore> NotificationService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn unread_count(&self, user_id: Uuid) -> AppResult<UnreadSummary> {
        let cursor = self.store.notification_cursor(user_id).await?;
        self.unread_since(&cursor).await
    }

    /// Counts for an explicit cursor
    pub async fn unread_since(&self, cursor: &NotificationCursor) -> AppResult<UnreadSummary> {
        let since = cursor.last_checked_at;
        let inventory_imports = self
            .store
            .count_batches_since(ImportKind::Inventory, cursor.user_id, since)
            .await?;
        let cost_sheet_imports = self
            .store
            .count_batches_since(ImportKind::CostSheet, cursor.user_id, since)
            .await?;

        Ok(UnreadSummary {
            inventory_imports,
            cost_sheet_imports,
            since,
        })
    }

    /// Move the user's cursor to now
    pub async fn mark_checked(&self, user_id: Uuid) -> AppResult<NotificationCursor> {
        let cursor = self
            .store
            .notification_cursor(user_id)
            .await?
            .advanced(Utc::now());
        self.store.save_notification_cursor(&cursor).await?;

        tracing::debug!(user_id = %user_id, "notifications marked as checked");
        Ok(cursor)
    }
}
