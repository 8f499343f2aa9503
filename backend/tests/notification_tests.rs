//! Notification cursor tests
//!
//! Unread counts cover committed imports by other users after the caller's
//! last check.

mod common;

use chrono::{Duration, Utc};
use common::{csv_file, MemoryStore};
use ops_portal_backend::config::ImportConfig;
use ops_portal_backend::services::import::{CostSheetCommit, InventoryCommit};
use ops_portal_backend::services::{ImportService, NotificationService};
use shared::infer_mapping;
use shared::models::{CommitMode, ImportBatch, ImportKind, InReason, NotificationCursor};
use uuid::Uuid;

async fn import_stock(store: &MemoryStore, file_name: &str, user_id: Uuid) {
    let headers: Vec<String> = ["SKU", "Product Name", "Quantity", "Unit Cost"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    ImportService::new(store.clone(), &ImportConfig::default())
        .commit_inventory(
            &csv_file(
                file_name,
                &format!("SKU,Product Name,Quantity,Unit Cost\n{},Widget,1,1.00\n", file_name),
            ),
            InventoryCommit {
                mapping: infer_mapping(&headers),
                reason: InReason::Purchase,
                mode: None,
            },
            Some(user_id),
        )
        .await
        .unwrap();
}

async fn import_costs(store: &MemoryStore, user_id: Uuid) {
    let headers = vec!["SKU".to_string(), "Cost".to_string()];
    ImportService::new(store.clone(), &ImportConfig::default())
        .commit_cost_sheet(
            &csv_file("costs.csv", "SKU,Cost\nA1,1.00\n"),
            CostSheetCommit {
                mapping: infer_mapping(&headers),
                mode: None,
            },
            Some(user_id),
        )
        .await
        .unwrap();
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// A user who never checked sees every import by others
    #[tokio::test]
    async fn test_fresh_user_sees_all_other_imports() {
        let store = MemoryStore::new();
        let me = Uuid::new_v4();
        let colleague = Uuid::new_v4();

        import_stock(&store, "a.csv", colleague).await;
        import_stock(&store, "b.csv", colleague).await;
        import_costs(&store, colleague).await;
        import_stock(&store, "mine.csv", me).await;

        let unread = NotificationService::new(store.clone())
            .unread_count(me)
            .await
            .unwrap();

        assert_eq!(unread.inventory_imports, 2);
        assert_eq!(unread.cost_sheet_imports, 1);
        assert_eq!(unread.total(), 3);
        assert_eq!(unread.since, None);
    }

    /// Marking as checked hides older imports but not later ones
    #[tokio::test]
    async fn test_mark_checked_moves_cursor() {
        let store = MemoryStore::new();
        let svc = NotificationService::new(store.clone());
        let me = Uuid::new_v4();
        let colleague = Uuid::new_v4();

        import_stock(&store, "a.csv", colleague).await;
        let cursor = svc.mark_checked(me).await.unwrap();
        assert!(cursor.last_checked_at.is_some());
        assert_eq!(svc.unread_count(me).await.unwrap().total(), 0);

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        import_stock(&store, "b.csv", colleague).await;

        let unread = svc.unread_count(me).await.unwrap();
        assert_eq!(unread.inventory_imports, 1);
        assert_eq!(unread.since, cursor.last_checked_at);
    }

    /// Rolled-back imports committed nothing and are not announced
    #[tokio::test]
    async fn test_failed_batches_not_counted() {
        let store = MemoryStore::new();
        let me = Uuid::new_v4();
        let colleague = Uuid::new_v4();
        store.fail_on("A1");

        let headers: Vec<String> = ["SKU", "Product Name", "Quantity", "Unit Cost"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let result = ImportService::new(store.clone(), &ImportConfig::default())
            .commit_inventory(
                &csv_file("x.csv", "SKU,Product Name,Quantity,Unit Cost\nA1,Widget,1,1.00\n"),
                InventoryCommit {
                    mapping: infer_mapping(&headers),
                    reason: InReason::Return,
                    mode: Some(CommitMode::AllOrNothing),
                },
                Some(colleague),
            )
            .await;
        assert!(result.is_err());

        let unread = NotificationService::new(store.clone())
            .unread_count(me)
            .await
            .unwrap();
        assert_eq!(unread.total(), 0);
    }

    /// Counts for an explicit cursor ignore the stored one
    #[tokio::test]
    async fn test_unread_since_explicit_cursor() {
        let store = MemoryStore::new();
        let me = Uuid::new_v4();
        let mut old = ImportBatch::start(ImportKind::Inventory, "old.csv", "00", None, 1, Some(Uuid::new_v4()));
        old.rows_committed = 1;
        old.created_at = Utc::now() - Duration::days(2);
        store.add_batch(old);
        import_stock(&store, "new.csv", Uuid::new_v4()).await;

        let svc = NotificationService::new(store.clone());
        let cursor = NotificationCursor::new(me).advanced(Utc::now() - Duration::days(1));
        let unread = svc.unread_since(&cursor).await.unwrap();

        assert_eq!(unread.inventory_imports, 1);
        assert_eq!(svc.unread_count(me).await.unwrap().inventory_imports, 2);
    }
}
