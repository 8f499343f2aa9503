//! Inventory read service

use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::store::{InventoryStore, Page};
use shared::models::{CostRecord, InventoryHistoryEntry, InventoryRecord};

const MAX_PAGE_SIZE: i64 = 500;

/// Query parameters for list endpoints
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ListQuery {
    pub fn page(&self) -> Page {
        let default = Page::default();
        Page {
            limit: self.limit.unwrap_or(default.limit).clamp(1, MAX_PAGE_SIZE),
            offset: self.offset.unwrap_or(0).max(0),
        }
    }
}

/// Inventory service
#[derive(Clone)]
pub struct InventoryService<S> {
    store: S,
}

impl<S: InventoryStore> InventoryService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn list(&self, query: &ListQuery) -> AppResult<Vec<InventoryRecord>> {
        self.store.list_inventory(query.page()).await
    }

    /// Movement history of one SKU, newest first
    pub async fn history(&self, sku: &str, query: &ListQuery) -> AppResult<Vec<InventoryHistoryEntry>> {
        if self.store.get_inventory(sku).await?.is_none() {
            return Err(AppError::NotFound(format!("Inventory record {}", sku)));
        }
        self.store.history_for_sku(sku, query.page()).await
    }

    pub async fn cost_records(&self, query: &ListQuery) -> AppResult<Vec<CostRecord>> {
        self.store.list_cost_records(query.page()).await
    }
}
