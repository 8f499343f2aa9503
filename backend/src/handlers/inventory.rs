//! Inventory and cost record handlers

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::error::AppError;
use crate::middleware::CurrentUser;
use crate::services::inventory::ListQuery;
use crate::services::InventoryService;
use crate::AppState;
use shared::models::{CostRecord, InventoryHistoryEntry, InventoryRecord};

/// List inventory records
pub async fn list_inventory(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<InventoryRecord>>, AppError> {
    let service = InventoryService::new(state.store());
    Ok(Json(service.list(&query).await?))
}

/// Movement history of one SKU
pub async fn get_inventory_history(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(sku): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<InventoryHistoryEntry>>, AppError> {
    let service = InventoryService::new(state.store());
    Ok(Json(service.history(&sku, &query).await?))
}

/// List uploaded unit costs
pub async fn list_cost_records(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<CostRecord>>, AppError> {
    current_user.0.require_finance_access()?;
    let service = InventoryService::new(state.store());
    Ok(Json(service.cost_records(&query).await?))
}
