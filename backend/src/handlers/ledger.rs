//! Fixed cost and payroll handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::CurrentUser;
use crate::services::ledger::{CreateFixedCostInput, CreatePayrollInput, UpdateFixedCostInput};
use crate::services::LedgerService;
use crate::AppState;
use shared::models::{FixedCost, PayrollEntry};

pub async fn list_fixed_costs(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> Result<Json<Vec<FixedCost>>, AppError> {
    current_user.0.require_finance_access()?;
    let service = LedgerService::new(state.store());
    Ok(Json(service.list_fixed_costs().await?))
}

pub async fn create_fixed_cost(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateFixedCostInput>,
) -> Result<(StatusCode, Json<FixedCost>), AppError> {
    current_user.0.require_finance_access()?;
    let service = LedgerService::new(state.store());
    let cost = service.create_fixed_cost(input).await?;
    Ok((StatusCode::CREATED, Json(cost)))
}

pub async fn update_fixed_cost(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateFixedCostInput>,
) -> Result<Json<FixedCost>, AppError> {
    current_user.0.require_finance_access()?;
    let service = LedgerService::new(state.store());
    Ok(Json(service.update_fixed_cost(id, input).await?))
}

pub async fn list_payroll(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> Result<Json<Vec<PayrollEntry>>, AppError> {
    current_user.0.require_finance_access()?;
    let service = LedgerService::new(state.store());
    Ok(Json(service.list_payroll().await?))
}

pub async fn create_payroll(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreatePayrollInput>,
) -> Result<(StatusCode, Json<PayrollEntry>), AppError> {
    current_user.0.require_finance_access()?;
    let service = LedgerService::new(state.store());
    let entry = service.create_payroll(input).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}
