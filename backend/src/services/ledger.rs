//! Fixed costs and payroll

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::store::{FixedCostChanges, LedgerStore, NewFixedCost, NewPayrollEntry};
use shared::models::{CostFrequency, FixedCost, PayrollEntry};

/// Input for creating a fixed cost
#[derive(Debug, Deserialize, Validate)]
pub struct CreateFixedCostInput {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub amount: Decimal,
    pub frequency: CostFrequency,
    pub is_active: Option<bool>,
}

/// Input for updating a fixed cost
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateFixedCostInput {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub amount: Option<Decimal>,
    pub frequency: Option<CostFrequency>,
    pub is_active: Option<bool>,
}

/// Input for recording payroll
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePayrollInput {
    #[validate(length(min = 1, max = 200))]
    pub employee_name: String,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub total: Decimal,
}

fn ensure_non_negative(field: &str, amount: Decimal) -> AppResult<()> {
    if amount < Decimal::ZERO {
        return Err(AppError::Validation {
            field: field.to_string(),
            message: format!("{} must not be negative", field),
            message_zh: format!("{} 不能为负数", field),
        });
    }
    Ok(())
}

/// Ledger service
#[derive(Clone)]
pub struct LedgerService<S> {
    store: S,
}

impl<S: LedgerStore> LedgerService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn list_fixed_costs(&self) -> AppResult<Vec<FixedCost>> {
        self.store.list_fixed_costs().await
    }

    pub async fn create_fixed_cost(&self, input: CreateFixedCostInput) -> AppResult<FixedCost> {
        input.validate()?;
        ensure_non_negative("amount", input.amount)?;

        let cost = self
            .store
            .create_fixed_cost(NewFixedCost {
                name: input.name.trim().to_string(),
                amount: input.amount,
                frequency: input.frequency,
                is_active: input.is_active.unwrap_or(true),
            })
            .await?;

        tracing::info!(id = %cost.id, name = %cost.name, "fixed cost created");
        Ok(cost)
    }

    pub async fn update_fixed_cost(
        &self,
        id: Uuid,
        input: UpdateFixedCostInput,
    ) -> AppResult<FixedCost> {
        input.validate()?;
        if let Some(amount) = input.amount {
            ensure_non_negative("amount", amount)?;
        }

        self.store
            .update_fixed_cost(
                id,
                FixedCostChanges {
                    name: input.name.map(|n| n.trim().to_string()),
                    amount: input.amount,
                    frequency: input.frequency,
                    is_active: input.is_active,
                },
            )
            .await?
            .ok_or_else(|| AppError::NotFound("Fixed cost".to_string()))
    }

    pub async fn list_payroll(&self) -> AppResult<Vec<PayrollEntry>> {
        self.store.list_payroll().await
    }

    pub async fn create_payroll(&self, input: CreatePayrollInput) -> AppResult<PayrollEntry> {
        input.validate()?;
        ensure_non_negative("total", input.total)?;
        if input.period_end < input.period_start {
            return Err(AppError::Validation {
                field: "period_end".to_string(),
                message: "Period end must not be before period start".to_string(),
                message_zh: "结束日期不能早于开始日期".to_string(),
            });
        }

        self.store
            .create_payroll(NewPayrollEntry {
                employee_name: input.employee_name.trim().to_string(),
                period_start: input.period_start,
                period_end: input.period_end,
                total: input.total,
            })
            .await
    }
}
