//! Profit aggregation over settlement uploads
//!
//! Combines an uploaded settlement dataset with the fixed-cost and payroll
//! tables into a [`ProfitAnalysis`]. Every call starts from the inputs it is
//! given; nothing is cached between analyses.

use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};

use crate::error::PipelineError;
use crate::models::{
    FixedCost, PayrollEntry, PeriodSummary, ProductCostBasis, ProfitAnalysis, SettlementRow,
};

/// Share of settlement revenue assumed to be product cost (60%)
pub const DEFAULT_PRODUCT_COST_RATIO: Decimal = Decimal::from_parts(6, 0, 0, false, 1);

const UNKNOWN_PERIOD: &str = "unknown";

fn add(a: Decimal, b: Decimal, what: &str) -> Result<Decimal, PipelineError> {
    a.checked_add(b).ok_or_else(|| PipelineError::overflow(what))
}

fn sub(a: Decimal, b: Decimal, what: &str) -> Result<Decimal, PipelineError> {
    a.checked_sub(b).ok_or_else(|| PipelineError::overflow(what))
}

fn mul(a: Decimal, b: Decimal, what: &str) -> Result<Decimal, PipelineError> {
    a.checked_mul(b).ok_or_else(|| PipelineError::overflow(what))
}

/// Sum of active fixed costs expressed as a daily rate
pub fn daily_fixed_costs(costs: &[FixedCost]) -> Result<Decimal, PipelineError> {
    costs
        .iter()
        .filter(|c| c.is_active)
        .try_fold(Decimal::ZERO, |acc, c| add(acc, c.daily_amount(), "fixed costs"))
}

pub fn total_payroll(entries: &[PayrollEntry]) -> Result<Decimal, PipelineError> {
    entries
        .iter()
        .try_fold(Decimal::ZERO, |acc, e| add(acc, e.total, "payroll"))
}

/// `net / revenue * 100` rounded to two places, or 0 without revenue
pub fn profit_margin(
    net_profit: Decimal,
    total_settlement: Decimal,
) -> Result<Decimal, PipelineError> {
    if total_settlement.is_zero() {
        return Ok(Decimal::ZERO);
    }
    let ratio = net_profit
        .checked_div(total_settlement)
        .ok_or_else(|| PipelineError::overflow("profit margin"))?;
    Ok(mul(ratio, Decimal::ONE_HUNDRED, "profit margin")?.round_dp(2))
}

/// Computes profit analyses with a fixed product-cost policy
#[derive(Debug, Clone)]
pub struct ProfitAggregator {
    ratio: Decimal,
    basis: ProductCostBasis,
    unit_costs: HashMap<String, Decimal>,
}

impl Default for ProfitAggregator {
    fn default() -> Self {
        Self::flat_ratio(DEFAULT_PRODUCT_COST_RATIO)
    }
}

impl ProfitAggregator {
    /// Product cost is `ratio` of every settlement amount
    pub fn flat_ratio(ratio: Decimal) -> Self {
        Self {
            ratio,
            basis: ProductCostBasis::FlatRatio,
            unit_costs: HashMap::new(),
        }
    }

    /// Product cost comes from per-SKU unit costs where a line's SKU is known
    pub fn cost_sheet(ratio: Decimal, unit_costs: HashMap<String, Decimal>) -> Self {
        Self {
            ratio,
            basis: ProductCostBasis::CostSheet,
            unit_costs,
        }
    }

    /// Estimated product cost of one line and whether the cost sheet priced it
    fn line_cost(&self, row: &SettlementRow) -> Result<(Decimal, bool), PipelineError> {
        if self.basis == ProductCostBasis::CostSheet {
            if let Some(cost) = row.sku.as_ref().and_then(|sku| self.unit_costs.get(sku)) {
                let quantity = Decimal::from(row.quantity.unwrap_or(1));
                return Ok((mul(*cost, quantity, "product costs")?, true));
            }
        }
        Ok((mul(row.settlement_amount, self.ratio, "product costs")?, false))
    }

    /// Fails with [`PipelineError::Overflow`] when a total leaves the decimal range
    pub fn analyze(
        &self,
        settlements: &[SettlementRow],
        fixed_costs: &[FixedCost],
        payroll: &[PayrollEntry],
    ) -> Result<ProfitAnalysis, PipelineError> {
        let mut total_settlement = Decimal::ZERO;
        let mut negative_count = 0u64;
        let mut matched_cost_lines = 0u64;
        let mut line_costs = Decimal::ZERO;
        let mut periods: BTreeMap<String, PeriodSummary> = BTreeMap::new();

        for row in settlements {
            let (cost, matched) = self.line_cost(row)?;
            let negative = row.settlement_amount < Decimal::ZERO;

            total_settlement = add(total_settlement, row.settlement_amount, "settlement total")?;
            line_costs = add(line_costs, cost, "product costs")?;
            if negative {
                negative_count += 1;
            }
            if matched {
                matched_cost_lines += 1;
            }

            let key = row
                .statement_date
                .map(|d| d.format("%Y-%m").to_string())
                .unwrap_or_else(|| UNKNOWN_PERIOD.to_string());
            let period = periods.entry(key.clone()).or_insert_with(|| PeriodSummary {
                period: key,
                orders: 0,
                settlement: Decimal::ZERO,
                negative_count: 0,
                estimated_product_costs: Decimal::ZERO,
                gross_profit: Decimal::ZERO,
            });
            period.orders += 1;
            period.settlement = add(period.settlement, row.settlement_amount, "settlement total")?;
            period.estimated_product_costs =
                add(period.estimated_product_costs, cost, "product costs")?;
            period.gross_profit = sub(
                period.settlement,
                period.estimated_product_costs,
                "gross profit",
            )?;
            if negative {
                period.negative_count += 1;
            }
        }

        // The flat policy applies to the total so rounding matches a single multiply
        let estimated_product_costs = match self.basis {
            ProductCostBasis::FlatRatio => mul(total_settlement, self.ratio, "product costs")?,
            ProductCostBasis::CostSheet => line_costs,
        };
        let total_fixed_costs = daily_fixed_costs(fixed_costs)?;
        let total_payroll_costs = total_payroll(payroll)?;
        let net_profit = [estimated_product_costs, total_fixed_costs, total_payroll_costs]
            .into_iter()
            .try_fold(total_settlement, |acc, cost| sub(acc, cost, "net profit"))?;

        Ok(ProfitAnalysis {
            total_orders: settlements.len() as u64,
            total_settlement,
            negative_count,
            estimated_product_costs,
            total_fixed_costs,
            total_payroll_costs,
            net_profit,
            profit_margin: profit_margin(net_profit, total_settlement)?,
            cost_basis: self.basis,
            matched_cost_lines,
            periods: periods.into_values().collect(),
        })
    }
}
