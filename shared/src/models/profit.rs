//! Profit analysis models

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One line of an uploaded sales settlement report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementRow {
    pub statement_date: Option<NaiveDate>,
    pub settlement_amount: Decimal,
    pub sku: Option<String>,
    pub quantity: Option<i64>,
}

/// How often a fixed cost is incurred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CostFrequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl CostFrequency {
    /// Days the amount is spread over when approximating a daily rate.
    /// Months count as 30 days.
    pub fn days(&self) -> u32 {
        match self {
            CostFrequency::Daily => 1,
            CostFrequency::Weekly => 7,
            CostFrequency::Monthly => 30,
            CostFrequency::Yearly => 365,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CostFrequency::Daily => "daily",
            CostFrequency::Weekly => "weekly",
            CostFrequency::Monthly => "monthly",
            CostFrequency::Yearly => "yearly",
        }
    }
}

impl std::str::FromStr for CostFrequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(CostFrequency::Daily),
            "weekly" => Ok(CostFrequency::Weekly),
            "monthly" => Ok(CostFrequency::Monthly),
            "yearly" => Ok(CostFrequency::Yearly),
            other => Err(format!("Unknown cost frequency: {}", other)),
        }
    }
}

/// A recurring overhead such as rent or software subscriptions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixedCost {
    pub id: Uuid,
    pub name: String,
    pub amount: Decimal,
    pub frequency: CostFrequency,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FixedCost {
    pub fn daily_amount(&self) -> Decimal {
        self.amount / Decimal::from(self.frequency.days())
    }
}

/// Payroll total for one employee and pay period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayrollEntry {
    pub id: Uuid,
    pub employee_name: String,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub total: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Source of the product cost figure in a profit analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductCostBasis {
    /// A flat share of settlement revenue
    #[default]
    FlatRatio,
    /// Uploaded per-SKU costs, falling back to the flat share for unmatched lines
    CostSheet,
}

impl std::str::FromStr for ProductCostBasis {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "flat_ratio" => Ok(ProductCostBasis::FlatRatio),
            "cost_sheet" => Ok(ProductCostBasis::CostSheet),
            other => Err(format!("Unknown product cost basis: {}", other)),
        }
    }
}

/// Settlement figures for one calendar month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodSummary {
    /// `YYYY-MM`, or `unknown` for rows without a statement date
    pub period: String,
    pub orders: u64,
    pub settlement: Decimal,
    pub negative_count: u64,
    pub estimated_product_costs: Decimal,
    pub gross_profit: Decimal,
}

/// Profit figures computed fresh for one settlement upload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfitAnalysis {
    pub total_orders: u64,
    pub total_settlement: Decimal,
    pub negative_count: u64,
    pub estimated_product_costs: Decimal,
    pub total_fixed_costs: Decimal,
    pub total_payroll_costs: Decimal,
    pub net_profit: Decimal,
    /// Percentage of settlement revenue, 0 when there is no revenue
    pub profit_margin: Decimal,
    pub cost_basis: ProductCostBasis,
    /// Settlement lines costed from the cost sheet rather than the flat ratio
    pub matched_cost_lines: u64,
    pub periods: Vec<PeriodSummary>,
}
