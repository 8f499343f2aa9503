//! Reporting service for profit analysis
//!
//! Every analysis reads the uploaded settlement sheet together with the
//! current fixed-cost and payroll tables; nothing is cached between calls.

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::config::ReportsConfig;
use crate::error::AppResult;
use crate::services::spreadsheet::{read_sheet, UploadedFile};
use crate::store::{InventoryStore, LedgerStore};
use shared::models::{ProductCostBasis, ProfitAnalysis, SettlementMapping};
use shared::{infer_settlement_mapping, validate_settlement_rows, ProfitAggregator};

/// Options sent alongside a settlement upload
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfitRequest {
    /// Confirmed mapping; inferred from the headers when absent
    pub mapping: Option<SettlementMapping>,
    #[serde(default)]
    pub basis: ProductCostBasis,
}

/// Reporting service
#[derive(Clone)]
pub struct ReportingService<S> {
    store: S,
    product_cost_ratio: Decimal,
    max_upload_bytes: usize,
}

impl<S: LedgerStore + InventoryStore> ReportingService<S> {
    pub fn new(store: S, config: &ReportsConfig, max_upload_bytes: usize) -> Self {
        Self {
            store,
            product_cost_ratio: config.product_cost_ratio,
            max_upload_bytes,
        }
    }

    /// Profit analysis for one settlement upload
    pub async fn analyze_settlements(
        &self,
        file: &UploadedFile,
        request: ProfitRequest,
    ) -> AppResult<ProfitAnalysis> {
        file.ensure_within(self.max_upload_bytes)?;
        let sheet = read_sheet(file)?;
        let mapping = request
            .mapping
            .unwrap_or_else(|| infer_settlement_mapping(&sheet.headers));
        let settlements = validate_settlement_rows(&sheet, &mapping)?;

        let fixed_costs = self.store.list_fixed_costs().await?;
        let payroll = self.store.list_payroll().await?;

        let aggregator = match request.basis {
            ProductCostBasis::FlatRatio => ProfitAggregator::flat_ratio(self.product_cost_ratio),
            ProductCostBasis::CostSheet => {
                let unit_costs = self.store.unit_costs().await?;
                ProfitAggregator::cost_sheet(self.product_cost_ratio, unit_costs)
            }
        };
        let analysis = aggregator.analyze(&settlements, &fixed_costs, &payroll)?;

        tracing::info!(
            file = %file.file_name,
            orders = analysis.total_orders,
            negative = analysis.negative_count,
            basis = ?analysis.cost_basis,
            net_profit = %analysis.net_profit,
            "profit analysis computed"
        );
        Ok(analysis)
    }
}
