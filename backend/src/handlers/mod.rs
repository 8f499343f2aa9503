//! HTTP handlers for the Ops Portal

pub mod auth;
pub mod health;
pub mod imports;
pub mod inventory;
pub mod ledger;
pub mod notification;
pub mod reporting;
pub mod upload;

pub use auth::login;
pub use health::health_check;
pub use imports::{
    commit_cost_sheet, commit_inventory, export_inventory, preview_cost_sheet, preview_inventory,
};
pub use inventory::{get_inventory_history, list_cost_records, list_inventory};
pub use ledger::{create_fixed_cost, create_payroll, list_fixed_costs, list_payroll, update_fixed_cost};
pub use notification::{get_unread_count, mark_checked};
pub use reporting::analyze_profit;
