//! Business logic services for the Ops Portal

pub mod auth;
pub mod import;
pub mod inventory;
pub mod ledger;
pub mod notification;
pub mod reporting;
pub mod spreadsheet;

pub use auth::AuthService;
pub use import::ImportService;
pub use inventory::InventoryService;
pub use ledger::LedgerService;
pub use notification::NotificationService;
pub use reporting::ReportingService;
pub use spreadsheet::UploadedFile;
