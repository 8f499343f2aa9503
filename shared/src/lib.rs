//! Shared types and pipeline logic for the Ops Portal
//!
//! This crate holds everything that does not touch I/O: the domain models,
//! spreadsheet cell values, column inference, row validation and profit
//! aggregation. The backend drives these stages against the database and the
//! WASM module runs them in the browser for import previews.

pub mod aggregation;
pub mod error;
pub mod inference;
pub mod models;
pub mod types;
pub mod validation;

pub use aggregation::*;
pub use error::*;
pub use inference::*;
pub use models::*;
pub use types::*;
pub use validation::*;
