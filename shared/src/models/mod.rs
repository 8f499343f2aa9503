//! Domain models for the Ops Portal

mod cost;
mod import;
mod inventory;
mod mapping;
mod notification;
mod profit;
mod user;

pub use cost::*;
pub use import::*;
pub use inventory::*;
pub use mapping::*;
pub use notification::*;
pub use profit::*;
pub use user::*;
