//! Business logic services for the Stock Movement API

pub mod inventory;
pub mod upload;

pub use inventory::InventoryService;
pub use upload::{RequestOrigin, UploadService};
