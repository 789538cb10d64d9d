//! HTTP request handlers

pub mod health;
pub mod inventory;
pub mod upload;

pub use health::health_check;
pub use inventory::{create_movement, get_kardex, get_summary, list_movements};
pub use upload::create_presigned_url;
