//! Models exchanged over the HTTP API

pub mod inventory;
pub mod upload;

pub use inventory::*;
pub use upload::*;
