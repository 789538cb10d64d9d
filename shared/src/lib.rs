//! Shared types and pure logic for the Stock Movement API
//!
//! This crate holds everything that does not touch the database or HTTP:
//! wire models, numeric coercion, date parsing and balance arithmetic.

pub mod dates;
pub mod ledger;
pub mod models;
pub mod numeric;
pub mod types;
pub mod validation;

pub use dates::*;
pub use ledger::*;
pub use models::*;
pub use numeric::{to_decimal, to_optional_code, to_optional_decimal, NumericLike};
pub use types::*;
pub use validation::*;
