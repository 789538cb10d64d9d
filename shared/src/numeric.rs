//! Best-effort numeric coercion
//!
//! Movement columns, JSON payloads and query strings all carry numbers in
//! different shapes. Every arithmetic read goes through [`to_optional_decimal`]
//! (absent or unparseable yields `None`) or [`to_decimal`] (coalesces to zero).

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::str::FromStr;

/// A value that may carry a number
pub trait NumericLike {
    fn as_decimal(&self) -> Option<Decimal>;
}

impl NumericLike for Decimal {
    fn as_decimal(&self) -> Option<Decimal> {
        Some(*self)
    }
}

impl NumericLike for i32 {
    fn as_decimal(&self) -> Option<Decimal> {
        Some(Decimal::from(*self))
    }
}

impl NumericLike for i64 {
    fn as_decimal(&self) -> Option<Decimal> {
        Some(Decimal::from(*self))
    }
}

impl NumericLike for str {
    fn as_decimal(&self) -> Option<Decimal> {
        parse_decimal_str(self)
    }
}

impl NumericLike for String {
    fn as_decimal(&self) -> Option<Decimal> {
        parse_decimal_str(self)
    }
}

impl NumericLike for Value {
    fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Value::Number(n) => parse_decimal_str(&n.to_string()),
            Value::String(s) => parse_decimal_str(s),
            Value::Bool(true) => Some(Decimal::ONE),
            Value::Bool(false) => Some(Decimal::ZERO),
            _ => None,
        }
    }
}

impl<T: NumericLike> NumericLike for Option<T> {
    fn as_decimal(&self) -> Option<Decimal> {
        self.as_ref().and_then(NumericLike::as_decimal)
    }
}

impl<T: NumericLike + ?Sized> NumericLike for &T {
    fn as_decimal(&self) -> Option<Decimal> {
        (**self).as_decimal()
    }
}

fn parse_decimal_str(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .ok()
}

/// Convert to a decimal, `None` when absent or not numeric
pub fn to_optional_decimal<N: NumericLike + ?Sized>(value: &N) -> Option<Decimal> {
    value.as_decimal()
}

/// Convert to a decimal, zero when absent or not numeric
pub fn to_decimal<N: NumericLike + ?Sized>(value: &N) -> Decimal {
    value.as_decimal().unwrap_or(Decimal::ZERO)
}

/// Integer codes (`cdemp`, `cditem`, ...). Fractional or out-of-range values
/// are treated as absent.
pub fn to_optional_code<N: NumericLike + ?Sized>(value: &N) -> Option<i32> {
    let decimal = value.as_decimal()?;
    if !decimal.fract().is_zero() {
        return None;
    }
    decimal.to_i32()
}

/// Serde helpers for payload fields that arrive as numbers, numeric strings or null
pub mod lenient {
    use super::*;

    pub fn decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value.as_ref().and_then(to_optional_decimal))
    }

    pub fn code<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value.as_ref().and_then(to_optional_code))
    }

    /// Accepts strings and numbers, yielding their textual form
    pub fn text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(match value {
            Some(Value::String(s)) => Some(s),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        })
    }
}
