//! Inventory movement models

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::numeric::lenient;

/// Movement direction as stored in `t_movest.st`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MovementType {
    /// Entry (`E`)
    #[default]
    #[serde(rename = "E")]
    Entry,
    /// Exit (`S`, "saida")
    #[serde(rename = "S")]
    Exit,
}

impl MovementType {
    /// Anything other than a case-insensitive `S` is an entry
    pub fn normalize(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(value) if value.eq_ignore_ascii_case("S") => MovementType::Exit,
            _ => MovementType::Entry,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::Entry => "E",
            MovementType::Exit => "S",
        }
    }

    /// Apply the movement sign to a quantity
    pub fn signed(&self, quantity: Decimal) -> Decimal {
        match self {
            MovementType::Entry => quantity,
            MovementType::Exit => -quantity,
        }
    }

    /// Role of the counterparty on a movement of this type
    pub fn counterparty_role(&self) -> CounterpartyRole {
        match self {
            MovementType::Entry => CounterpartyRole::Supplier,
            MovementType::Exit => CounterpartyRole::Customer,
        }
    }
}

impl std::fmt::Display for MovementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CounterpartyRole {
    #[serde(rename = "FORNECEDOR")]
    Supplier,
    #[serde(rename = "CLIENTE")]
    Customer,
}

// ============================================================================
// Query inputs
// ============================================================================

/// Filters for `GET /inventory/movements`
///
/// Numeric values stay textual here and are coerced best-effort by the service.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementFilters {
    #[serde(rename = "type")]
    pub movement_type: Option<String>,
    pub cdemp: Option<String>,
    pub item_id: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

/// Query for `GET /inventory/movements/:itemId`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KardexQuery {
    pub cdemp: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

/// Query for `GET /inventory/movements/summary`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryQuery {
    pub from: Option<String>,
    pub to: Option<String>,
    pub item_id: Option<String>,
    pub cdemp: Option<String>,
}

// ============================================================================
// Creation payload
// ============================================================================

/// Fiscal document attached to a movement
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MovementDocument {
    #[serde(default, deserialize_with = "lenient::code")]
    pub number: Option<i32>,
    pub date: Option<String>,
    #[serde(rename = "type")]
    #[validate(length(max = 15))]
    pub doc_type: Option<String>,
}

/// Body of `POST /inventory/movements`
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateMovementInput {
    /// Item GUID (`t_itens.ID`)
    pub item_id: Option<String>,
    #[serde(rename = "type")]
    pub movement_type: Option<String>,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub quantity: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub unit_price: Option<Decimal>,
    #[validate]
    pub document: Option<MovementDocument>,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub total_value: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub cost: Option<Decimal>,
    #[validate(length(max = 100))]
    pub notes: Option<String>,
    /// Company GUID or numeric `cdemp`
    #[serde(default, deserialize_with = "lenient::text")]
    pub warehouse: Option<String>,
    #[serde(default, deserialize_with = "lenient::code")]
    pub customer_or_supplier: Option<i32>,
    pub date: Option<String>,
    #[validate(length(max = 10))]
    pub codusu: Option<String>,
    #[validate(length(max = 20))]
    pub user: Option<String>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl CreateMovementInput {
    /// `codusu`, falling back to its `user` alias
    pub fn user_code(&self) -> Option<&str> {
        present(&self.codusu).or_else(|| present(&self.user))
    }

    pub fn warehouse_input(&self) -> Option<&str> {
        present(&self.warehouse)
    }

    /// Labels of every required field missing from the payload, in a stable order
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.warehouse_input().is_none() {
            missing.push("cdemp (warehouse)");
        }
        if present(&self.item_id).is_none() {
            missing.push("cditem (itemId)");
        }
        if self.customer_or_supplier.is_none() {
            missing.push("clifor (customerOrSupplier)");
        }
        if present(&self.date).is_none() {
            missing.push("data (date)");
        }
        if self.quantity.is_none() {
            missing.push("qtde (quantity)");
        }
        if present(&self.movement_type).is_none() {
            missing.push("st (type)");
        }
        if self.user_code().is_none() {
            missing.push("codusu (user)");
        }
        missing
    }
}

// ============================================================================
// Responses
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub number: Option<i32>,
    pub date: Option<NaiveDateTime>,
    #[serde(rename = "type")]
    pub doc_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Counterparty {
    pub code: i32,
    #[serde(rename = "type")]
    pub role: CounterpartyRole,
}

/// One row of the movement listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementResponse {
    pub nrlan: i64,
    pub item_id: Option<i32>,
    pub item_code: Option<String>,
    pub item_description: Option<String>,
    pub item_label: Option<String>,
    pub date: Option<NaiveDateTime>,
    #[serde(rename = "type")]
    pub movement_type: MovementType,
    pub quantity: Decimal,
    pub unit_price: Option<Decimal>,
    pub total_value: Option<Decimal>,
    pub document: DocumentInfo,
    pub counterparty: Option<Counterparty>,
    pub notes: Option<String>,
    pub warehouse: Option<i32>,
}

/// One kardex line with the balance before and after it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KardexRow {
    pub nrlan: i64,
    pub date: Option<NaiveDateTime>,
    pub doc_number: Option<i32>,
    #[serde(rename = "type")]
    pub movement_type: MovementType,
    pub quantity: Decimal,
    pub unit_price: Option<Decimal>,
    pub total_value: Option<Decimal>,
    pub previous_balance: Decimal,
    pub current_balance: Decimal,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementTotal {
    pub quantity: Decimal,
    pub value: Decimal,
}

/// Totals over a date range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementSummary {
    pub item_id: Option<i32>,
    pub item_description: Option<String>,
    pub item_label: Option<String>,
    pub from: String,
    pub to: String,
    pub entries: MovementTotal,
    pub exits: MovementTotal,
    pub net_quantity: Decimal,
    pub current_balance: Decimal,
}

/// Result of `POST /inventory/movements`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedMovement {
    pub id: i64,
    pub item_id: i32,
    #[serde(rename = "type")]
    pub movement_type: MovementType,
    pub quantity: Decimal,
    pub unit_price: Option<Decimal>,
    pub total_value: Option<Decimal>,
    pub previous_balance: Decimal,
    pub current_balance: Decimal,
    pub date: Option<NaiveDateTime>,
}
