//! Tenant-scoped persistence seam
//!
//! The inventory service only depends on these query semantics. The
//! PostgreSQL adapter lives in [`postgres`]; tests provide an in-memory one.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use shared::{BalanceSnapshot, CompanyKey, DateRange, MovementType};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::AppResult;

pub mod postgres;

pub use postgres::PgInventoryStore;

/// `t_emp` row
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct CompanyRecord {
    #[sqlx(rename = "ID")]
    pub id: Option<Uuid>,
    pub cdemp: i32,
    pub isdeleted: Option<bool>,
}

/// `t_itens` row
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct ItemRecord {
    #[sqlx(rename = "ID")]
    pub id: Option<Uuid>,
    pub cdemp: i32,
    pub cditem: i32,
    pub deitem: Option<String>,
}

/// `t_movest` row
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct MovementRecord {
    pub nrlan: i64,
    pub cdemp: i32,
    pub cditem: Option<i32>,
    pub data: Option<NaiveDateTime>,
    pub st: Option<String>,
    pub qtde: Option<Decimal>,
    pub preco: Option<Decimal>,
    pub valor: Option<Decimal>,
    pub custo: Option<Decimal>,
    pub numdoc: Option<i32>,
    pub datadoc: Option<NaiveDateTime>,
    pub especie: Option<String>,
    pub clifor: Option<i32>,
    pub codusu: Option<String>,
    pub empitem: Option<i32>,
    pub empfor: Option<i32>,
    pub empmov: Option<i32>,
    pub empven: Option<i32>,
    pub saldoant: Option<Decimal>,
    pub sldantemp: Option<Decimal>,
    pub obs: Option<String>,
    pub obsit: Option<String>,
    pub datalan: Option<NaiveDateTime>,
    pub isdeleted: Option<bool>,
    pub createdat: Option<NaiveDateTime>,
    pub updatedat: Option<NaiveDateTime>,
}

impl MovementRecord {
    pub fn movement_type(&self) -> MovementType {
        MovementType::normalize(self.st.as_deref())
    }

    pub fn balance_snapshot(&self) -> BalanceSnapshot {
        BalanceSnapshot {
            movement_type: self.movement_type(),
            quantity: shared::to_decimal(&self.qtde),
            previous_balance: shared::to_optional_decimal(&self.saldoant),
            resulting_balance: shared::to_optional_decimal(&self.sldantemp),
        }
    }

    /// Transaction date, falling back to the document date
    pub fn effective_date(&self) -> Option<NaiveDateTime> {
        self.data.or(self.datadoc)
    }
}

/// Columns written by the movement writer; `nrlan` is assigned by the database
#[derive(Debug, Clone, PartialEq)]
pub struct NewMovement {
    pub cdemp: i32,
    pub cditem: i32,
    pub data: NaiveDateTime,
    pub st: MovementType,
    pub qtde: Decimal,
    pub preco: Option<Decimal>,
    pub valor: Option<Decimal>,
    pub custo: Option<Decimal>,
    pub numdoc: Option<i32>,
    pub datadoc: Option<NaiveDateTime>,
    pub especie: Option<String>,
    pub clifor: i32,
    pub codusu: String,
    pub empitem: i32,
    pub empfor: i32,
    pub empmov: i32,
    pub empven: i32,
    pub saldoant: Decimal,
    pub sldantemp: Decimal,
    pub obs: Option<String>,
    pub obsit: Option<String>,
    pub datalan: NaiveDateTime,
    pub createdat: NaiveDateTime,
    pub updatedat: NaiveDateTime,
}

/// Sort direction over `(data, nrlan)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chronology {
    Ascending,
    Descending,
}

/// Predicate over non-deleted movements of one company
#[derive(Debug, Clone, PartialEq)]
pub struct MovementFilter {
    pub cdemp: i32,
    pub cditem: Option<i32>,
    pub movement_type: Option<MovementType>,
    pub range: DateRange,
    pub order: Chronology,
    pub limit: Option<i64>,
}

impl MovementFilter {
    pub fn new(cdemp: i32, order: Chronology) -> Self {
        Self {
            cdemp,
            cditem: None,
            movement_type: None,
            range: DateRange::default(),
            order,
            limit: None,
        }
    }

    pub fn item(mut self, cditem: Option<i32>) -> Self {
        self.cditem = cditem;
        self
    }

    pub fn movement_type(mut self, movement_type: MovementType) -> Self {
        self.movement_type = Some(movement_type);
        self
    }

    pub fn range(mut self, range: DateRange) -> Self {
        self.range = range;
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Query operations over one tenant database
#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// Smallest `cdemp` in `t_emp`
    async fn first_company_code(&self) -> AppResult<Option<i32>>;

    /// Non-deleted company matching the key
    async fn find_company(&self, key: &CompanyKey) -> AppResult<Option<CompanyRecord>>;

    /// Item by GUID inside one company
    async fn find_item(&self, cdemp: i32, id: Uuid) -> AppResult<Option<ItemRecord>>;

    /// Items whose code is in `codes`, optionally restricted to one company
    async fn find_items(&self, codes: &[i32], cdemp: Option<i32>) -> AppResult<Vec<ItemRecord>>;

    /// Latest non-deleted movement of an item strictly before `before`,
    /// ordered `(data desc, nrlan desc)`
    async fn latest_movement_before(
        &self,
        cdemp: i32,
        cditem: i32,
        before: NaiveDateTime,
    ) -> AppResult<Option<MovementRecord>>;

    async fn find_movements(&self, filter: &MovementFilter) -> AppResult<Vec<MovementRecord>>;

    /// Single-statement insert returning the stored row
    async fn insert_movement(&self, movement: NewMovement) -> AppResult<MovementRecord>;
}

/// Supplies the store of a tenant
#[async_trait]
pub trait TenantResolver: Send + Sync {
    async fn store(&self, tenant: &str) -> AppResult<Arc<dyn InventoryStore>>;
}
