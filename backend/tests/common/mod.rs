//! In-memory tenant stores shared by the integration tests

#![allow(dead_code)]

use std::{
    collections::HashMap,
    str::FromStr,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use shared::{CompanyKey, MovementType};
use uuid::Uuid;

use stock_backend::error::{AppError, AppResult};
use stock_backend::store::{
    Chronology, CompanyRecord, InventoryStore, ItemRecord, MovementFilter, MovementRecord,
    NewMovement, TenantResolver,
};

pub fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

pub fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, 0, 0)
        .unwrap()
}

#[derive(Default)]
struct Tables {
    companies: Vec<CompanyRecord>,
    items: Vec<ItemRecord>,
    movements: Vec<MovementRecord>,
}

/// One tenant database held in memory, mirroring the SQL adapter's semantics
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_company(&self, cdemp: i32) -> Uuid {
        let id = Uuid::new_v4();
        self.tables.lock().unwrap().companies.push(CompanyRecord {
            id: Some(id),
            cdemp,
            isdeleted: Some(false),
        });
        id
    }

    pub fn add_deleted_company(&self, cdemp: i32) -> Uuid {
        let id = Uuid::new_v4();
        self.tables.lock().unwrap().companies.push(CompanyRecord {
            id: Some(id),
            cdemp,
            isdeleted: Some(true),
        });
        id
    }

    pub fn add_item(&self, cdemp: i32, cditem: i32, deitem: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.tables.lock().unwrap().items.push(ItemRecord {
            id: Some(id),
            cdemp,
            cditem,
            deitem: Some(deitem.to_string()),
        });
        id
    }

    pub fn add_item_without_description(&self, cdemp: i32, cditem: i32) -> Uuid {
        let id = Uuid::new_v4();
        self.tables.lock().unwrap().items.push(ItemRecord {
            id: Some(id),
            cdemp,
            cditem,
            deitem: None,
        });
        id
    }

    pub fn add_movement(&self, movement: MovementRecord) {
        self.tables.lock().unwrap().movements.push(movement);
    }

    pub fn movements(&self) -> Vec<MovementRecord> {
        self.tables.lock().unwrap().movements.clone()
    }

    fn next_nrlan(tables: &Tables) -> i64 {
        tables.movements.iter().map(|m| m.nrlan).max().unwrap_or(0) + 1
    }
}

fn sort_key(m: &MovementRecord) -> (bool, Option<NaiveDateTime>, i64) {
    // Postgres default: NULLS LAST ascending, NULLS FIRST descending
    (m.data.is_none(), m.data, m.nrlan)
}

fn visible(m: &MovementRecord) -> bool {
    m.isdeleted != Some(true)
}

#[async_trait]
impl InventoryStore for MemoryStore {
    async fn first_company_code(&self) -> AppResult<Option<i32>> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .companies
            .iter()
            .map(|c| c.cdemp)
            .min())
    }

    async fn find_company(&self, key: &CompanyKey) -> AppResult<Option<CompanyRecord>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .companies
            .iter()
            .filter(|c| c.isdeleted != Some(true))
            .filter(|c| match key {
                CompanyKey::Guid(id) => c.id == Some(*id),
                CompanyKey::Code(cdemp) => c.cdemp == *cdemp,
            })
            .min_by_key(|c| c.cdemp)
            .cloned())
    }

    async fn find_item(&self, cdemp: i32, id: Uuid) -> AppResult<Option<ItemRecord>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .items
            .iter()
            .find(|i| i.cdemp == cdemp && i.id == Some(id))
            .cloned())
    }

    async fn find_items(&self, codes: &[i32], cdemp: Option<i32>) -> AppResult<Vec<ItemRecord>> {
        let tables = self.tables.lock().unwrap();
        let mut items: Vec<ItemRecord> = tables
            .items
            .iter()
            .filter(|i| codes.contains(&i.cditem))
            .filter(|i| cdemp.map_or(true, |c| i.cdemp == c))
            .cloned()
            .collect();
        items.sort_by_key(|i| (i.cdemp, i.cditem));
        Ok(items)
    }

    async fn latest_movement_before(
        &self,
        cdemp: i32,
        cditem: i32,
        before: NaiveDateTime,
    ) -> AppResult<Option<MovementRecord>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .movements
            .iter()
            .filter(|m| visible(m) && m.cdemp == cdemp && m.cditem == Some(cditem))
            .filter(|m| m.data.map_or(false, |d| d < before))
            .max_by_key(|m| sort_key(m))
            .cloned())
    }

    async fn find_movements(&self, filter: &MovementFilter) -> AppResult<Vec<MovementRecord>> {
        let tables = self.tables.lock().unwrap();
        let mut rows: Vec<MovementRecord> = tables
            .movements
            .iter()
            .filter(|m| visible(m) && m.cdemp == filter.cdemp)
            .filter(|m| filter.cditem.map_or(true, |c| m.cditem == Some(c)))
            .filter(|m| {
                filter
                    .movement_type
                    .map_or(true, |t| m.st.as_deref() == Some(t.as_str()))
            })
            .filter(|m| {
                filter
                    .range
                    .start
                    .map_or(true, |s| m.data.map_or(false, |d| d >= s))
            })
            .filter(|m| {
                filter
                    .range
                    .end
                    .map_or(true, |e| m.data.map_or(false, |d| d <= e))
            })
            .cloned()
            .collect();

        rows.sort_by_key(sort_key);
        if filter.order == Chronology::Descending {
            rows.reverse();
        }
        if let Some(limit) = filter.limit {
            rows.truncate(limit as usize);
        }
        Ok(rows)
    }

    async fn insert_movement(&self, movement: NewMovement) -> AppResult<MovementRecord> {
        let mut tables = self.tables.lock().unwrap();
        let record = MovementRecord {
            nrlan: Self::next_nrlan(&tables),
            cdemp: movement.cdemp,
            cditem: Some(movement.cditem),
            data: Some(movement.data),
            st: Some(movement.st.as_str().to_string()),
            qtde: Some(movement.qtde),
            preco: movement.preco,
            valor: movement.valor,
            custo: movement.custo,
            numdoc: movement.numdoc,
            datadoc: movement.datadoc,
            especie: movement.especie,
            clifor: Some(movement.clifor),
            codusu: Some(movement.codusu),
            empitem: Some(movement.empitem),
            empfor: Some(movement.empfor),
            empmov: Some(movement.empmov),
            empven: Some(movement.empven),
            saldoant: Some(movement.saldoant),
            sldantemp: Some(movement.sldantemp),
            obs: movement.obs,
            obsit: movement.obsit,
            datalan: Some(movement.datalan),
            isdeleted: Some(false),
            createdat: Some(movement.createdat),
            updatedat: Some(movement.updatedat),
        };
        tables.movements.push(record.clone());
        Ok(record)
    }
}

/// Tenants keyed by slug
#[derive(Default)]
pub struct MemoryTenants {
    stores: HashMap<String, Arc<MemoryStore>>,
}

impl MemoryTenants {
    pub fn with(mut self, tenant: &str, store: Arc<MemoryStore>) -> Self {
        self.stores.insert(tenant.to_string(), store);
        self
    }
}

#[async_trait]
impl TenantResolver for MemoryTenants {
    async fn store(&self, tenant: &str) -> AppResult<Arc<dyn InventoryStore>> {
        self.stores
            .get(tenant)
            .cloned()
            .map(|store| store as Arc<dyn InventoryStore>)
            .ok_or_else(|| AppError::TenantNotFound(tenant.to_string()))
    }
}

/// Builder for stored movement rows
pub struct MovementBuilder {
    record: MovementRecord,
}

impl MovementBuilder {
    pub fn new(nrlan: i64, cdemp: i32, cditem: i32) -> Self {
        Self {
            record: MovementRecord {
                nrlan,
                cdemp,
                cditem: Some(cditem),
                data: None,
                st: Some("E".into()),
                qtde: None,
                preco: None,
                valor: None,
                custo: None,
                numdoc: None,
                datadoc: None,
                especie: None,
                clifor: None,
                codusu: None,
                empitem: Some(cdemp),
                empfor: None,
                empmov: None,
                empven: None,
                saldoant: None,
                sldantemp: None,
                obs: None,
                obsit: None,
                datalan: None,
                isdeleted: Some(false),
                createdat: None,
                updatedat: None,
            },
        }
    }

    pub fn entry(mut self, qty: &str) -> Self {
        self.record.st = Some(MovementType::Entry.as_str().into());
        self.record.qtde = Some(dec(qty));
        self
    }

    pub fn exit(mut self, qty: &str) -> Self {
        self.record.st = Some(MovementType::Exit.as_str().into());
        self.record.qtde = Some(dec(qty));
        self
    }

    pub fn on(mut self, date: NaiveDateTime) -> Self {
        self.record.data = Some(date);
        self
    }

    pub fn price(mut self, price: &str) -> Self {
        self.record.preco = Some(dec(price));
        self
    }

    pub fn value(mut self, value: &str) -> Self {
        self.record.valor = Some(dec(value));
        self
    }

    pub fn balances(mut self, previous: Option<&str>, resulting: Option<&str>) -> Self {
        self.record.saldoant = previous.map(dec);
        self.record.sldantemp = resulting.map(dec);
        self
    }

    pub fn counterparty(mut self, clifor: i32) -> Self {
        self.record.clifor = Some(clifor);
        self
    }

    pub fn deleted(mut self) -> Self {
        self.record.isdeleted = Some(true);
        self
    }

    pub fn build(self) -> MovementRecord {
        self.record
    }
}
