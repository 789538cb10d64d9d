//! Inventory movement service: balances, kardex, summaries and movement entry

use std::{
    collections::{BTreeSet, HashMap},
    sync::Arc,
};

use chrono::{NaiveDateTime, Utc};
use rust_decimal::Decimal;
use shared::{
    computed_total, opening_balance, within_decimal_places, AmountOverflow, parse_company_key, parse_date_range, parse_date_time,
    to_decimal, to_optional_code, to_optional_decimal, Counterparty, CreateMovementInput,
    CreatedMovement, DocumentInfo, KardexQuery, KardexRow, MovementFilters, MovementResponse,
    MovementSummary, MovementTotals, MovementType, RunningBalance, SummaryQuery,
    DEFAULT_COMPANY_CODE, MAX_AMOUNT_DECIMAL_PLACES, MOVEMENT_LIST_LIMIT,
};
use tokio::sync::RwLock;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::store::{
    Chronology, InventoryStore, MovementFilter, MovementRecord, NewMovement, TenantResolver,
};

/// Inventory service shared by all requests.
///
/// Holds the per-tenant default company cache, so it must be created once and
/// kept in application state rather than built per request.
pub struct InventoryService {
    tenants: Arc<dyn TenantResolver>,
    // TODO: no invalidation; a new lowest company of a tenant is only seen after restart
    company_cache: RwLock<HashMap<String, i32>>,
}

impl InventoryService {
    /// Create a new InventoryService instance
    pub fn new(tenants: Arc<dyn TenantResolver>) -> Self {
        Self {
            tenants,
            company_cache: RwLock::new(HashMap::new()),
        }
    }

    /// Default company code of a tenant (lowest `cdemp`, else 1), cached per tenant
    pub async fn company_code(&self, tenant: &str, store: &dyn InventoryStore) -> AppResult<i32> {
        if let Some(cdemp) = self.company_cache.read().await.get(tenant) {
            return Ok(*cdemp);
        }

        let cdemp = store
            .first_company_code()
            .await?
            .unwrap_or(DEFAULT_COMPANY_CODE);

        self.company_cache
            .write()
            .await
            .entry(tenant.to_string())
            .or_insert(cdemp);

        tracing::debug!(tenant = %tenant, cdemp, "Resolved default company");
        Ok(cdemp)
    }

    /// Company from an explicit query value, else the tenant default
    async fn resolve_company(
        &self,
        tenant: &str,
        store: &dyn InventoryStore,
        explicit: Option<&str>,
    ) -> AppResult<i32> {
        match explicit.and_then(to_optional_code) {
            Some(cdemp) => Ok(cdemp),
            None => self.company_code(tenant, store).await,
        }
    }

    /// Balance of an item just before `before`; zero when no date is given or
    /// the item has no earlier movement
    pub async fn starting_balance(
        store: &dyn InventoryStore,
        cdemp: i32,
        cditem: i32,
        before: Option<NaiveDateTime>,
    ) -> AppResult<Decimal> {
        let Some(before) = before else {
            return Ok(Decimal::ZERO);
        };

        let previous = store.latest_movement_before(cdemp, cditem, before).await?;
        Ok(opening_balance(
            previous.map(|movement| movement.balance_snapshot()).as_ref(),
        )?)
    }

    /// Descriptions for item codes: company-scoped first, then any company for
    /// the codes still unmatched. Scoped matches are never overwritten.
    pub async fn item_descriptions(
        store: &dyn InventoryStore,
        codes: &[i32],
        cdemp: i32,
    ) -> AppResult<HashMap<i32, Option<String>>> {
        let mut descriptions = HashMap::new();
        if codes.is_empty() {
            return Ok(descriptions);
        }

        for item in store.find_items(codes, Some(cdemp)).await? {
            descriptions.entry(item.cditem).or_insert(item.deitem);
        }

        let missing: Vec<i32> = codes
            .iter()
            .copied()
            .filter(|code| !descriptions.contains_key(code))
            .collect();

        if !missing.is_empty() {
            for item in store.find_items(&missing, None).await? {
                descriptions.entry(item.cditem).or_insert(item.deitem);
            }
        }

        Ok(descriptions)
    }

    /// Description of a single item. A scoped row without a description
    /// counts as a miss; the first described row of any company is used then.
    pub async fn item_description(
        store: &dyn InventoryStore,
        code: i32,
        cdemp: i32,
    ) -> AppResult<Option<String>> {
        let scoped = store
            .find_items(&[code], Some(cdemp))
            .await?
            .into_iter()
            .next()
            .and_then(|item| item.deitem)
            .filter(|description| !description.is_empty());
        if scoped.is_some() {
            return Ok(scoped);
        }

        Ok(store
            .find_items(&[code], None)
            .await?
            .into_iter()
            .find_map(|item| item.deitem.filter(|description| !description.is_empty())))
    }

    /// Latest movements of one type (at most 50), newest first
    pub async fn list_movements(
        &self,
        tenant: &str,
        filters: MovementFilters,
    ) -> AppResult<Vec<MovementResponse>> {
        let store = self.tenants.store(tenant).await?;
        let movement_type = MovementType::normalize(filters.movement_type.as_deref());
        let range = parse_date_range(filters.from.as_deref(), filters.to.as_deref())?;
        let item_code = filters.item_id.as_deref().and_then(to_optional_code);
        let cdemp = self
            .resolve_company(tenant, store.as_ref(), filters.cdemp.as_deref())
            .await?;

        let filter = MovementFilter::new(cdemp, Chronology::Descending)
            .item(item_code)
            .movement_type(movement_type)
            .range(range)
            .limit(MOVEMENT_LIST_LIMIT);
        let movements = store.find_movements(&filter).await?;

        let codes: Vec<i32> = movements
            .iter()
            .filter_map(|m| m.cditem)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let descriptions = Self::item_descriptions(store.as_ref(), &codes, cdemp).await?;

        tracing::debug!(tenant = %tenant, cdemp, count = movements.len(), "Listed movements");

        movements
            .into_iter()
            .map(|movement| movement_response(movement, &descriptions))
            .collect()
    }

    /// Chronological ledger of one item with running balances
    pub async fn kardex(
        &self,
        tenant: &str,
        item_id: i32,
        query: KardexQuery,
    ) -> AppResult<Vec<KardexRow>> {
        let store = self.tenants.store(tenant).await?;
        let cdemp = self
            .resolve_company(tenant, store.as_ref(), query.cdemp.as_deref())
            .await?;
        let range = parse_date_range(query.from.as_deref(), query.to.as_deref())?;

        let opening = Self::starting_balance(store.as_ref(), cdemp, item_id, range.start).await?;

        let filter = MovementFilter::new(cdemp, Chronology::Ascending)
            .item(Some(item_id))
            .range(range);
        let movements = store.find_movements(&filter).await?;

        let mut running = RunningBalance::new(opening);
        movements
            .into_iter()
            .map(|movement| -> AppResult<KardexRow> {
                let snapshot = movement.balance_snapshot();
                let step = running.apply(&snapshot)?;
                Ok(KardexRow {
                    nrlan: movement.nrlan,
                    date: movement.effective_date(),
                    doc_number: movement.numdoc,
                    movement_type: snapshot.movement_type,
                    quantity: snapshot.quantity,
                    unit_price: to_optional_decimal(&movement.preco),
                    total_value: to_optional_decimal(&movement.valor),
                    previous_balance: step.previous,
                    current_balance: step.current,
                    notes: movement.obs,
                })
            })
            .collect()
    }

    /// Entry/exit totals over a required date range
    pub async fn summary(&self, tenant: &str, query: SummaryQuery) -> AppResult<MovementSummary> {
        let range = parse_date_range(query.from.as_deref(), query.to.as_deref())?;
        let (Some(start), Some(_)) = (range.start, range.end) else {
            return Err(AppError::validation(
                "Parameters `from` and `to` are required",
                "Parametros \"from\" e \"to\" sao obrigatorios.",
            ));
        };

        let store = self.tenants.store(tenant).await?;
        let item_code = query.item_id.as_deref().and_then(to_optional_code);
        let cdemp = self
            .resolve_company(tenant, store.as_ref(), query.cdemp.as_deref())
            .await?;

        let item_description = match item_code {
            Some(code) => Self::item_description(store.as_ref(), code, cdemp).await?,
            None => None,
        };

        let filter = MovementFilter::new(cdemp, Chronology::Ascending)
            .item(item_code)
            .range(range);
        let movements = store.find_movements(&filter).await?;

        let mut totals = MovementTotals::default();
        for movement in &movements {
            totals.record(
                movement.movement_type(),
                to_decimal(&movement.qtde),
                to_decimal(&movement.valor),
            )?;
        }

        let opening = match item_code {
            Some(code) => Self::starting_balance(store.as_ref(), cdemp, code, Some(start)).await?,
            None => Decimal::ZERO,
        };
        let net_quantity = totals.net_quantity()?;
        let current_balance = opening.checked_add(net_quantity).ok_or(AmountOverflow)?;

        Ok(MovementSummary {
            item_id: item_code,
            item_label: item_description.clone(),
            item_description,
            from: query.from.unwrap_or_default(),
            to: query.to.unwrap_or_default(),
            entries: totals.entries,
            exits: totals.exits,
            net_quantity,
            current_balance,
        })
    }

    /// Validate and record one stock movement
    pub async fn create_movement(
        &self,
        tenant: &str,
        input: CreateMovementInput,
    ) -> AppResult<CreatedMovement> {
        // Payload checks happen before any database round-trip
        let missing = input.missing_fields();
        if !missing.is_empty() {
            return Err(AppError::MissingFields(missing));
        }
        input.validate()?;

        let movement_date = parse_movement_date(input.date.as_deref())?;
        let document_date = match input.document.as_ref().and_then(|d| d.date.as_deref()) {
            Some(raw) if !raw.trim().is_empty() => Some(
                parse_date_time(raw)
                    .ok_or_else(|| {
                        AppError::field(
                            "document.date",
                            "Invalid document date",
                            "Data do documento invalida.",
                        )
                    })?
                    .value,
            ),
            _ => None,
        };

        let movement_type = MovementType::normalize(input.movement_type.as_deref());
        let quantity = input.quantity.unwrap_or_default().abs();
        if quantity.is_zero() {
            return Err(AppError::field(
                "quantity",
                "Quantity must be greater than zero",
                "A quantidade deve ser maior que zero.",
            ));
        }
        for (field, amount) in [
            ("quantity", Some(quantity)),
            ("unitPrice", input.unit_price),
            ("totalValue", input.total_value),
            ("cost", input.cost),
        ] {
            if amount.is_some_and(|v| !within_decimal_places(v, MAX_AMOUNT_DECIMAL_PLACES)) {
                return Err(AppError::field(
                    field,
                    format!("At most {} decimal places are allowed", MAX_AMOUNT_DECIMAL_PLACES),
                    format!("Sao permitidas no maximo {} casas decimais.", MAX_AMOUNT_DECIMAL_PLACES),
                ));
            }
        }
        let signed_quantity = movement_type.signed(quantity);
        let unit_price = input.unit_price;
        let total_value = match input.total_value {
            Some(total) => Some(total),
            None => computed_total(quantity, unit_price).map_err(|_| {
                AppError::field(
                    "unitPrice",
                    "Quantity times unit price is out of range",
                    "Quantidade vezes preco unitario fora do intervalo permitido.",
                )
            })?,
        };
        let cost = input.cost.or(unit_price);

        let warehouse = input.warehouse_input().unwrap_or_default().to_string();
        let company_key = parse_company_key(&warehouse).map_err(|_| {
            AppError::field(
                "warehouse",
                "Invalid warehouse. Send a GUID (ID) or a numeric cdemp",
                "Warehouse invalido. Envie GUID (ID) ou cdemp numerico.",
            )
        })?;

        let item_input = input.item_id.as_deref().unwrap_or_default().trim().to_string();
        let clifor = input.customer_or_supplier.unwrap_or_default();
        let user_code = input.user_code().unwrap_or_default().to_string();

        let store = self.tenants.store(tenant).await?;

        let company = store.find_company(&company_key).await?.ok_or_else(|| {
            AppError::not_found(
                format!("Company/warehouse '{}' not found", warehouse),
                format!("Empresa/Almoxarifado '{}' nao encontrada.", warehouse),
            )
        })?;
        let cdemp = company.cdemp;

        let item_not_found = || {
            AppError::not_found(
                format!("Item '{}' not found in warehouse '{}'", item_input, warehouse),
                format!(
                    "Item '{}' nao encontrado no almoxarifado '{}'.",
                    item_input, warehouse
                ),
            )
        };
        let item_guid = Uuid::parse_str(&item_input).map_err(|_| item_not_found())?;
        let item = store
            .find_item(cdemp, item_guid)
            .await?
            .ok_or_else(item_not_found)?;

        let previous_balance =
            Self::starting_balance(store.as_ref(), cdemp, item.cditem, Some(movement_date)).await?;
        let current_balance = previous_balance.checked_add(signed_quantity).ok_or_else(|| {
            AppError::field(
                "quantity",
                "Resulting balance is out of range",
                "Saldo resultante fora do intervalo permitido.",
            )
        })?;

        let notes = input.notes.clone();
        let document = input.document.unwrap_or_default();
        let now = Utc::now().naive_utc();

        let created = store
            .insert_movement(NewMovement {
                cdemp,
                cditem: item.cditem,
                data: movement_date,
                st: movement_type,
                qtde: quantity,
                preco: unit_price,
                valor: total_value,
                custo: cost,
                numdoc: document.number,
                datadoc: document_date,
                especie: document.doc_type,
                clifor,
                codusu: user_code,
                empitem: cdemp,
                empfor: cdemp,
                empmov: cdemp,
                empven: cdemp,
                saldoant: previous_balance,
                sldantemp: current_balance,
                obs: notes.clone(),
                obsit: notes,
                datalan: movement_date,
                createdat: now,
                updatedat: now,
            })
            .await?;

        tracing::info!(
            tenant = %tenant,
            nrlan = created.nrlan,
            cdemp,
            cditem = item.cditem,
            st = %movement_type,
            "Recorded stock movement"
        );

        Ok(CreatedMovement {
            id: created.nrlan,
            item_id: item.cditem,
            movement_type,
            quantity,
            unit_price,
            total_value,
            previous_balance,
            current_balance,
            date: created.data,
        })
    }
}

/// Movement date from the payload, defaulting to now when absent
pub fn parse_movement_date(raw: Option<&str>) -> AppResult<NaiveDateTime> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(value) => parse_date_time(value).map(|parsed| parsed.value).ok_or_else(|| {
            AppError::field("date", "Invalid movement date", "Data do lancamento invalida.")
        }),
        None => Ok(Utc::now().naive_utc()),
    }
}

fn movement_response(
    movement: MovementRecord,
    descriptions: &HashMap<i32, Option<String>>,
) -> AppResult<MovementResponse> {
    let movement_type = movement.movement_type();
    let quantity = to_decimal(&movement.qtde);
    let unit_price = to_optional_decimal(&movement.preco);
    let total_value = match to_optional_decimal(&movement.valor) {
        Some(total) => Some(total),
        None => computed_total(quantity, unit_price)?,
    };
    let description = movement
        .cditem
        .and_then(|code| descriptions.get(&code).cloned().flatten());

    Ok(MovementResponse {
        nrlan: movement.nrlan,
        item_id: movement.cditem,
        item_code: movement.cditem.map(|code| code.to_string()),
        item_label: description.clone(),
        item_description: description,
        date: movement.effective_date(),
        movement_type,
        quantity,
        unit_price,
        total_value,
        document: DocumentInfo {
            number: movement.numdoc,
            date: movement.datadoc.or(movement.data),
            doc_type: movement.especie,
        },
        counterparty: movement.clifor.filter(|code| *code != 0).map(|code| Counterparty {
            code,
            role: movement_type.counterparty_role(),
        }),
        notes: movement.obs,
        warehouse: movement.empitem,
    })
}
