//! PostgreSQL implementation of [`InventoryStore`]

use async_trait::async_trait;
use chrono::NaiveDateTime;
use shared::CompanyKey;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{
    Chronology, CompanyRecord, InventoryStore, ItemRecord, MovementFilter, MovementRecord,
    NewMovement,
};
use crate::error::AppResult;

const MOVEMENT_COLUMNS: &str = r#"
    nrlan, cdemp, cditem, data, st, qtde, preco, valor, custo, numdoc, datadoc, especie,
    clifor, codusu, empitem, empfor, empmov, empven, saldoant, sldantemp, obs, obsit,
    datalan, isdeleted, createdat, updatedat
"#;

/// Store backed by one tenant's connection pool
#[derive(Clone)]
pub struct PgInventoryStore {
    db: PgPool,
}

impl PgInventoryStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn push_movement_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &MovementFilter) {
    builder.push(" WHERE cdemp = ").push_bind(filter.cdemp);
    builder.push(" AND isdeleted = false");

    if let Some(cditem) = filter.cditem {
        builder.push(" AND cditem = ").push_bind(cditem);
    }
    if let Some(movement_type) = filter.movement_type {
        builder.push(" AND st = ").push_bind(movement_type.as_str());
    }
    if let Some(start) = filter.range.start {
        builder.push(" AND data >= ").push_bind(start);
    }
    if let Some(end) = filter.range.end {
        builder.push(" AND data <= ").push_bind(end);
    }

    builder.push(match filter.order {
        Chronology::Ascending => " ORDER BY data ASC, nrlan ASC",
        Chronology::Descending => " ORDER BY data DESC, nrlan DESC",
    });

    if let Some(limit) = filter.limit {
        builder.push(" LIMIT ").push_bind(limit);
    }
}

#[async_trait]
impl InventoryStore for PgInventoryStore {
    async fn first_company_code(&self) -> AppResult<Option<i32>> {
        let cdemp = sqlx::query_scalar::<_, i32>("SELECT cdemp FROM t_emp ORDER BY cdemp ASC LIMIT 1")
            .fetch_optional(&self.db)
            .await?;

        Ok(cdemp)
    }

    async fn find_company(&self, key: &CompanyKey) -> AppResult<Option<CompanyRecord>> {
        let mut builder = QueryBuilder::<Postgres>::new(
            r#"SELECT "ID", cdemp, isdeleted FROM t_emp WHERE isdeleted IS DISTINCT FROM true"#,
        );
        match key {
            CompanyKey::Guid(id) => builder.push(r#" AND "ID" = "#).push_bind(*id),
            CompanyKey::Code(cdemp) => builder.push(" AND cdemp = ").push_bind(*cdemp),
        };
        builder.push(" ORDER BY cdemp ASC LIMIT 1");

        let company = builder
            .build_query_as::<CompanyRecord>()
            .fetch_optional(&self.db)
            .await?;

        Ok(company)
    }

    async fn find_item(&self, cdemp: i32, id: Uuid) -> AppResult<Option<ItemRecord>> {
        let item = sqlx::query_as::<_, ItemRecord>(
            r#"
            SELECT "ID", cdemp, cditem, deitem
            FROM t_itens
            WHERE "ID" = $1 AND cdemp = $2
            LIMIT 1
            "#,
        )
        .bind(id)
        .bind(cdemp)
        .fetch_optional(&self.db)
        .await?;

        Ok(item)
    }

    async fn find_items(&self, codes: &[i32], cdemp: Option<i32>) -> AppResult<Vec<ItemRecord>> {
        if codes.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder = QueryBuilder::<Postgres>::new(
            r#"SELECT "ID", cdemp, cditem, deitem FROM t_itens WHERE cditem = ANY("#,
        );
        builder.push_bind(codes.to_vec()).push(")");
        if let Some(cdemp) = cdemp {
            builder.push(" AND cdemp = ").push_bind(cdemp);
        }
        builder.push(" ORDER BY cdemp ASC, cditem ASC");

        let items = builder
            .build_query_as::<ItemRecord>()
            .fetch_all(&self.db)
            .await?;

        Ok(items)
    }

    async fn latest_movement_before(
        &self,
        cdemp: i32,
        cditem: i32,
        before: NaiveDateTime,
    ) -> AppResult<Option<MovementRecord>> {
        let sql = format!(
            r#"
            SELECT {MOVEMENT_COLUMNS}
            FROM t_movest
            WHERE cdemp = $1 AND cditem = $2 AND isdeleted = false AND data < $3
            ORDER BY data DESC, nrlan DESC
            LIMIT 1
            "#
        );

        let movement = sqlx::query_as::<_, MovementRecord>(&sql)
            .bind(cdemp)
            .bind(cditem)
            .bind(before)
            .fetch_optional(&self.db)
            .await?;

        Ok(movement)
    }

    async fn find_movements(&self, filter: &MovementFilter) -> AppResult<Vec<MovementRecord>> {
        let mut builder =
            QueryBuilder::<Postgres>::new(format!("SELECT {MOVEMENT_COLUMNS} FROM t_movest"));
        push_movement_filter(&mut builder, filter);

        let movements = builder
            .build_query_as::<MovementRecord>()
            .fetch_all(&self.db)
            .await?;

        Ok(movements)
    }

    async fn insert_movement(&self, movement: NewMovement) -> AppResult<MovementRecord> {
        let sql = format!(
            r#"
            INSERT INTO t_movest (
                cdemp, cditem, data, st, qtde, preco, valor, custo, numdoc, datadoc, especie,
                clifor, codusu, empitem, empfor, empmov, empven, saldoant, sldantemp, obs, obsit,
                datalan, isdeleted, createdat, updatedat
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17,
                    $18, $19, $20, $21, $22, false, $23, $24)
            RETURNING {MOVEMENT_COLUMNS}
            "#
        );

        let created = sqlx::query_as::<_, MovementRecord>(&sql)
            .bind(movement.cdemp)
            .bind(movement.cditem)
            .bind(movement.data)
            .bind(movement.st.as_str())
            .bind(movement.qtde)
            .bind(movement.preco)
            .bind(movement.valor)
            .bind(movement.custo)
            .bind(movement.numdoc)
            .bind(movement.datadoc)
            .bind(&movement.especie)
            .bind(movement.clifor)
            .bind(&movement.codusu)
            .bind(movement.empitem)
            .bind(movement.empfor)
            .bind(movement.empmov)
            .bind(movement.empven)
            .bind(movement.saldoant)
            .bind(movement.sldantemp)
            .bind(&movement.obs)
            .bind(&movement.obsit)
            .bind(movement.datalan)
            .bind(movement.createdat)
            .bind(movement.updatedat)
            .fetch_one(&self.db)
            .await?;

        Ok(created)
    }
}
