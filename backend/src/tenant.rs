//! Tenant database registry
//!
//! Tenants are looked up in the main database (`t_acessos`) by their slug,
//! which doubles as the tenant database name. One pool is kept per tenant
//! connection string for the lifetime of the process.

use std::{collections::HashMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tokio::sync::RwLock;

use crate::{
    config::DatabaseConfig,
    error::{AppError, AppResult},
    store::{InventoryStore, PgInventoryStore, TenantResolver},
};

/// Registry of tenant connection pools
pub struct TenantRegistry {
    main: PgPool,
    settings: DatabaseConfig,
    pools: RwLock<HashMap<String, PgPool>>,
}

impl TenantRegistry {
    pub fn new(main: PgPool, settings: DatabaseConfig) -> Self {
        Self {
            main,
            settings,
            pools: RwLock::new(HashMap::new()),
        }
    }

    /// Main database pool
    pub fn main(&self) -> &PgPool {
        &self.main
    }

    /// Database name of an active tenant
    async fn tenant_database(&self, slug: &str) -> AppResult<String> {
        let banco = sqlx::query_scalar::<_, String>(
            "SELECT banco FROM t_acessos WHERE ativo = 'S' AND banco = $1 LIMIT 1",
        )
        .bind(slug)
        .fetch_optional(&self.main)
        .await?;

        banco
            .map(|b| b.trim().to_string())
            .filter(|b| !b.is_empty())
            .ok_or_else(|| AppError::TenantNotFound(slug.to_string()))
    }

    /// Pool for a tenant, opening it on first use
    pub async fn pool(&self, slug: &str) -> AppResult<PgPool> {
        let database = self.tenant_database(slug).await?;
        let url = self.settings.tenant_url(&database);

        if let Some(pool) = self.pools.read().await.get(&url) {
            return Ok(pool.clone());
        }

        let mut pools = self.pools.write().await;
        // another request may have opened it while we waited for the lock
        if let Some(pool) = pools.get(&url) {
            return Ok(pool.clone());
        }

        tracing::info!(tenant = %slug, "Opening tenant connection pool");
        let pool = PgPoolOptions::new()
            .max_connections(self.settings.max_connections)
            .min_connections(self.settings.min_connections)
            .acquire_timeout(Duration::from_secs(self.settings.acquire_timeout_secs))
            .connect_lazy(&url)?;

        if self.settings.run_tenant_migrations {
            tracing::info!(tenant = %slug, "Running tenant schema migrations...");
            sqlx::migrate!("./tenant_migrations").run(&pool).await?;
        }

        pools.insert(url, pool.clone());
        Ok(pool)
    }

    /// Close every pool; used on shutdown
    pub async fn close(&self) {
        for pool in self.pools.read().await.values() {
            pool.close().await;
        }
        self.main.close().await;
    }
}

#[async_trait]
impl TenantResolver for TenantRegistry {
    async fn store(&self, tenant: &str) -> AppResult<Arc<dyn InventoryStore>> {
        let pool = self.pool(tenant).await?;
        Ok(Arc::new(PgInventoryStore::new(pool)))
    }
}
