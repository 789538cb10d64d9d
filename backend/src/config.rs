//! Configuration management for the Stock Movement API
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with STOCK_ prefix

use config::{ConfigError, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// JWT authentication configuration
    pub jwt: JwtConfig,

    /// Object storage configuration for presigned uploads
    pub storage: StorageConfig,

    /// CORS policy used outside development
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// Main database holding `t_acessos`
    pub url: String,

    /// Tenant connection string; `{database}` is replaced by the tenant's `banco`
    pub tenant_url_template: String,

    /// Maximum number of connections per pool
    pub max_connections: u32,

    /// Minimum number of connections per pool
    pub min_connections: u32,

    /// Seconds to wait for a pooled connection
    pub acquire_timeout_secs: u64,

    /// Apply the tenant schema migrations when a tenant pool is first opened
    pub run_tenant_migrations: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    /// Secret key used to verify HS256 tokens
    pub secret: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Cloudflare R2 account id (endpoint host prefix)
    pub account_id: String,

    pub access_key_id: String,

    pub secret_access_key: String,

    /// Region used in the signature scope
    pub region: String,

    /// Default bucket
    pub bucket_name: String,

    /// Public CDN domain of the default bucket
    pub public_domain: String,

    /// Bucket for requests coming from e-pdv hosts
    pub bucket_name_epdv: Option<String>,

    /// Public CDN domain for e-pdv hosts
    pub public_domain_epdv: Option<String>,

    /// Presigned URL lifetime in seconds
    pub presign_expiry_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    /// Exact origins always allowed
    pub allowed_origins: Vec<String>,

    /// Any `https://<sub>.<base_domain>` origin is allowed
    pub base_domain: Option<String>,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("STOCK_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3023)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 1)?
            .set_default("database.acquire_timeout_secs", 30)?
            .set_default("database.run_tenant_migrations", false)?
            .set_default("storage.region", "auto")?
            .set_default("storage.presign_expiry_secs", 600)?
            .set_default(
                "cors.allowed_origins",
                vec!["https://goldpdv.com.br", "https://www.goldpdv.com.br"],
            )?
            .set_default("cors.base_domain", "goldpdv.com.br")?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (STOCK_ prefix)
            .add_source(
                Environment::with_prefix("STOCK")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("cors.allowed_origins")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl DatabaseConfig {
    /// Connection string for one tenant database
    pub fn tenant_url(&self, database: &str) -> String {
        self.tenant_url_template.replace("{database}", database)
    }
}

impl StorageConfig {
    /// S3-compatible endpoint of the account
    pub fn endpoint_host(&self) -> String {
        format!("{}.r2.cloudflarestorage.com", self.account_id.trim())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3023,
            host: "0.0.0.0".to_string(),
        }
    }
}
