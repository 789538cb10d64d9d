//! Stock Movement API - Backend
//!
//! Multi-tenant inventory movement service: per-item balances, kardex
//! ledgers, range summaries, movement entry and presigned uploads.

use std::sync::Arc;

use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    routing::get,
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

pub mod config;
pub mod error;
pub mod external;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod store;
pub mod tenant;

pub use config::{Config, CorsConfig};
pub use services::{InventoryService, UploadService};
pub use tenant::TenantRegistry;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub tenants: Arc<TenantRegistry>,
    pub inventory: Arc<InventoryService>,
    pub uploads: Arc<UploadService>,
}

/// Create the application router with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    Router::new()
        .route("/", get(root))
        .nest("/api/v1", routes::api_routes(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
        .with_state(state)
}

/// CORS policy: any origin in development, configured origins otherwise
fn cors_layer(config: &Config) -> CorsLayer {
    if config.is_development() {
        return CorsLayer::new()
            .allow_origin(AllowOrigin::mirror_request())
            .allow_methods(allowed_methods())
            .allow_headers(allowed_headers())
            .allow_credentials(true);
    }

    let cors = config.cors.clone();
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(move |origin: &HeaderValue, _| {
            origin
                .to_str()
                .map(|origin| origin_allowed(origin, &cors))
                .unwrap_or(false)
        }))
        .allow_methods(allowed_methods())
        .allow_headers(allowed_headers())
        .allow_credentials(true)
}

fn allowed_methods() -> [Method; 6] {
    [
        Method::GET,
        Method::POST,
        Method::PATCH,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ]
}

fn allowed_headers() -> [HeaderName; 6] {
    [
        header::ORIGIN,
        header::CONTENT_TYPE,
        header::ACCEPT,
        header::AUTHORIZATION,
        HeaderName::from_static("x-tenant"),
        HeaderName::from_static("x-requested-with"),
    ]
}

/// Exact configured origins, or `https://` plus one subdomain label of the base domain
pub fn origin_allowed(origin: &str, cors: &CorsConfig) -> bool {
    if cors.allowed_origins.iter().any(|allowed| allowed == origin) {
        return true;
    }

    let Some(base) = cors.base_domain.as_deref().map(str::trim).filter(|b| !b.is_empty()) else {
        return false;
    };
    let origin = origin.to_ascii_lowercase();
    let Some(host) = origin.strip_prefix("https://") else {
        return false;
    };
    if host == base.to_ascii_lowercase() {
        return true;
    }

    host.strip_suffix(&format!(".{}", base.to_ascii_lowercase()))
        .map(|label| {
            !label.is_empty()
                && label
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-')
        })
        .unwrap_or(false)
}

/// Root endpoint
async fn root() -> &'static str {
    "Stock Movement API v1.0"
}
