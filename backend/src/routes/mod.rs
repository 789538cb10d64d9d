//! Route definitions for the Stock Movement API

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Protected routes - inventory movements
        .nest("/inventory", inventory_routes(state.clone()))
        // Protected routes - presigned uploads
        .nest("/upload", upload_routes(state))
}

/// Inventory movement routes (protected)
fn inventory_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/movements",
            get(handlers::list_movements).post(handlers::create_movement),
        )
        // static segment wins over the `:item_id` capture
        .route("/movements/summary", get(handlers::get_summary))
        .route("/movements/:item_id", get(handlers::get_kardex))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Upload routes (protected, admin only)
fn upload_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/presigned", post(handlers::create_presigned_url))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}
