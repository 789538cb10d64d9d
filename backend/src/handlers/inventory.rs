//! HTTP handlers for inventory movement endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use shared::{
    to_optional_code, CreateMovementInput, CreatedMovement, KardexQuery, KardexRow,
    MovementFilters, MovementResponse, MovementSummary, SummaryQuery,
};

use crate::error::{AppError, AppResult};
use crate::middleware::CurrentUser;
use crate::AppState;

/// List the latest movements of one type
pub async fn list_movements(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(filters): Query<MovementFilters>,
) -> AppResult<Json<Vec<MovementResponse>>> {
    let movements = state
        .inventory
        .list_movements(&current_user.0.tenant, filters)
        .await?;
    Ok(Json(movements))
}

/// Entry/exit totals over a date range
pub async fn get_summary(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<SummaryQuery>,
) -> AppResult<Json<MovementSummary>> {
    let summary = state
        .inventory
        .summary(&current_user.0.tenant, query)
        .await?;
    Ok(Json(summary))
}

/// Kardex of one item
pub async fn get_kardex(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(item_id): Path<String>,
    Query(query): Query<KardexQuery>,
) -> AppResult<Json<Vec<KardexRow>>> {
    let item_id = to_optional_code(item_id.as_str()).ok_or_else(|| {
        AppError::field("itemId", "Invalid item code", "Codigo do item invalido.")
    })?;

    let rows = state
        .inventory
        .kardex(&current_user.0.tenant, item_id, query)
        .await?;
    Ok(Json(rows))
}

/// Record a stock movement
pub async fn create_movement(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateMovementInput>,
) -> AppResult<(StatusCode, Json<CreatedMovement>)> {
    let created = state
        .inventory
        .create_movement(&current_user.0.tenant, input)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}
