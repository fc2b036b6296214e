use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::server::AppState;
use crate::server::actor::RequireActor;
use crate::server::dto::RowDataRequest;
use crate::server::response::{ApiError, ApiResponse, StoreOptionExt, StoreResultExt};
use crate::text::canonicalize_date_value;
use crate::types::{ColumnKind, RowData, Sheet};

/// Rewrites date-typed column values into canonical `YYYY-MM-DD` form on the
/// way into the store. Keys without a matching date column pass through
/// untouched.
fn canonicalize_dates(sheet: &Sheet, data: &RowData) -> RowData {
    let mut out = data.clone();
    for column in &sheet.columns {
        if column.kind != ColumnKind::Date {
            continue;
        }
        if let Some(value) = out.get_mut(&column.name) {
            *value = canonicalize_date_value(value);
        }
    }
    out
}

pub async fn list_rows(
    _auth: RequireActor,
    State(state): State<Arc<AppState>>,
    Path(sheet): Path<String>,
) -> impl IntoResponse {
    state
        .store
        .get_sheet(&sheet)
        .api_err("Failed to get sheet")?
        .or_not_found("Sheet not found")?;

    let rows = state
        .store
        .list_rows(&sheet)
        .api_err("Failed to list rows")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(rows)))
}

pub async fn create_row(
    RequireActor(actor): RequireActor,
    State(state): State<Arc<AppState>>,
    Path(sheet): Path<String>,
    Json(req): Json<RowDataRequest>,
) -> impl IntoResponse {
    let sheet = state
        .store
        .get_sheet(&sheet)
        .api_err("Failed to get sheet")?
        .or_not_found("Sheet not found")?;

    let data = canonicalize_dates(&sheet, &req.data);
    let row = state
        .store
        .create_row(&sheet.name, &data, &actor)
        .api_err("Failed to create row")?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(row))))
}

pub async fn get_row(
    _auth: RequireActor,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    let row = state
        .store
        .get_row(id)
        .api_err("Failed to get row")?
        .or_not_found("Row not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(row)))
}

/// Full replace of the row's data map, last-write-wins.
pub async fn update_row(
    RequireActor(actor): RequireActor,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<RowDataRequest>,
) -> impl IntoResponse {
    let store = state.store.as_ref();

    let row = store
        .get_row(id)
        .api_err("Failed to get row")?
        .or_not_found("Row not found")?;

    let sheet = store
        .get_sheet(&row.sheet)
        .api_err("Failed to get sheet")?
        .or_not_found("Sheet not found")?;

    let data = canonicalize_dates(&sheet, &req.data);
    store
        .update_row(id, &data, &actor)
        .map_err(ApiError::from)?;

    let row = store
        .get_row(id)
        .api_err("Failed to get row")?
        .or_not_found("Row not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(row)))
}

pub async fn delete_row(
    _auth: RequireActor,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    let deleted = state
        .store
        .delete_row(id)
        .api_err("Failed to delete row")?;

    if !deleted {
        return Err(ApiError::not_found("Row not found"));
    }

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}
