use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::options::options_for_columns;
use crate::server::AppState;
use crate::server::actor::RequireActor;
use crate::server::dto::{UpdateOptionSetRequest, UpsertOptionSetRequest};
use crate::server::response::{ApiError, ApiResponse, StoreOptionExt, StoreResultExt};
use crate::server::validation::validate_field_name;

pub async fn list_option_sets(
    _auth: RequireActor,
    State(state): State<Arc<AppState>>,
    Path(sheet): Path<String>,
) -> impl IntoResponse {
    state
        .store
        .get_sheet(&sheet)
        .api_err("Failed to get sheet")?
        .or_not_found("Sheet not found")?;

    let sets = state
        .store
        .list_option_sets(&sheet)
        .api_err("Failed to list option sets")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(sets)))
}

/// The resolved view: current schema columns mapped to their allowed values
/// by normalized field-name matching. This is what a row editor renders as
/// dropdowns.
pub async fn column_options(
    _auth: RequireActor,
    State(state): State<Arc<AppState>>,
    Path(sheet): Path<String>,
) -> impl IntoResponse {
    let sheet = state
        .store
        .get_sheet(&sheet)
        .api_err("Failed to get sheet")?
        .or_not_found("Sheet not found")?;

    let sets = state
        .store
        .list_option_sets(&sheet.name)
        .api_err("Failed to list option sets")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(options_for_columns(
        &sheet, &sets,
    ))))
}

pub async fn upsert_option_set(
    _auth: RequireActor,
    State(state): State<Arc<AppState>>,
    Path(sheet): Path<String>,
    Json(req): Json<UpsertOptionSetRequest>,
) -> impl IntoResponse {
    validate_field_name(&req.field)?;
    if req.values.iter().all(|v| v.trim().is_empty()) {
        return Err(ApiError::bad_request("At least one option value is required"));
    }

    state
        .store
        .get_sheet(&sheet)
        .api_err("Failed to get sheet")?
        .or_not_found("Sheet not found")?;

    let values: Vec<String> = req
        .values
        .iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect();

    let set = state
        .store
        .upsert_option_set(&sheet, req.field.trim(), &values)
        .api_err("Failed to save option set")?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(set))))
}

pub async fn update_option_set(
    _auth: RequireActor,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateOptionSetRequest>,
) -> impl IntoResponse {
    let store = state.store.as_ref();

    store
        .get_option_set(id)
        .api_err("Failed to get option set")?
        .or_not_found("Option set not found")?;

    if let Some(values) = &req.values {
        store
            .set_option_set_values(id, values)
            .api_err("Failed to update option set")?;
    }
    if let Some(active) = req.active {
        store
            .set_option_set_active(id, active)
            .api_err("Failed to update option set")?;
    }

    let set = store
        .get_option_set(id)
        .api_err("Failed to get option set")?
        .or_not_found("Option set not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(set)))
}

pub async fn delete_option_set(
    _auth: RequireActor,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    let deleted = state
        .store
        .delete_option_set(id)
        .api_err("Failed to delete option set")?;

    if !deleted {
        return Err(ApiError::not_found("Option set not found"));
    }

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}
