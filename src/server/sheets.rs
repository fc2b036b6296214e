use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::server::AppState;
use crate::server::actor::RequireActor;
use crate::server::dto::{
    CreateSheetRequest, EditColumnRequest, SetColumnsRequest, SetDelegatableRequest,
    UpdateSheetRequest,
};
use crate::server::response::{ApiError, ApiResponse, StoreOptionExt, StoreResultExt};
use crate::server::validation::{validate_columns, validate_field_name, validate_sheet_name};
use crate::types::{ColumnDef, Sheet};

pub async fn list_sheets(
    _auth: RequireActor,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let sheets = state
        .store
        .list_sheets()
        .api_err("Failed to list sheets")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(sheets)))
}

pub async fn create_sheet(
    _auth: RequireActor,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateSheetRequest>,
) -> impl IntoResponse {
    validate_sheet_name(&req.name)?;
    if !req.columns.is_empty() {
        validate_columns(&req.columns)?;
    }

    let sheet = Sheet {
        name: req.name.trim().to_string(),
        columns: req.columns,
        delegatable: vec![],
        display_order: req.display_order.unwrap_or(0),
        active: true,
    };

    match state.store.create_sheet(&sheet) {
        Ok(()) => Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(sheet)))),
        Err(crate::error::Error::AlreadyExists) => Err(ApiError::conflict("Sheet already exists")),
        Err(_) => Err(ApiError::internal("Failed to create sheet")),
    }
}

pub async fn get_sheet(
    _auth: RequireActor,
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> impl IntoResponse {
    let sheet = state
        .store
        .get_sheet(&name)
        .api_err("Failed to get sheet")?
        .or_not_found("Sheet not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(sheet)))
}

pub async fn update_sheet(
    _auth: RequireActor,
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(req): Json<UpdateSheetRequest>,
) -> impl IntoResponse {
    let store = state.store.as_ref();

    store
        .get_sheet(&name)
        .api_err("Failed to get sheet")?
        .or_not_found("Sheet not found")?;

    if let Some(active) = req.active {
        store
            .set_sheet_active(&name, active)
            .api_err("Failed to update sheet")?;
    }
    if let Some(display_order) = req.display_order {
        store
            .set_sheet_display_order(&name, display_order)
            .api_err("Failed to update sheet")?;
    }

    let sheet = state
        .store
        .get_sheet(&name)
        .api_err("Failed to get sheet")?
        .or_not_found("Sheet not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(sheet)))
}

pub async fn get_columns(
    _auth: RequireActor,
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> impl IntoResponse {
    let sheet = state
        .store
        .get_sheet(&name)
        .api_err("Failed to get sheet")?
        .or_not_found("Sheet not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(sheet.columns)))
}

/// Idempotent full replace of the column schema. Existing rows are never
/// touched: a removed column simply leaves stale keys behind and an added
/// column reads as empty until written.
pub async fn set_columns(
    _auth: RequireActor,
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(req): Json<SetColumnsRequest>,
) -> impl IntoResponse {
    validate_columns(&req.columns)?;

    state
        .store
        .set_sheet_columns(&name, &req.columns)
        .map_err(ApiError::from)?;

    Ok::<_, ApiError>(Json(ApiResponse::success(req.columns)))
}

/// Positional single-column edit. The delegatable grant follows a rename;
/// option sets are left alone and re-match (or stop matching) by
/// normalized name on their own.
pub async fn edit_column(
    _auth: RequireActor,
    State(state): State<Arc<AppState>>,
    Path((name, index)): Path<(String, usize)>,
    Json(req): Json<EditColumnRequest>,
) -> impl IntoResponse {
    validate_field_name(&req.name)?;

    let store = state.store.as_ref();
    let sheet = store
        .get_sheet(&name)
        .api_err("Failed to get sheet")?
        .or_not_found("Sheet not found")?;

    if sheet
        .columns
        .iter()
        .enumerate()
        .any(|(i, c)| i != index && c.name == req.name)
    {
        return Err(ApiError::conflict("Duplicate column name"));
    }

    let columns = store
        .rename_sheet_column(
            &name,
            index,
            &ColumnDef {
                name: req.name,
                kind: req.kind,
            },
        )
        .map_err(ApiError::from)?;

    Ok::<_, ApiError>(Json(ApiResponse::success(columns)))
}

pub async fn get_delegatable(
    _auth: RequireActor,
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> impl IntoResponse {
    let sheet = state
        .store
        .get_sheet(&name)
        .api_err("Failed to get sheet")?
        .or_not_found("Sheet not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(sheet.delegatable)))
}

/// Replaces the delegatable set. Takes effect for outstanding links
/// immediately: scoping is evaluated at redemption time.
pub async fn set_delegatable(
    _auth: RequireActor,
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(req): Json<SetDelegatableRequest>,
) -> impl IntoResponse {
    for field in &req.fields {
        validate_field_name(field)?;
    }

    state
        .store
        .set_sheet_delegatable(&name, &req.fields)
        .map_err(ApiError::from)?;

    Ok::<_, ApiError>(Json(ApiResponse::success(req.fields)))
}
