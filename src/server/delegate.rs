use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{Duration, Utc};

use crate::delegation;
use crate::server::AppState;
use crate::server::actor::RequireActor;
use crate::server::dto::{DelegateRequest, DelegateResponse, FillResponse, SubmitFillRequest};
use crate::server::response::{ApiError, ApiResponse, StoreOptionExt, StoreResultExt};

/// Mints a fill-in link for one row. The returned link carries the token as
/// its only path segment; sheet and row resolve server-side.
pub async fn issue_link(
    RequireActor(actor): RequireActor,
    State(state): State<Arc<AppState>>,
    Path(row_id): Path<i64>,
    Json(req): Json<DelegateRequest>,
) -> impl IntoResponse {
    let row = state
        .store
        .get_row(row_id)
        .api_err("Failed to get row")?
        .or_not_found("Row not found")?;

    let ttl_days = req.ttl_days.unwrap_or(delegation::DEFAULT_TTL_DAYS);

    let token = delegation::issue(
        state.store.as_ref(),
        &row.sheet,
        row.id,
        &actor,
        Duration::days(ttl_days),
    )
    .map_err(ApiError::from)?;

    let base = state.public_base_url.as_deref().unwrap_or("");
    let response = DelegateResponse {
        link: format!("{}/fill/{}", base.trim_end_matches('/'), token.token),
        expires_at: token.expires_at,
    };

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(response))))
}

/// Lists the links issued for one row, newest first. The token secrets are
/// never serialized; callers see issuance, expiry, and use metadata only.
pub async fn list_links(
    _auth: RequireActor,
    State(state): State<Arc<AppState>>,
    Path(row_id): Path<i64>,
) -> impl IntoResponse {
    state
        .store
        .get_row(row_id)
        .api_err("Failed to get row")?
        .or_not_found("Row not found")?;

    let links = state
        .store
        .list_row_delegations(row_id)
        .api_err("Failed to list links")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(links)))
}

// The /fill handlers below are public: the token is the capability.

pub async fn read_fill(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> impl IntoResponse {
    let redemption = delegation::redeem_for_read(state.store.as_ref(), &token, Utc::now())
        .map_err(ApiError::from)?;

    Ok::<_, ApiError>(Json(ApiResponse::success(FillResponse {
        data: redemption.row.data,
        editable: redemption.editable,
        expires_at: redemption.expires_at,
    })))
}

pub async fn submit_fill(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
    Json(req): Json<SubmitFillRequest>,
) -> impl IntoResponse {
    delegation::redeem_for_write(state.store.as_ref(), &token, &req.fields, Utc::now())
        .map_err(ApiError::from)?;

    // Out-of-scope fields were dropped server-side; the response is
    // deliberately uniform either way.
    Ok::<_, ApiError>(Json(ApiResponse::success("saved")))
}

pub async fn finish_fill(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> impl IntoResponse {
    delegation::finish(state.store.as_ref(), &token, Utc::now()).map_err(ApiError::from)?;

    Ok::<_, ApiError>(Json(ApiResponse::success("finished")))
}
