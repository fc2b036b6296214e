use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};
use chrono::Utc;

use crate::deadline;
use crate::server::AppState;
use crate::server::actor::RequireActor;
use crate::server::dto::DeadlineQuery;
use crate::server::response::{ApiError, ApiResponse, StoreResultExt};

pub async fn calendar(
    _auth: RequireActor,
    State(state): State<Arc<AppState>>,
    Query(params): Query<DeadlineQuery>,
) -> impl IntoResponse {
    let today = params.today.unwrap_or_else(|| Utc::now().date_naive());
    let events = deadline::calendar_events(state.store.as_ref(), today)
        .api_err("Failed to compute calendar events")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(events)))
}

pub async fn alerts(
    _auth: RequireActor,
    State(state): State<Arc<AppState>>,
    Query(params): Query<DeadlineQuery>,
) -> impl IntoResponse {
    let today = params.today.unwrap_or_else(|| Utc::now().date_naive());
    let alerts = deadline::alerts(state.store.as_ref(), today)
        .api_err("Failed to compute alerts")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(alerts)))
}
