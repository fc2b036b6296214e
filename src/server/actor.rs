//! Actor identity for authenticated routes.
//!
//! Authentication itself lives outside this service (a fronting proxy or
//! embedding application); what the core needs is an identity to stamp into
//! row audit fields and token issuer records. That identity arrives in the
//! `X-Actor` header, and this extractor is the seam where a real
//! authentication layer plugs in.

use std::sync::Arc;

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::server::AppState;

pub const ACTOR_HEADER: &str = "x-actor";

/// Extractor that requires an actor identity on the request.
pub struct RequireActor(pub String);

pub struct MissingActor;

impl IntoResponse for MissingActor {
    fn into_response(self) -> Response {
        let body = json!({ "data": null, "error": "Actor identity required" });
        (StatusCode::UNAUTHORIZED, Json(body)).into_response()
    }
}

impl FromRequestParts<Arc<AppState>> for RequireActor {
    type Rejection = MissingActor;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let actor = parts
            .headers
            .get(ACTOR_HEADER)
            .and_then(|h| h.to_str().ok())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(MissingActor)?;

        Ok(RequireActor(actor.to_string()))
    }
}
