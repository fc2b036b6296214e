use std::sync::Arc;
use std::time::Instant;

use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::{
    Router,
    routing::{delete, get, patch, post, put},
};

use super::{deadlines, delegate, options, rows, sheets};
use crate::store::Store;

pub struct AppState {
    pub store: Arc<dyn Store>,
    /// Public base URL for external access. Used when building fill-in links.
    pub public_base_url: Option<String>,
}

async fn health() -> &'static str {
    "OK"
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let response = next.run(request).await;

    let latency = start.elapsed();
    let status = response.status();

    tracing::info!(
        "{} {} {} {}ms",
        method,
        uri.path(),
        status.as_u16(),
        latency.as_millis()
    );

    response
}

fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        // Sheets (schema registry)
        .route("/sheets", get(sheets::list_sheets))
        .route("/sheets", post(sheets::create_sheet))
        .route("/sheets/{name}", get(sheets::get_sheet))
        .route("/sheets/{name}", patch(sheets::update_sheet))
        .route("/sheets/{name}/columns", get(sheets::get_columns))
        .route("/sheets/{name}/columns", put(sheets::set_columns))
        .route("/sheets/{name}/columns/{index}", patch(sheets::edit_column))
        .route("/sheets/{name}/delegatable", get(sheets::get_delegatable))
        .route("/sheets/{name}/delegatable", put(sheets::set_delegatable))
        // Option sets
        .route("/sheets/{name}/options", get(options::list_option_sets))
        .route("/sheets/{name}/options", post(options::upsert_option_set))
        .route("/sheets/{name}/column-options", get(options::column_options))
        .route("/options/{id}", patch(options::update_option_set))
        .route("/options/{id}", delete(options::delete_option_set))
        // Rows
        .route("/sheets/{name}/rows", get(rows::list_rows))
        .route("/sheets/{name}/rows", post(rows::create_row))
        .route("/rows/{id}", get(rows::get_row))
        .route("/rows/{id}", put(rows::update_row))
        .route("/rows/{id}", delete(rows::delete_row))
        .route("/rows/{id}/delegate", post(delegate::issue_link))
        .route("/rows/{id}/delegations", get(delegate::list_links))
        // Deadline views
        .route("/calendar/deadlines", get(deadlines::calendar))
        .route("/alerts/deadlines", get(deadlines::alerts))
}

/// Public fill-in routes: the token in the path is the whole capability, so
/// no actor identity is required.
fn fill_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/fill/{token}", get(delegate::read_fill))
        .route("/fill/{token}", post(delegate::submit_fill))
        .route("/fill/{token}/finish", post(delegate::finish_fill))
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api_router())
        .merge(fill_router())
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}
