use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ColumnDef, ColumnKind, RowData};

#[derive(Debug, Deserialize)]
pub struct CreateSheetRequest {
    pub name: String,
    #[serde(default)]
    pub columns: Vec<ColumnDef>,
    #[serde(default)]
    pub display_order: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSheetRequest {
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub display_order: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct SetColumnsRequest {
    pub columns: Vec<ColumnDef>,
}

#[derive(Debug, Deserialize)]
pub struct EditColumnRequest {
    pub name: String,
    #[serde(default)]
    pub kind: ColumnKind,
}

#[derive(Debug, Deserialize)]
pub struct SetDelegatableRequest {
    pub fields: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpsertOptionSetRequest {
    pub field: String,
    pub values: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateOptionSetRequest {
    #[serde(default)]
    pub values: Option<Vec<String>>,
    #[serde(default)]
    pub active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct RowDataRequest {
    pub data: RowData,
}

#[derive(Debug, Default, Deserialize)]
pub struct DelegateRequest {
    #[serde(default)]
    pub ttl_days: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct DelegateResponse {
    /// Opaque fill-in link; the token is the only identifier it carries.
    pub link: String,
    pub expires_at: DateTime<Utc>,
}

/// What the external fill-in page sees: the full row for context, the
/// editable subset of columns, and when the link dies.
#[derive(Debug, Serialize)]
pub struct FillResponse {
    pub data: RowData,
    pub editable: Vec<ColumnDef>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitFillRequest {
    pub fields: RowData,
}

#[derive(Debug, Default, Deserialize)]
pub struct DeadlineQuery {
    /// Overrides "today" for deterministic queries; defaults to the current
    /// UTC date.
    #[serde(default)]
    pub today: Option<NaiveDate>,
}
