use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::text::normalize_field_name;

/// Column value type tag. Storage does not enforce these; they drive
/// presentation and date canonicalization only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColumnKind {
    Text,
    Date,
    Select,
    LongText,
}

impl Default for ColumnKind {
    fn default() -> Self {
        ColumnKind::Text
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    #[serde(default)]
    pub kind: ColumnKind,
}

/// A sheet: a named collection of rows sharing one column schema.
/// Sheets are never deleted, only deactivated, so historical rows and
/// issued delegation links keep resolving.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sheet {
    pub name: String,
    pub columns: Vec<ColumnDef>,
    /// Names of columns an external party may edit through a delegation link.
    pub delegatable: Vec<String>,
    pub display_order: i64,
    pub active: bool,
}

impl Sheet {
    /// Column definitions currently marked delegatable, in schema order.
    /// Grants match columns by normalized name, so case or accent drift
    /// between the grant list and the schema does not silently revoke a
    /// column.
    pub fn delegatable_columns(&self) -> Vec<ColumnDef> {
        let granted: Vec<String> = self
            .delegatable
            .iter()
            .map(|f| normalize_field_name(f))
            .collect();
        self.columns
            .iter()
            .filter(|c| {
                let name = normalize_field_name(&c.name);
                granted.iter().any(|g| g == &name)
            })
            .cloned()
            .collect()
    }
}

/// Row data is a plain string map. Keys are column names; the key set is
/// allowed to drift from the sheet schema (stale keys from removed columns,
/// missing keys for added ones). Readers treat absent as empty.
pub type RowData = BTreeMap<String, String>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Row {
    pub id: i64,
    pub sheet: String,
    pub data: RowData,
    /// Monotonic per-sheet creation index. Never reused after deletion.
    pub row_order: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
}

/// Allowed values for a select-type column, keyed by (sheet, field name).
/// The field name is matched against the schema by normalized name, so an
/// option set may outlive or predate the column it configures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionSet {
    pub id: i64,
    pub sheet: String,
    pub field: String,
    pub values: Vec<String>,
    pub active: bool,
    pub display_order: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An opaque, time-limited, single-row write capability. Looked up by token
/// equality only. `used_at` marks the latest successful submission; it does
/// not invalidate the token (repeat submission until expiry is allowed).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelegationToken {
    #[serde(skip)]
    pub token: String,
    pub sheet: String,
    pub row_id: i64,
    pub expires_at: DateTime<Utc>,
    pub issued_by: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub used_at: Option<DateTime<Utc>>,
}

impl DelegationToken {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}
