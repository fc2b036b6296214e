mod schema;
mod sqlite;

pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::types::*;

/// Store defines the database interface.
pub trait Store: Send + Sync {
    fn initialize(&self) -> Result<()>;

    // Schema registry operations
    fn create_sheet(&self, sheet: &Sheet) -> Result<()>;
    fn get_sheet(&self, name: &str) -> Result<Option<Sheet>>;
    fn list_sheets(&self) -> Result<Vec<Sheet>>;
    fn set_sheet_columns(&self, name: &str, columns: &[ColumnDef]) -> Result<()>;
    /// Positional single-column edit. When the renamed column was
    /// delegatable, the delegatable grant follows the rename in the same
    /// transaction. Returns the resulting column list.
    fn rename_sheet_column(
        &self,
        name: &str,
        index: usize,
        column: &ColumnDef,
    ) -> Result<Vec<ColumnDef>>;
    fn set_sheet_delegatable(&self, name: &str, fields: &[String]) -> Result<()>;
    fn set_sheet_active(&self, name: &str, active: bool) -> Result<()>;
    fn set_sheet_display_order(&self, name: &str, display_order: i64) -> Result<()>;

    // Option registry operations
    fn list_option_sets(&self, sheet: &str) -> Result<Vec<OptionSet>>;
    fn get_option_set(&self, id: i64) -> Result<Option<OptionSet>>;
    fn upsert_option_set(&self, sheet: &str, field: &str, values: &[String]) -> Result<OptionSet>;
    fn set_option_set_values(&self, id: i64, values: &[String]) -> Result<()>;
    fn set_option_set_active(&self, id: i64, active: bool) -> Result<()>;
    fn delete_option_set(&self, id: i64) -> Result<bool>;

    // Row store operations
    fn list_rows(&self, sheet: &str) -> Result<Vec<Row>>;
    fn get_row(&self, id: i64) -> Result<Option<Row>>;
    fn create_row(&self, sheet: &str, data: &RowData, actor: &str) -> Result<Row>;
    /// Full replace of the row's data map (not a merge).
    fn update_row(&self, id: i64, data: &RowData, actor: &str) -> Result<()>;
    /// Read-merge-write in one transaction, applying only keys present in
    /// `allowed`. This is the write path delegation redemption uses.
    fn merge_row_fields(
        &self,
        id: i64,
        partial: &RowData,
        allowed: &[String],
        actor: &str,
    ) -> Result<()>;
    fn delete_row(&self, id: i64) -> Result<bool>;

    // Delegation token operations
    fn create_delegation(&self, token: &DelegationToken) -> Result<()>;
    fn get_delegation(&self, token: &str) -> Result<Option<DelegationToken>>;
    fn mark_delegation_used(&self, token: &str) -> Result<()>;
    fn list_row_delegations(&self, row_id: i64) -> Result<Vec<DelegationToken>>;
}
