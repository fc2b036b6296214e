use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row as SqlRow, params};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::Store;
use super::schema::SCHEMA;
use crate::error::{Error, Result};
use crate::text::normalize_field_name;
use crate::types::*;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns a guard to the underlying database connection.
    /// This allows consuming applications to execute custom SQL.
    pub fn connection(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn()
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Handle SQLite's default datetime format: "YYYY-MM-DD HH:MM:SS"
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            tracing::error!("Invalid datetime in database: '{}' - {}", s, e);
            Utc::now()
        })
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

/// Stored JSON documents are tolerated, not trusted: a corrupt value logs
/// and reads as empty instead of poisoning the whole query.
fn parse_json<T: DeserializeOwned + Default>(s: &str) -> T {
    serde_json::from_str(s).unwrap_or_else(|e| {
        tracing::error!("Invalid json in database: '{}' - {}", s, e);
        T::default()
    })
}

fn to_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(Error::from)
}

fn map_sheet(row: &SqlRow<'_>) -> rusqlite::Result<Sheet> {
    Ok(Sheet {
        name: row.get(0)?,
        columns: parse_json(&row.get::<_, String>(1)?),
        delegatable: parse_json(&row.get::<_, String>(2)?),
        display_order: row.get(3)?,
        active: row.get(4)?,
    })
}

fn map_row(row: &SqlRow<'_>) -> rusqlite::Result<Row> {
    Ok(Row {
        id: row.get(0)?,
        sheet: row.get(1)?,
        data: parse_json(&row.get::<_, String>(2)?),
        row_order: row.get(3)?,
        created_at: parse_datetime(&row.get::<_, String>(4)?),
        updated_at: parse_datetime(&row.get::<_, String>(5)?),
        created_by: row.get(6)?,
        updated_by: row.get(7)?,
    })
}

fn map_option_set(row: &SqlRow<'_>) -> rusqlite::Result<OptionSet> {
    Ok(OptionSet {
        id: row.get(0)?,
        sheet: row.get(1)?,
        field: row.get(2)?,
        values: parse_json(&row.get::<_, String>(3)?),
        active: row.get(4)?,
        display_order: row.get(5)?,
        created_at: parse_datetime(&row.get::<_, String>(6)?),
        updated_at: parse_datetime(&row.get::<_, String>(7)?),
    })
}

fn map_delegation(row: &SqlRow<'_>) -> rusqlite::Result<DelegationToken> {
    Ok(DelegationToken {
        token: row.get(0)?,
        sheet: row.get(1)?,
        row_id: row.get(2)?,
        expires_at: parse_datetime(&row.get::<_, String>(3)?),
        issued_by: row.get(4)?,
        created_at: parse_datetime(&row.get::<_, String>(5)?),
        used_at: row
            .get::<_, Option<String>>(6)?
            .map(|s| parse_datetime(&s)),
    })
}

const SHEET_COLS: &str = "name, columns, delegatable, display_order, active";
const ROW_COLS: &str = "id, sheet, data, row_order, created_at, updated_at, created_by, updated_by";
const OPTION_SET_COLS: &str =
    "id, sheet, field, options, active, display_order, created_at, updated_at";
const DELEGATION_COLS: &str =
    "token, sheet, row_id, expires_at, issued_by, created_at, used_at";

impl Store for SqliteStore {
    fn initialize(&self) -> Result<()> {
        self.conn().execute_batch(SCHEMA)?;
        Ok(())
    }

    // Schema registry operations

    fn create_sheet(&self, sheet: &Sheet) -> Result<()> {
        let rows = self.conn().execute(
            "INSERT OR IGNORE INTO sheets (name, columns, delegatable, display_order, active)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                sheet.name,
                to_json(&sheet.columns)?,
                to_json(&sheet.delegatable)?,
                sheet.display_order,
                sheet.active,
            ],
        )?;

        if rows == 0 {
            return Err(Error::AlreadyExists);
        }
        Ok(())
    }

    fn get_sheet(&self, name: &str) -> Result<Option<Sheet>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {SHEET_COLS} FROM sheets WHERE name = ?1"),
            params![name],
            map_sheet,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_sheets(&self) -> Result<Vec<Sheet>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {SHEET_COLS} FROM sheets ORDER BY display_order, name"
        ))?;

        let rows = stmt.query_map([], map_sheet)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn set_sheet_columns(&self, name: &str, columns: &[ColumnDef]) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE sheets SET columns = ?1 WHERE name = ?2",
            params![to_json(&columns)?, name],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn rename_sheet_column(
        &self,
        name: &str,
        index: usize,
        column: &ColumnDef,
    ) -> Result<Vec<ColumnDef>> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let stored: Option<(String, String)> = tx
            .query_row(
                "SELECT columns, delegatable FROM sheets WHERE name = ?1",
                params![name],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let Some((columns_json, delegatable_json)) = stored else {
            return Err(Error::NotFound);
        };

        let mut columns: Vec<ColumnDef> = parse_json(&columns_json);
        let Some(slot) = columns.get_mut(index) else {
            return Err(Error::Validation("column index out of range".to_string()));
        };
        let old_name = std::mem::replace(slot, column.clone()).name;

        tx.execute(
            "UPDATE sheets SET columns = ?1 WHERE name = ?2",
            params![to_json(&columns)?, name],
        )?;

        // Rewrite the grant list so an external link scoped to the old name
        // keeps working under the new one.
        if old_name != column.name {
            let old_normalized = normalize_field_name(&old_name);
            let delegatable: Vec<String> = parse_json(&delegatable_json);
            if delegatable
                .iter()
                .any(|f| normalize_field_name(f) == old_normalized)
            {
                let renamed: Vec<String> = delegatable
                    .into_iter()
                    .map(|f| {
                        if normalize_field_name(&f) == old_normalized {
                            column.name.clone()
                        } else {
                            f
                        }
                    })
                    .collect();
                tx.execute(
                    "UPDATE sheets SET delegatable = ?1 WHERE name = ?2",
                    params![to_json(&renamed)?, name],
                )?;
            }
        }

        tx.commit()?;
        Ok(columns)
    }

    fn set_sheet_delegatable(&self, name: &str, fields: &[String]) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE sheets SET delegatable = ?1 WHERE name = ?2",
            params![to_json(&fields)?, name],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn set_sheet_active(&self, name: &str, active: bool) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE sheets SET active = ?1 WHERE name = ?2",
            params![active, name],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn set_sheet_display_order(&self, name: &str, display_order: i64) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE sheets SET display_order = ?1 WHERE name = ?2",
            params![display_order, name],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    // Option registry operations

    fn list_option_sets(&self, sheet: &str) -> Result<Vec<OptionSet>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {OPTION_SET_COLS} FROM option_sets
             WHERE sheet = ?1 ORDER BY display_order, id"
        ))?;

        let rows = stmt.query_map(params![sheet], map_option_set)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn get_option_set(&self, id: i64) -> Result<Option<OptionSet>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {OPTION_SET_COLS} FROM option_sets WHERE id = ?1"),
            params![id],
            map_option_set,
        )
        .optional()
        .map_err(Error::from)
    }

    fn upsert_option_set(&self, sheet: &str, field: &str, values: &[String]) -> Result<OptionSet> {
        let now = format_datetime(&Utc::now());
        let conn = self.conn();
        conn.execute(
            "INSERT INTO option_sets (sheet, field, options, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)
             ON CONFLICT(sheet, field) DO UPDATE SET
                 options = excluded.options,
                 updated_at = excluded.updated_at",
            params![sheet, field, to_json(&values)?, now],
        )?;

        conn.query_row(
            &format!("SELECT {OPTION_SET_COLS} FROM option_sets WHERE sheet = ?1 AND field = ?2"),
            params![sheet, field],
            map_option_set,
        )
        .map_err(Error::from)
    }

    fn set_option_set_values(&self, id: i64, values: &[String]) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE option_sets SET options = ?1, updated_at = ?2 WHERE id = ?3",
            params![to_json(&values)?, format_datetime(&Utc::now()), id],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn set_option_set_active(&self, id: i64, active: bool) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE option_sets SET active = ?1, updated_at = ?2 WHERE id = ?3",
            params![active, format_datetime(&Utc::now()), id],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn delete_option_set(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM option_sets WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    // Row store operations

    fn list_rows(&self, sheet: &str) -> Result<Vec<Row>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {ROW_COLS} FROM rows WHERE sheet = ?1 ORDER BY row_order"
        ))?;

        let rows = stmt.query_map(params![sheet], map_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn get_row(&self, id: i64) -> Result<Option<Row>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {ROW_COLS} FROM rows WHERE id = ?1"),
            params![id],
            map_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn create_row(&self, sheet: &str, data: &RowData, actor: &str) -> Result<Row> {
        let now = Utc::now();
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        // row_order is max+1 within the sheet, never reused after deletions,
        // so external references (delegation links) stay stable.
        let max_order: i64 = tx.query_row(
            "SELECT COALESCE(MAX(row_order), 0) FROM rows WHERE sheet = ?1",
            params![sheet],
            |row| row.get(0),
        )?;

        tx.execute(
            "INSERT INTO rows (sheet, data, row_order, created_at, updated_at, created_by, updated_by)
             VALUES (?1, ?2, ?3, ?4, ?4, ?5, ?5)",
            params![
                sheet,
                to_json(data)?,
                max_order + 1,
                format_datetime(&now),
                actor,
            ],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        Ok(Row {
            id,
            sheet: sheet.to_string(),
            data: data.clone(),
            row_order: max_order + 1,
            created_at: now,
            updated_at: now,
            created_by: Some(actor.to_string()),
            updated_by: Some(actor.to_string()),
        })
    }

    fn update_row(&self, id: i64, data: &RowData, actor: &str) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE rows SET data = ?1, updated_at = ?2, updated_by = ?3 WHERE id = ?4",
            params![to_json(data)?, format_datetime(&Utc::now()), actor, id],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn merge_row_fields(
        &self,
        id: i64,
        partial: &RowData,
        allowed: &[String],
        actor: &str,
    ) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        // Read-merge-write inside one transaction so a concurrent full-row
        // update cannot slip between the read and the write.
        let stored: Option<String> = tx
            .query_row("SELECT data FROM rows WHERE id = ?1", params![id], |row| {
                row.get(0)
            })
            .optional()?;

        let Some(stored) = stored else {
            return Err(Error::NotFound);
        };

        let mut data: RowData = parse_json(&stored);
        for field in allowed {
            if let Some(value) = partial.get(field) {
                data.insert(field.clone(), value.clone());
            }
        }

        tx.execute(
            "UPDATE rows SET data = ?1, updated_at = ?2, updated_by = ?3 WHERE id = ?4",
            params![to_json(&data)?, format_datetime(&Utc::now()), actor, id],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn delete_row(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM rows WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    // Delegation token operations

    fn create_delegation(&self, token: &DelegationToken) -> Result<()> {
        self.conn().execute(
            "INSERT INTO delegation_tokens (token, sheet, row_id, expires_at, issued_by, created_at, used_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                token.token,
                token.sheet,
                token.row_id,
                format_datetime(&token.expires_at),
                token.issued_by,
                format_datetime(&token.created_at),
                token.used_at.as_ref().map(format_datetime),
            ],
        )?;
        Ok(())
    }

    fn get_delegation(&self, token: &str) -> Result<Option<DelegationToken>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {DELEGATION_COLS} FROM delegation_tokens WHERE token = ?1"),
            params![token],
            map_delegation,
        )
        .optional()
        .map_err(Error::from)
    }

    fn mark_delegation_used(&self, token: &str) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE delegation_tokens SET used_at = ?1 WHERE token = ?2",
            params![format_datetime(&Utc::now()), token],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn list_row_delegations(&self, row_id: i64) -> Result<Vec<DelegationToken>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {DELEGATION_COLS} FROM delegation_tokens
             WHERE row_id = ?1 ORDER BY created_at DESC"
        ))?;

        let rows = stmt.query_map(params![row_id], map_delegation)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }
}
