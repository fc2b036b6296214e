use std::collections::HashSet;

use crate::server::response::ApiError;
use crate::types::ColumnDef;

const MAX_SHEET_NAME_LEN: usize = 100;
const MAX_COLUMN_NAME_LEN: usize = 200;

pub fn validate_sheet_name(name: &str) -> Result<(), ApiError> {
    if name.trim().is_empty() {
        return Err(ApiError::bad_request("Sheet name cannot be empty"));
    }
    if name.len() > MAX_SHEET_NAME_LEN {
        return Err(ApiError::bad_request(format!(
            "Sheet name cannot exceed {MAX_SHEET_NAME_LEN} characters"
        )));
    }
    if name.contains('/') || name.contains('\\') {
        return Err(ApiError::bad_request("Sheet name cannot contain slashes"));
    }
    Ok(())
}

/// Column name uniqueness is a write-time precondition, not a storage
/// invariant: the registry stores whatever it is handed, so the HTTP layer
/// is where duplicates must be rejected.
pub fn validate_columns(columns: &[ColumnDef]) -> Result<(), ApiError> {
    if columns.is_empty() {
        return Err(ApiError::bad_request("At least one column is required"));
    }

    let mut seen = HashSet::new();
    for column in columns {
        validate_field_name(&column.name)?;
        if !seen.insert(column.name.as_str()) {
            return Err(ApiError::bad_request(format!(
                "Duplicate column name: {}",
                column.name
            )));
        }
    }
    Ok(())
}

pub fn validate_field_name(name: &str) -> Result<(), ApiError> {
    if name.trim().is_empty() {
        return Err(ApiError::bad_request("Field name cannot be empty"));
    }
    if name.len() > MAX_COLUMN_NAME_LEN {
        return Err(ApiError::bad_request(format!(
            "Field name cannot exceed {MAX_COLUMN_NAME_LEN} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ColumnKind;

    fn col(name: &str) -> ColumnDef {
        ColumnDef {
            name: name.to_string(),
            kind: ColumnKind::Text,
        }
    }

    #[test]
    fn rejects_duplicate_columns() {
        assert!(validate_columns(&[col("Status"), col("Status")]).is_err());
    }

    #[test]
    fn accepts_accented_names() {
        assert!(validate_columns(&[col("Situação"), col("Recomendação")]).is_ok());
    }

    #[test]
    fn rejects_empty_sheet_name() {
        assert!(validate_sheet_name("  ").is_err());
    }
}
