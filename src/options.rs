//! Resolution of option sets against a sheet's column schema.
//!
//! Option sets are keyed by field name as it was typed when configured,
//! which over time diverges from the schema spelling (accents dropped,
//! casing changed, double spaces). Matching therefore goes through the
//! shared normalization instead of exact string equality; an exact match
//! requirement is how dropdowns end up "configured but invisible".

use std::collections::BTreeMap;

use crate::text::normalize_field_name;
use crate::types::{OptionSet, Sheet};

/// Resolves the active option sets of a sheet to its current columns,
/// returning schema column name -> allowed values. Option sets whose field
/// no longer matches any column are skipped, not errors.
pub fn options_for_columns(sheet: &Sheet, sets: &[OptionSet]) -> BTreeMap<String, Vec<String>> {
    let mut by_normalized: BTreeMap<String, &OptionSet> = BTreeMap::new();
    for set in sets.iter().filter(|s| s.active) {
        by_normalized.insert(normalize_field_name(&set.field), set);
    }

    let mut resolved = BTreeMap::new();
    for column in &sheet.columns {
        if let Some(set) = by_normalized.get(&normalize_field_name(&column.name)) {
            if !set.values.is_empty() {
                resolved.insert(column.name.clone(), set.values.clone());
            }
        }
    }
    resolved
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::types::{ColumnDef, ColumnKind};

    fn sheet_with_columns(names: &[&str]) -> Sheet {
        Sheet {
            name: "findings".to_string(),
            columns: names
                .iter()
                .map(|n| ColumnDef {
                    name: n.to_string(),
                    kind: ColumnKind::Select,
                })
                .collect(),
            delegatable: vec![],
            display_order: 0,
            active: true,
        }
    }

    fn option_set(field: &str, values: &[&str], active: bool) -> OptionSet {
        OptionSet {
            id: 1,
            sheet: "findings".to_string(),
            field: field.to_string(),
            values: values.iter().map(|v| v.to_string()).collect(),
            active,
            display_order: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn matches_despite_accents_and_case() {
        let sheet = sheet_with_columns(&["Situação"]);
        let sets = vec![option_set("situacao", &["Aberta", "Fechada"], true)];

        let resolved = options_for_columns(&sheet, &sets);
        assert_eq!(
            resolved.get("Situação").map(Vec::len),
            Some(2),
            "accent-insensitive match must resolve"
        );
    }

    #[test]
    fn inactive_sets_are_ignored() {
        let sheet = sheet_with_columns(&["Status"]);
        let sets = vec![option_set("Status", &["Done"], false)];

        assert!(options_for_columns(&sheet, &sets).is_empty());
    }

    #[test]
    fn stale_field_reference_is_skipped() {
        let sheet = sheet_with_columns(&["Status"]);
        let sets = vec![option_set("Removed Column", &["x"], true)];

        assert!(options_for_columns(&sheet, &sets).is_empty());
    }
}
