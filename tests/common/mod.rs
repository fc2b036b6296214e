use tempfile::TempDir;

use auditdesk::store::{SqliteStore, Store};
use auditdesk::types::{ColumnDef, ColumnKind, RowData, Sheet};

pub fn open_store() -> (TempDir, SqliteStore) {
    let temp_dir = TempDir::new().expect("create temp dir");
    let store = SqliteStore::new(temp_dir.path().join("test.db")).expect("open store");
    store.initialize().expect("initialize schema");
    (temp_dir, store)
}

pub fn make_sheet(name: &str, columns: &[(&str, ColumnKind)], delegatable: &[&str]) -> Sheet {
    Sheet {
        name: name.to_string(),
        columns: columns
            .iter()
            .map(|(n, kind)| ColumnDef {
                name: n.to_string(),
                kind: *kind,
            })
            .collect(),
        delegatable: delegatable.iter().map(|f| f.to_string()).collect(),
        display_order: 0,
        active: true,
    }
}

pub fn row_data(pairs: &[(&str, &str)]) -> RowData {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
