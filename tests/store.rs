mod common;

use auditdesk::error::Error;
use auditdesk::options::options_for_columns;
use auditdesk::store::Store;
use auditdesk::types::{ColumnDef, ColumnKind};

use common::{make_sheet, open_store, row_data};

#[test]
fn schema_edits_never_mutate_stored_rows() {
    let (_dir, store) = open_store();
    let sheet = make_sheet(
        "findings",
        &[("Status", ColumnKind::Text), ("Owner", ColumnKind::Text)],
        &[],
    );
    store.create_sheet(&sheet).unwrap();

    let row = store
        .create_row(
            "findings",
            &row_data(&[("Status", "Open"), ("Owner", "alice")]),
            "tester",
        )
        .unwrap();

    // Remove one column, add another. Stored rows must be untouched.
    let new_columns = make_sheet("findings", &[("Severity", ColumnKind::Text)], &[]).columns;
    store.set_sheet_columns("findings", &new_columns).unwrap();

    let reread = store.get_row(row.id).unwrap().unwrap();
    assert_eq!(reread.data.get("Status").map(String::as_str), Some("Open"));
    assert_eq!(reread.data.get("Owner").map(String::as_str), Some("alice"));
    assert!(!reread.data.contains_key("Severity"));
}

#[test]
fn row_order_is_monotonic_and_survives_deletions() {
    let (_dir, store) = open_store();
    store
        .create_sheet(&make_sheet("findings", &[("A", ColumnKind::Text)], &[]))
        .unwrap();

    let r1 = store.create_row("findings", &row_data(&[]), "t").unwrap();
    let r2 = store.create_row("findings", &row_data(&[]), "t").unwrap();
    let r3 = store.create_row("findings", &row_data(&[]), "t").unwrap();
    assert_eq!((r1.row_order, r2.row_order, r3.row_order), (1, 2, 3));

    // Deleting a row never renumbers the others.
    assert!(store.delete_row(r2.id).unwrap());
    let remaining = store.list_rows("findings").unwrap();
    let orders: Vec<i64> = remaining.iter().map(|r| r.row_order).collect();
    assert_eq!(orders, vec![1, 3]);

    let r4 = store.create_row("findings", &row_data(&[]), "t").unwrap();
    assert_eq!(r4.row_order, 4);
}

#[test]
fn update_row_is_a_full_replace() {
    let (_dir, store) = open_store();
    store
        .create_sheet(&make_sheet("findings", &[("A", ColumnKind::Text)], &[]))
        .unwrap();

    let row = store
        .create_row("findings", &row_data(&[("A", "1"), ("B", "2")]), "t")
        .unwrap();

    store
        .update_row(row.id, &row_data(&[("A", "changed")]), "t")
        .unwrap();

    let reread = store.get_row(row.id).unwrap().unwrap();
    assert_eq!(reread.data.get("A").map(String::as_str), Some("changed"));
    assert!(!reread.data.contains_key("B"), "replace, not merge");
    assert_eq!(reread.updated_by.as_deref(), Some("t"));
}

#[test]
fn merge_row_fields_applies_only_allowed_keys() {
    let (_dir, store) = open_store();
    store
        .create_sheet(&make_sheet("findings", &[("A", ColumnKind::Text)], &[]))
        .unwrap();

    let row = store
        .create_row("findings", &row_data(&[("A", "1"), ("B", "2")]), "t")
        .unwrap();

    store
        .merge_row_fields(
            row.id,
            &row_data(&[("A", "edited"), ("B", "sneaky")]),
            &["A".to_string()],
            "ext",
        )
        .unwrap();

    let reread = store.get_row(row.id).unwrap().unwrap();
    assert_eq!(reread.data.get("A").map(String::as_str), Some("edited"));
    assert_eq!(reread.data.get("B").map(String::as_str), Some("2"));
}

#[test]
fn renaming_a_delegatable_column_carries_the_grant() {
    let (_dir, store) = open_store();
    store
        .create_sheet(&make_sheet(
            "findings",
            &[
                ("Status", ColumnKind::Select),
                ("Notes", ColumnKind::LongText),
            ],
            &["Status"],
        ))
        .unwrap();

    let columns = store
        .rename_sheet_column(
            "findings",
            0,
            &ColumnDef {
                name: "Situation".to_string(),
                kind: ColumnKind::Select,
            },
        )
        .unwrap();
    assert_eq!(columns[0].name, "Situation");

    let sheet = store.get_sheet("findings").unwrap().unwrap();
    assert_eq!(sheet.delegatable, vec!["Situation".to_string()]);
    assert_eq!(sheet.columns[1].name, "Notes");
}

#[test]
fn renamed_column_picks_up_option_sets_by_normalized_name() {
    let (_dir, store) = open_store();
    store
        .create_sheet(&make_sheet("findings", &[("Status", ColumnKind::Select)], &[]))
        .unwrap();

    // Configured against a name the schema does not carry yet.
    store
        .upsert_option_set("findings", "situação", &["Aberta".to_string()])
        .unwrap();

    let sheet = store.get_sheet("findings").unwrap().unwrap();
    let sets = store.list_option_sets("findings").unwrap();
    assert!(options_for_columns(&sheet, &sets).is_empty());

    store
        .rename_sheet_column(
            "findings",
            0,
            &ColumnDef {
                name: "Situacao".to_string(),
                kind: ColumnKind::Select,
            },
        )
        .unwrap();

    let sheet = store.get_sheet("findings").unwrap().unwrap();
    let resolved = options_for_columns(&sheet, &sets);
    assert_eq!(resolved.get("Situacao"), Some(&vec!["Aberta".to_string()]));
}

#[test]
fn rename_rejects_an_out_of_range_index() {
    let (_dir, store) = open_store();
    store
        .create_sheet(&make_sheet("findings", &[("A", ColumnKind::Text)], &[]))
        .unwrap();

    let err = store
        .rename_sheet_column(
            "findings",
            5,
            &ColumnDef {
                name: "B".to_string(),
                kind: ColumnKind::Text,
            },
        )
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
}

#[test]
fn duplicate_sheet_is_rejected() {
    let (_dir, store) = open_store();
    let sheet = make_sheet("findings", &[("A", ColumnKind::Text)], &[]);
    store.create_sheet(&sheet).unwrap();
    assert!(matches!(
        store.create_sheet(&sheet),
        Err(Error::AlreadyExists)
    ));
}

#[test]
fn option_sets_resolve_by_normalized_name() {
    let (_dir, store) = open_store();
    store
        .create_sheet(&make_sheet(
            "findings",
            &[("Situação", ColumnKind::Select)],
            &[],
        ))
        .unwrap();

    // Configured without the accent, as imports tend to spell it.
    store
        .upsert_option_set(
            "findings",
            "situacao",
            &["Aberta".to_string(), "Fechada".to_string()],
        )
        .unwrap();

    let sheet = store.get_sheet("findings").unwrap().unwrap();
    let sets = store.list_option_sets("findings").unwrap();
    let resolved = options_for_columns(&sheet, &sets);

    assert_eq!(
        resolved.get("Situação"),
        Some(&vec!["Aberta".to_string(), "Fechada".to_string()])
    );
}

#[test]
fn option_set_upsert_replaces_values() {
    let (_dir, store) = open_store();
    store
        .create_sheet(&make_sheet("findings", &[("S", ColumnKind::Select)], &[]))
        .unwrap();

    let first = store
        .upsert_option_set("findings", "S", &["a".to_string()])
        .unwrap();
    let second = store
        .upsert_option_set("findings", "S", &["b".to_string(), "c".to_string()])
        .unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.values, vec!["b".to_string(), "c".to_string()]);
}

#[test]
fn deactivated_sheet_keeps_its_rows() {
    let (_dir, store) = open_store();
    store
        .create_sheet(&make_sheet("findings", &[("A", ColumnKind::Text)], &[]))
        .unwrap();
    let row = store.create_row("findings", &row_data(&[]), "t").unwrap();

    store.set_sheet_active("findings", false).unwrap();

    assert!(!store.get_sheet("findings").unwrap().unwrap().active);
    assert!(store.get_row(row.id).unwrap().is_some());
}
