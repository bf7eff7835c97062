mod common;

use common::{TestWorkspace, ingest};
use csv_relational::{
    ConflictPolicy, IngestError, IngestOptions, TypeTag, introspect, ingest::ingest_path,
    store::Store,
};

#[test]
fn describe_reports_inferred_types_and_relationships() {
    let store = Store::open_in_memory().unwrap();
    ingest(
        &store,
        "payments",
        &["user_id", "amount"],
        vec![vec!["1", "9.99"], vec!["2", "3.50"]],
    );
    ingest(&store, "users", &["id", "name"], vec![vec!["1", "Ada"]]);
    ingest(&store, "user", &["id"], vec![vec!["1"]]);

    let info = introspect::describe_database(&store).unwrap();
    let payments = info.table("payments").expect("payments table");
    let tags = payments
        .columns
        .iter()
        .map(|c| (c.name.as_str(), c.type_tag))
        .collect::<Vec<_>>();
    assert_eq!(
        tags,
        vec![("user_id", TypeTag::Integer), ("amount", TypeTag::Decimal)]
    );

    let mut targets = info
        .relationships
        .iter()
        .filter(|r| r.source_table == "payments" && r.source_column == "user_id")
        .map(|r| r.target_table.as_str())
        .collect::<Vec<_>>();
    targets.sort_unstable();
    assert_eq!(targets, vec!["user", "users"]);
}

#[test]
fn same_name_ingest_twice_is_not_an_error() {
    let store = Store::open_in_memory().unwrap();
    ingest(&store, "t", &["id", "v"], vec![vec!["1", "a"]]);
    let second = ingest(&store, "t", &["id", "v"], vec![vec!["2", "b"]]);
    assert!(!second.created);
    assert_eq!(second.columns.len(), 2);
    assert_eq!(introspect::fetch_rows(&store, "t").unwrap().len(), 2);
}

#[test]
fn existing_declared_types_win_over_new_samples() {
    let store = Store::open_in_memory().unwrap();
    ingest(&store, "t", &["v"], vec![vec!["1"], vec!["2"]]);
    let second = ingest(&store, "t", &["v"], vec![vec!["hello"]]);
    assert_eq!(second.columns[0].type_tag, TypeTag::Integer);
}

#[test]
fn ingest_path_names_table_after_file() {
    let workspace = TestWorkspace::new();
    let path = workspace.write("sales report.2024.csv", "order id,total\n1,10.5\n2,7\n");
    let store = Store::open_in_memory().unwrap();
    let report = ingest_path(&store, &path, &IngestOptions::default()).unwrap();
    assert_eq!(report.table, "sales_report");
    assert_eq!(report.columns[0].name, "order_id");
    assert_eq!(report.columns[1].type_tag, TypeTag::Decimal);
    assert_eq!(report.rows_loaded, 2);
}

#[test]
fn ingest_path_reads_tsv_by_extension() {
    let workspace = TestWorkspace::new();
    let path = workspace.write("flags.tsv", "name\tactive\nx\tyes\ny\tNo\n");
    let store = Store::open_in_memory().unwrap();
    let report = ingest_path(&store, &path, &IngestOptions::default()).unwrap();
    assert_eq!(report.columns[1].type_tag, TypeTag::Boolean);
}

#[test]
fn empty_file_is_an_ingest_error() {
    let workspace = TestWorkspace::new();
    let path = workspace.write("empty.csv", "");
    let store = Store::open_in_memory().unwrap();
    let err = ingest_path(&store, &path, &IngestOptions::default()).unwrap_err();
    assert!(matches!(err, IngestError::Empty));
    assert!(store.table_names().unwrap().is_empty());
}

#[test]
fn ragged_rows_abort_the_whole_load() {
    let workspace = TestWorkspace::new();
    let path = workspace.write("ragged.csv", "a,b\n1,2\n3,4,5\n");
    let store = Store::open_in_memory().unwrap();
    let err = ingest_path(&store, &path, &IngestOptions::default()).unwrap_err();
    match err {
        IngestError::Arity {
            table,
            row,
            expected,
            found,
        } => {
            assert_eq!(table, "ragged");
            assert_eq!((row, expected, found), (2, 2, 3));
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert!(!store.table_exists("ragged").unwrap());
    // The store stays usable after the failure.
    ingest(&store, "after", &["x"], vec![vec!["1"]]);
}

#[test]
fn sampling_limits_classification_rows() {
    let store = Store::open_in_memory().unwrap();
    let options = IngestOptions {
        sample_rows: 1,
        ..IngestOptions::default()
    };
    let report = csv_relational::ingest::ingest(
        &store,
        &common::request("s", &["v"], vec![vec!["1"], vec!["abc"]]),
        &options,
    )
    .unwrap();
    assert_eq!(report.columns[0].type_tag, TypeTag::Boolean);
    assert_eq!(report.rows_loaded, 2);
}

#[test]
fn full_scan_is_the_default() {
    let store = Store::open_in_memory().unwrap();
    let mut rows = vec![vec!["1"]; 2500];
    rows.push(vec!["hello"]);
    let report = ingest(&store, "wide", &["v"], rows);
    assert_eq!(report.columns[0].type_tag, TypeTag::Text);
}

#[test]
fn failed_replace_restores_the_previous_table() {
    let store = Store::open_in_memory().unwrap();
    ingest(&store, "t", &["a"], vec![vec!["old1"], vec!["old2"]]);
    let options = IngestOptions {
        on_conflict: ConflictPolicy::Replace,
        ..IngestOptions::default()
    };
    let err = csv_relational::ingest::ingest(
        &store,
        &common::request("t", &["a", "b"], vec![vec!["1", "2"], vec!["3"]]),
        &options,
    )
    .unwrap_err();
    assert!(matches!(err, IngestError::Arity { row: 2, .. }));
    let rows = introspect::fetch_rows(&store, "t").unwrap();
    assert_eq!(rows.columns, vec!["a"]);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows.get(1, "a").map(|c| c.as_display()), Some("old2".to_string()));
}

#[test]
fn reject_policy_leaves_existing_rows_alone() {
    let store = Store::open_in_memory().unwrap();
    ingest(&store, "t", &["a"], vec![vec!["1"]]);
    let options = IngestOptions {
        on_conflict: ConflictPolicy::Reject,
        ..IngestOptions::default()
    };
    let err = csv_relational::ingest::ingest(
        &store,
        &common::request("t", &["a"], vec![vec!["2"]]),
        &options,
    )
    .unwrap_err();
    assert!(matches!(err, IngestError::Conflict { .. }));
    assert_eq!(introspect::fetch_rows(&store, "t").unwrap().len(), 1);
}
