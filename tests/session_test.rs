//! Session persistence tests
//!
//! CSV import → scans → reopen from SQLite → re-import, end to end

use inventory_count::{
    difference, load_import, ImportError, InventorySnapshot, ScanOutcome, Session, SnapshotStore,
};
use std::path::Path;
use tempfile::tempdir;

fn write_csv(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).expect("failed to write csv");
    path
}

fn open_session(db: &Path) -> Session {
    let store = SnapshotStore::open(db).expect("failed to open store");
    Session::open(store).expect("failed to open session")
}

/// Import, scan by 7-digit number, check difference
#[test]
fn test_scan_scenario_with_quantity() {
    let dir = tempdir().expect("Failed to create temp dir");
    let csv = write_csv(dir.path(), "list.csv", "Equipment#,Omschrijving,Voorraad\nIDT0001234,Boormachine,5\n");

    let mut session = open_session(&dir.path().join("inventory.db"));
    let (table, columns) = load_import(&csv, None, None).unwrap();
    session.import(&table, &columns).unwrap();

    let outcome = session.scan("0001234").unwrap().unwrap();
    match outcome {
        ScanOutcome::Matched { equipment_id, count, .. } => {
            assert_eq!(equipment_id, "IDT0001234");
            assert_eq!(count, 1);
        }
        other => panic!("expected match, got {:?}", other),
    }

    let item = &session.snapshot().items[0];
    assert_eq!(difference(item, Some("Voorraad")), Some(-4));
}

/// Counts and unknown scans survive a restart
#[test]
fn test_session_restored_after_reopen() {
    let dir = tempdir().expect("Failed to create temp dir");
    let db = dir.path().join("inventory.db");
    let csv = write_csv(dir.path(), "list.csv", "Equipment,Qty\nxy-99,1\nab-1,2\n");

    {
        let mut session = open_session(&db);
        let (table, columns) = load_import(&csv, None, None).unwrap();
        session.import(&table, &columns).unwrap();
        session.scan("https://eqin.centix.com/object/249bq-g0X/xy-99").unwrap();
        session.scan("onbekend").unwrap();
    }

    let session = open_session(&db);
    let snapshot = session.snapshot();

    assert_eq!(snapshot.items.len(), 2);
    assert_eq!(snapshot.items[0].equipment_id, "XY-99");
    assert_eq!(snapshot.items[0].count, 1);
    assert_eq!(snapshot.unknown_scans.len(), 1);
    assert_eq!(snapshot.unknown_scans[0].normalized_token, "ONBEKEND");
    assert_eq!(snapshot.equipment_column_name, "Equipment");
    assert_eq!(snapshot.quantity_column_name.as_deref(), Some("Qty"));
}

/// Re-importing a changed list keeps counts for identical ids only
#[test]
fn test_reimport_keeps_progress() {
    let dir = tempdir().expect("Failed to create temp dir");
    let db = dir.path().join("inventory.db");
    let first = write_csv(dir.path(), "v1.csv", "Equipment#\nABC-1\nDEF-2\n");
    let second = write_csv(dir.path(), "v2.csv", "Equipment#\nabc-1\nDEF2\nGHI-3\n");

    let mut session = open_session(&db);
    let (table, columns) = load_import(&first, None, None).unwrap();
    session.import(&table, &columns).unwrap();
    for _ in 0..3 {
        session.scan("abc1").unwrap();
    }
    session.scan("def2").unwrap();

    let (table, columns) = load_import(&second, None, None).unwrap();
    let summary = session.import(&table, &columns).unwrap();
    assert_eq!(summary.items_carried_over, 1);

    let counts: Vec<(String, u32)> = open_session(&db)
        .snapshot()
        .items
        .iter()
        .map(|item| (item.equipment_id.clone(), item.count))
        .collect();

    assert_eq!(
        counts,
        vec![
            ("ABC-1".to_string(), 3),
            ("DEF2".to_string(), 0),
            ("GHI-3".to_string(), 0),
        ]
    );
}

/// A bad file leaves the saved session untouched
#[test]
fn test_malformed_import_keeps_saved_state() {
    let dir = tempdir().expect("Failed to create temp dir");
    let db = dir.path().join("inventory.db");
    let good = write_csv(dir.path(), "good.csv", "Equipment#\nA-1\n");
    let no_column = write_csv(dir.path(), "bad.csv", "Serial,Location\nX,Y\n");
    let header_only = write_csv(dir.path(), "empty.csv", "Equipment#\n");

    let mut session = open_session(&db);
    let (table, columns) = load_import(&good, None, None).unwrap();
    session.import(&table, &columns).unwrap();
    session.scan("A1").unwrap();

    let err = load_import(&no_column, None, None).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ImportError>(),
        Some(ImportError::EquipmentColumnNotFound { .. })
    ));

    let err = load_import(&header_only, None, None).unwrap_err();
    assert!(matches!(err.downcast_ref::<ImportError>(), Some(ImportError::TooFewRows)));

    let snapshot = open_session(&db).snapshot().clone();
    assert_eq!(snapshot.items.len(), 1);
    assert_eq!(snapshot.items[0].count, 1);
}

/// Explicit column choice when detection fails
#[test]
fn test_import_with_column_override() {
    let dir = tempdir().expect("Failed to create temp dir");
    let csv = write_csv(dir.path(), "list.csv", "Serial,Location\nq-1,Hal 1\n,Hal 2\n");

    let mut session = Session::new();
    let (table, columns) = load_import(&csv, Some("serial"), None).unwrap();
    assert_eq!(table.rows.len(), 1);

    session.import(&table, &columns).unwrap();
    assert_eq!(session.snapshot().items[0].equipment_id, "Q-1");
    assert_eq!(session.snapshot().equipment_column_name, "Serial");
    assert_eq!(session.snapshot().quantity_column_name, None);
}

/// Clear removes the persisted record too
#[test]
fn test_clear_removes_saved_state() {
    let dir = tempdir().expect("Failed to create temp dir");
    let db = dir.path().join("inventory.db");
    let csv = write_csv(dir.path(), "list.csv", "Equipment#,Voorraad\nA-1,1\n");

    let mut session = open_session(&db);
    let (table, columns) = load_import(&csv, None, None).unwrap();
    session.import(&table, &columns).unwrap();
    session.clear().unwrap();

    assert_eq!(open_session(&db).snapshot(), &InventorySnapshot::new());
}

/// Reset survives a restart, even with only unknown scans recorded
#[test]
fn test_reset_then_reopen() {
    let dir = tempdir().expect("Failed to create temp dir");
    let db = dir.path().join("inventory.db");

    {
        let mut session = open_session(&db);
        session.scan("zzz").unwrap();
        assert_eq!(session.stats().unknown_count, 1);
        session.reset_counts().unwrap();
        assert_eq!(session.stats().unknown_count, 0);
    }

    assert_eq!(open_session(&db).stats().unknown_count, 0);

    let csv = write_csv(dir.path(), "list.csv", "Equipment#\nA-1\n");
    {
        let mut session = open_session(&db);
        let (table, columns) = load_import(&csv, None, None).unwrap();
        session.import(&table, &columns).unwrap();
        session.scan("A1").unwrap();
        session.scan("nope").unwrap();
        session.reset_counts().unwrap();
    }

    let session = open_session(&db);
    assert_eq!(session.snapshot().items.len(), 1);
    assert_eq!(session.snapshot().items[0].count, 0);
    assert_eq!(session.stats().unknown_count, 0);
}
