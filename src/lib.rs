// Inventory Count - Core Library
// Scan matching and inventory reconciliation, shared by CLI, TUI, API server and tests

pub mod normalizer;
pub mod matcher;
pub mod inventory;
pub mod reconciliation;
pub mod counter;
pub mod stats;
pub mod import;
pub mod export;
pub mod store;
pub mod session;
pub mod config;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use normalizer::{normalize, strip_and_upper, NormalizationResult, URL_PREFIX};
pub use matcher::{find_duplicate_ids, find_match, scan_key, DuplicateGroup, MatchRule, RosterMatch};
pub use inventory::{ColumnBindings, EquipmentItem, InventorySnapshot, UnknownScan};
pub use reconciliation::{migration_key, reconcile, ImportSummary, ImportedTable};
pub use counter::{record_scan, record_scan_at, ScanOutcome};
pub use stats::{compute_stats, difference, expected_quantity, parse_leading_integer, InventoryStats};
pub use import::{detect_columns, load_import, read_table, read_table_from_path, resolve_columns, DetectedColumns};
pub use export::{
    export_to_dir, inventory_rows, unknown_scan_rows, write_inventory_csv, write_unknown_scans_csv,
    ExportTable,
};
pub use store::SnapshotStore;
pub use session::{Session, SharedSession};
pub use config::Config;
pub use error::ImportError;
