// ⚖️ Reconciliation Engine - merge a fresh import with the running session
//
// Every import replaces the roster, headers and column bindings. Counts
// survive when the new item's id equals a previous item's id after
// uppercasing (strict rule, punctuation matters). Unknown scans carry over.
//
// The forgiving scan rule lives in matcher::scan_key. Keeping the strict rule
// here means a reformatted id ("ABC-1" → "ABC1") starts again from zero.

use crate::error::ImportError;
use crate::inventory::{ColumnBindings, EquipmentItem, InventorySnapshot};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

// ============================================================================
// IMPORTED TABLE
// ============================================================================

/// Plain tabular input: ordered headers plus rows of header → cell
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportedTable {
    pub headers: Vec<String>,
    pub rows: Vec<BTreeMap<String, String>>,
}

impl ImportedTable {
    pub fn new(headers: Vec<String>, rows: Vec<BTreeMap<String, String>>) -> Self {
        ImportedTable { headers, rows }
    }

    /// Header spelled exactly as given
    pub fn has_header(&self, column: &str) -> bool {
        self.headers.iter().any(|h| h == column)
    }

    /// Keep only rows with a non-blank cell in `column`
    pub fn retain_identified(&mut self, column: &str) {
        self.rows.retain(|row| has_identifier(row, column));
    }
}

fn has_identifier(row: &BTreeMap<String, String>, column: &str) -> bool {
    row.get(column).map(|v| !v.trim().is_empty()).unwrap_or(false)
}

/// Comparison key for count migration: the id uppercased, nothing stripped
pub fn migration_key(equipment_id: &str) -> String {
    equipment_id.to_uppercase()
}

// ============================================================================
// RECONCILE
// ============================================================================

/// Build the snapshot that replaces `previous` after an import.
///
/// `previous` is only read; on error the caller keeps it as is.
pub fn reconcile(
    previous: &InventorySnapshot,
    table: &ImportedTable,
    columns: &ColumnBindings,
) -> Result<InventorySnapshot, ImportError> {
    if !table.has_header(&columns.equipment) {
        return Err(ImportError::UnknownColumn(columns.equipment.clone()));
    }
    if let Some(quantity) = &columns.quantity {
        if !table.has_header(quantity) {
            return Err(ImportError::UnknownColumn(quantity.clone()));
        }
    }

    // Previous counts by strict key; on duplicate ids the last one wins
    let carried: HashMap<String, u32> = previous
        .items
        .iter()
        .map(|item| (migration_key(&item.equipment_id), item.count))
        .collect();

    let items: Vec<EquipmentItem> = table
        .rows
        .iter()
        .filter(|row| has_identifier(row, &columns.equipment))
        .map(|row| {
            let raw_id = row.get(&columns.equipment).map(String::as_str).unwrap_or_default();
            let mut item = EquipmentItem::new(raw_id.to_uppercase(), row.clone());
            item.count = carried
                .get(&migration_key(&item.equipment_id))
                .copied()
                .unwrap_or(0);
            item
        })
        .collect();

    if items.is_empty() {
        return Err(ImportError::NoUsableRows {
            column: columns.equipment.clone(),
        });
    }

    Ok(InventorySnapshot {
        items,
        unknown_scans: previous.unknown_scans.clone(),
        equipment_column_name: columns.equipment.clone(),
        quantity_column_name: columns.quantity.clone(),
        headers: table.headers.clone(),
    })
}

// ============================================================================
// IMPORT SUMMARY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub items_imported: usize,
    pub items_carried_over: usize,
    pub count_carried_over: u64,
    pub unknown_scans_kept: usize,
    pub columns: ColumnBindings,
}

impl ImportSummary {
    /// Describe what `reconcile` kept when going from `previous` to `current`
    pub fn between(previous: &InventorySnapshot, current: &InventorySnapshot) -> Self {
        let previous_keys: HashSet<String> = previous
            .items
            .iter()
            .map(|item| migration_key(&item.equipment_id))
            .collect();

        let carried: Vec<&EquipmentItem> = current
            .items
            .iter()
            .filter(|item| previous_keys.contains(&migration_key(&item.equipment_id)))
            .collect();

        ImportSummary {
            items_imported: current.items.len(),
            items_carried_over: carried.len(),
            count_carried_over: carried.iter().map(|item| u64::from(item.count)).sum(),
            unknown_scans_kept: current.unknown_scans.len(),
            columns: current.columns(),
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "Imported {} items using column \"{}\"{}; {} items kept their count ({} scans), {} unknown scans kept",
            self.items_imported,
            self.columns.equipment,
            self.columns
                .quantity
                .as_ref()
                .map(|q| format!(" (quantity: \"{}\")", q))
                .unwrap_or_default(),
            self.items_carried_over,
            self.count_carried_over,
            self.unknown_scans_kept
        )
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::UnknownScan;
    use chrono::Utc;

    fn create_test_table(ids: &[&str]) -> ImportedTable {
        let headers = vec!["Equipment#".to_string(), "Voorraad".to_string()];
        let rows = ids
            .iter()
            .map(|id| {
                let mut row = BTreeMap::new();
                row.insert("Equipment#".to_string(), id.to_string());
                row.insert("Voorraad".to_string(), "1".to_string());
                row
            })
            .collect();
        ImportedTable::new(headers, rows)
    }

    fn columns() -> ColumnBindings {
        ColumnBindings::new("Equipment#", Some("Voorraad".to_string()))
    }

    fn snapshot_with_counts(entries: &[(&str, u32)]) -> InventorySnapshot {
        let mut snapshot = InventorySnapshot::new();
        for (id, count) in entries {
            let mut item = EquipmentItem::new(*id, BTreeMap::new());
            item.count = *count;
            snapshot.items.push(item);
        }
        snapshot
    }

    #[test]
    fn test_first_import_starts_at_zero() {
        let table = create_test_table(&["ab-1", "Cd-2"]);
        let snapshot = reconcile(&InventorySnapshot::new(), &table, &columns()).unwrap();

        assert_eq!(snapshot.items.len(), 2);
        assert_eq!(snapshot.items[0].equipment_id, "AB-1");
        assert_eq!(snapshot.items[1].equipment_id, "CD-2");
        assert!(snapshot.items.iter().all(|item| item.count == 0));
        assert_eq!(snapshot.equipment_column_name, "Equipment#");
        assert_eq!(snapshot.quantity_column_name.as_deref(), Some("Voorraad"));
        assert_eq!(snapshot.headers, vec!["Equipment#", "Voorraad"]);
    }

    #[test]
    fn test_attributes_keep_equipment_cell() {
        let table = create_test_table(&["ab-1"]);
        let snapshot = reconcile(&InventorySnapshot::new(), &table, &columns()).unwrap();

        assert_eq!(snapshot.items[0].attribute("Equipment#"), Some("ab-1"));
        assert_eq!(snapshot.items[0].attribute("Voorraad"), Some("1"));
    }

    #[test]
    fn test_count_carried_over_case_insensitive() {
        let previous = snapshot_with_counts(&[("ABC-1", 3)]);
        let table = create_test_table(&["abc-1"]);

        let snapshot = reconcile(&previous, &table, &columns()).unwrap();

        assert_eq!(snapshot.items[0].equipment_id, "ABC-1");
        assert_eq!(snapshot.items[0].count, 3);
    }

    #[test]
    fn test_punctuation_change_resets_count() {
        let previous = snapshot_with_counts(&[("ABC-1", 3)]);
        let table = create_test_table(&["ABC1"]);

        let snapshot = reconcile(&previous, &table, &columns()).unwrap();

        assert_eq!(snapshot.items[0].equipment_id, "ABC1");
        assert_eq!(snapshot.items[0].count, 0);
    }

    #[test]
    fn test_dropped_items_disappear() {
        let previous = snapshot_with_counts(&[("A-1", 2), ("B-2", 5)]);
        let table = create_test_table(&["b-2", "c-3"]);

        let snapshot = reconcile(&previous, &table, &columns()).unwrap();
        let counts: Vec<(&str, u32)> = snapshot
            .items
            .iter()
            .map(|item| (item.equipment_id.as_str(), item.count))
            .collect();

        assert_eq!(counts, vec![("B-2", 5), ("C-3", 0)]);
    }

    #[test]
    fn test_duplicate_ids_are_kept() {
        let table = create_test_table(&["X-1", "x-1"]);
        let previous = snapshot_with_counts(&[("X-1", 4)]);

        let snapshot = reconcile(&previous, &table, &columns()).unwrap();

        assert_eq!(snapshot.items.len(), 2);
        assert!(snapshot.items.iter().all(|item| item.count == 4));
    }

    #[test]
    fn test_unknown_scans_survive_reimport() {
        let mut previous = snapshot_with_counts(&[("A-1", 1)]);
        previous.unknown_scans.push(UnknownScan {
            raw_input: "??".to_string(),
            normalized_token: "".to_string(),
            observed_at: Utc::now(),
        });

        let snapshot = reconcile(&previous, &create_test_table(&["A-1"]), &columns()).unwrap();
        assert_eq!(snapshot.unknown_scans, previous.unknown_scans);
    }

    #[test]
    fn test_repeated_reimport_keeps_progress() {
        let table = create_test_table(&["A-1", "B-2"]);
        let mut snapshot = reconcile(&InventorySnapshot::new(), &table, &columns()).unwrap();
        snapshot.items[1].count = 7;

        for _ in 0..3 {
            snapshot = reconcile(&snapshot, &table, &columns()).unwrap();
        }

        assert_eq!(snapshot.items[0].count, 0);
        assert_eq!(snapshot.items[1].count, 7);
    }

    #[test]
    fn test_rows_without_identifier_are_skipped() {
        let table = create_test_table(&["A-1", "", "   "]);
        let snapshot = reconcile(&InventorySnapshot::new(), &table, &columns()).unwrap();
        assert_eq!(snapshot.items.len(), 1);
    }

    #[test]
    fn test_no_usable_rows_is_rejected() {
        let table = create_test_table(&["", " "]);
        let err = reconcile(&InventorySnapshot::new(), &table, &columns()).unwrap_err();

        assert_eq!(err, ImportError::NoUsableRows { column: "Equipment#".to_string() });
    }

    #[test]
    fn test_unknown_columns_are_rejected() {
        let table = create_test_table(&["A-1"]);

        let err = reconcile(&InventorySnapshot::new(), &table, &ColumnBindings::new("Serial", None))
            .unwrap_err();
        assert_eq!(err, ImportError::UnknownColumn("Serial".to_string()));

        let err = reconcile(
            &InventorySnapshot::new(),
            &table,
            &ColumnBindings::new("Equipment#", Some("Qty".to_string())),
        )
        .unwrap_err();
        assert_eq!(err, ImportError::UnknownColumn("Qty".to_string()));
    }

    #[test]
    fn test_bindings_are_replaced() {
        let mut previous = snapshot_with_counts(&[("A-1", 1)]);
        previous.quantity_column_name = Some("Old".to_string());

        let snapshot = reconcile(
            &previous,
            &create_test_table(&["A-1"]),
            &ColumnBindings::new("Equipment#", None),
        )
        .unwrap();

        assert_eq!(snapshot.quantity_column_name, None);
    }

    #[test]
    fn test_import_summary() {
        let previous = snapshot_with_counts(&[("A-1", 2), ("B-2", 3)]);
        let current = reconcile(&previous, &create_test_table(&["a-1", "B2", "C-3"]), &columns()).unwrap();

        let summary = ImportSummary::between(&previous, &current);

        assert_eq!(summary.items_imported, 3);
        assert_eq!(summary.items_carried_over, 1);
        assert_eq!(summary.count_carried_over, 2);
        assert!(summary.summary().contains("Imported 3 items"));
    }

    #[test]
    fn test_retain_identified() {
        let mut table = create_test_table(&["A-1", "", "B-2"]);
        table.retain_identified("Equipment#");
        assert_eq!(table.rows.len(), 2);
    }
}
