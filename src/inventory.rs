// 📦 Inventory data model - roster items, unknown scans, session snapshot
//
// The snapshot is the unit of state: replaced wholesale on import,
// mutated in place per scan, cleared on request.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// EQUIPMENT ITEM
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EquipmentItem {
    /// Canonical id: equipment cell uppercased, punctuation kept
    pub equipment_id: String,

    /// Imported cells keyed by column header (column order lives in `headers`)
    pub attributes: BTreeMap<String, String>,

    /// Times this item has been scanned
    pub count: u32,
}

impl EquipmentItem {
    pub fn new(equipment_id: impl Into<String>, attributes: BTreeMap<String, String>) -> Self {
        EquipmentItem {
            equipment_id: equipment_id.into(),
            attributes,
            count: 0,
        }
    }

    pub fn attribute(&self, column: &str) -> Option<&str> {
        self.attributes.get(column).map(String::as_str)
    }
}

// ============================================================================
// UNKNOWN SCAN
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnknownScan {
    pub raw_input: String,
    pub normalized_token: String,
    pub observed_at: DateTime<Utc>,
}

// ============================================================================
// COLUMN BINDINGS
// ============================================================================

/// Which imported columns carry identity and expected quantity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnBindings {
    pub equipment: String,
    pub quantity: Option<String>,
}

impl ColumnBindings {
    pub fn new(equipment: impl Into<String>, quantity: Option<String>) -> Self {
        ColumnBindings {
            equipment: equipment.into(),
            quantity,
        }
    }
}

// ============================================================================
// INVENTORY SNAPSHOT
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventorySnapshot {
    pub items: Vec<EquipmentItem>,
    pub unknown_scans: Vec<UnknownScan>,
    pub equipment_column_name: String,
    pub quantity_column_name: Option<String>,
    pub headers: Vec<String>,
}

impl InventorySnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Nothing worth keeping: no roster and no unknown scans
    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.unknown_scans.is_empty()
    }

    /// Roster ids in roster order (the matcher's input)
    pub fn equipment_ids(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|item| item.equipment_id.as_str())
    }

    pub fn columns(&self) -> ColumnBindings {
        ColumnBindings::new(
            self.equipment_column_name.clone(),
            self.quantity_column_name.clone(),
        )
    }

    /// Zero every count and empty the unknown-scan log, keep the roster
    pub fn reset_counts(&mut self) {
        for item in &mut self.items {
            item.count = 0;
        }
        self.unknown_scans.clear();
    }

    /// Drop everything, column bindings included
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Parse a persisted snapshot; corrupt input yields an empty snapshot
    pub fn from_json_or_default(json: &str) -> Self {
        match serde_json::from_str(json) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!(error = %e, "discarding unreadable inventory snapshot");
                Self::default()
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
