// 📊 Inventory Statistics - derived, read-only counters
//
// Nothing here mutates the snapshot; calling twice gives the same answer.

use crate::inventory::{EquipmentItem, InventorySnapshot};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryStats {
    /// Roster entries
    pub total_items: usize,

    /// Sum of all counts
    pub total_scanned: u64,

    /// Roster entries scanned at least once
    pub unique_scanned: usize,

    /// Entries in the unknown-scan log
    pub unknown_count: usize,
}

impl InventoryStats {
    pub fn summary(&self) -> String {
        format!(
            "{} items, {} scanned ({} unique), {} unknown",
            self.total_items, self.total_scanned, self.unique_scanned, self.unknown_count
        )
    }
}

pub fn compute_stats(snapshot: &InventorySnapshot) -> InventoryStats {
    InventoryStats {
        total_items: snapshot.items.len(),
        total_scanned: snapshot.items.iter().map(|item| u64::from(item.count)).sum(),
        unique_scanned: snapshot.items.iter().filter(|item| item.count > 0).count(),
        unknown_count: snapshot.unknown_scans.len(),
    }
}

// ============================================================================
// EXPECTED VS COUNTED
// ============================================================================

/// Expected quantity from the bound quantity column, 0 when missing or non-numeric
pub fn expected_quantity(item: &EquipmentItem, quantity_column: &str) -> i64 {
    item.attribute(quantity_column)
        .map(parse_leading_integer)
        .unwrap_or(0)
}

/// `count - expected`, or `None` when no quantity column is bound.
/// Saturates at the i64 bounds for absurd quantity cells.
pub fn difference(item: &EquipmentItem, quantity_column: Option<&str>) -> Option<i64> {
    quantity_column.map(|column| i64::from(item.count).saturating_sub(expected_quantity(item, column)))
}

/// Lenient integer parse: leading whitespace, optional sign, digits up to the
/// first non-digit. No digits means 0.
pub fn parse_leading_integer(value: &str) -> i64 {
    let trimmed = value.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let digits: &str = match rest.find(|c: char| !c.is_ascii_digit()) {
        Some(end) => &rest[..end],
        None => rest,
    };

    if digits.is_empty() {
        return 0;
    }

    // Saturate on absurdly long digit runs rather than failing
    let magnitude = digits.parse::<i64>().unwrap_or(i64::MAX);
    if negative {
        -magnitude
    } else {
        magnitude
    }
}

// ============================================================================
// TESTS
// ============================================================================
