// 🔢 Scan Counter - apply one scan event to the snapshot
//
// normalize → match → increment (every item sharing the id) or log unknown.

use crate::inventory::{InventorySnapshot, UnknownScan};
use crate::matcher::{find_match, MatchRule};
use crate::normalizer::normalize;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// SCAN OUTCOME
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScanOutcome {
    /// Scan resolved to a roster item
    Matched {
        equipment_id: String,
        /// Count of the first item with this id, after the increment
        count: u32,
        rule: MatchRule,
    },

    /// No roster item matched; an unknown-scan entry was appended
    Unknown { normalized: String },
}

impl ScanOutcome {
    pub fn is_matched(&self) -> bool {
        matches!(self, ScanOutcome::Matched { .. })
    }

    pub fn message(&self) -> String {
        match self {
            ScanOutcome::Matched { equipment_id, count, .. } => {
                format!("✓ Found {}: counted {}", equipment_id, count)
            }
            ScanOutcome::Unknown { normalized } => format!("⚠ Unknown number: {}", normalized),
        }
    }
}

// ============================================================================
// RECORD SCAN
// ============================================================================

/// Record one scan observed now
pub fn record_scan(snapshot: &mut InventorySnapshot, raw_input: &str) -> ScanOutcome {
    record_scan_at(snapshot, raw_input, Utc::now())
}

/// Record one scan with an explicit observation time
pub fn record_scan_at(
    snapshot: &mut InventorySnapshot,
    raw_input: &str,
    observed_at: DateTime<Utc>,
) -> ScanOutcome {
    let token = normalize(raw_input);

    let matched = find_match(&token.normalized, snapshot.equipment_ids())
        .map(|m| (m.equipment_id.to_string(), m.rule));

    match matched {
        Some((equipment_id, rule)) => {
            let mut primary_count = None;

            for item in snapshot
                .items
                .iter_mut()
                .filter(|item| item.equipment_id == equipment_id)
            {
                item.count = item.count.saturating_add(1);
                primary_count.get_or_insert(item.count);
            }

            let count = primary_count.unwrap_or_default();
            tracing::debug!(raw = %raw_input, %equipment_id, count, ?rule, "scan matched");

            ScanOutcome::Matched { equipment_id, count, rule }
        }
        None => {
            tracing::warn!(raw = %raw_input, normalized = %token.normalized, "unknown scan");

            snapshot.unknown_scans.push(UnknownScan {
                raw_input: token.raw,
                normalized_token: token.normalized.clone(),
                observed_at,
            });

            ScanOutcome::Unknown { normalized: token.normalized }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
