// 🎯 Scan Matcher - resolve a normalized token against the roster
//
// Forgiving rule used while scanning: roster ids are compared in their
// stripped form (alphanumeric only, uppercase). Three strategies, first hit wins:
//   a) exact stripped equality
//   b) 7 digits      → try "IDT" + digits
//   c) IDT + 7 digits → try the digits alone
//
// Count migration on re-import uses a different, strict rule
// (see reconciliation::migration_key). Do not merge the two.

use crate::normalizer::strip_and_upper;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const IDT_PREFIX: &str = "IDT";
const IDT_DIGITS: usize = 7;

// ============================================================================
// MATCH RULE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchRule {
    /// Token equals the roster id's stripped form
    Exact,

    /// 7-digit token matched a roster id with the IDT prefix
    IdtPrefixAdded,

    /// IDT + 7 digits token matched a roster id without the prefix
    IdtPrefixRemoved,
}

/// A roster hit: the roster's original (unstripped) id plus the rule that found it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RosterMatch<'a> {
    pub equipment_id: &'a str,
    pub rule: MatchRule,
}

/// Comparison key for live scanning: the stripped form of an identifier
pub fn scan_key(equipment_id: &str) -> String {
    strip_and_upper(equipment_id)
}

/// Resolve a normalized token to a roster id, or `None` when unknown.
///
/// Ties between roster ids with the same stripped form go to the first id in
/// iteration order.
pub fn find_match<'a, I>(normalized_token: &str, roster_ids: I) -> Option<RosterMatch<'a>>
where
    I: IntoIterator<Item = &'a str>,
{
    let keyed: Vec<(&'a str, String)> = roster_ids
        .into_iter()
        .map(|id| (id, scan_key(id)))
        .collect();

    let lookup = |key: &str| -> Option<&'a str> {
        keyed
            .iter()
            .find(|(_, stripped)| stripped == key)
            .map(|(original, _)| *original)
    };

    // Strategy a: exact stripped equality
    if let Some(id) = lookup(normalized_token) {
        return Some(RosterMatch { equipment_id: id, rule: MatchRule::Exact });
    }

    // Strategy b: bare 7-digit number, roster carries the IDT prefix
    if is_idt_digits(normalized_token) {
        let with_prefix = format!("{}{}", IDT_PREFIX, normalized_token);
        if let Some(id) = lookup(&with_prefix) {
            return Some(RosterMatch { equipment_id: id, rule: MatchRule::IdtPrefixAdded });
        }
    }

    // Strategy c: IDT + 7 digits, roster carries the bare number
    if let Some(digits) = normalized_token.strip_prefix(IDT_PREFIX) {
        if is_idt_digits(digits) {
            if let Some(id) = lookup(digits) {
                return Some(RosterMatch { equipment_id: id, rule: MatchRule::IdtPrefixRemoved });
            }
        }
    }

    None
}

fn is_idt_digits(value: &str) -> bool {
    value.len() == IDT_DIGITS && value.bytes().all(|b| b.is_ascii_digit())
}

// ============================================================================
// DUPLICATE DIAGNOSTIC
// ============================================================================

/// Roster ids that collapse to the same scan key
///
/// A scan resolving to this key always lands on `equipment_ids[0]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    pub scan_key: String,
    pub equipment_ids: Vec<String>,
}

/// Find every scan key shared by more than one roster entry, in first-seen order.
pub fn find_duplicate_ids<'a, I>(roster_ids: I) -> Vec<DuplicateGroup>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<String>> = HashMap::new();

    for id in roster_ids {
        let key = scan_key(id);
        let entry = groups.entry(key.clone()).or_insert_with(|| {
            order.push(key);
            Vec::new()
        });
        entry.push(id.to_string());
    }

    order
        .into_iter()
        .filter_map(|key| {
            let ids = groups.remove(&key)?;
            if ids.len() > 1 {
                Some(DuplicateGroup { scan_key: key, equipment_ids: ids })
            } else {
                None
            }
        })
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================
