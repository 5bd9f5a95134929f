// 🧾 Session - the one owned snapshot plus its store
//
// All mutation goes through &mut self. Shared callers (HTTP server) wrap
// the session in Arc<Mutex<_>>, one exclusive section per session.

use crate::counter::{record_scan, ScanOutcome};
use crate::inventory::{ColumnBindings, InventorySnapshot};
use crate::matcher::{find_duplicate_ids, DuplicateGroup};
use crate::reconciliation::{reconcile, ImportSummary, ImportedTable};
use crate::stats::{compute_stats, InventoryStats};
use crate::store::SnapshotStore;
use anyhow::Result;
use std::sync::{Arc, Mutex};

pub type SharedSession = Arc<Mutex<Session>>;

pub struct Session {
    snapshot: InventorySnapshot,
    store: Option<SnapshotStore>,
}

impl Session {
    /// Session without persistence
    pub fn new() -> Self {
        Session {
            snapshot: InventorySnapshot::new(),
            store: None,
        }
    }

    /// Session restored from (and saved to) `store`
    pub fn open(store: SnapshotStore) -> Result<Self> {
        let snapshot = store.load()?;
        tracing::info!(
            items = snapshot.items.len(),
            unknown = snapshot.unknown_scans.len(),
            "session restored"
        );

        Ok(Session {
            snapshot,
            store: Some(store),
        })
    }

    pub fn into_shared(self) -> SharedSession {
        Arc::new(Mutex::new(self))
    }

    pub fn snapshot(&self) -> &InventorySnapshot {
        &self.snapshot
    }

    /// Replace the roster with `table`, carrying counts over.
    /// On failure neither the snapshot nor the store changes.
    pub fn import(&mut self, table: &ImportedTable, columns: &ColumnBindings) -> Result<ImportSummary> {
        let next = reconcile(&self.snapshot, table, columns)?;
        let summary = ImportSummary::between(&self.snapshot, &next);

        self.persist(&next)?;
        self.snapshot = next;

        tracing::info!("{}", summary.summary());
        Ok(summary)
    }

    /// Record one scan. Blank input is ignored and yields `None`.
    /// The in-memory count only moves once the store has accepted it.
    pub fn scan(&mut self, raw_input: &str) -> Result<Option<ScanOutcome>> {
        if raw_input.trim().is_empty() {
            return Ok(None);
        }

        let mut next = self.snapshot.clone();
        let outcome = record_scan(&mut next, raw_input);

        self.persist(&next)?;
        self.snapshot = next;
        Ok(Some(outcome))
    }

    pub fn stats(&self) -> InventoryStats {
        compute_stats(&self.snapshot)
    }

    pub fn duplicates(&self) -> Vec<DuplicateGroup> {
        find_duplicate_ids(self.snapshot.equipment_ids())
    }

    /// Zero all counts and drop unknown scans, keep the roster
    pub fn reset_counts(&mut self) -> Result<()> {
        let mut next = self.snapshot.clone();
        next.reset_counts();

        self.persist(&next)?;
        self.snapshot = next;
        tracing::info!(items = self.snapshot.items.len(), "counts reset");
        Ok(())
    }

    /// Forget everything, including the persisted record
    pub fn clear(&mut self) -> Result<()> {
        if let Some(store) = &self.store {
            store.remove()?;
        }
        self.snapshot.clear();
        tracing::info!("session cleared");
        Ok(())
    }

    /// Write the state a mutation produced. A mutation that empties the
    /// snapshot deletes the record so the old state cannot come back.
    fn persist(&self, snapshot: &InventorySnapshot) -> Result<()> {
        if let Some(store) = &self.store {
            if snapshot.is_empty() {
                store.remove()?;
            } else {
                store.save(snapshot)?;
            }
        }
        Ok(())
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================
