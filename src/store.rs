// 💾 Snapshot Store - SQLite persistence for the active session
//
// One row per session key holding the snapshot as JSON. Unreadable data is
// discarded on load (empty snapshot) instead of failing the caller.

use crate::inventory::InventorySnapshot;
use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// Key of the single active session
pub const SESSION_KEY: &str = "inventory-counting-state";

pub struct SnapshotStore {
    conn: Connection,
}

impl SnapshotStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database {}", path.display()))?;

        // WAL for crash recovery
        conn.pragma_update(None, "journal_mode", "WAL")?;

        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS snapshots (
                key TEXT PRIMARY KEY,
                data TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )
        .context("Failed to create snapshots table")?;

        Ok(SnapshotStore { conn })
    }

    /// Load the saved session, or an empty snapshot when nothing usable is stored
    pub fn load(&self) -> Result<InventorySnapshot> {
        let data: Option<String> = self
            .conn
            .query_row(
                "SELECT data FROM snapshots WHERE key = ?1",
                params![SESSION_KEY],
                |row| row.get(0),
            )
            .optional()
            .context("Failed to read saved snapshot")?;

        Ok(data
            .map(|json| InventorySnapshot::from_json_or_default(&json))
            .unwrap_or_default())
    }

    /// Persist the snapshot. Returns false when it was empty and skipped.
    pub fn save(&self, snapshot: &InventorySnapshot) -> Result<bool> {
        if snapshot.is_empty() {
            return Ok(false);
        }

        let json = snapshot.to_json().context("Failed to serialize snapshot")?;

        self.conn
            .execute(
                "INSERT INTO snapshots (key, data, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET data = excluded.data, updated_at = excluded.updated_at",
                params![SESSION_KEY, json, Utc::now().to_rfc3339()],
            )
            .context("Failed to save snapshot")?;

        Ok(true)
    }

    /// Delete the saved session. Returns whether a record existed.
    pub fn remove(&self) -> Result<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM snapshots WHERE key = ?1", params![SESSION_KEY])
            .context("Failed to delete snapshot")?;
        Ok(deleted > 0)
    }

    #[cfg(test)]
    fn write_raw(&self, data: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO snapshots (key, data, updated_at) VALUES (?1, ?2, ?3)",
            params![SESSION_KEY, data, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn break_table(&self) -> Result<()> {
        self.conn.execute("DROP TABLE snapshots", [])?;
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
