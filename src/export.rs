// 📤 Export - snapshot → tabular payloads (and CSV files)
//
// Inventory payload: imported columns + Counted (+ Difference when a quantity
// column is bound). Unknown payload: raw, normalized, timestamp.

use crate::inventory::InventorySnapshot;
use crate::stats::difference;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const COUNTED_LABEL: &str = "Counted";
pub const DIFFERENCE_LABEL: &str = "Difference";
pub const UNKNOWN_SCAN_HEADERS: [&str; 3] = ["Raw scan", "Normalized", "Timestamp"];

/// Header row plus data rows, all cells as strings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ExportTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(&self.headers)
            .context("Failed to write CSV header")?;
        for row in &self.rows {
            wtr.write_record(row).context("Failed to write CSV row")?;
        }
        wtr.flush().context("Failed to flush CSV output")?;
        Ok(())
    }
}

pub fn inventory_rows(snapshot: &InventorySnapshot) -> ExportTable {
    let quantity_column = snapshot.quantity_column_name.as_deref();

    let mut headers: Vec<String> = snapshot
        .headers
        .iter()
        .filter(|h| !h.is_empty())
        .cloned()
        .collect();
    let attribute_columns = headers.clone();

    headers.push(COUNTED_LABEL.to_string());
    if quantity_column.is_some() {
        headers.push(DIFFERENCE_LABEL.to_string());
    }

    let rows = snapshot
        .items
        .iter()
        .map(|item| {
            let mut row: Vec<String> = attribute_columns
                .iter()
                .map(|column| item.attribute(column).unwrap_or_default().to_string())
                .collect();
            row.push(item.count.to_string());
            if let Some(diff) = difference(item, quantity_column) {
                row.push(diff.to_string());
            }
            row
        })
        .collect();

    ExportTable { headers, rows }
}

pub fn unknown_scan_rows(snapshot: &InventorySnapshot) -> ExportTable {
    ExportTable {
        headers: UNKNOWN_SCAN_HEADERS.iter().map(|h| h.to_string()).collect(),
        rows: snapshot
            .unknown_scans
            .iter()
            .map(|scan| {
                vec![
                    scan.raw_input.clone(),
                    scan.normalized_token.clone(),
                    scan.observed_at.to_rfc3339(),
                ]
            })
            .collect(),
    }
}

pub fn write_inventory_csv<W: Write>(snapshot: &InventorySnapshot, writer: W) -> Result<()> {
    inventory_rows(snapshot).write_csv(writer)
}

pub fn write_unknown_scans_csv<W: Write>(snapshot: &InventorySnapshot, writer: W) -> Result<()> {
    unknown_scan_rows(snapshot).write_csv(writer)
}

/// Write the dated export files into `dir`; empty payloads are skipped.
pub fn export_to_dir(snapshot: &InventorySnapshot, dir: &Path, date: NaiveDate) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create export directory {}", dir.display()))?;

    let stamp = date.format("%Y-%m-%d");
    let mut written = Vec::new();

    let payloads = [
        (format!("inventory-count-{}.csv", stamp), inventory_rows(snapshot)),
        (format!("unknown-scans-{}.csv", stamp), unknown_scan_rows(snapshot)),
    ];

    for (file_name, table) in payloads {
        if table.is_empty() {
            continue;
        }

        let path = dir.join(file_name);
        let file = std::fs::File::create(&path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        table.write_csv(file)?;

        tracing::info!(path = %path.display(), rows = table.rows.len(), "export written");
        written.push(path);
    }

    Ok(written)
}

// ============================================================================
// TESTS
// ============================================================================
