// 📥 CSV Import - equipment list → ImportedTable + column bindings
//
// First record is the header row. Column detection is a fixed,
// case-insensitive candidate list; explicit overrides always win.

use crate::error::ImportError;
use crate::inventory::ColumnBindings;
use crate::reconciliation::ImportedTable;
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

/// Header names recognised as the equipment-number column, in priority order
pub const EQUIPMENT_COLUMN_NAMES: &[&str] = &[
    "Equipment#",
    "Equipment",
    "EquipmentNumber",
    "Equipment Number",
    "Equipmentnr",
];

/// Header names recognised as the expected-quantity column, in priority order
pub const QUANTITY_COLUMN_NAMES: &[&str] = &["Voorraad", "Qty", "Quantity", "Aantal", "Stock", "Count"];

// ============================================================================
// READING
// ============================================================================

pub fn read_table_from_path(path: &Path) -> Result<ImportedTable> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open import file {}", path.display()))?;
    read_table(file).with_context(|| format!("Failed to import {}", path.display()))
}

/// Read delimited text into headers + rows.
///
/// Cells are trimmed, fully empty rows skipped, cells under an empty header
/// dropped. Short rows read as empty cells.
pub fn read_table<R: Read>(reader: R) -> Result<ImportedTable> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut records = Vec::new();
    for result in rdr.records() {
        records.push(result.context("Failed to read CSV record")?);
    }

    if records.len() < 2 {
        return Err(ImportError::TooFewRows.into());
    }

    let headers: Vec<String> = records[0].iter().map(|h| h.trim().to_string()).collect();

    let mut rows = Vec::new();
    for record in &records[1..] {
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }

        let row: BTreeMap<String, String> = headers
            .iter()
            .enumerate()
            .filter(|(_, header)| !header.is_empty())
            .map(|(idx, header)| {
                let cell = record.get(idx).unwrap_or("").trim().to_string();
                (header.clone(), cell)
            })
            .collect();

        rows.push(row);
    }

    Ok(ImportedTable::new(headers, rows))
}

// ============================================================================
// COLUMN DETECTION
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetectedColumns {
    pub equipment: Option<String>,
    pub quantity: Option<String>,
}

pub fn detect_columns(headers: &[String]) -> DetectedColumns {
    DetectedColumns {
        equipment: first_known_header(headers, EQUIPMENT_COLUMN_NAMES),
        quantity: first_known_header(headers, QUANTITY_COLUMN_NAMES),
    }
}

fn first_known_header(headers: &[String], candidates: &[&str]) -> Option<String> {
    candidates
        .iter()
        .find_map(|candidate| find_header(headers, candidate))
}

/// Case-insensitive header lookup returning the header's own spelling
fn find_header(headers: &[String], name: &str) -> Option<String> {
    let wanted = name.to_lowercase();
    headers
        .iter()
        .find(|h| !h.is_empty() && h.to_lowercase() == wanted)
        .cloned()
}

/// Pick the equipment and quantity columns, overrides first, then detection.
pub fn resolve_columns(
    table: &ImportedTable,
    equipment_override: Option<&str>,
    quantity_override: Option<&str>,
) -> Result<ColumnBindings, ImportError> {
    let detected = detect_columns(&table.headers);

    let equipment = match equipment_override {
        Some(name) => find_header(&table.headers, name)
            .ok_or_else(|| ImportError::UnknownColumn(name.to_string()))?,
        None => detected.equipment.ok_or_else(|| ImportError::EquipmentColumnNotFound {
            headers: table.headers.iter().filter(|h| !h.is_empty()).cloned().collect(),
        })?,
    };

    let quantity = match quantity_override {
        Some(name) => Some(
            find_header(&table.headers, name)
                .ok_or_else(|| ImportError::UnknownColumn(name.to_string()))?,
        ),
        None => detected.quantity,
    };

    Ok(ColumnBindings::new(equipment, quantity))
}

/// Read, resolve columns and drop rows without an equipment number.
pub fn load_import(
    path: &Path,
    equipment_override: Option<&str>,
    quantity_override: Option<&str>,
) -> Result<(ImportedTable, ColumnBindings)> {
    let mut table = read_table_from_path(path)?;
    let columns = resolve_columns(&table, equipment_override, quantity_override)?;
    table.retain_identified(&columns.equipment);

    tracing::info!(
        path = %path.display(),
        rows = table.rows.len(),
        equipment = %columns.equipment,
        quantity = ?columns.quantity,
        "import file read"
    );

    Ok((table, columns))
}

// ============================================================================
// TESTS
// ============================================================================
