use thiserror::Error;

/// Why an import was rejected. The previous snapshot stays in place.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImportError {
    #[error("import file has too few rows (need a header row and at least one data row)")]
    TooFewRows,

    #[error("no rows with a value in equipment column \"{column}\"")]
    NoUsableRows { column: String },

    #[error("no equipment column found among headers: {}", headers.join(", "))]
    EquipmentColumnNotFound { headers: Vec<String> },

    #[error("column \"{0}\" is not among the imported headers")]
    UnknownColumn(String),
}
