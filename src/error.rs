//! Error taxonomy for store operations.
//!
//! Each family of operations reports its own error type so callers can tell
//! an ingestion failure apart from a schema, query, or row-mutation failure.
//! Storage-engine failures are wrapped with the engine's message intact.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("CSV input is empty")]
    Empty,
    #[error(
        "Row {row} has {found} field(s) but table '{table}' has {expected} column(s)"
    )]
    Arity {
        table: String,
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("Table '{table}' already exists")]
    Conflict { table: String },
    #[error("Headers [{found}] do not match existing table '{table}' columns [{expected}]")]
    SchemaMismatch {
        table: String,
        expected: String,
        found: String,
    },
    #[error("Failed to read CSV input: {0}")]
    Csv(#[from] csv::Error),
    #[error("Failed to read input: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unknown encoding '{0}'")]
    Encoding(String),
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error("Loading into '{table}' failed: {source}")]
    Engine {
        table: String,
        #[source]
        source: rusqlite::Error,
    },
}

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Table '{0}' not found")]
    UnknownTable(String),
    #[error("Schema operation failed: {0}")]
    Engine(#[from] rusqlite::Error),
}

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Table '{0}' not found")]
    UnknownTable(String),
    #[error("Query failed: {0}")]
    Engine(#[from] rusqlite::Error),
    #[error("Failed to write CSV output: {0}")]
    Csv(#[from] csv::Error),
    #[error("Failed to write output: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum MutationError {
    #[error("Table '{0}' not found")]
    UnknownTable(String),
    #[error("No record with id '{id}' in table '{table}'")]
    RecordNotFound { table: String, id: String },
    #[error("Row operation failed: {0}")]
    Engine(#[from] rusqlite::Error),
}

impl MutationError {
    /// True when the failure concerns a missing record rather than a missing table.
    pub fn is_record_not_found(&self) -> bool {
        matches!(self, MutationError::RecordNotFound { .. })
    }
}
