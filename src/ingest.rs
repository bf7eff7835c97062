//! CSV ingestion: classify, create, load.
//!
//! Re-ingesting into an existing table follows [`ConflictPolicy`]. The
//! default appends, keeping the live table definition, and requires the new
//! headers to match its columns.
//!
//! Table preparation and the row load share one transaction: a failed
//! ingest leaves the store exactly as it was.

use std::path::Path;

use clap::ValueEnum;
use itertools::Itertools;
use log::{debug, info, warn};
use rusqlite::Connection;
use serde::Serialize;

use crate::{
    classify::{TypeTag, classify_columns},
    error::IngestError,
    introspect::{self, Column},
    io_utils, loader,
    store::{self, Store},
    synth,
};

/// Rows sampled for classification; 0 scans every row.
pub const DEFAULT_SAMPLE_ROWS: usize = 0;

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
#[value(rename_all = "kebab-case")]
pub enum ConflictPolicy {
    /// Keep the existing table and append rows whose headers match it
    #[default]
    Append,
    /// Drop the existing table and ingest afresh
    Replace,
    /// Fail when the table already exists
    Reject,
}

#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// Rows sampled for type classification (0 means full scan)
    pub sample_rows: usize,
    pub on_conflict: ConflictPolicy,
    pub delimiter: Option<u8>,
    pub encoding: Option<String>,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            sample_rows: DEFAULT_SAMPLE_ROWS,
            on_conflict: ConflictPolicy::default(),
            delimiter: None,
            encoding: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct IngestRequest {
    pub table_hint: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub table: String,
    pub columns: Vec<Column>,
    pub rows_loaded: usize,
    pub created: bool,
}

pub fn ingest(
    store: &Store,
    request: &IngestRequest,
    options: &IngestOptions,
) -> Result<IngestReport, IngestError> {
    if request.headers.is_empty() || request.headers.iter().all(|h| h.is_empty()) {
        return Err(IngestError::Empty);
    }
    let table = synth::sanitize_identifier(&request.table_hint);
    let headers = request
        .headers
        .iter()
        .map(|h| synth::sanitize_identifier(h))
        .collect::<Vec<_>>();

    let report = store.with_connection(|conn| -> Result<IngestReport, IngestError> {
        let engine_error = |source| IngestError::Engine {
            table: table.clone(),
            source,
        };
        let tx = conn.transaction().map_err(engine_error)?;
        let created = prepare_table(&tx, &table, &headers, request, options)?;
        let rows_loaded = loader::insert_all(&tx, &table, &request.rows)?;
        let columns = introspect::read_columns(&tx, &table)?;
        tx.commit().map_err(engine_error)?;
        Ok(IngestReport {
            table: table.clone(),
            columns,
            rows_loaded,
            created,
        })
    })?;
    info!(
        "Ingested {} row(s) into '{}' ({} column(s))",
        report.rows_loaded,
        report.table,
        report.columns.len()
    );
    Ok(report)
}

/// Makes sure `table` exists with a shape compatible with `headers`.
/// Returns whether a new table was created. Runs inside the ingest
/// transaction, so a dropped or created table is undone if the load fails.
fn prepare_table(
    conn: &Connection,
    table: &str,
    headers: &[String],
    request: &IngestRequest,
    options: &IngestOptions,
) -> Result<bool, IngestError> {
    let engine_error = |source| IngestError::Engine {
        table: table.to_string(),
        source,
    };
    if store::table_exists(conn, table).map_err(engine_error)? {
        match options.on_conflict {
            ConflictPolicy::Reject => {
                return Err(IngestError::Conflict {
                    table: table.to_string(),
                });
            }
            ConflictPolicy::Replace => {
                warn!("Replacing existing table '{table}'");
                conn.execute(&format!("DROP TABLE {}", synth::quote_identifier(table)), [])
                    .map_err(engine_error)?;
            }
            ConflictPolicy::Append => {
                let existing = introspect::read_columns(conn, table)?
                    .into_iter()
                    .map(|c| c.name)
                    .collect::<Vec<_>>();
                if existing != headers {
                    return Err(IngestError::SchemaMismatch {
                        table: table.to_string(),
                        expected: existing.join(", "),
                        found: headers.join(", "),
                    });
                }
                debug!("Appending to existing table '{table}'");
                return Ok(false);
            }
        }
    }

    let types = classify_columns(headers.len(), &request.rows, options.sample_rows);
    let columns = headers
        .iter()
        .cloned()
        .zip(types)
        .collect::<Vec<(String, TypeTag)>>();
    debug!(
        "Inferred types for '{table}': {}",
        columns
            .iter()
            .map(|(name, tag)| format!("{name}:{tag}"))
            .join(", ")
    );
    let sql = synth::create_table_sql(table, &columns);
    debug!("Executing: {sql}");
    conn.execute(&sql, []).map_err(engine_error)?;
    Ok(true)
}

/// Ingests a CSV file, naming the table after the file.
pub fn ingest_path(
    store: &Store,
    path: &Path,
    options: &IngestOptions,
) -> Result<IngestReport, IngestError> {
    let delimiter = io_utils::resolve_input_delimiter(path, options.delimiter);
    let encoding = io_utils::resolve_encoding(options.encoding.as_deref())?;
    let document = io_utils::read_csv_path(path, delimiter, encoding)?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let request = IngestRequest {
        table_hint: synth::derive_table_name(&file_name),
        headers: document.headers,
        rows: document.rows,
    };
    ingest(store, &request, options)
}
