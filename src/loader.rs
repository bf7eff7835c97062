//! Transactional bulk insertion of string rows.

use log::debug;
use rusqlite::{Connection, params_from_iter};

use crate::{error::IngestError, introspect, store::Store, synth};

/// [`load`] against a shared store, holding the connection for the whole batch.
pub fn load_rows<R: AsRef<[String]>>(
    store: &Store,
    table: &str,
    rows: &[R],
) -> Result<usize, IngestError> {
    store.with_connection(|conn| load(conn, table, rows))
}

/// Inserts every row into `table` inside one transaction.
///
/// Each row must have exactly as many fields as the table has columns. The
/// first failing row aborts the batch and nothing is committed. Values are
/// bound as text and left to the engine's column affinity.
pub fn load<R: AsRef<[String]>>(
    conn: &mut Connection,
    table: &str,
    rows: &[R],
) -> Result<usize, IngestError> {
    let tx = conn.transaction().map_err(|source| IngestError::Engine {
        table: table.to_string(),
        source,
    })?;
    let loaded = insert_all(&tx, table, rows)?;
    tx.commit().map_err(|source| IngestError::Engine {
        table: table.to_string(),
        source,
    })?;
    Ok(loaded)
}

/// Inserts `rows` through one prepared statement on a connection the caller
/// already holds inside a transaction.
pub(crate) fn insert_all<R: AsRef<[String]>>(
    conn: &Connection,
    table: &str,
    rows: &[R],
) -> Result<usize, IngestError> {
    let expected = introspect::read_columns(conn, table)?.len();
    let engine_error = |source| IngestError::Engine {
        table: table.to_string(),
        source,
    };

    let mut stmt = conn
        .prepare(&synth::insert_sql(table, expected))
        .map_err(engine_error)?;
    for (idx, row) in rows.iter().enumerate() {
        let fields = row.as_ref();
        if fields.len() != expected {
            return Err(IngestError::Arity {
                table: table.to_string(),
                row: idx + 1,
                expected,
                found: fields.len(),
            });
        }
        stmt.execute(params_from_iter(fields.iter()))
            .map_err(engine_error)?;
    }
    debug!("Loaded {} row(s) into '{table}'", rows.len());
    Ok(rows.len())
}
