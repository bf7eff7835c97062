//! Free-form SQL execution and CSV export.

use std::io::Write;

use log::{debug, info};
use rusqlite::{Batch, Connection, Params, Statement};

use crate::{
    error::QueryError,
    store::{self, Store},
    synth::quote_identifier,
    value::{CellValue, RowSet},
};

pub(crate) fn query_row_set<P: Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> rusqlite::Result<RowSet> {
    debug!("Executing: {sql}");
    let mut stmt = conn.prepare(sql)?;
    read_rows(&mut stmt, params)
}

fn read_rows<P: Params>(stmt: &mut Statement<'_>, params: P) -> rusqlite::Result<RowSet> {
    let columns = stmt
        .column_names()
        .into_iter()
        .map(str::to_string)
        .collect::<Vec<_>>();
    let width = columns.len();
    let mut set = RowSet::new(columns);
    let mut rows = stmt.query(params)?;
    while let Some(row) = rows.next()? {
        let cells = (0..width)
            .map(|idx| row.get_ref(idx).map(CellValue::from))
            .collect::<rusqlite::Result<Vec<_>>>()?;
        set.rows.push(cells);
    }
    Ok(set)
}

pub(crate) fn select_all(conn: &Connection, table: &str) -> rusqlite::Result<RowSet> {
    query_row_set(
        conn,
        &format!("SELECT * FROM {}", quote_identifier(table)),
        [],
    )
}

/// Runs arbitrary SQL against the store, one statement after another.
///
/// The result is that of the last statement producing columns; statements
/// without rows still execute and yield an empty result. Execution stops at
/// the first failing statement and earlier statements stay applied.
pub fn run_query(store: &Store, sql: &str) -> Result<RowSet, QueryError> {
    let set = store.with_connection(|conn| run_batch(conn, sql))?;
    Ok(set)
}

fn run_batch(conn: &Connection, sql: &str) -> rusqlite::Result<RowSet> {
    debug!("Executing: {sql}");
    let mut batch = Batch::new(conn, sql);
    let mut result = RowSet::default();
    while let Some(mut stmt) = batch.next()? {
        let set = read_rows(&mut stmt, [])?;
        if !set.columns.is_empty() {
            result = set;
        }
    }
    Ok(result)
}

/// Writes `table` as CSV (header first) and returns the number of data rows.
/// NULL cells become empty fields.
pub fn export_table<W: Write>(store: &Store, table: &str, writer: W) -> Result<usize, QueryError> {
    let set = store.with_connection(|conn| -> rusqlite::Result<Option<RowSet>> {
        if !store::table_exists(conn, table)? {
            return Ok(None);
        }
        select_all(conn, table).map(Some)
    })?;
    let set = set.ok_or_else(|| QueryError::UnknownTable(table.to_string()))?;

    let mut csv_writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Necessary)
        .from_writer(writer);
    csv_writer.write_record(&set.columns)?;
    for row in &set.rows {
        csv_writer.write_record(row.iter().map(CellValue::as_display))?;
    }
    csv_writer.flush()?;
    info!("Exported {} row(s) from '{table}'", set.len());
    Ok(set.len())
}
