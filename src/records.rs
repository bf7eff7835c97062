//! Row-level access to any table, keyed by its `id` column.

use log::{debug, warn};
use rusqlite::{Connection, OptionalExtension, params};

use crate::{
    error::MutationError,
    query::select_all,
    store::{self, Store},
    synth::{quote_identifier, sanitize_identifier},
    value::{CellValue, RowSet},
};

fn ensure_table(conn: &Connection, table: &str) -> Result<(), MutationError> {
    if store::table_exists(conn, table)? {
        Ok(())
    } else {
        Err(MutationError::UnknownTable(table.to_string()))
    }
}

pub fn list_rows(store: &Store, table: &str) -> Result<RowSet, MutationError> {
    let table = sanitize_identifier(table);
    store.with_connection(|conn| -> Result<RowSet, MutationError> {
        ensure_table(conn, &table)?;
        Ok(select_all(conn, &table)?)
    })
}

/// One past the largest numeric `id`, or 1 when there is none.
fn next_id(conn: &Connection, table: &str) -> i64 {
    let sql = format!("SELECT MAX(id) FROM {}", quote_identifier(table));
    conn.query_row(&sql, [], |row| row.get_ref(0).map(CellValue::from))
        .ok()
        .and_then(|max| max.as_integer())
        .map_or(1, |max| max + 1)
}

/// Inserts a blank row and returns its id.
///
/// The row is first inserted with only `id` set to the next free id. If the
/// table rejects that (for instance a NOT NULL column without a default), a
/// default-values row is inserted instead and its actual id is read back.
pub fn insert_row(store: &Store, table: &str) -> Result<i64, MutationError> {
    let table = sanitize_identifier(table);
    store.with_connection(|conn| -> Result<i64, MutationError> {
        ensure_table(conn, &table)?;
        let candidate = next_id(conn, &table);
        let quoted = quote_identifier(&table);
        let attempt = conn.execute(
            &format!("INSERT INTO {quoted} (id) VALUES (?1)"),
            params![candidate],
        );
        match attempt {
            Ok(_) => {
                debug!("Inserted row {candidate} into '{table}'");
                Ok(candidate)
            }
            Err(err) => {
                warn!("Insert with id {candidate} into '{table}' failed ({err}); using default values");
                conn.execute(&format!("INSERT INTO {quoted} DEFAULT VALUES"), [])?;
                let rowid = conn.last_insert_rowid();
                let actual = inserted_id(conn, &quoted, rowid).unwrap_or(rowid);
                debug!("Inserted row {actual} into '{table}'");
                Ok(actual)
            }
        }
    })
}

fn inserted_id(conn: &Connection, quoted_table: &str, rowid: i64) -> Option<i64> {
    conn.query_row(
        &format!("SELECT id FROM {quoted_table} WHERE rowid = ?1"),
        params![rowid],
        |row| row.get_ref(0).map(CellValue::from),
    )
    .optional()
    .ok()
    .flatten()
    .and_then(|id| id.as_integer())
}

/// Record ids that read as integers are bound as integers so they match
/// untyped `id` columns; anything else is bound as text.
fn id_param(record_id: &str) -> CellValue {
    record_id
        .trim()
        .parse::<i64>()
        .map_or_else(|_| CellValue::from(record_id), CellValue::Integer)
}

/// Sets one cell of the row whose `id` is `record_id`. Last writer wins.
pub fn update_cell(
    store: &Store,
    table: &str,
    record_id: &str,
    column: &str,
    value: &CellValue,
) -> Result<(), MutationError> {
    let table = sanitize_identifier(table);
    let column = sanitize_identifier(column);
    store.with_connection(|conn| -> Result<(), MutationError> {
        ensure_table(conn, &table)?;
        let sql = format!(
            "UPDATE {} SET {} = ?1 WHERE id = ?2",
            quote_identifier(&table),
            quote_identifier(&column)
        );
        debug!("Executing: {sql}");
        let changed = conn.execute(&sql, params![value, id_param(record_id)])?;
        if changed == 0 {
            return Err(MutationError::RecordNotFound {
                table: table.clone(),
                id: record_id.to_string(),
            });
        }
        Ok(())
    })
}

/// Deletes the row whose `id` is `record_id`. Nothing cascades.
pub fn delete_row(store: &Store, table: &str, record_id: &str) -> Result<(), MutationError> {
    let table = sanitize_identifier(table);
    store.with_connection(|conn| -> Result<(), MutationError> {
        ensure_table(conn, &table)?;
        let sql = format!("DELETE FROM {} WHERE id = ?1", quote_identifier(&table));
        debug!("Executing: {sql}");
        let changed = conn.execute(&sql, params![id_param(record_id)])?;
        if changed == 0 {
            return Err(MutationError::RecordNotFound {
                table: table.clone(),
                id: record_id.to_string(),
            });
        }
        Ok(())
    })
}
