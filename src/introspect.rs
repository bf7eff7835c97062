//! Live schema introspection.
//!
//! Once a table exists its declared column types are authoritative; nothing
//! here re-runs value classification.

use log::{debug, info};
use rusqlite::{Connection, params};
use serde::Serialize;

use crate::{
    classify::TypeTag,
    error::SchemaError,
    query::select_all,
    relationships::{Relationship, infer_relationships},
    store::{self, Store},
    synth,
    value::RowSet,
};

const FALLBACK_DECLARED_TYPE: &str = "TEXT";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    pub name: String,
    pub declared_type: String,
    pub type_tag: TypeTag,
    pub not_null: bool,
    pub default_value: Option<String>,
    pub primary_key: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct TableInfo {
    pub name: String,
    pub columns: Vec<Column>,
    pub rows: RowSet,
}

impl TableInfo {
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DatabaseInfo {
    pub tables: Vec<TableInfo>,
    pub relationships: Vec<Relationship>,
}

impl DatabaseInfo {
    pub fn table(&self, name: &str) -> Option<&TableInfo> {
        self.tables.iter().find(|t| t.name == name)
    }
}

pub(crate) fn read_columns(conn: &Connection, table: &str) -> Result<Vec<Column>, SchemaError> {
    if !store::table_exists(conn, table)? {
        return Err(SchemaError::UnknownTable(table.to_string()));
    }
    let mut stmt = conn.prepare(
        "SELECT name, type, \"notnull\", dflt_value, pk FROM pragma_table_info(?1) ORDER BY cid",
    )?;
    let columns = stmt
        .query_map(params![table], |row| {
            let declared: String = row.get(1)?;
            let declared = if declared.trim().is_empty() {
                FALLBACK_DECLARED_TYPE.to_string()
            } else {
                declared
            };
            Ok(Column {
                name: row.get(0)?,
                type_tag: TypeTag::from_declared(&declared),
                declared_type: declared,
                not_null: row.get::<_, i64>(2)? != 0,
                default_value: row.get(3)?,
                primary_key: row.get::<_, i64>(4)? > 0,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(columns)
}

/// Authoritative column metadata for `table`, in declaration order.
pub fn describe(store: &Store, table: &str) -> Result<Vec<Column>, SchemaError> {
    store.with_connection(|conn| read_columns(conn, table))
}

/// All rows of `table` in introspected column order.
pub fn fetch_rows(store: &Store, table: &str) -> Result<RowSet, SchemaError> {
    store.with_connection(|conn| -> Result<RowSet, SchemaError> {
        if !store::table_exists(conn, table)? {
            return Err(SchemaError::UnknownTable(table.to_string()));
        }
        Ok(select_all(conn, table)?)
    })
}

/// Every table with its columns and rows, plus the relationships implied by
/// column names.
pub fn describe_database(store: &Store) -> Result<DatabaseInfo, SchemaError> {
    let tables = store.with_connection(|conn| -> Result<Vec<TableInfo>, SchemaError> {
        store::table_names(conn)?
            .into_iter()
            .map(|name| -> Result<TableInfo, SchemaError> {
                let columns = read_columns(conn, &name)?;
                let rows = select_all(conn, &name)?;
                Ok(TableInfo {
                    name,
                    columns,
                    rows,
                })
            })
            .collect()
    })?;
    let shape = tables
        .iter()
        .map(|t| (t.name.as_str(), t.column_names()))
        .collect::<Vec<_>>();
    let relationships = infer_relationships(&shape);
    debug!(
        "Described {} table(s) with {} relationship(s)",
        tables.len(),
        relationships.len()
    );
    Ok(DatabaseInfo {
        tables,
        relationships,
    })
}

/// Appends a column to an existing table. The requested type is checked
/// against the allow-list and falls back to `TEXT`.
pub fn add_column(
    store: &Store,
    table: &str,
    column: &str,
    requested_type: &str,
) -> Result<(), SchemaError> {
    let table = synth::sanitize_identifier(table);
    let sql = synth::add_column_sql(&table, column, requested_type);
    store.with_connection(|conn| -> Result<(), SchemaError> {
        if !store::table_exists(conn, &table)? {
            return Err(SchemaError::UnknownTable(table.clone()));
        }
        debug!("Executing: {sql}");
        conn.execute(&sql, [])?;
        Ok(())
    })?;
    info!("Added column '{column}' to '{table}'");
    Ok(())
}
