//! Line-oriented session over one store.
//!
//! Dot-commands map onto the row, schema, and export operations; any other
//! line is executed as SQL. A failing line is reported and the session goes
//! on.

use std::{
    io::{BufRead, Write},
    path::Path,
};

use anyhow::{Context, Result, anyhow, bail};
use log::debug;

use crate::{
    ingest::{self, IngestOptions},
    introspect, io_utils, query, records,
    store::Store,
    table,
    value::CellValue,
};

const HELP: &str = "\
.tables                          list tables
.describe                        tables, columns, and relationships
.rows TABLE                      all rows of TABLE
.insert TABLE                    insert a blank row, print its id
.update TABLE ID COLUMN VALUE    set one cell (VALUE may contain spaces; NULL sets null)
.delete TABLE ID                 delete a row by id
.add-column TABLE COLUMN TYPE    append a column (TEXT, INT, DECIMAL, REAL, BOOLEAN)
.export TABLE [PATH]             write TABLE as CSV to PATH or stdout
.load PATH                       ingest a CSV file
.help                            this text
.quit                            end the session
anything else                    executed as SQL";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Session {
    store: Store,
    options: IngestOptions,
}

impl Session {
    pub fn new(store: Store, options: IngestOptions) -> Self {
        Self { store, options }
    }

    /// Runs lines from `input` until EOF or `.quit`. Returns the number of
    /// lines that failed.
    pub fn run<R: BufRead, W: Write, E: Write>(
        &self,
        input: R,
        out: &mut W,
        err: &mut E,
    ) -> Result<usize> {
        let mut failures = 0usize;
        for line in input.lines() {
            let line = line.context("Reading session input")?;
            match self.execute_line(&line, out) {
                Ok(Flow::Quit) => break,
                Ok(Flow::Continue) => {}
                Err(failure) => {
                    failures += 1;
                    debug!("Session line failed: {failure:?}");
                    writeln!(err, "error: {failure:#}")?;
                }
            }
        }
        out.flush()?;
        Ok(failures)
    }

    pub fn execute_line<W: Write>(&self, line: &str, out: &mut W) -> Result<Flow> {
        let line = line.trim();
        if line.is_empty() || line.starts_with("--") {
            return Ok(Flow::Continue);
        }
        if !line.starts_with('.') {
            let set = query::run_query(&self.store, line)?;
            if !set.columns.is_empty() {
                write!(out, "{}", table::render_rows(&set))?;
            }
            return Ok(Flow::Continue);
        }

        let (command, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();
        debug!("Shell command {command} {rest}");
        match command {
            ".quit" | ".exit" => return Ok(Flow::Quit),
            ".help" => writeln!(out, "{HELP}")?,
            ".tables" => {
                for name in self.store.table_names()? {
                    writeln!(out, "{name}")?;
                }
            }
            ".describe" => self.describe(out)?,
            ".rows" => {
                let table_name = single_arg(rest, ".rows TABLE")?;
                let set = records::list_rows(&self.store, table_name)?;
                write!(out, "{}", table::render_rows(&set))?;
            }
            ".insert" => {
                let table_name = single_arg(rest, ".insert TABLE")?;
                let id = records::insert_row(&self.store, table_name)?;
                writeln!(out, "{id}")?;
            }
            ".update" => {
                let mut parts = rest.splitn(4, char::is_whitespace);
                let (Some(table_name), Some(id), Some(column), Some(value)) =
                    (parts.next(), parts.next(), parts.next(), parts.next())
                else {
                    bail!("usage: .update TABLE ID COLUMN VALUE");
                };
                let value = if value.trim() == "NULL" {
                    CellValue::Null
                } else {
                    CellValue::from(value.trim())
                };
                records::update_cell(&self.store, table_name, id, column, &value)?;
                writeln!(out, "updated")?;
            }
            ".delete" => {
                let mut parts = rest.split_whitespace();
                let (Some(table_name), Some(id)) = (parts.next(), parts.next()) else {
                    bail!("usage: .delete TABLE ID");
                };
                records::delete_row(&self.store, table_name, id)?;
                writeln!(out, "deleted")?;
            }
            ".add-column" => {
                let mut parts = rest.split_whitespace();
                let (Some(table_name), Some(column), Some(requested)) =
                    (parts.next(), parts.next(), parts.next())
                else {
                    bail!("usage: .add-column TABLE COLUMN TYPE");
                };
                introspect::add_column(&self.store, table_name, column, requested)?;
                writeln!(out, "column added")?;
            }
            ".export" => {
                let mut parts = rest.split_whitespace();
                let table_name = parts
                    .next()
                    .ok_or_else(|| anyhow!("usage: .export TABLE [PATH]"))?;
                match parts.next() {
                    Some(path) => {
                        let sink = io_utils::open_output(Some(Path::new(path)))
                            .with_context(|| format!("Creating output file {path:?}"))?;
                        let count = query::export_table(&self.store, table_name, sink)?;
                        writeln!(out, "exported {count} row(s) to {path}")?;
                    }
                    None => {
                        query::export_table(&self.store, table_name, &mut *out)?;
                    }
                }
            }
            ".load" => {
                let path = single_arg(rest, ".load PATH")?;
                let report = ingest::ingest_path(&self.store, Path::new(path), &self.options)
                    .with_context(|| format!("Loading {path:?}"))?;
                writeln!(
                    out,
                    "loaded {} row(s) into {}",
                    report.rows_loaded, report.table
                )?;
            }
            other => bail!("Unknown command '{other}' (try .help)"),
        }
        Ok(Flow::Continue)
    }

    fn describe<W: Write>(&self, out: &mut W) -> Result<()> {
        let info = introspect::describe_database(&self.store)?;
        write!(out, "{}", render_description(&info))?;
        Ok(())
    }
}

fn single_arg<'a>(rest: &'a str, usage: &str) -> Result<&'a str> {
    let mut parts = rest.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some(arg), None) => Ok(arg),
        _ => Err(anyhow!("usage: {usage}")),
    }
}

/// Text summary of a database: one column table per table, then relationships.
pub fn render_description(info: &introspect::DatabaseInfo) -> String {
    let mut output = String::new();
    for table_info in &info.tables {
        output.push_str(&format!(
            "{} ({} row(s))\n",
            table_info.name,
            table_info.rows.len()
        ));
        let headers = vec!["column".to_string(), "type".to_string()];
        let rows = table_info
            .columns
            .iter()
            .map(|c| vec![c.name.clone(), c.declared_type.clone()])
            .collect::<Vec<_>>();
        output.push_str(&table::render_table(&headers, &rows));
        output.push('\n');
    }
    if !info.relationships.is_empty() {
        output.push_str("relationships\n");
        for rel in &info.relationships {
            output.push_str(&format!(
                "{}.{} -> {}\n",
                rel.source_table, rel.source_column, rel.target_table
            ));
        }
    }
    output
}
