use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::ingest::{ConflictPolicy, DEFAULT_SAMPLE_ROWS, IngestOptions};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Load CSV files into an in-memory relational store and query them",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show every table with its typed columns plus inferred relationships
    Describe(DescribeArgs),
    /// Run a SQL statement against the loaded tables
    Query(QueryArgs),
    /// Export one table as CSV
    Export(ExportArgs),
    /// Read commands and SQL from stdin against a single store
    Shell(ShellArgs),
}

#[derive(Debug, Clone, Args)]
pub struct SessionArgs {
    /// CSV files to load; each becomes a table named after the file
    #[arg(short = 'i', long = "input", action = clap::ArgAction::Append)]
    pub inputs: Vec<PathBuf>,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input files (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Number of rows to sample when inferring types (0, the default, scans every row)
    #[arg(long, default_value_t = DEFAULT_SAMPLE_ROWS)]
    pub sample_rows: usize,
    /// What to do when a file maps onto a table that already exists
    #[arg(long = "on-conflict", value_enum, default_value = "append")]
    pub on_conflict: ConflictPolicy,
}

impl SessionArgs {
    pub fn ingest_options(&self) -> IngestOptions {
        IngestOptions {
            sample_rows: self.sample_rows,
            on_conflict: self.on_conflict,
            delimiter: self.delimiter,
            encoding: self.input_encoding.clone(),
        }
    }
}

#[derive(Debug, Args)]
pub struct DescribeArgs {
    #[command(flatten)]
    pub session: SessionArgs,
    /// Emit the full description, rows included, as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct QueryArgs {
    #[command(flatten)]
    pub session: SessionArgs,
    /// SQL text to execute
    #[arg(short = 's', long = "sql")]
    pub sql: String,
    /// Render the result as an aligned table instead of CSV
    #[arg(long = "table")]
    pub table: bool,
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    #[command(flatten)]
    pub session: SessionArgs,
    /// Table to export
    #[arg(short = 't', long = "table-name")]
    pub table_name: String,
    /// Output CSV file (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ShellArgs {
    #[command(flatten)]
    pub session: SessionArgs,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
