pub mod classify;
pub mod cli;
pub mod error;
pub mod ingest;
pub mod introspect;
pub mod io_utils;
pub mod loader;
pub mod query;
pub mod records;
pub mod relationships;
pub mod shell;
pub mod store;
pub mod synth;
pub mod table;
pub mod value;

use std::{env, io, sync::OnceLock};

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::{LevelFilter, debug, info};

use crate::{
    cli::{Cli, Commands, SessionArgs},
    shell::Session,
    store::Store,
};

pub use crate::{
    classify::{TypeTag, classify},
    error::{IngestError, MutationError, QueryError, SchemaError},
    ingest::{ConflictPolicy, IngestOptions, IngestReport, IngestRequest},
    introspect::{Column, DatabaseInfo, TableInfo},
    relationships::{Relationship, infer_relationships},
    value::{CellValue, Row, RowSet},
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("csv_relational", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Describe(args) => handle_describe(&args),
        Commands::Query(args) => handle_query(&args),
        Commands::Export(args) => handle_export(&args),
        Commands::Shell(args) => handle_shell(&args),
    }
}

/// Opens a fresh store and ingests every input file into it.
pub fn open_session(args: &SessionArgs) -> Result<Store> {
    let store = Store::open_in_memory().context("Opening in-memory store")?;
    let options = args.ingest_options();
    for input in &args.inputs {
        info!(
            "Loading '{}' with delimiter '{}'",
            input.display(),
            printable_delimiter(io_utils::resolve_input_delimiter(input, options.delimiter))
        );
        let report = ingest::ingest_path(&store, input, &options)
            .with_context(|| format!("Ingesting {input:?}"))?;
        debug!(
            "Table '{}' now has columns {:?}",
            report.table,
            report
                .columns
                .iter()
                .map(|c| format!("{}:{}", c.name, c.declared_type))
                .collect::<Vec<_>>()
        );
    }
    Ok(store)
}

fn handle_describe(args: &cli::DescribeArgs) -> Result<()> {
    let store = open_session(&args.session)?;
    let info = introspect::describe_database(&store).context("Describing database")?;
    if args.json {
        let stdout = io::stdout();
        serde_json::to_writer_pretty(stdout.lock(), &info).context("Writing JSON")?;
        println!();
    } else {
        print!("{}", shell::render_description(&info));
    }
    Ok(())
}

fn handle_query(args: &cli::QueryArgs) -> Result<()> {
    let store = open_session(&args.session)?;
    let set = query::run_query(&store, &args.sql).context("Running query")?;
    if args.table {
        print!("{}", table::render_rows(&set));
        return Ok(());
    }
    if set.columns.is_empty() {
        return Ok(());
    }
    let mut writer = csv::Writer::from_writer(io::stdout());
    writer.write_record(&set.columns)?;
    for row in set.display_rows() {
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}

fn handle_export(args: &cli::ExportArgs) -> Result<()> {
    let store = open_session(&args.session)?;
    let sink = io_utils::open_output(args.output.as_deref())
        .with_context(|| format!("Opening output {:?}", args.output))?;
    query::export_table(&store, &args.table_name, sink)
        .with_context(|| format!("Exporting table '{}'", args.table_name))?;
    Ok(())
}

fn handle_shell(args: &cli::ShellArgs) -> Result<()> {
    let store = open_session(&args.session)?;
    let session = Session::new(store, args.session.ingest_options());
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut stderr = io::stderr();
    let failures = session.run(stdin.lock(), &mut stdout, &mut stderr)?;
    if failures > 0 {
        bail!("{failures} command(s) failed");
    }
    Ok(())
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        b'\n' => "\\n".to_string(),
        other => (other as char).to_string(),
    }
}
