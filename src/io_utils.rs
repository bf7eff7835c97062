//! CSV input decoding and output sinks.
//!
//! - **Delimiter resolution**: `.tsv` files default to tab, everything else to
//!   comma, with a manual override.
//! - **Encoding**: input bytes are decoded via `encoding_rs`, defaulting to
//!   UTF-8.
//! - **Records**: rows may have differing lengths here; arity is judged by the
//!   loader against the target table.
//! - **stdout**: the `-` path convention (or no path) writes to stdout.

use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};

use encoding_rs::{Encoding, UTF_8};

use crate::error::IngestError;

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';

/// Header plus data rows of one CSV document, all fields as text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvDocument {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding, IngestError> {
    match label {
        Some(value) => Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| IngestError::Encoding(value.to_string())),
        None => Ok(UTF_8),
    }
}

pub fn resolve_input_delimiter(path: &Path, provided: Option<u8>) -> u8 {
    provided.unwrap_or_else(|| match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => DEFAULT_TSV_DELIMITER,
        _ => DEFAULT_CSV_DELIMITER,
    })
}

pub fn open_csv_reader<R: Read>(reader: R, delimiter: u8) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .has_headers(false)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(true)
        .from_reader(reader)
}

fn decode_record(
    record: &csv::ByteRecord,
    encoding: &'static Encoding,
) -> Result<Vec<String>, IngestError> {
    record
        .iter()
        .map(|field| {
            let (text, _, had_errors) = encoding.decode(field);
            if had_errors {
                Err(IngestError::Encoding(encoding.name().to_string()))
            } else {
                Ok(text.into_owned())
            }
        })
        .collect()
}

/// Splits `reader` into a header row and data rows. An input without a
/// header row is [`IngestError::Empty`].
pub fn read_csv<R: Read>(
    reader: R,
    delimiter: u8,
    encoding: &'static Encoding,
) -> Result<CsvDocument, IngestError> {
    let mut csv_reader = open_csv_reader(reader, delimiter);
    let mut records = csv_reader.byte_records();
    let headers = match records.next() {
        Some(record) => decode_record(&record?, encoding)?,
        None => return Err(IngestError::Empty),
    };
    let rows = records
        .map(|record| decode_record(&record?, encoding))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(CsvDocument { headers, rows })
}

pub fn read_csv_path(
    path: &Path,
    delimiter: u8,
    encoding: &'static Encoding,
) -> Result<CsvDocument, IngestError> {
    let file = File::open(path)?;
    read_csv(BufReader::new(file), delimiter, encoding)
}

pub fn open_output(path: Option<&Path>) -> std::io::Result<Box<dyn Write>> {
    Ok(match path {
        Some(p) if !is_dash(p) => Box::new(BufWriter::new(File::create(p)?)),
        _ => Box::new(std::io::stdout()),
    })
}
