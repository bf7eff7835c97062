#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use csv_relational::{IngestOptions, IngestReport, IngestRequest, store::Store};
use tempfile::{TempDir, tempdir};

/// Scratch directory for CSV inputs and exports, removed on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }
}

pub fn request(table: &str, headers: &[&str], rows: Vec<Vec<&str>>) -> IngestRequest {
    IngestRequest {
        table_hint: table.to_string(),
        headers: headers.iter().map(|h| h.to_string()).collect(),
        rows: rows
            .into_iter()
            .map(|row| row.into_iter().map(str::to_string).collect())
            .collect(),
    }
}

pub fn ingest(store: &Store, table: &str, headers: &[&str], rows: Vec<Vec<&str>>) -> IngestReport {
    csv_relational::ingest::ingest(store, &request(table, headers, rows), &IngestOptions::default())
        .expect("ingest succeeds")
}
