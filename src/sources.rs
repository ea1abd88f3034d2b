//! Record sources: JSON, JSON Lines and CSV files.

use crate::value::Value;
use clap::ValueEnum;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Failed to read '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid JSON in '{path}': {reason}")]
    Json { path: String, reason: String },
    #[error("Invalid CSV in '{path}': {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },
    #[error("'{path}' does not contain records (expected objects, found {found})")]
    NotRecords { path: String, found: &'static str },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum InputFormat {
    /// Pick the format from the file extension
    #[default]
    Auto,
    /// A JSON array of objects, or a single object
    Json,
    /// One JSON object per line
    Jsonl,
    /// Comma separated values with a header row
    Csv,
}

impl InputFormat {
    /// Resolve `Auto` from the file extension; unknown extensions read as JSON.
    pub fn resolve(self, path: &Path) -> InputFormat {
        if self != InputFormat::Auto {
            return self;
        }
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("csv") => InputFormat::Csv,
            Some("jsonl" | "ndjson") => InputFormat::Jsonl,
            _ => InputFormat::Json,
        }
    }
}

/// Records loaded from one source, with their column order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    /// Header order for CSV, first-seen top-level keys otherwise
    pub columns: Vec<String>,
    pub records: Vec<Value>,
}

impl Dataset {
    pub fn new(records: Vec<Value>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for record in &records {
            if let Value::Map(map) = record {
                for key in map.keys() {
                    if !columns.contains(key) {
                        columns.push(key.clone());
                    }
                }
            }
        }
        Self { columns, records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Load a dataset from a file.
pub fn load(path: &Path, format: InputFormat) -> Result<Dataset, SourceError> {
    let display = path.display().to_string();
    let file = File::open(path).map_err(|source| SourceError::Read {
        path: display.clone(),
        source,
    })?;
    let reader = BufReader::new(file);
    match format.resolve(path) {
        InputFormat::Csv => read_csv(reader, &display),
        InputFormat::Jsonl => read_jsonl(reader, &display),
        InputFormat::Json | InputFormat::Auto => read_json(reader, &display),
    }
}

/// JSON is parsed leniently: comments and trailing commas are accepted.
pub fn read_json(mut reader: impl Read, path: &str) -> Result<Dataset, SourceError> {
    let mut raw = String::new();
    reader
        .read_to_string(&mut raw)
        .map_err(|source| SourceError::Read {
            path: path.to_string(),
            source,
        })?;
    let parsed = json5::from_str::<serde_json::Value>(&raw).map_err(|err| SourceError::Json {
        path: path.to_string(),
        reason: err.to_string(),
    })?;
    let records = match Value::from(parsed) {
        Value::List(items) => items,
        map @ Value::Map(_) => vec![map],
        other => {
            return Err(SourceError::NotRecords {
                path: path.to_string(),
                found: other.kind(),
            });
        }
    };
    if let Some(bad) = records.iter().find(|r| !matches!(r, Value::Map(_))) {
        return Err(SourceError::NotRecords {
            path: path.to_string(),
            found: bad.kind(),
        });
    }
    Ok(Dataset::new(records))
}

pub fn read_jsonl(reader: impl BufRead, path: &str) -> Result<Dataset, SourceError> {
    let mut records = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(|source| SourceError::Read {
            path: path.to_string(),
            source,
        })?;
        if line.trim().is_empty() {
            continue;
        }
        let parsed: serde_json::Value =
            serde_json::from_str(&line).map_err(|err| SourceError::Json {
                path: path.to_string(),
                reason: format!("line {}: {err}", index + 1),
            })?;
        match Value::from(parsed) {
            map @ Value::Map(_) => records.push(map),
            other => {
                return Err(SourceError::NotRecords {
                    path: path.to_string(),
                    found: other.kind(),
                });
            }
        }
    }
    Ok(Dataset::new(records))
}

/// Every CSV cell is read as a string; the evaluators convert on demand.
pub fn read_csv(reader: impl Read, path: &str) -> Result<Dataset, SourceError> {
    let csv_error = |source| SourceError::Csv {
        path: path.to_string(),
        source,
    };
    let mut csv_reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let columns: Vec<String> = csv_reader
        .headers()
        .map_err(csv_error)?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for row in csv_reader.records() {
        let row = row.map_err(csv_error)?;
        rows.push(row.iter().map(Value::from).collect());
    }
    let records = crate::record::records_from_rows(&columns, rows);
    Ok(Dataset { columns, records })
}
