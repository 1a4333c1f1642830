//! Delimited flat-record source.
//!
//! One record per line, `key<d>subkey<d>value` with a single-character
//! delimiter `<d>` (`;` by default). Values are taken verbatim; only the line
//! terminator is stripped.

use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

use crate::contract::{CollaboratorError, FlatRecord, RecordSource};
use crate::error::MappingError;

pub const DEFAULT_DELIMITER: char = ';';

/// Parse delimited text into flat records, in line order.
///
/// Every line must split into exactly three parts, otherwise the whole parse
/// fails with [`MappingError::MalformedRecord`].
pub fn parse_records(text: &str, delimiter: char) -> Result<Vec<FlatRecord>, MappingError> {
    let mut records = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let parts: Vec<&str> = line.split(delimiter).collect();
        match parts.as_slice() {
            [key, subkey, value] => records.push(FlatRecord::new(line_no, key, subkey, value)),
            _ => {
                error!(line = line_no, parts = parts.len(), "Malformed record line");
                return Err(MappingError::MalformedRecord {
                    line: line_no,
                    content: line.to_string(),
                    parts: parts.len(),
                });
            }
        }
    }
    Ok(records)
}

/// Record source reading a delimited text file from disk.
pub struct DelimitedFile {
    path: PathBuf,
    delimiter: char,
}

impl DelimitedFile {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            delimiter: DEFAULT_DELIMITER,
        }
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }
}

#[async_trait::async_trait]
impl RecordSource for DelimitedFile {
    async fn read_records(&self) -> Result<Vec<FlatRecord>, CollaboratorError> {
        info!(path = %self.path.display(), delimiter = %self.delimiter, "Reading metadata records");
        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            error!(error = ?e, path = %self.path.display(), "Failed to read records file");
            format!("failed to read records file {}: {e}", self.path.display())
        })?;
        let records = parse_records(&content, self.delimiter)?;
        debug!(count = records.len(), "Parsed metadata records");
        Ok(records)
    }
}
