//! Reader for the comma-separated sensor logs recorded during a trip.

use csv::{ReaderBuilder, StringRecord, Trim};
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, warn};

use crate::error::{PipelineError, PipelineResult};

/// The header and raw data rows of one log file.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    headers: StringRecord,
    rows: Vec<StringRecord>,
}

impl Frame {
    pub fn new(headers: StringRecord, rows: Vec<StringRecord>) -> Self {
        Self { headers, rows }
    }

    pub fn headers(&self) -> &StringRecord {
        &self.headers
    }

    pub fn rows(&self) -> &[StringRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.headers.iter().any(|h| h == name)
    }

    /// Deserializes every row into `T`, matching fields by column name.
    pub fn deserialize<T: DeserializeOwned>(&self) -> PipelineResult<Vec<T>> {
        self.rows
            .iter()
            .map(|row| row.deserialize(Some(&self.headers)).map_err(PipelineError::from))
            .collect()
    }
}

/// Reads a log file with a header row.
///
/// Returns `Ok(None)` when the file has a header but no data rows.
///
/// # Errors
///
/// [`PipelineError::NotFound`] if the file does not exist and
/// [`PipelineError::EmptyData`] if it has no header row.
pub fn read_frame(path: &Path) -> PipelineResult<Option<Frame>> {
    let file = File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => PipelineError::NotFound(path.to_path_buf()),
        _ => PipelineError::Io(e),
    })?;

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(file);

    let headers = reader.headers()?.clone();
    if headers.is_empty() {
        return Err(PipelineError::EmptyData(path.to_path_buf()));
    }

    let rows = reader.records().collect::<Result<Vec<_>, _>>()?;
    debug!(path = %path.display(), rows = rows.len(), "Log file read");

    if rows.is_empty() {
        return Ok(None);
    }
    Ok(Some(Frame::new(headers, rows)))
}

/// Like [`read_frame`], but a missing or empty file is reported as "no
/// data" instead of an error.
pub fn read_data_file(path: &Path) -> PipelineResult<Option<Frame>> {
    match read_frame(path) {
        Ok(None) => {
            warn!(path = %path.display(), "Log file has no data rows");
            Ok(None)
        }
        Err(e @ (PipelineError::NotFound(_) | PipelineError::EmptyData(_))) => {
            warn!(error = %e, "Log file unusable");
            Ok(None)
        }
        other => other,
    }
}
