// src/output/dataset.rs
// =============================================================================
// Serializes the whole dataset as one pretty-printed JSON array.
// =============================================================================

use std::path::Path;

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use tracing::info;

use crate::error::ExportError;
use crate::export::IssueRecord;

/// Writes `records` to `path` and returns how many were written.
///
/// Parameters:
///   records: the whole dataset, every repository
///   path: the output file; its parent directory must already exist
///
/// Returns: the record count, or a Write error naming `path`
///
/// An empty dataset still produces a valid document (`[]`).
pub async fn write_dataset(records: &[IssueRecord], path: &Path) -> Result<usize, ExportError> {
    // Serialize into memory first, so a serializer error never leaves a
    // truncated file behind
    let mut buffer = Vec::new();
    // One-space indentation (serde_json's to_string_pretty would use two)
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(b" "));
    records.serialize(&mut serializer)?;

    // One write call replaces any existing file
    tokio::fs::write(path, &buffer)
        .await
        .map_err(|source| ExportError::Write {
            path: path.to_path_buf(),
            source,
        })?;

    info!(count = records.len(), path = %path.display(), "exported issues");
    Ok(records.len())
}
