//! Error types for trace parsing.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal trace errors.
///
/// Malformed records are never errors; they are skipped and counted in
/// `ParsedTrace::skipped_records`.
#[derive(Debug, Error)]
pub enum TraceError {
    /// The stream could not be read.
    #[error("failed to read trace: {0}")]
    Io(#[from] std::io::Error),

    /// The file could not be opened.
    #[error("failed to open trace file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
