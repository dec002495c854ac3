use thiserror::Error;
use tokio::task::JoinError;

use crate::provider::FetchError;

/// Archive extraction failures.
///
/// Format-library errors are carried as strings so one enum can cover
/// zip, tar and the external unrar without leaking their error types.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Zip extraction failed: {0}")]
    Zip(String),

    #[error("Tar extraction failed: {0}")]
    Tar(String),

    #[error("'unrar' not found in PATH")]
    UnrarMissing,

    #[error("unrar exited with {status}: {stderr}")]
    UnrarFailed {
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("Unknown format: {0}")]
    UnsupportedFormat(String),

    #[error("Disk error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Extraction task failed: {0}")]
    Join(#[from] JoinError),
}

/// A record-scoped pipeline failure.
///
/// Each variant maps to one stage of processing; the pipeline turns it
/// into a skip reason and carries on with the next record.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Unknown provider type '{0}'")]
    UnknownProvider(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error("Filesystem error: {0}")]
    Filesystem(#[from] std::io::Error),
}
