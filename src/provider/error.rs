use std::path::PathBuf;
use thiserror::Error;

/// Typed fetch failures.
///
/// Every variant is record-scoped: the pipeline logs it, skips the record,
/// and moves on. Variants carry enough context (URL, byte counts, tool
/// paths) for the skip reason to be actionable on its own.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("HTTP status {status} fetching {url}")]
    HttpStatus { status: u16, url: String },

    #[error("HTTP error fetching {url} (bytes_so_far={bytes_written}): {source}")]
    Http {
        source: reqwest::Error,
        url: String,
        bytes_written: u64,
    },

    #[error("Disk error: {0}")]
    Disk(#[from] std::io::Error),

    #[error("Download tool not found at '{path}'")]
    ToolMissing { path: PathBuf },

    #[error("Failed to launch '{path}': {source}")]
    Spawn {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Download tool exited with {status}: {stderr}")]
    ToolFailed {
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("Download tool left {count} files in the staging directory, expected exactly one")]
    OutputContract { count: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_missing_names_the_path() {
        let e = FetchError::ToolMissing {
            path: PathBuf::from("/opt/megatools/megadl"),
        };
        assert_eq!(
            e.to_string(),
            "Download tool not found at '/opt/megatools/megadl'"
        );
    }

    #[test]
    fn test_output_contract_counts() {
        let e = FetchError::OutputContract { count: 0 };
        assert!(e.to_string().contains("0 files"));
        let e = FetchError::OutputContract { count: 3 };
        assert!(e.to_string().contains("3 files"));
    }
}
