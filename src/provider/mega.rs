use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

use super::error::FetchError;
use super::{single_output_file, Provider};
use crate::progress::ProgressSink;

/// Mega.nz downloads via the external megatools CLI.
///
/// The tool is invoked as `<tool> dl --path <dest> <url>` with its stdout
/// streamed to the progress sink line by line.
pub struct MegaProvider {
    tool_path: PathBuf,
}

impl MegaProvider {
    /// `tool_path` overrides the bundled default of
    /// `<exe dir>/Tools/megatools/<binary>`.
    pub fn new(tool_path: Option<PathBuf>) -> Self {
        Self {
            tool_path: tool_path.unwrap_or_else(default_tool_path),
        }
    }

    async fn fetch_inner(
        &self,
        url: &str,
        dest_dir: &Path,
        sink: &dyn ProgressSink,
    ) -> Result<PathBuf, FetchError> {
        sink.emit(&format!(
            "  [Mega] Running: {} dl --path {} {}",
            self.tool_path.display(),
            dest_dir.display(),
            url
        ));

        let mut child = Command::new(&self.tool_path)
            .arg("dl")
            .arg("--path")
            .arg(dest_dir)
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => FetchError::ToolMissing {
                    path: self.tool_path.clone(),
                },
                _ => FetchError::Spawn {
                    path: self.tool_path.clone(),
                    source: e,
                },
            })?;

        // Drain stdout live so transfer progress streams as it happens;
        // stderr stays buffered until exit (megatools keeps it short).
        if let Some(stdout) = child.stdout.take() {
            let mut lines = BufReader::new(stdout).lines();
            while let Some(line) = lines.next_line().await? {
                let line = line.trim_end();
                if !line.is_empty() {
                    sink.emit(&format!("  [Mega] {line}"));
                }
            }
        }

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            return Err(FetchError::ToolFailed {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        single_output_file(dest_dir).await
    }
}

fn default_tool_path() -> PathBuf {
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."));
    let binary = if cfg!(windows) { "megatools.exe" } else { "megadl" };
    exe_dir.join("Tools").join("megatools").join(binary)
}

#[async_trait]
impl Provider for MegaProvider {
    fn name(&self) -> &'static str {
        "Mega"
    }

    async fn fetch(
        &self,
        url: &str,
        dest_dir: &Path,
        sink: &dyn ProgressSink,
    ) -> Result<PathBuf, FetchError> {
        match self.fetch_inner(url, dest_dir, sink).await {
            Ok(path) => Ok(path),
            Err(e) => {
                sink.emit(&format!("  [Mega] ERROR: {e}"));
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Collector(Mutex<Vec<String>>);

    impl ProgressSink for Collector {
        fn emit(&self, line: &str) {
            self.0.lock().unwrap().push(line.to_string());
        }
    }

    impl Collector {
        fn lines(&self) -> Vec<String> {
            self.0.lock().unwrap().clone()
        }
    }

    #[test]
    fn test_default_path_points_at_bundled_tools() {
        let path = default_tool_path();
        assert!(path.ends_with(if cfg!(windows) {
            "Tools/megatools/megatools.exe"
        } else {
            "Tools/megatools/megadl"
        }));
    }

    #[tokio::test]
    async fn test_missing_tool_is_reported_with_path() {
        let sink = Collector::default();
        let dir = tempfile::tempdir().unwrap();
        let provider = MegaProvider::new(Some(PathBuf::from("/nonexistent/megadl")));

        let err = provider
            .fetch("https://mega.nz/file/abc", dir.path(), &sink)
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::ToolMissing { .. }));
        assert!(sink.lines().iter().any(|l| {
            l.starts_with("  [Mega] ERROR: Download tool not found at '/nonexistent/megadl'")
        }));
    }

    // The remaining tests stand in a shell script for megatools; they only
    // make sense where scripts are executable.
    #[cfg(unix)]
    mod scripted {
        use super::*;
        use std::os::unix::fs::PermissionsExt;

        fn write_script(dir: &Path, body: &str) -> PathBuf {
            let path = dir.join("fake-megatools");
            std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
            let mut perms = std::fs::metadata(&path).unwrap().permissions();
            perms.set_mode(0o755);
            std::fs::set_permissions(&path, perms).unwrap();
            path
        }

        #[tokio::test]
        async fn test_successful_download_streams_stdout() {
            let tool_dir = tempfile::tempdir().unwrap();
            let dest = tempfile::tempdir().unwrap();
            // $1=dl $2=--path $3=dest $4=url
            let script = write_script(
                tool_dir.path(),
                "echo \"downloading $4\"\nprintf 'payload' > \"$3/asset.bin\"",
            );
            let sink = Collector::default();

            let provider = MegaProvider::new(Some(script));
            let path = provider
                .fetch("https://mega.nz/file/abc", dest.path(), &sink)
                .await
                .unwrap();

            assert_eq!(path, dest.path().join("asset.bin"));
            let lines = sink.lines();
            assert!(lines[0].starts_with("  [Mega] Running: "));
            assert!(lines
                .iter()
                .any(|l| l == "  [Mega] downloading https://mega.nz/file/abc"));
        }

        #[tokio::test]
        async fn test_nonzero_exit_surfaces_stderr() {
            let tool_dir = tempfile::tempdir().unwrap();
            let dest = tempfile::tempdir().unwrap();
            let script = write_script(tool_dir.path(), "echo 'boom' >&2\nexit 3");
            let sink = Collector::default();

            let provider = MegaProvider::new(Some(script));
            let err = provider
                .fetch("https://mega.nz/file/abc", dest.path(), &sink)
                .await
                .unwrap_err();

            match err {
                FetchError::ToolFailed { status, stderr } => {
                    assert_eq!(status.code(), Some(3));
                    assert_eq!(stderr, "boom");
                }
                other => panic!("unexpected error: {other}"),
            }
            assert!(sink.lines().iter().any(|l| l.contains("boom")));
        }

        #[tokio::test]
        async fn test_clean_exit_without_output_violates_contract() {
            let tool_dir = tempfile::tempdir().unwrap();
            let dest = tempfile::tempdir().unwrap();
            let script = write_script(tool_dir.path(), "exit 0");
            let sink = Collector::default();

            let provider = MegaProvider::new(Some(script));
            let err = provider
                .fetch("https://mega.nz/file/abc", dest.path(), &sink)
                .await
                .unwrap_err();
            assert!(matches!(err, FetchError::OutputContract { count: 0 }));
        }

        #[tokio::test]
        async fn test_multiple_outputs_violate_contract() {
            let tool_dir = tempfile::tempdir().unwrap();
            let dest = tempfile::tempdir().unwrap();
            let script = write_script(tool_dir.path(), "touch \"$3/a\" \"$3/b\"");
            let sink = Collector::default();

            let provider = MegaProvider::new(Some(script));
            let err = provider
                .fetch("https://mega.nz/file/abc", dest.path(), &sink)
                .await
                .unwrap_err();
            assert!(matches!(err, FetchError::OutputContract { count: 2 }));
        }
    }
}
