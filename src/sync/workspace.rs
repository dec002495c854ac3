use std::path::{Path, PathBuf};

/// Hands out per-record staging directories under a single temp root.
pub struct WorkspaceManager {
    temp_root: PathBuf,
}

impl WorkspaceManager {
    pub fn new(temp_root: impl Into<PathBuf>) -> Self {
        Self {
            temp_root: temp_root.into(),
        }
    }

    /// Creates an empty staging directory named after the record, wiping
    /// any leftover from an earlier crashed or interrupted run first.
    pub async fn acquire(&self, name: &str) -> std::io::Result<Workspace> {
        let path = self.temp_root.join(name);
        match tokio::fs::remove_dir_all(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
        tokio::fs::create_dir_all(&path).await?;
        Ok(Workspace { path })
    }
}

/// An acquired staging directory. Consumed by [`Workspace::release`].
#[derive(Debug)]
pub struct Workspace {
    path: PathBuf,
}

impl Workspace {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Best-effort teardown. Failures are logged and swallowed; a stale
    /// staging directory must never fail the record it belonged to, and
    /// the next acquire wipes it anyway.
    pub async fn release(self) {
        if let Err(e) = tokio::fs::remove_dir_all(&self.path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(
                    "Failed to remove workspace {}: {}",
                    self.path.display(),
                    e
                );
            }
        }
    }
}
