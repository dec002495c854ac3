use crate::cli::SyncArgs;
use std::path::PathBuf;

/// Resolved settings for one sync invocation.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Project tree the assets are materialized into.
    pub root_dir: PathBuf,
    /// Directory holding `Database.json`.
    pub config_dir: PathBuf,
    /// Scratch root for per-asset staging directories.
    pub temp_dir: PathBuf,
    /// Asset names to sync; empty means all.
    pub assets: Vec<String>,
    /// Explicit megatools binary, when the bundled default is wrong.
    pub megatools_path: Option<PathBuf>,
}

pub(crate) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

impl SyncConfig {
    pub fn from_cli(args: SyncArgs) -> Self {
        let root_dir = expand_tilde(&args.root_folder);
        let config_dir = expand_tilde(&args.config_folder);
        // Staging always sits beside the catalog; not separately configurable.
        let temp_dir = config_dir.join("Temp");
        Self {
            root_dir,
            config_dir,
            temp_dir,
            assets: args.assets,
            megatools_path: args.megatools_path.as_deref().map(expand_tilde),
        }
    }
}
