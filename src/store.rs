//! Persistent asset catalog.
//!
//! Records live in a single `Database.json` under the config directory,
//! shaped for hand editing:
//!
//! ```json
//! { "Assets": [ { "Name": "...", "Location": "...", "Type": "...", "URL": "..." } ] }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DATABASE_FILE: &str = "Database.json";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid JSON in {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Asset '{name}' not found. Available assets: {available:?}")]
    UnknownAsset {
        name: String,
        available: Vec<String>,
    },
}

/// One declared asset: where it comes from and where it lands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRecord {
    /// Unique display name; doubles as the temp workspace directory name.
    #[serde(rename = "Name")]
    pub name: String,
    /// Destination directory, relative to the project root.
    #[serde(rename = "Location")]
    pub location: String,
    /// Provider tag, e.g. "Mega" or "HTTP". Matched case-sensitively.
    #[serde(rename = "Type")]
    pub kind: String,
    /// Source URL handed verbatim to the provider.
    #[serde(rename = "URL")]
    pub url: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Database {
    #[serde(rename = "Assets", default)]
    assets: Vec<AssetRecord>,
}

fn database_path(config_dir: &Path) -> PathBuf {
    config_dir.join(DATABASE_FILE)
}

/// Loads all records from `Database.json`, in file order.
///
/// A missing file is an empty catalog, not an error.
pub async fn load_records(config_dir: &Path) -> Result<Vec<AssetRecord>, StoreError> {
    let path = database_path(config_dir);
    let raw = match tokio::fs::read_to_string(&path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(StoreError::Read { path, source: e }),
    };
    let db: Database =
        serde_json::from_str(&raw).map_err(|e| StoreError::Parse { path, source: e })?;
    Ok(db.assets)
}

/// Writes the full record list back, pretty-printed, creating the config
/// directory if needed.
pub async fn save_records(config_dir: &Path, records: &[AssetRecord]) -> Result<(), StoreError> {
    let path = database_path(config_dir);
    tokio::fs::create_dir_all(config_dir)
        .await
        .map_err(|e| StoreError::Write {
            path: path.clone(),
            source: e,
        })?;
    let db = Database {
        assets: records.to_vec(),
    };
    let raw = serde_json::to_string_pretty(&db).map_err(|e| StoreError::Parse {
        path: path.clone(),
        source: e,
    })?;
    tokio::fs::write(&path, raw)
        .await
        .map_err(|e| StoreError::Write { path, source: e })
}

/// Narrows a catalog to the named subset, preserving catalog order.
///
/// An empty `names` slice selects everything. An unknown name fails the
/// whole selection so a typo cannot silently sync nothing.
pub fn select_records(
    records: Vec<AssetRecord>,
    names: &[String],
) -> Result<Vec<AssetRecord>, StoreError> {
    if names.is_empty() {
        return Ok(records);
    }
    for name in names {
        if !records.iter().any(|r| &r.name == name) {
            return Err(StoreError::UnknownAsset {
                name: name.clone(),
                available: records.into_iter().map(|r| r.name).collect(),
            });
        }
    }
    Ok(records
        .into_iter()
        .filter(|r| names.contains(&r.name))
        .collect())
}
