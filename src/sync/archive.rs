//! Archive detection and extraction.
//!
//! Classification is purely by filename suffix, matched case-sensitively:
//! a provider that hands back `Pack.RAR` gets it moved as a plain file
//! rather than guessed at. zip and tar variants are unpacked in-process
//! on the blocking pool; rar shells out to `unrar`.

use std::path::Path;

use bzip2::read::BzDecoder;
use flate2::read::GzDecoder;
use tokio::process::Command;

use super::error::{ExtractError, SyncError};
use crate::progress::ProgressSink;

/// Filename suffixes treated as archives.
pub const ARCHIVE_SUFFIXES: [&str; 6] = [".zip", ".tar", ".tar.gz", ".tgz", ".tar.bz2", ".rar"];

pub fn is_archive(path: &Path) -> bool {
    let name = file_name_str(path);
    ARCHIVE_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
}

fn file_name_str(path: &Path) -> &str {
    path.file_name().and_then(|n| n.to_str()).unwrap_or_default()
}

#[derive(Clone, Copy)]
enum TarCompression {
    Plain,
    Gzip,
    Bzip2,
}

/// Unpacks `path` into `dest_dir`, choosing the handler by suffix.
pub async fn extract(
    path: &Path,
    dest_dir: &Path,
    sink: &dyn ProgressSink,
) -> Result<(), ExtractError> {
    let name = file_name_str(path);
    if name.ends_with(".zip") {
        sink.emit(&format!("  [Extract] Unzipping {name}"));
        extract_zip(path, dest_dir).await
    } else if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
        sink.emit(&format!("  [Extract] Untarring {name}"));
        extract_tar(path, dest_dir, TarCompression::Gzip).await
    } else if name.ends_with(".tar.bz2") {
        sink.emit(&format!("  [Extract] Untarring {name}"));
        extract_tar(path, dest_dir, TarCompression::Bzip2).await
    } else if name.ends_with(".tar") {
        sink.emit(&format!("  [Extract] Untarring {name}"));
        extract_tar(path, dest_dir, TarCompression::Plain).await
    } else if name.ends_with(".rar") {
        sink.emit(&format!("  [Extract] Unraring {name} (requires 'unrar' in PATH)"));
        extract_rar(path, dest_dir).await
    } else {
        Err(ExtractError::UnsupportedFormat(name.to_string()))
    }
}

async fn extract_zip(archive: &Path, dest_dir: &Path) -> Result<(), ExtractError> {
    let archive = archive.to_path_buf();
    let dest = dest_dir.to_path_buf();
    tokio::task::spawn_blocking(move || -> Result<(), ExtractError> {
        let file = std::fs::File::open(&archive)?;
        let mut zip = zip::ZipArchive::new(file).map_err(|e| ExtractError::Zip(e.to_string()))?;
        zip.extract(&dest).map_err(|e| ExtractError::Zip(e.to_string()))
    })
    .await?
}

async fn extract_tar(
    archive: &Path,
    dest_dir: &Path,
    compression: TarCompression,
) -> Result<(), ExtractError> {
    let archive = archive.to_path_buf();
    let dest = dest_dir.to_path_buf();
    tokio::task::spawn_blocking(move || -> Result<(), ExtractError> {
        let file = std::fs::File::open(&archive)?;
        let reader: Box<dyn std::io::Read> = match compression {
            TarCompression::Plain => Box::new(file),
            TarCompression::Gzip => Box::new(GzDecoder::new(file)),
            TarCompression::Bzip2 => Box::new(BzDecoder::new(file)),
        };
        tar::Archive::new(reader)
            .unpack(&dest)
            .map_err(|e| ExtractError::Tar(e.to_string()))
    })
    .await?
}

async fn extract_rar(archive: &Path, dest_dir: &Path) -> Result<(), ExtractError> {
    let unrar = which::which("unrar").map_err(|_| ExtractError::UnrarMissing)?;
    let output = Command::new(unrar)
        .arg("x")
        .arg("-o+")
        .arg(archive)
        .arg(dest_dir)
        .output()
        .await?;
    if !output.status.success() {
        return Err(ExtractError::UnrarFailed {
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(())
}

/// Places a fetched file at its destination: archives are unpacked into
/// `dest_dir`, anything else is moved in keeping its name.
pub async fn materialize(
    file: &Path,
    dest_dir: &Path,
    sink: &dyn ProgressSink,
) -> Result<(), SyncError> {
    if is_archive(file) {
        if let Err(e) = extract(file, dest_dir, sink).await {
            sink.emit(&format!("  [Extract] ERROR: {e}"));
            return Err(SyncError::Extract(e));
        }
        return Ok(());
    }
    if let Err(e) = move_into(file, dest_dir, sink).await {
        sink.emit(&format!("  [Move] ERROR: {e}"));
        return Err(SyncError::Filesystem(e));
    }
    Ok(())
}

async fn move_into(file: &Path, dest_dir: &Path, sink: &dyn ProgressSink) -> std::io::Result<()> {
    let Some(name) = file.file_name() else {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("No file name in {}", file.display()),
        ));
    };
    sink.emit(&format!(
        "  [Move] {} → {}",
        name.to_string_lossy(),
        dest_dir.display()
    ));
    let target = dest_dir.join(name);
    match tokio::fs::rename(file, &target).await {
        Ok(()) => Ok(()),
        Err(e) => {
            // Rename cannot cross filesystems; staging and destination may
            // be on different mounts.
            tracing::debug!(
                "Rename to {} failed ({}), copying instead",
                target.display(),
                e
            );
            tokio::fs::copy(file, &target).await?;
            let _ = tokio::fs::remove_file(file).await;
            Ok(())
        }
    }
}

/// Stored zip holding `text.txt` with `"Hello, World\n"`. Shared with the
/// pipeline tests.
#[cfg(test)]
pub(crate) const HELLO_WORLD_ZIP: &[u8] = &[
    80, 75, 3, 4, 10, 0, 0, 0, 0, 0, 244, 123, 36, 88, 144, 58, 246, 64, 13, 0, 0, 0, 13, 0, 0, 0,
    8, 0, 28, 0, 116, 101, 120, 116, 46, 116, 120, 116, 85, 84, 9, 0, 3, 4, 130, 150, 101, 6, 130,
    150, 101, 117, 120, 11, 0, 1, 4, 245, 1, 0, 0, 4, 20, 0, 0, 0, 72, 101, 108, 108, 111, 44, 32,
    87, 111, 114, 108, 100, 10, 80, 75, 1, 2, 30, 3, 10, 0, 0, 0, 0, 0, 244, 123, 36, 88, 144, 58,
    246, 64, 13, 0, 0, 0, 13, 0, 0, 0, 8, 0, 24, 0, 0, 0, 0, 0, 0, 0, 0, 0, 164, 129, 0, 0, 0, 0,
    116, 101, 120, 116, 46, 116, 120, 116, 85, 84, 5, 0, 3, 4, 130, 150, 101, 117, 120, 11, 0, 1,
    4, 245, 1, 0, 0, 4, 20, 0, 0, 0, 80, 75, 5, 6, 0, 0, 0, 0, 1, 0, 1, 0, 78, 0, 0, 0, 79, 0, 0,
    0, 0, 0,
];
