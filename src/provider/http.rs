use std::path::{Path, PathBuf};

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::{Client, Url};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

use super::error::FetchError;
use super::Provider;
use crate::progress::ProgressSink;

const USER_AGENT: &str = concat!("assetpull/", env!("CARGO_PKG_VERSION"));

/// Direct HTTP(S) downloads, streamed to disk chunk by chunk.
pub struct HttpProvider {
    client: Client,
}

impl HttpProvider {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self { client })
    }

    async fn fetch_inner(
        &self,
        url: &str,
        dest_dir: &Path,
        sink: &dyn ProgressSink,
    ) -> Result<PathBuf, FetchError> {
        let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        let dest_file = dest_dir.join(file_name_from_url(&parsed));

        sink.emit(&format!("  [HTTP] Downloading: {url}"));

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| FetchError::Http {
                source: e,
                url: url.to_string(),
                bytes_written: 0,
            })?;
        if !response.status().is_success() {
            return Err(FetchError::HttpStatus {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }
        let total = response.content_length();

        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&dest_file)
            .await?;

        let mut bytes_written: u64 = 0;
        let mut last_pct: Option<u64> = None;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| FetchError::Http {
                source: e,
                url: url.to_string(),
                bytes_written,
            })?;
            file.write_all(&chunk).await?;
            bytes_written += chunk.len() as u64;
            // One line per whole-percent step, not per chunk.
            if let Some(total) = total {
                if total > 0 {
                    let pct = bytes_written * 100 / total;
                    if last_pct != Some(pct) {
                        last_pct = Some(pct);
                        sink.emit(&format!("  [HTTP] {pct}% ({bytes_written}/{total} bytes)"));
                    }
                }
            }
        }
        file.flush().await?;

        sink.emit(&format!("  [HTTP] Saved: {}", dest_file.display()));
        Ok(dest_file)
    }
}

/// Last path segment of the URL, query and fragment excluded. Falls back
/// to `"download"` when the path ends in a slash or has no segments.
fn file_name_from_url(url: &Url) -> String {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|s| !s.is_empty())
        .unwrap_or("download")
        .to_string()
}

#[async_trait]
impl Provider for HttpProvider {
    fn name(&self) -> &'static str {
        "HTTP"
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
                sink.emit(&format!("  [HTTP] ERROR: {e}"));
                Err(e)
            }
        }
    }
}
