//! Caption fetching
//!
//! The loader only sees [`CaptionFetcher`]. [`SourceFetcher`] is the
//! production implementation for HTTP(S) URLs and local files.

use bytes::Bytes;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::FetchConfig;
use crate::error::{FetchError, PlayerError, Result};

/// Reads raw caption bytes from a location
pub trait CaptionFetcher: Send + Sync + 'static {
    fn fetch(&self, location: &str) -> impl Future<Output = std::result::Result<Bytes, FetchError>> + Send;
}

/// Fetches `http://`, `https://`, `file://` and plain filesystem locations
#[derive(Debug, Clone)]
pub struct SourceFetcher {
    client: reqwest::Client,
    base_dir: Option<PathBuf>,
}

impl SourceFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PlayerError::Config(format!("HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_dir: config.base_dir.clone(),
        })
    }

    fn resolve_path(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            // Root-relative page paths ("/captions-en.srt") live under base_dir
            Some(base) if path.has_root() && !path.exists() => {
                base.join(path.strip_prefix("/").unwrap_or(path))
            }
            _ => path.to_path_buf(),
        }
    }

    async fn fetch_http(&self, location: &str) -> std::result::Result<Bytes, FetchError> {
        let response = self
            .client
            .get(location)
            .send()
            .await
            .map_err(|e| FetchError::Transport {
                location: location.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http {
                location: location.to_string(),
                status: status.as_u16(),
            });
        }

        response.bytes().await.map_err(|e| FetchError::Transport {
            location: location.to_string(),
            reason: e.to_string(),
        })
    }

    async fn fetch_file(&self, location: &str, path: &str) -> std::result::Result<Bytes, FetchError> {
        let path = self.resolve_path(path);
        tokio::fs::read(&path)
            .await
            .map(Bytes::from)
            .map_err(|source| FetchError::Io {
                location: location.to_string(),
                source,
            })
    }
}

impl CaptionFetcher for SourceFetcher {
    fn fetch(&self, location: &str) -> impl Future<Output = std::result::Result<Bytes, FetchError>> + Send {
        async move {
            if location.starts_with("http://") || location.starts_with("https://") {
                self.fetch_http(location).await
            } else if let Some(path) = location.strip_prefix("file://") {
                self.fetch_file(location, path).await
            } else if location.contains("://") {
                Err(FetchError::UnsupportedScheme(location.to_string()))
            } else {
                self.fetch_file(location, location).await
            }
        }
    }
}
