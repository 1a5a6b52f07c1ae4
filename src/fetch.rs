//! Downloads of remote artifacts.
//!
//! Release metadata, release archives and externally hosted stack definitions
//! all go through [`ArtifactFetcher`], which asks intermediaries for a fresh
//! copy on every request (`Cache-Control: no-cache`) and turns non-success
//! statuses into [`HostshipError::FetchFailed`]. Transport errors are passed
//! through unchanged as [`HostshipError::Http`]. Nothing here retries.

use reqwest::header::{CACHE_CONTROL, HeaderValue};
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::config::current_version;
use crate::constants::HTTP_TIMEOUT;
use crate::core::HostshipError;

/// HTTP client for cache-busting GET requests.
#[derive(Debug, Clone)]
pub struct ArtifactFetcher {
    client: reqwest::Client,
}

impl ArtifactFetcher {
    /// Build a fetcher with the default timeout.
    pub fn new() -> Result<Self, HostshipError> {
        let client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .user_agent(format!("hostship/{}", current_version()))
            .build()?;
        Ok(Self {
            client,
        })
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, HostshipError> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .header(CACHE_CONTROL, HeaderValue::from_static("no-cache"))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(HostshipError::FetchFailed {
                url: url.to_string(),
                status: status.to_string(),
            });
        }
        Ok(response)
    }

    /// Fetch the whole body of `url`.
    pub async fn fetch(&self, url: &str) -> Result<Vec<u8>, HostshipError> {
        let body = self.get(url).await?.bytes().await?;
        debug!("Fetched {} bytes from {}", body.len(), url);
        Ok(body.to_vec())
    }

    /// Stream `url` into `dest`, replacing any existing file.
    ///
    /// Returns the number of bytes written.
    pub async fn fetch_to_file(&self, url: &str, dest: &Path) -> Result<u64, HostshipError> {
        let mut response = self.get(url).await?;
        let mut file = fs::File::create(dest).await?;
        let mut written = 0u64;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        debug!("Wrote {} bytes from {} to {}", written, url, dest.display());
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::StaticServer;
    use axum::http::StatusCode;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_fetch_sends_no_cache_header() {
        let server = StaticServer::spawn().await;
        server.serve("/prod/metadata.json", StatusCode::OK, br#"{"version":"1.2.3"}"#.to_vec());

        let fetcher = ArtifactFetcher::new().unwrap();
        let body = fetcher.fetch(&server.url("/prod/metadata.json")).await.unwrap();

        assert_eq!(body, br#"{"version":"1.2.3"}"#);
        let seen = server.requests();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].cache_control.as_deref(), Some("no-cache"));
    }

    #[tokio::test]
    async fn test_non_success_status_is_fetch_error() {
        let server = StaticServer::spawn().await;
        let url = server.url("/missing");

        let err = ArtifactFetcher::new().unwrap().fetch(&url).await.unwrap_err();
        match err {
            HostshipError::FetchFailed {
                url: failed,
                status,
            } => {
                assert_eq!(failed, url);
                assert_eq!(status, "404 Not Found");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_transport_error_passes_through() {
        // Port 9 (discard) is closed on test hosts.
        let err = ArtifactFetcher::new().unwrap().fetch("http://127.0.0.1:9/x").await.unwrap_err();
        assert!(matches!(err, HostshipError::Http(_)));
    }

    #[tokio::test]
    async fn test_fetch_to_file() {
        let server = StaticServer::spawn().await;
        server.serve("/a.tar.gz", StatusCode::OK, vec![7u8; 70_000]);
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("a.tar.gz");

        let written = ArtifactFetcher::new()
            .unwrap()
            .fetch_to_file(&server.url("/a.tar.gz"), &dest)
            .await
            .unwrap();

        assert_eq!(written, 70_000);
        assert_eq!(std::fs::read(&dest).unwrap().len(), 70_000);
    }
}
