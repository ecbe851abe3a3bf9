//! # Remote Source Fetching
//!
//! Downloads `MediaSource::RemoteUrl` bodies into memory so the decoder can
//! treat them like any other buffer. The whole body is fetched before
//! decoding begins; progressive range-request streaming is a possible
//! future adapter but not implemented here.

use crate::error::{MediaError, Result};
use bytes::Bytes;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, error, info, instrument};

/// HTTP fetcher for remote audio sources.
///
/// Wraps a shared `reqwest::Client`; the engine creates one fetcher and
/// reuses it for every remote load so connection pools are shared.
#[derive(Debug, Clone)]
pub struct RemoteFetcher {
    client: reqwest::Client,
}

impl RemoteFetcher {
    /// Create a fetcher with the given request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built
    /// (e.g., TLS backend initialization failure).
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MediaError::Internal(format!("HTTP client error: {}", e)))?;

        Ok(Self { client })
    }

    /// Download the entire body of `url` into memory.
    ///
    /// # Errors
    ///
    /// Returns [`MediaError::FetchFailed`] on transport errors and
    /// non-success statuses. Both are transient from the caller's
    /// perspective (see [`MediaError::is_transient`]).
    #[instrument(skip(self, headers))]
    pub async fn fetch(&self, url: &str, headers: &HashMap<String, String>) -> Result<Bytes> {
        info!("Downloading audio from: {}", url);

        let mut request = self.client.get(url);
        for (key, value) in headers {
            request = request.header(key, value);
        }

        let response = request.send().await.map_err(|e| {
            error!("HTTP request failed: {}", e);
            MediaError::FetchFailed(format!("HTTP request failed: {}", e))
        })?;

        if !response.status().is_success() {
            error!("HTTP request returned error status: {}", response.status());
            return Err(MediaError::FetchFailed(format!(
                "HTTP error: {}",
                response.status()
            )));
        }

        if let Some(len) = response.content_length() {
            debug!("Downloading {} bytes", len);
        }

        let data = response.bytes().await.map_err(|e| {
            error!("Failed to download response body: {}", e);
            MediaError::FetchFailed(format!("Download failed: {}", e))
        })?;

        info!("Downloaded {} bytes successfully", data.len());
        Ok(data)
    }
}

/// Extract a format-hint extension from a URL path, if one is present.
///
/// Query strings and fragments are stripped first, so
/// `https://cdn.example.com/track.mp3?token=abc` hints `mp3`.
pub fn url_extension(url: &str) -> Option<&str> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let last_segment = path.rsplit('/').next()?;
    let (_, ext) = last_segment.rsplit_once('.')?;
    if ext.is_empty() || ext.len() > 5 {
        return None;
    }
    Some(ext)
}
