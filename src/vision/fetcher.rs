// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Remote image fetching with a bounded timeout
//!
//! Downloads the bytes behind an image URL with a single GET and decodes them
//! into an RGB image. Every failure is classified into a [`FetchError`] so the
//! handler can map it onto an HTTP status.

use image::DynamicImage;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use url::Url;

use super::image_utils::{decode_image_bytes, ImageError, DEFAULT_MAX_IMAGE_BYTES};

/// Image fetch error types
#[derive(Debug, Error)]
pub enum FetchError {
    /// Remote answered with something other than 200
    #[error("image fetch failed: {0}")]
    Status(u16),

    /// Connect, response or body read exceeded the timeout
    #[error("image fetch timeout")]
    Timeout,

    /// Transport failure or undecodable bytes
    #[error("image fetch error: {0}")]
    Other(String),
}

impl From<ImageError> for FetchError {
    fn from(err: ImageError) -> Self {
        FetchError::Other(err.to_string())
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else {
            FetchError::Other(err.to_string())
        }
    }
}

/// Fetcher configuration
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Upper bound on the whole request, body included
    pub timeout: Duration,
    /// Largest accepted image body
    pub max_image_bytes: usize,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
        }
    }
}

/// HTTP image fetcher sharing one connection pool across requests
#[derive(Debug, Clone)]
pub struct ImageFetcher {
    client: Client,
    config: FetcherConfig,
}

impl ImageFetcher {
    /// Create a new fetcher
    pub fn new(config: FetcherConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("clip-embed-service/", env!("CARGO_PKG_VERSION")))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(|e| FetchError::Other(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Fetch and decode the image behind `url`
    ///
    /// One GET, no retries. A non-200 answer is reported with its status code
    /// and the body is never read. The body is read chunk by chunk and the
    /// download stops as soon as it passes `max_image_bytes`, whether or not
    /// the server announced a `Content-Length`.
    pub async fn fetch(&self, url: &Url) -> Result<DynamicImage, FetchError> {
        debug!("Fetching image from: {}", url);

        let mut response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::Status(status.as_u16()));
        }

        let max_bytes = self.config.max_image_bytes;
        if let Some(length) = response.content_length() {
            if length > max_bytes as u64 {
                let announced = usize::try_from(length).unwrap_or(usize::MAX);
                return Err(ImageError::TooLarge(announced, max_bytes).into());
            }
        }

        let capacity = response
            .content_length()
            .and_then(|l| usize::try_from(l).ok())
            .unwrap_or(0);
        let mut body = Vec::with_capacity(capacity);
        while let Some(chunk) = response.chunk().await? {
            let received = body.len() + chunk.len();
            if received > max_bytes {
                return Err(ImageError::TooLarge(received, max_bytes).into());
            }
            body.extend_from_slice(&chunk);
        }

        let (image, info) = decode_image_bytes(&body, max_bytes)?;

        debug!(
            "Decoded image: {}x{} {:?}, {} bytes",
            info.width, info.height, info.format, info.size_bytes
        );

        Ok(image)
    }

    /// Get the configuration
    pub fn config(&self) -> &FetcherConfig {
        &self.config
    }
}
