// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! EmbedRequest type for POST /embed

use crate::api::ApiError;
use serde::{Deserialize, Serialize};
use url::Url;

/// Request body for POST /embed
///
/// # Example
/// ```json
/// { "image_url": "https://cdn.example.com/covers/123.jpg" }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbedRequest {
    /// Absolute http(s) URL of the image to embed
    pub image_url: Url,
}

impl EmbedRequest {
    /// Validates the embed request
    ///
    /// Deserialization already guarantees an absolute URL; this additionally
    /// requires an `http`/`https` scheme and a host.
    pub fn validate(&self) -> Result<(), ApiError> {
        match self.image_url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(ApiError::InvalidRequest(format!(
                    "image_url must use http or https (got {})",
                    other
                )))
            }
        }

        if self.image_url.host_str().map_or(true, str::is_empty) {
            return Err(ApiError::InvalidRequest(
                "image_url must include a host".to_string(),
            ));
        }

        Ok(())
    }
}
