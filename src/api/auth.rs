// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Static bearer-token authentication

use axum::http::{header::AUTHORIZATION, HeaderMap};

use super::ApiError;

const BEARER_PREFIX: &str = "bearer ";

/// Shared-secret check applied before any fetch or model work
#[derive(Debug, Clone, Default)]
pub struct BearerAuth {
    token: Option<String>,
}

impl BearerAuth {
    /// `None` or a blank token puts the service in open mode
    pub fn new(token: Option<String>) -> Self {
        let token = token
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        Self { token }
    }

    pub fn is_enabled(&self) -> bool {
        self.token.is_some()
    }

    /// Returns whether a raw `Authorization` header value grants access
    ///
    /// The scheme is matched case-insensitively and the presented token is
    /// trimmed before comparison.
    pub fn check(&self, header: Option<&str>) -> bool {
        let Some(expected) = &self.token else {
            return true;
        };
        let Some(header) = header else {
            return false;
        };

        match header.get(..BEARER_PREFIX.len()) {
            Some(scheme) if scheme.eq_ignore_ascii_case(BEARER_PREFIX) => {
                header[BEARER_PREFIX.len()..].trim() == expected
            }
            _ => false,
        }
    }

    /// Header-map flavour of [`BearerAuth::check`] for handlers
    pub fn authorize(&self, headers: &HeaderMap) -> Result<(), ApiError> {
        if !self.is_enabled() {
            return Ok(());
        }

        let header = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
        if self.check(header) {
            Ok(())
        } else {
            Err(ApiError::Unauthorized)
        }
    }
}
