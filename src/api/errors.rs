// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};

use crate::vision::FetchError;

/// JSON body of every failed call
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub error_type: String,
    pub detail: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("unauthorized")]
    Unauthorized,

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("image fetch failed: {0}")]
    ImageFetchFailed(u16),

    #[error("image fetch timeout")]
    ImageFetchTimeout,

    #[error("image fetch error: {0}")]
    ImageFetchError(String),

    #[error("unexpected embedding dim: {observed} (expected {expected})")]
    EmbeddingDimensionMismatch { observed: usize, expected: usize },

    #[error("inference failed: {0}")]
    InferenceFailed(String),
}

impl ApiError {
    pub fn error_type(&self) -> &'static str {
        match self {
            ApiError::Unauthorized => "unauthorized",
            ApiError::InvalidRequest(_) => "invalid_request",
            ApiError::ImageFetchFailed(_) => "image_fetch_failed",
            ApiError::ImageFetchTimeout => "image_fetch_timeout",
            ApiError::ImageFetchError(_) => "image_fetch_error",
            ApiError::EmbeddingDimensionMismatch { .. } => "embedding_dimension_mismatch",
            ApiError::InferenceFailed(_) => "inference_failed",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::InvalidRequest(_)
            | ApiError::ImageFetchFailed(_)
            | ApiError::ImageFetchError(_) => StatusCode::BAD_REQUEST,
            ApiError::ImageFetchTimeout => StatusCode::REQUEST_TIMEOUT,
            ApiError::EmbeddingDimensionMismatch { .. } | ApiError::InferenceFailed(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            error_type: self.error_type().to_string(),
            detail: self.to_string(),
        }
    }
}

impl From<FetchError> for ApiError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Status(code) => ApiError::ImageFetchFailed(code),
            FetchError::Timeout => ApiError::ImageFetchTimeout,
            FetchError::Other(cause) => ApiError::ImageFetchError(cause),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error_type = self.error_type(), "{}", self);
        } else {
            warn!(error_type = self.error_type(), "{}", self);
        }

        (status, Json(self.to_response())).into_response()
    }
}
