// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! EmbedResponse type for POST /embed

use crate::api::ApiError;
use serde::{Deserialize, Serialize};

/// Response body for POST /embed
///
/// # Example
/// ```json
/// { "embedding": [0.013, -0.042, ...] }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbedResponse {
    /// Unit-norm image embedding
    pub embedding: Vec<f32>,
}

impl EmbedResponse {
    /// Checks the embedding has exactly `expected` entries
    ///
    /// A mismatch means the loaded model does not match what clients store,
    /// so it is reported as a server error.
    pub fn validate_dimension(&self, expected: usize) -> Result<(), ApiError> {
        if self.embedding.len() != expected {
            return Err(ApiError::EmbeddingDimensionMismatch {
                observed: self.embedding.len(),
                expected,
            });
        }
        Ok(())
    }

    /// Euclidean length of the embedding
    pub fn norm(&self) -> f32 {
        self.embedding.iter().map(|x| x * x).sum::<f32>().sqrt()
    }
}

impl From<Vec<f32>> for EmbedResponse {
    fn from(embedding: Vec<f32>) -> Self {
        Self { embedding }
    }
}
