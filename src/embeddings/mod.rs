// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! CLIP image embedding model
//!
//! The encoder is loaded once at startup and shared read-only by every
//! request through the [`ImageEncoder`] trait.

pub mod model_registry;
pub mod onnx_model;

use anyhow::Result;
use image::DynamicImage;
use ndarray::Array4;

pub use model_registry::{find_model, resolve_weights, ModelSpec, WeightsSource, CLIP_MODELS};
pub use onnx_model::OnnxClipModel;

/// Dimension every served embedding must have
pub const EMBEDDING_DIM: usize = 512;

/// Smallest divisor used when normalizing a feature vector
pub const NORM_FLOOR: f32 = 1e-12;

/// A pretrained image encoder with its paired preprocessing transform
///
/// Implementations must be safe to call concurrently from many requests.
#[cfg_attr(test, mockall::automock)]
pub trait ImageEncoder: Send + Sync {
    /// Turn an RGB image into a model-ready NCHW tensor
    fn preprocess(&self, image: &DynamicImage) -> Result<Array4<f32>>;

    /// Run the forward pass and return the unit-normalized feature vector
    fn encode(&self, pixels: &Array4<f32>) -> Result<Vec<f32>>;
}

/// Scale `features` to unit Euclidean length
///
/// The norm is clamped to [`NORM_FLOOR`] so an all-zero vector stays zero
/// instead of turning into NaNs.
pub fn l2_normalize(mut features: Vec<f32>) -> Vec<f32> {
    let norm = features.iter().map(|x| x * x).sum::<f32>().sqrt();
    let divisor = norm.max(NORM_FLOOR);
    for value in &mut features {
        *value /= divisor;
    }
    features
}
