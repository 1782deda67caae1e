// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! ONNX CLIP Visual Encoder
//!
//! This module wraps ONNX Runtime around an export of the CLIP visual tower.
//!
//! Features:
//! - ONNX model loading from disk (CPU execution provider)
//! - Output width validated by a probe inference at load time
//! - CLIP preprocessing paired with the architecture
//! - L2-normalized image embeddings

use anyhow::{anyhow, Context, Result};
use image::DynamicImage;
use ndarray::{Array4, ArrayViewD};
use ort::execution_providers::CPUExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use super::model_registry::ModelSpec;
use super::{l2_normalize, ImageEncoder};
use crate::vision::preprocessing::{preprocess_for_clip, PreprocessConfig};

/// ONNX-based CLIP image encoder
///
/// # Thread Safety
/// An ONNX Runtime run needs exclusive access to its session, so the session
/// sits behind a mutex and concurrent encodes are serialized. Preprocessing
/// needs no lock.
#[derive(Clone)]
pub struct OnnxClipModel {
    /// ONNX Runtime session (wrapped in Arc<Mutex> for thread-safe shared access)
    session: Arc<Mutex<Session>>,

    /// Name of the pixel input, read from the graph
    input_name: String,

    /// Architecture identifier (e.g., "ViT-B-32")
    model_name: String,

    /// Pretrained-weights tag (e.g., "openai")
    pretrained: String,

    /// Output dimension
    dimension: usize,

    /// Transform applied before encoding
    preprocess: PreprocessConfig,
}

impl std::fmt::Debug for OnnxClipModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxClipModel")
            .field("model_name", &self.model_name)
            .field("pretrained", &self.pretrained)
            .field("input_name", &self.input_name)
            .field("dimension", &self.dimension)
            .field("image_size", &self.preprocess.image_size)
            .finish_non_exhaustive()
    }
}

impl OnnxClipModel {
    /// Loads the visual tower from an ONNX file
    ///
    /// # Arguments
    /// - `spec`: Architecture description (input size, output width)
    /// - `pretrained`: Pretrained-weights tag, reported by /health
    /// - `model_path`: Path to the ONNX export of the visual tower
    /// - `intra_threads`: ONNX Runtime intra-op thread count
    ///
    /// # Errors
    /// Returns error if:
    /// - Model file not found or invalid
    /// - ONNX Runtime initialization fails
    /// - The probe inference does not produce `spec.embed_dim` values
    pub async fn new<P: AsRef<Path>>(
        spec: &ModelSpec,
        pretrained: impl Into<String>,
        model_path: P,
        intra_threads: usize,
    ) -> Result<Self> {
        let model_path = model_path.as_ref();
        let pretrained = pretrained.into();

        if !model_path.exists() {
            anyhow::bail!("CLIP visual model not found: {}", model_path.display());
        }

        info!(
            "Loading CLIP visual encoder {} from {}",
            spec.name,
            model_path.display()
        );

        let mut session = Session::builder()
            .context("Failed to create session builder")?
            .with_execution_providers([CPUExecutionProvider::default().build()])
            .context("Failed to set CPU execution provider")?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .context("Failed to set optimization level")?
            .with_intra_threads(intra_threads)
            .context("Failed to set intra threads")?
            .commit_from_file(model_path)
            .context(format!(
                "Failed to load CLIP visual model from {}",
                model_path.display()
            ))?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .unwrap_or_else(|| "pixel_values".to_string());

        let preprocess = spec.preprocess_config();

        // Probe with a blank image to confirm the output width
        {
            let side = preprocess.image_size as usize;
            let probe = Array4::<f32>::zeros((1, 3, side, side));
            let outputs = session
                .run(ort::inputs![input_name.as_str() => Value::from_array(probe)?])
                .context("Probe inference failed")?;
            let output = outputs[0]
                .try_extract_array::<f32>()
                .context("Failed to extract probe output tensor")?;
            let features = extract_features(&output)?;

            if features.len() != spec.embed_dim {
                anyhow::bail!(
                    "Model outputs unexpected dimensions: {:?} (expected [1, {}])",
                    output.shape(),
                    spec.embed_dim
                );
            }
        } // outputs dropped here

        info!(
            "✅ CLIP visual encoder loaded ({} / {}, input {}px, {}D)",
            spec.name, pretrained, preprocess.image_size, spec.embed_dim
        );

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            input_name,
            model_name: spec.name.to_string(),
            pretrained,
            dimension: spec.embed_dim,
            preprocess,
        })
    }

    /// Returns the output dimension of this model
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Returns the architecture identifier
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Returns the pretrained-weights tag
    pub fn pretrained(&self) -> &str {
        &self.pretrained
    }
}

impl ImageEncoder for OnnxClipModel {
    fn preprocess(&self, image: &DynamicImage) -> Result<Array4<f32>> {
        Ok(preprocess_for_clip(image, &self.preprocess)?)
    }

    fn encode(&self, pixels: &Array4<f32>) -> Result<Vec<f32>> {
        let shape = pixels.shape();
        if shape.len() != 4 || shape[0] != 1 || shape[1] != 3 {
            anyhow::bail!("Invalid input shape: {:?}, expected [1, 3, H, W]", shape);
        }

        let input_value =
            Value::from_array(pixels.to_owned()).context("Failed to create input tensor")?;

        let features = {
            let mut session = self
                .session
                .lock()
                .map_err(|_| anyhow!("ONNX session lock poisoned"))?;
            let outputs = session
                .run(ort::inputs![self.input_name.as_str() => input_value])
                .context("Encoder inference failed")?;
            let output = outputs[0]
                .try_extract_array::<f32>()
                .context("Failed to extract output tensor")?;
            debug!("Encoder output shape: {:?}", output.shape());
            extract_features(&output)?
        };

        Ok(l2_normalize(features))
    }
}

/// Flatten a `[1, D]` or `[D]` output into a feature vector
fn extract_features(output: &ArrayViewD<'_, f32>) -> Result<Vec<f32>> {
    match output.shape() {
        [_] => Ok(output.iter().copied().collect()),
        [1, _] => Ok(output.iter().copied().collect()),
        shape => anyhow::bail!("Unexpected encoder output shape: {:?}", shape),
    }
}
