// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Known CLIP architectures and weights resolution
//!
//! Architecture names follow OpenCLIP (`ViT-B-32`, `RN50`, ...). The table
//! carries what the service needs to run an ONNX export of the visual tower:
//! input resolution and output width. All listed variants were trained with
//! the OpenAI normalization constants.

use anyhow::{Context, Result};
use hf_hub::{api::tokio::ApiBuilder, Cache};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::vision::preprocessing::{PreprocessConfig, CLIP_MEAN, CLIP_STD};

/// File name of the visual tower inside a local weights directory
pub const VISUAL_MODEL_FILE: &str = "visual.onnx";

/// Static description of a CLIP architecture
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSpec {
    /// OpenCLIP architecture identifier
    pub name: &'static str,
    /// Square input resolution
    pub image_size: u32,
    /// Width of the image embedding
    pub embed_dim: usize,
}

impl ModelSpec {
    /// Preprocessing transform paired with this architecture
    pub fn preprocess_config(&self) -> PreprocessConfig {
        PreprocessConfig {
            image_size: self.image_size,
            mean: CLIP_MEAN,
            std: CLIP_STD,
        }
    }
}

/// Supported architectures
pub static CLIP_MODELS: &[ModelSpec] = &[
    ModelSpec {
        name: "ViT-B-32",
        image_size: 224,
        embed_dim: 512,
    },
    ModelSpec {
        name: "ViT-B-32-quickgelu",
        image_size: 224,
        embed_dim: 512,
    },
    ModelSpec {
        name: "ViT-B-16",
        image_size: 224,
        embed_dim: 512,
    },
    ModelSpec {
        name: "ViT-B-16-quickgelu",
        image_size: 224,
        embed_dim: 512,
    },
    ModelSpec {
        name: "ViT-L-14",
        image_size: 224,
        embed_dim: 768,
    },
    ModelSpec {
        name: "RN50",
        image_size: 224,
        embed_dim: 1024,
    },
    ModelSpec {
        name: "RN101",
        image_size: 224,
        embed_dim: 512,
    },
];

/// Look up an architecture by name, ignoring ASCII case
pub fn find_model(name: &str) -> Option<&'static ModelSpec> {
    CLIP_MODELS
        .iter()
        .find(|m| m.name.eq_ignore_ascii_case(name.trim()))
}

/// Where the visual tower weights may come from
#[derive(Debug, Clone)]
pub struct WeightsSource {
    /// Explicit ONNX file, bypasses every other lookup
    pub explicit_path: Option<PathBuf>,
    /// Root of `<model>/<pretrained>/visual.onnx` layouts
    pub models_dir: PathBuf,
    /// Hugging Face repository to download from when nothing is on disk
    pub hf_repo: Option<String>,
    /// File to download from `hf_repo`
    pub hf_file: String,
    /// Hugging Face cache directory, `~/.cache/huggingface/hub` when unset
    pub hf_cache_dir: Option<PathBuf>,
}

/// Conventional on-disk location for a `(model, pretrained)` pair
pub fn local_weights_path(models_dir: &Path, model: &str, pretrained: &str) -> PathBuf {
    models_dir.join(model).join(pretrained).join(VISUAL_MODEL_FILE)
}

/// Resolve the ONNX file for `(model, pretrained)`
///
/// Order: explicit path, local models directory, Hugging Face download.
pub async fn resolve_weights(
    source: &WeightsSource,
    model: &str,
    pretrained: &str,
) -> Result<PathBuf> {
    if let Some(path) = &source.explicit_path {
        if !path.exists() {
            anyhow::bail!("CLIP visual model not found: {}", path.display());
        }
        return Ok(path.clone());
    }

    let local = local_weights_path(&source.models_dir, model, pretrained);
    if local.exists() {
        return Ok(local);
    }

    match &source.hf_repo {
        Some(repo) => {
            info!("Downloading {} from Hugging Face repo {}", source.hf_file, repo);
            let builder = match &source.hf_cache_dir {
                Some(cache_dir) => ApiBuilder::from_cache(Cache::new(cache_dir.clone())),
                None => ApiBuilder::new(),
            };
            let api = builder
                .with_progress(false)
                .build()
                .context("Failed to initialize Hugging Face client")?;
            let path = api
                .model(repo.clone())
                .get(&source.hf_file)
                .await
                .with_context(|| format!("Failed to download {} from {}", source.hf_file, repo))?;
            Ok(path)
        }
        None => anyhow::bail!(
            "CLIP visual model not found for {}/{}: expected {} (set CLIP_VISUAL_MODEL_PATH or CLIP_HF_REPO)",
            model,
            pretrained,
            local.display()
        ),
    }
}
