// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Service configuration
//!
//! Every setting can be given as a flag or an environment variable and is
//! read once at startup. Changing the model requires a restart.

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;
use tokio::net::lookup_host;

use crate::embeddings::WeightsSource;
use crate::vision::image_utils::DEFAULT_MAX_IMAGE_BYTES;
use crate::vision::FetcherConfig;

/// CLIP image embedding service
#[derive(Parser, Debug, Clone)]
#[command(name = "clip-embed-service")]
#[command(version)]
#[command(about = "Serves unit-norm CLIP image embeddings over HTTP", long_about = None)]
pub struct ServiceConfig {
    /// CLIP architecture identifier
    #[arg(long, env = "CLIP_MODEL", default_value = "ViT-B-32")]
    pub model: String,

    /// Pretrained-weights tag
    #[arg(long, env = "CLIP_PRETRAINED", default_value = "openai")]
    pub pretrained: String,

    /// Image fetch timeout in seconds
    #[arg(long, env = "REQUEST_TIMEOUT_SECONDS", default_value_t = 10.0)]
    pub request_timeout_seconds: f64,

    /// Static bearer token; empty disables authentication
    #[arg(long, env = "CLIP_API_KEY", default_value = "", hide_env_values = true)]
    pub api_key: String,

    /// Bind address
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Bind port
    #[arg(long, env = "PORT", default_value_t = 8000)]
    pub port: u16,

    /// Root directory holding <model>/<pretrained>/visual.onnx
    #[arg(long, env = "CLIP_MODELS_DIR", default_value = "./models")]
    pub models_dir: PathBuf,

    /// Explicit path to the visual tower ONNX file
    #[arg(long, env = "CLIP_VISUAL_MODEL_PATH")]
    pub visual_model_path: Option<PathBuf>,

    /// Hugging Face repository to download the visual tower from
    #[arg(long, env = "CLIP_HF_REPO")]
    pub hf_repo: Option<String>,

    /// File inside the Hugging Face repository
    #[arg(long, env = "CLIP_HF_FILE", default_value = "visual.onnx")]
    pub hf_file: String,

    /// Hugging Face cache directory for downloaded weights
    #[arg(long, env = "CLIP_HF_CACHE_DIR")]
    pub hf_cache_dir: Option<PathBuf>,

    /// ONNX Runtime intra-op threads
    #[arg(long, env = "CLIP_INTRA_THREADS", default_value_t = 4)]
    pub intra_threads: usize,

    /// Largest accepted image body in bytes
    #[arg(long, env = "MAX_IMAGE_BYTES", default_value_t = DEFAULT_MAX_IMAGE_BYTES)]
    pub max_image_bytes: usize,
}

impl ServiceConfig {
    /// Rejects settings the service cannot run with
    pub fn validate(&self) -> Result<()> {
        if !self.request_timeout_seconds.is_finite() || self.request_timeout_seconds <= 0.0 {
            bail!(
                "REQUEST_TIMEOUT_SECONDS must be a positive number (got {})",
                self.request_timeout_seconds
            );
        }
        self.request_timeout()?;
        if self.intra_threads == 0 {
            bail!("CLIP_INTRA_THREADS must be greater than 0");
        }
        if self.max_image_bytes == 0 {
            bail!("MAX_IMAGE_BYTES must be greater than 0");
        }
        if self.model.trim().is_empty() {
            bail!("CLIP_MODEL cannot be empty");
        }
        Ok(())
    }

    /// Configured token, `None` when authentication is disabled
    pub fn api_token(&self) -> Option<String> {
        let token = self.api_key.trim();
        (!token.is_empty()).then(|| token.to_string())
    }

    pub fn request_timeout(&self) -> Result<Duration> {
        Duration::try_from_secs_f64(self.request_timeout_seconds).map_err(|e| {
            anyhow!(
                "REQUEST_TIMEOUT_SECONDS is out of range (got {}): {}",
                self.request_timeout_seconds,
                e
            )
        })
    }

    pub fn fetcher_config(&self) -> Result<FetcherConfig> {
        Ok(FetcherConfig {
            timeout: self.request_timeout()?,
            max_image_bytes: self.max_image_bytes,
        })
    }

    pub fn weights_source(&self) -> WeightsSource {
        WeightsSource {
            explicit_path: self.visual_model_path.clone(),
            models_dir: self.models_dir.clone(),
            hf_repo: self.hf_repo.clone().filter(|r| !r.trim().is_empty()),
            hf_file: self.hf_file.clone(),
            hf_cache_dir: self.hf_cache_dir.clone(),
        }
    }

    /// Resolve `HOST:PORT` into the socket address to bind
    ///
    /// Accepts IPv4 and IPv6 literals (bare or bracketed) and host names,
    /// which are resolved and the first address taken.
    pub async fn bind_addr(&self) -> Result<SocketAddr> {
        let host = self.host.trim();
        let host = host
            .strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .unwrap_or(host);

        if let Ok(ip) = host.parse::<IpAddr>() {
            return Ok(SocketAddr::new(ip, self.port));
        }

        lookup_host((host, self.port))
            .await
            .with_context(|| format!("Invalid bind address {}:{}", host, self.port))?
            .next()
            .ok_or_else(|| anyhow!("Bind host {} resolved to no addresses", host))
    }
}
