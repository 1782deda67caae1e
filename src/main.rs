// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{anyhow, Result};
use clap::Parser;
use clip_embed_service::{
    api::{start_server, AppState},
    config::ServiceConfig,
    embeddings::{find_model, resolve_weights, OnnxClipModel, CLIP_MODELS, EMBEDDING_DIM},
    version,
};
use std::{env, sync::Arc};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Initialize tracing subscriber for logging
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = ServiceConfig::parse();
    config.validate()?;

    info!("🚀 Starting {}", version::get_version_string());
    info!(
        model = %config.model,
        pretrained = %config.pretrained,
        timeout_s = config.request_timeout_seconds,
        max_image_bytes = config.max_image_bytes,
        auth = config.api_token().is_some(),
        "Configuration loaded"
    );

    let spec = find_model(&config.model).ok_or_else(|| {
        let known: Vec<&str> = CLIP_MODELS.iter().map(|m| m.name).collect();
        anyhow!(
            "Unknown CLIP architecture '{}' (known: {})",
            config.model,
            known.join(", ")
        )
    })?;

    if spec.embed_dim != EMBEDDING_DIM {
        warn!(
            "⚠️  {} produces {}-d embeddings; every /embed call will fail until a {}-d model is configured",
            spec.name, spec.embed_dim, EMBEDDING_DIM
        );
    }

    let weights = resolve_weights(&config.weights_source(), spec.name, &config.pretrained).await?;
    let model = OnnxClipModel::new(spec, config.pretrained.clone(), &weights, config.intra_threads).await?;

    let state = AppState::new(&config, Arc::new(model))?;
    let addr = config.bind_addr().await?;

    start_server(addr, state).await
}
