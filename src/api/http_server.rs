// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use std::{net::SocketAddr, sync::Arc};
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::info;

use super::{auth::BearerAuth, embed::embed_handler, health::health_handler};
use crate::config::ServiceConfig;
use crate::embeddings::ImageEncoder;
use crate::vision::ImageFetcher;

/// Everything a request needs, shared across handlers
///
/// The encoder and the fetcher are loaded once at startup and reused by every
/// request; nothing in here is mutated after construction.
#[derive(Clone)]
pub struct AppState {
    pub encoder: Arc<dyn ImageEncoder>,
    pub fetcher: Arc<ImageFetcher>,
    pub auth: BearerAuth,
    pub model: String,
    pub pretrained: String,
}

impl AppState {
    pub fn new(config: &ServiceConfig, encoder: Arc<dyn ImageEncoder>) -> Result<Self> {
        let fetcher = ImageFetcher::new(config.fetcher_config()?)?;

        Ok(Self {
            encoder,
            fetcher: Arc::new(fetcher),
            auth: BearerAuth::new(config.api_token()),
            model: config.model.clone(),
            pretrained: config.pretrained.clone(),
        })
    }
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        // Liveness, unauthenticated
        .route("/health", get(health_handler))
        .route("/embed", post(embed_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `addr` and serve until Ctrl-C or SIGTERM
pub async fn start_server(addr: SocketAddr, state: AppState) -> Result<()> {
    let auth_enabled = state.auth.is_enabled();
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(
        "API server listening on {} (auth {})",
        listener.local_addr()?,
        if auth_enabled { "enabled" } else { "disabled" }
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
