// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! POST /embed HTTP handler
//!
//! Authenticates the caller, fetches the referenced image, runs the CLIP
//! visual tower on a blocking thread and returns the unit-norm embedding.

use crate::api::embed::{EmbedRequest, EmbedResponse};
use crate::api::http_server::AppState;
use crate::api::ApiError;
use crate::embeddings::EMBEDDING_DIM;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::HeaderMap,
    Json,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// POST /embed handler
///
/// # Request Body
/// ```json
/// { "image_url": "https://cdn.example.com/covers/123.jpg" }
/// ```
///
/// # Response Body
/// ```json
/// { "embedding": [0.013, -0.042, ...] }
/// ```
///
/// Authentication runs before the body is looked at, so an unauthenticated
/// caller never learns whether its payload was well formed.
pub async fn embed_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<EmbedRequest>, JsonRejection>,
) -> Result<Json<EmbedResponse>, ApiError> {
    state.auth.authorize(&headers)?;

    let Json(request) = payload.map_err(|e| ApiError::InvalidRequest(e.body_text()))?;
    request.validate()?;

    let response = embed_image(&state, &request).await?;
    Ok(Json(response))
}

/// Fetch, preprocess, encode and check one image
pub async fn embed_image(state: &AppState, request: &EmbedRequest) -> Result<EmbedResponse, ApiError> {
    let started = Instant::now();

    let image = state.fetcher.fetch(&request.image_url).await?;
    let fetched_in = started.elapsed();
    debug!(
        url = %request.image_url,
        width = image.width(),
        height = image.height(),
        "Fetched image in {:?}",
        fetched_in
    );

    let encoder = Arc::clone(&state.encoder);
    let embedding = tokio::task::spawn_blocking(move || {
        let pixels = encoder.preprocess(&image)?;
        encoder.encode(&pixels)
    })
    .await
    .map_err(|e| ApiError::InferenceFailed(format!("inference task panicked: {}", e)))?
    .map_err(|e| ApiError::InferenceFailed(format!("{:#}", e)))?;

    let response = EmbedResponse::from(embedding);
    response.validate_dimension(EMBEDDING_DIM)?;

    debug!(
        url = %request.image_url,
        fetch_ms = fetched_in.as_millis() as u64,
        total_ms = started.elapsed().as_millis() as u64,
        "Embedded image"
    );

    Ok(response)
}
