// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! GET /health

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use super::http_server::AppState;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthResponse {
    pub status: String,
    pub model: String,
    pub pretrained: String,
}

/// Liveness plus the identity of the loaded model. Never authenticated.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        model: state.model.clone(),
        pretrained: state.pretrained.clone(),
    })
}
