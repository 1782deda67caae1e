// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

use super::common::*;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};

fn health_request() -> Request<Body> {
    Request::builder().uri("/health").body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_health_reports_model_identity() {
    let (status, json) = send(default_state(None), health_request()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["model"], "ViT-B-32");
    assert_eq!(json["pretrained"], "openai");
}

#[tokio::test]
async fn test_health_needs_no_token() {
    let (status, json) = send(default_state(Some(TOKEN)), health_request()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}
