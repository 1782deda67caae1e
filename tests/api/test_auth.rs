// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Bearer-token enforcement on POST /embed

use super::common::*;
use axum::http::StatusCode;

#[tokio::test]
async fn test_missing_token_rejected_before_fetch() {
    let host = ImageHost::start().await;
    let (status, json) = send(
        default_state(Some(TOKEN)),
        embed_request(url_body(&host.url("/cat.png")), None),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error_type"], "unauthorized");
    assert_eq!(host.hits(), 0, "no fetch may happen for an unauthenticated call");
}

#[tokio::test]
async fn test_wrong_token_rejected() {
    let host = ImageHost::start().await;
    let (status, _) = send(
        default_state(Some(TOKEN)),
        embed_request(url_body(&host.url("/cat.png")), Some("Bearer nope")),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(host.hits(), 0);
}

#[tokio::test]
async fn test_auth_checked_before_body() {
    let (status, _) = send(
        default_state(Some(TOKEN)),
        embed_request("not json".to_string(), None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_valid_token_accepted() {
    let host = ImageHost::start().await;
    let header = format!("bearer  {} ", TOKEN);
    let (status, _) = send(
        default_state(Some(TOKEN)),
        embed_request(url_body(&host.url("/cat.png")), Some(&header)),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(host.hits(), 1);
}

#[tokio::test]
async fn test_open_mode_ignores_header() {
    let host = ImageHost::start().await;
    for auth in [None, Some("Bearer anything"), Some("garbage")] {
        let (status, _) = send(
            default_state(None),
            embed_request(url_body(&host.url("/cat.png")), auth),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }
}
