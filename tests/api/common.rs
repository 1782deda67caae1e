// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Shared fixtures: a deterministic encoder and a local image host

use anyhow::Result;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use clip_embed_service::{
    api::{create_app, AppState, BearerAuth},
    embeddings::{l2_normalize, ImageEncoder, EMBEDDING_DIM},
    vision::{preprocess_for_clip, FetcherConfig, ImageFetcher, PreprocessConfig},
};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use ndarray::Array4;
use std::io::Cursor;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tower::util::ServiceExt;

pub const TOKEN: &str = "test-token";

/// Encoder whose output depends only on the preprocessed pixels
pub struct StubEncoder {
    width: usize,
}

impl StubEncoder {
    pub fn new() -> Self {
        Self { width: EMBEDDING_DIM }
    }

    pub fn with_width(width: usize) -> Self {
        Self { width }
    }
}

impl ImageEncoder for StubEncoder {
    fn preprocess(&self, image: &DynamicImage) -> Result<Array4<f32>> {
        Ok(preprocess_for_clip(image, &PreprocessConfig::default())?)
    }

    fn encode(&self, pixels: &Array4<f32>) -> Result<Vec<f32>> {
        let flat: Vec<f32> = pixels.iter().copied().collect();
        let features = (0..self.width)
            .map(|i| flat[(i * 97) % flat.len()] + (i % 7) as f32 * 0.1)
            .collect();
        Ok(l2_normalize(features))
    }
}

pub fn png_bytes() -> Vec<u8> {
    let img = RgbImage::from_fn(64, 48, |x, y| Rgb([(x * 4) as u8, (y * 5) as u8, 128]));
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    buf
}

/// Local HTTP host serving test images; counts every request it receives
pub struct ImageHost {
    pub addr: SocketAddr,
    hits: Arc<AtomicUsize>,
}

impl ImageHost {
    pub async fn start() -> Self {
        let hits = Arc::new(AtomicUsize::new(0));
        let png = png_bytes();

        let counter = hits.clone();
        let app = Router::new()
            .route(
                "/cat.png",
                get(move || {
                    let png = png.clone();
                    async move { ([(header::CONTENT_TYPE, "image/png")], png) }
                }),
            )
            .route("/missing.png", get(|| async { StatusCode::NOT_FOUND }))
            .route(
                "/slow.png",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(3)).await;
                    png_bytes()
                }),
            )
            .route(
                "/notes.txt",
                get(|| async {
                    ([(header::CONTENT_TYPE, "image/png")], "definitely not an image").into_response()
                }),
            )
            .layer(axum::middleware::from_fn(
                move |req: axum::extract::Request, next: axum::middleware::Next| {
                    let counter = counter.clone();
                    async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                        next.run(req).await
                    }
                },
            ));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, hits }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

pub fn state(encoder: impl ImageEncoder + 'static, token: Option<&str>, timeout: Duration) -> AppState {
    state_with_config(
        encoder,
        token,
        FetcherConfig {
            timeout,
            ..FetcherConfig::default()
        },
    )
}

pub fn state_with_config(
    encoder: impl ImageEncoder + 'static,
    token: Option<&str>,
    config: FetcherConfig,
) -> AppState {
    let fetcher = ImageFetcher::new(config).unwrap();

    AppState {
        encoder: Arc::new(encoder),
        fetcher: Arc::new(fetcher),
        auth: BearerAuth::new(token.map(str::to_string)),
        model: "ViT-B-32".to_string(),
        pretrained: "openai".to_string(),
    }
}

/// Raw HTTP/1.1 host answering every request with an endless chunked body
pub async fn endless_chunked_host() -> SocketAddr {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut request = [0u8; 1024];
                let _ = socket.read(&mut request).await;
                let head = "HTTP/1.1 200 OK\r\nContent-Type: image/png\r\nTransfer-Encoding: chunked\r\n\r\n";
                if socket.write_all(head.as_bytes()).await.is_err() {
                    return;
                }
                let mut chunk = b"1000\r\n".to_vec();
                chunk.extend_from_slice(&[0x89; 4096]);
                chunk.extend_from_slice(b"\r\n");
                while socket.write_all(&chunk).await.is_ok() {}
            });
        }
    });
    addr
}

pub fn default_state(token: Option<&str>) -> AppState {
    state(StubEncoder::new(), token, Duration::from_secs(5))
}

pub fn embed_request(body: String, auth: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/embed")
        .header("content-type", "application/json");
    if let Some(auth) = auth {
        builder = builder.header("authorization", auth);
    }
    builder.body(Body::from(body)).unwrap()
}

pub fn url_body(url: &str) -> String {
    serde_json::json!({ "image_url": url }).to_string()
}

/// Send `request` through a fresh router and decode the JSON reply
pub async fn send(state: AppState, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = create_app(state).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}

pub fn embedding_of(json: &serde_json::Value) -> Vec<f32> {
    json["embedding"]
        .as_array()
        .expect("embedding array")
        .iter()
        .map(|v| v.as_f64().unwrap() as f32)
        .collect()
}
