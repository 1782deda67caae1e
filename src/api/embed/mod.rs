// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Image embedding API module
//!
//! Provides the POST /embed endpoint returning 512-dimensional unit-norm
//! CLIP image embeddings.

pub mod handler;
pub mod request;
pub mod response;

pub use handler::{embed_handler, embed_image};
pub use request::EmbedRequest;
pub use response::EmbedResponse;
