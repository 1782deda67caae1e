// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image acquisition and preprocessing
//!
//! This module provides:
//! - Remote image fetching with timeout classification
//! - Content-sniffed decoding into RGB
//! - The CLIP resize / crop / normalize transform

pub mod fetcher;
pub mod image_utils;
pub mod preprocessing;

pub use fetcher::{FetchError, FetcherConfig, ImageFetcher};
pub use image_utils::{decode_image_bytes, detect_format, ImageError, ImageInfo};
pub use preprocessing::{preprocess_for_clip, PreprocessConfig, PreprocessError, CLIP_MEAN, CLIP_STD};
