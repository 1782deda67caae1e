// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Version information for the CLIP embedding service

/// Semantic version number
pub const VERSION_NUMBER: &str = env!("CARGO_PKG_VERSION");

/// Length of every embedding this build serves
pub const EMBEDDING_CONTRACT: usize = crate::embeddings::EMBEDDING_DIM;

/// Get formatted version string for logging
pub fn get_version_string() -> String {
    format!(
        "CLIP Embed Service {} ({}-d embeddings)",
        VERSION_NUMBER, EMBEDDING_CONTRACT
    )
}
