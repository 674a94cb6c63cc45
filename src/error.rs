// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Error types for surface setup and media decoding.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the annotation surface and its loaders.
#[derive(Error, Debug)]
pub enum MarkError {
    /// A required host container element is missing
    #[error("Container not found: #{id}")]
    ContainerNotFound {
        /// Identifier that was looked up
        id: String,
    },

    /// The background image could not be read or decoded
    #[error("Failed to decode image {path:?}: {source}")]
    ImageDecode {
        /// Source of the image
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// The decode thread went away before producing a result
    #[error("Image loader disconnected")]
    LoaderDisconnected,

    /// I/O error during file operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing or serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing or serialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, MarkError>;
