//! Error types for the design-studio-core library.
//!
//! This module provides granular error variants for the different failure
//! modes of the studio. Decode failures are recoverable in most call sites
//! (background removal falls back to the original image), so callers can
//! match on [`StudioError::Decode`] to degrade silently.

use thiserror::Error;

/// Errors that can occur within the design-studio-core library.
#[derive(Error, Debug)]
pub enum StudioError {
    /// Configuration-related errors (invalid values).
    #[error("Configuration error: {0}")]
    Config(String),

    /// An image reference could not be resolved to bytes or decoded.
    #[error("Image decode failed: {0}")]
    Decode(String),

    /// An image could not be encoded to the output format.
    #[error("Image encode failed: {0}")]
    Encode(String),

    /// The image reference uses a scheme the loader does not understand.
    #[error("Unsupported image source: {0}")]
    UnsupportedSource(String),

    /// An operation needed a base image but none is loaded.
    #[error("No base image is loaded")]
    NoBaseImage,

    /// An operation needed an overlay (print) but none is active.
    #[error("No print is active")]
    NoOverlay,

    /// Product creation was requested with nothing selected.
    #[error("No variations are selected")]
    EmptySelection,

    /// The selection exceeds the per-product image cap of the chosen mode.
    #[error(
        "Selected {selected} of at most {limit} images ({} too many)",
        excess(.selected, .limit)
    )]
    SelectionLimit {
        /// Maximum number of images allowed.
        limit: usize,
        /// Number of images the caller tried to select.
        selected: usize,
    },

    /// A variation id was not found in the pool.
    #[error("Unknown variation: {0}")]
    UnknownVariation(String),

    /// The product collaborator rejected a draft.
    #[error("Product emission failed after {emitted} of {total} drafts: {reason}")]
    Emission {
        /// Drafts already handed to the collaborator before the failure.
        emitted: usize,
        /// Drafts planned for this materialization.
        total: usize,
        /// The collaborator's explanation.
        reason: String,
    },

    /// The preview worker thread is gone.
    #[error("Preview worker is not running")]
    PreviewStopped,

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StudioError {
    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a decode error with the given message.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Creates an encode error with the given message.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Creates an emission error for a sink failure.
    pub fn emission(emitted: usize, total: usize, reason: impl Into<String>) -> Self {
        Self::Emission {
            emitted,
            total,
            reason: reason.into(),
        }
    }

    /// Whether this error is a recoverable decode problem.
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode(_) | Self::UnsupportedSource(_))
    }
}

fn excess(selected: &usize, limit: &usize) -> usize {
    selected.saturating_sub(*limit)
}

/// A convenient alias for Result with [`StudioError`].
pub type Result<T> = std::result::Result<T, StudioError>;
