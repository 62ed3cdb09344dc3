//! Error types for oxicc

use thiserror::Error;

use crate::icc::{ColorSpace, IccError, RenderingIntent};

/// Result type for oxicc operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in oxicc operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Profile codec failure (truncation, malformed container, channel mismatch)
    #[error("ICC error: {0}")]
    Icc(#[from] IccError),

    /// Adjacent pipeline stages do not share a color space
    #[error("Incompatible color spaces: {from:?} output cannot feed {to:?} input")]
    IncompatibleColorSpace { from: ColorSpace, to: ColorSpace },

    /// A profile has no transform for the requested intent and fallback is off
    #[error("No {intent:?} transform available: {detail}")]
    MissingTransform {
        intent: RenderingIntent,
        detail: String,
    },

    /// Pipeline construction was attempted without any profile
    #[error("Pipeline has no stages")]
    EmptyPipeline,

    /// Transform creation failed for a numeric reason
    #[error("Transform error: {0}")]
    Transform(String),

    /// Buffer size mismatch
    #[error("Buffer size mismatch: expected {expected}, got {actual}")]
    BufferSize { expected: usize, actual: usize },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
