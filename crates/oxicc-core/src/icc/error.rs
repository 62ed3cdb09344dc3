//! ICC codec error types

use std::fmt;

use super::types::signature_string;

/// Errors raised while decoding, encoding or assembling ICC structures
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum IccError {
    /// Profile data is too small to hold a header
    TooSmall { expected: usize, actual: usize },
    /// A read ran past the end of the byte source
    Truncated { needed: usize, available: usize },
    /// Underlying source or sink failure
    Io(String),
    /// Invalid profile signature (should be 'acsp')
    InvalidSignature(u32),
    /// Declared profile size exceeds the available data
    SizeMismatch {
        header_size: u32,
        actual_size: usize,
    },
    /// Tag directory does not fit inside the declared profile size
    DirectoryOverflow { count: u32, profile_size: u32 },
    /// Tag offset/size pair addresses bytes outside the profile
    TagOutOfBounds {
        tag: u32,
        offset: u32,
        size: u32,
        profile_size: usize,
    },
    /// No factory claims the tag type and strict reading was requested
    UnsupportedTagType { tag: u32, type_sig: u32 },
    /// Channel counts disagree at a stage boundary
    ChannelMismatch {
        stage: &'static str,
        expected: usize,
        actual: usize,
    },
    /// Invalid color space
    InvalidColorSpace(u32),
    /// Invalid profile class
    InvalidProfileClass(u32),
    /// Invalid rendering intent
    InvalidRenderingIntent(u32),
    /// Version outside the configured policy
    UnsupportedVersion { major: u8, minor: u8 },
    /// Degenerate or oversized CLUT geometry
    InvalidClut(String),
    /// Curve that cannot be evaluated (bad function type, empty segment list)
    InvalidCurve(String),
    /// Corrupted or invalid data
    CorruptedData(String),
}

impl fmt::Display for IccError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooSmall { expected, actual } => {
                write!(
                    f,
                    "Profile too small: expected {} bytes, got {}",
                    expected, actual
                )
            }
            Self::Truncated { needed, available } => {
                write!(
                    f,
                    "Unexpected end of data: needed {} bytes, {} available",
                    needed, available
                )
            }
            Self::Io(msg) => write!(f, "I/O failure: {}", msg),
            Self::InvalidSignature(sig) => {
                write!(
                    f,
                    "Invalid profile signature: 0x{:08X} (expected 'acsp')",
                    sig
                )
            }
            Self::SizeMismatch {
                header_size,
                actual_size,
            } => {
                write!(
                    f,
                    "Size mismatch: header says {} bytes, data is {} bytes",
                    header_size, actual_size
                )
            }
            Self::DirectoryOverflow {
                count,
                profile_size,
            } => {
                write!(
                    f,
                    "Tag directory of {} entries exceeds profile size {}",
                    count, profile_size
                )
            }
            Self::TagOutOfBounds {
                tag,
                offset,
                size,
                profile_size,
            } => {
                write!(
                    f,
                    "Tag '{}' out of bounds: offset {} + size {} > profile size {}",
                    signature_string(*tag),
                    offset,
                    size,
                    profile_size
                )
            }
            Self::UnsupportedTagType { tag, type_sig } => {
                write!(
                    f,
                    "Unsupported type '{}' for tag '{}'",
                    signature_string(*type_sig),
                    signature_string(*tag)
                )
            }
            Self::ChannelMismatch {
                stage,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "Channel mismatch at {}: expected {}, got {}",
                    stage, expected, actual
                )
            }
            Self::InvalidColorSpace(cs) => {
                write!(f, "Invalid color space: {}", signature_string(*cs))
            }
            Self::InvalidProfileClass(class) => {
                write!(f, "Invalid profile class: {}", signature_string(*class))
            }
            Self::InvalidRenderingIntent(intent) => {
                write!(f, "Invalid rendering intent: {}", intent)
            }
            Self::UnsupportedVersion { major, minor } => {
                write!(f, "Unsupported profile version: {}.{}", major, minor)
            }
            Self::InvalidClut(msg) => write!(f, "Invalid CLUT: {}", msg),
            Self::InvalidCurve(msg) => write!(f, "Invalid curve: {}", msg),
            Self::CorruptedData(msg) => {
                write!(f, "Corrupted data: {}", msg)
            }
        }
    }
}

impl std::error::Error for IccError {}

impl From<std::io::Error> for IccError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
