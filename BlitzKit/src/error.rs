//! Error types for `BlitzKit`

use thiserror::Error;

/// The error type for `BlitzKit` operations.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum Error {
    // ==================== IO Errors ====================
    /// IO error from file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ==================== Decoding Errors ====================
    /// A primitive read needed more bytes than remain in the current bound.
    #[error("truncated input at offset {offset}: needed {needed} bytes, {available} available")]
    TruncatedInput {
        /// Absolute offset of the failed read.
        offset: u64,
        /// Number of bytes the read required.
        needed: usize,
        /// Number of bytes left before the bound.
        available: usize,
    },

    /// A seek or skip would move past the end of the input.
    #[error("unexpected end of input: cannot move from {offset} to {target}")]
    UnexpectedEof {
        /// Cursor offset before the move.
        offset: u64,
        /// Requested absolute offset.
        target: u64,
    },

    /// Structurally invalid data (bad header size, bit depth, length...).
    #[error("invalid format: {0}")]
    InvalidFormat(String),

    /// The top-level tag is not `BB3D`.
    #[error("not a B3D model: expected BB3D, found {0:?}")]
    NotAModel([u8; 4]),

    /// The file is not a bitmap (missing `BM` signature).
    #[error("invalid bitmap magic: expected BM, found {0:#06x}")]
    InvalidBitmapMagic(u16),

    /// The file is not a DDS texture (missing `DDS ` signature).
    #[error("invalid DDS magic: found {0:?}")]
    InvalidDdsMagic([u8; 4]),

    /// A recognised layout that has no decoder.
    #[error("unsupported feature: {0}")]
    UnsupportedFeature(String),

    // ==================== Conversion Errors ====================
    /// Failed to build or encode an image.
    #[error("image error: {0}")]
    Image(String),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration file could not be parsed.
    #[error("config error: {0}")]
    Config(String),

    // ==================== File System Errors ====================
    /// Directory traversal error.
    #[error("directory walk error: {0}")]
    WalkDir(String),
}

impl Error {
    /// True when the data simply belongs to another format.
    ///
    /// Loaders that probe several formats use this to move on instead of
    /// reporting a hard failure.
    #[must_use]
    pub fn is_format_mismatch(&self) -> bool {
        matches!(
            self,
            Self::NotAModel(_) | Self::InvalidBitmapMagic(_) | Self::InvalidDdsMagic(_)
        )
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Self::Image(err.to_string())
    }
}

impl From<walkdir::Error> for Error {
    fn from(err: walkdir::Error) -> Self {
        Self::WalkDir(err.to_string())
    }
}

/// Result type alias for `BlitzKit` operations.
pub type Result<T> = std::result::Result<T, Error>;
