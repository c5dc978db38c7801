//! Error types for nalmux-annexb

/// Result type for segmentation operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the segmenter.
///
/// Malformed or truncated NAL fragments are not errors: the segmenter skips
/// them one byte at a time until it finds a usable unit.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A caller-supplied argument is out of range.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl Error {
    /// Create an invalid argument error.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}
