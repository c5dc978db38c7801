//! Error types for nalmux-mp4.

use std::io;
use thiserror::Error;

/// Result type for muxer and sink operations.
pub type Result<T> = std::result::Result<T, MuxError>;

/// Error type for container muxing.
#[derive(Debug, Error)]
pub enum MuxError {
    /// I/O error on the sink.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error reported by the MP4 box writer.
    #[error("MP4 writer error: {0}")]
    Mp4(#[from] mp4::Error),

    /// Track dimensions are unusable.
    #[error("Invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    /// A slice arrived before both SPS and PPS were seen.
    #[error("Slice received before SPS/PPS (nal_unit_type {nal_type})")]
    MissingParameterSets { nal_type: u8 },

    /// The muxer was closed without any picture being written.
    #[error("No video samples were written")]
    NoSamples,

    /// Invalid muxer configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl MuxError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
