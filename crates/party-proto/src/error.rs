//! Error types for the wire layer.

use thiserror::Error;

/// Convenience type alias for Results using [`ProtocolError`].
pub type Result<T, E = ProtocolError> = std::result::Result<T, E>;

/// Framing and envelope decoding errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProtocolError {
    /// I/O error during reading or writing.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The frame is not a valid envelope.
    #[error("invalid envelope: {0}")]
    InvalidEnvelope(#[from] serde_json::Error),

    /// The frame exceeds the configured length limit.
    #[error("frame too long: {actual} bytes exceeds limit of {limit}")]
    FrameTooLong {
        /// Observed frame length (or buffered prefix length) in bytes.
        actual: usize,
        /// Configured limit in bytes.
        limit: usize,
    },
}
