//! # Media Error Types
//!
//! Error types for source, decode, and output operations.

use thiserror::Error;

/// Errors that can occur while opening, decoding, or emitting audio.
#[derive(Error, Debug)]
pub enum MediaError {
    // ========================================================================
    // Source Errors
    // ========================================================================
    /// Failed to open or read an audio source.
    #[error("Failed to open audio source: {0}")]
    SourceError(String),

    /// Audio source is unavailable (e.g., network error, file deleted).
    #[error("Audio source unavailable: {0}")]
    SourceUnavailable(String),

    /// Remote fetch failed (transport error or non-success status).
    #[error("Remote fetch failed: {0}")]
    FetchFailed(String),

    // ========================================================================
    // Format/Codec Errors
    // ========================================================================
    /// Audio format is not recognized or cannot be parsed.
    #[error("Unsupported or invalid audio format: {0}")]
    InvalidFormat(String),

    /// Codec is not supported by the decoder.
    #[error("Unsupported codec: {0}")]
    UnsupportedCodec(String),

    /// Audio format was detected but contains no decodable track.
    #[error("Cannot decode audio format: {0}")]
    FormatNotDecodable(String),

    // ========================================================================
    // Decoding Errors
    // ========================================================================
    /// Error occurred during audio decoding.
    #[error("Decoding error: {0}")]
    DecodingError(String),

    /// Audio stream is corrupted or contains invalid data.
    #[error("Corrupted audio stream: {0}")]
    CorruptedStream(String),

    /// Decoder encountered an internal error.
    #[error("Decoder internal error: {0}")]
    DecoderError(String),

    // ========================================================================
    // Playback Control Errors
    // ========================================================================
    /// Seeking is not supported for this audio source.
    #[error("Seeking not supported")]
    SeekNotSupported,

    /// Seek position is out of bounds.
    #[error("Seek position out of bounds: {0:?}")]
    SeekOutOfBounds(std::time::Duration),

    // ========================================================================
    // Output Errors
    // ========================================================================
    /// The host audio output rejected the requested format.
    #[error("Output format not supported: {0}")]
    OutputFormatError(String),

    /// The host audio sink failed.
    #[error("Audio sink error: {0}")]
    SinkError(String),

    /// The sink was closed while samples were still being written.
    #[error("Audio sink closed")]
    SinkClosed,

    // ========================================================================
    // Generic Errors
    // ========================================================================
    /// I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Internal error (should not occur in normal operation).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl MediaError {
    /// Returns `true` if this error is transient and the operation can be
    /// retried.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            MediaError::FetchFailed(_) | MediaError::SourceUnavailable(_)
        )
    }

    /// Returns `true` if this error is related to audio format/codec issues.
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            MediaError::InvalidFormat(_)
                | MediaError::UnsupportedCodec(_)
                | MediaError::FormatNotDecodable(_)
        )
    }
}

/// Result type for media operations.
pub type Result<T> = std::result::Result<T, MediaError>;
