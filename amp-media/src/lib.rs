//! # Media Module
//!
//! Sources, decoding, and output plumbing for the playback core.
//!
//! ## Overview
//!
//! This crate handles:
//! - Media source descriptors (local file, in-memory buffer, remote URL)
//! - Audio decoding using symphonia
//! - The host output seam ([`AudioOutput`]/[`AudioSink`])
//! - The PCM ring buffer shared with host audio callbacks
//! - Remote fetching (optional, feature-gated)

pub mod config;
pub mod decoder;
pub mod error;
#[cfg(feature = "remote-sources")]
pub mod fetch;
pub mod ring_buffer;
pub mod source;
pub mod traits;

pub use config::PlaybackConfig;
pub use decoder::{FormatDetector, SampleConverter, SymphoniaDecoder};
pub use error::{MediaError, Result};
pub use ring_buffer::RingBuffer;
pub use source::MediaSource;
pub use traits::{
    AudioCodec, AudioDecoder, AudioFormat, AudioFrameChunk, AudioOutput, AudioSink, ProbeResult,
};
