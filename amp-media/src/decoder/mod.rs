//! # Audio Decoder Module
//!
//! Audio decoding using the Symphonia library.
//!
//! ## Overview
//!
//! This module provides [`SymphoniaDecoder`], an implementation of the
//! [`AudioDecoder`](crate::traits::AudioDecoder) trait that supports the
//! major audio formats through the Symphonia pure-Rust audio library:
//! MP3, AAC/M4A, FLAC, Vorbis, Opus, WAV, and ALAC.
//!
//! ## Architecture
//!
//! The decoder uses Symphonia's three-layer architecture:
//!
//! 1. **MediaSource**: Abstracts file/buffer I/O
//! 2. **FormatReader**: Demultiplexes containers, reads packets
//! 3. **Decoder**: Decodes packets to PCM samples
//!
//! ```text
//! MediaSource → MediaSourceStream → FormatReader → Decoder → AudioFrameChunk
//! ```
//!
//! Remote sources are fetched to memory before they reach this module; the
//! decoder itself never performs network I/O.

mod format_detector;
mod sample_converter;
mod symphonia;

pub use self::symphonia::SymphoniaDecoder;
pub use format_detector::FormatDetector;
pub use sample_converter::SampleConverter;
