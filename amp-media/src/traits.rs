//! # Media Traits
//!
//! Core abstractions for the decode-and-output pipeline.
//!
//! ## Architecture
//!
//! The pipeline uses a **producer-consumer model**:
//!
//! - **Producer ([`AudioDecoder`])**: Runs in the player's background task,
//!   decodes encoded audio into interleaved f32 PCM chunks.
//!
//! - **Consumer ([`AudioSink`])**: Provided by the host via [`AudioOutput`].
//!   Receives PCM chunks and feeds them to the platform audio engine. The
//!   sink's `write` provides backpressure; the player paces decoding
//!   against it.
//!
//! Both traits are async and `Send` so the pipeline can run on the tokio
//! runtime alongside the rest of the engine.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

// ============================================================================
// Audio Format Types
// ============================================================================

/// Supported audio codecs.
///
/// This enum covers the formats commonly fed to the engine. Use
/// [`AudioCodec::Other`] for platform-specific or proprietary codecs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioCodec {
    /// MPEG-1 Audio Layer 3
    Mp3,
    /// Advanced Audio Coding (AAC/M4A)
    Aac,
    /// Free Lossless Audio Codec
    Flac,
    /// Ogg Vorbis
    Vorbis,
    /// Opus (low-latency codec)
    Opus,
    /// Waveform Audio File Format
    Wav,
    /// Apple Lossless Audio Codec
    Alac,
    /// Codec not recognized
    Unknown,
    /// Custom or proprietary codec
    Other(String),
}

impl AudioCodec {
    /// Returns `true` if this is a lossless codec.
    pub fn is_lossless(&self) -> bool {
        matches!(self, AudioCodec::Flac | AudioCodec::Wav | AudioCodec::Alac)
    }

    /// Returns `true` if this codec is lossy.
    pub fn is_lossy(&self) -> bool {
        matches!(
            self,
            AudioCodec::Mp3 | AudioCodec::Aac | AudioCodec::Vorbis | AudioCodec::Opus
        )
    }
}

/// Audio format metadata describing decoded PCM output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioFormat {
    /// Source codec (before decoding)
    pub codec: AudioCodec,
    /// Sample rate in Hz (e.g., 44100, 48000)
    pub sample_rate: u32,
    /// Number of audio channels (1 = mono, 2 = stereo, etc.)
    pub channels: u16,
    /// Bits per sample in the source format (e.g., 16, 24)
    pub bits_per_sample: Option<u16>,
    /// Average bitrate in kbps (for lossy codecs)
    pub bitrate: Option<u32>,
}

impl AudioFormat {
    /// Create a new audio format descriptor.
    pub fn new(
        codec: AudioCodec,
        sample_rate: u32,
        channels: u16,
        bits_per_sample: Option<u16>,
        bitrate: Option<u32>,
    ) -> Self {
        Self {
            codec,
            sample_rate,
            channels,
            bits_per_sample,
            bitrate,
        }
    }

    /// Standard CD quality (44.1 kHz, 16-bit stereo)
    pub fn cd_quality() -> Self {
        Self {
            codec: AudioCodec::Wav,
            sample_rate: 44100,
            channels: 2,
            bits_per_sample: Some(16),
            bitrate: None,
        }
    }
}

// ============================================================================
// Decoded Audio Data
// ============================================================================

/// A chunk of decoded PCM audio frames.
///
/// This struct represents the output of [`AudioDecoder::decode_frames()`].
/// Samples are normalized to the range `[-1.0, 1.0]` and are interleaved
/// for multi-channel audio (e.g., stereo is LRLRLR...).
#[derive(Debug, Clone)]
pub struct AudioFrameChunk {
    /// Interleaved PCM samples normalized to [-1.0, 1.0].
    pub samples: Vec<f32>,

    /// Number of frames represented by this chunk.
    ///
    /// One frame = one sample per channel.
    /// For stereo: `frames = samples.len() / 2`
    pub frames: usize,

    /// Presentation timestamp for the first frame in this chunk.
    pub timestamp: Duration,
}

impl AudioFrameChunk {
    /// Create a new audio frame chunk.
    pub fn new(samples: Vec<f32>, frames: usize, timestamp: Duration) -> Self {
        Self {
            samples,
            frames,
            timestamp,
        }
    }

    /// Returns `true` if the chunk contains no audio data.
    pub fn is_empty(&self) -> bool {
        self.frames == 0 || self.samples.is_empty()
    }

    /// Returns the duration of this chunk based on sample rate.
    pub fn duration(&self, sample_rate: u32) -> Duration {
        if sample_rate == 0 {
            return Duration::from_secs(0);
        }
        let seconds = self.frames as f64 / sample_rate as f64;
        Duration::from_secs_f64(seconds)
    }

    /// Scale every sample by `gain` in place.
    ///
    /// Gain is applied before samples reach a sink; sinks never apply
    /// volume themselves.
    pub fn apply_gain(&mut self, gain: f32) {
        if (gain - 1.0).abs() < f32::EPSILON {
            return;
        }
        for sample in &mut self.samples {
            *sample *= gain;
        }
    }
}

/// Result of probing an audio stream.
///
/// Contains format metadata and optional tags extracted from the audio
/// container.
#[derive(Debug, Clone)]
pub struct ProbeResult {
    /// Decoded audio format
    pub format: AudioFormat,
    /// Total duration of the audio stream. `None` when the container does
    /// not report a length (e.g., certain remote streams).
    pub duration: Option<Duration>,
    /// Metadata tags (e.g., title, artist, album)
    pub tags: HashMap<String, String>,
}

impl ProbeResult {
    /// Create a new probe result with the given format.
    pub fn new(format: AudioFormat) -> Self {
        Self {
            format,
            duration: None,
            tags: HashMap::new(),
        }
    }

    /// Set the stream duration.
    pub fn with_duration(mut self, duration: Option<Duration>) -> Self {
        self.duration = duration;
        self
    }

    /// Set metadata tags.
    pub fn with_tags(mut self, tags: HashMap<String, String>) -> Self {
        self.tags = tags;
        self
    }
}

// ============================================================================
// Decoder Trait
// ============================================================================

/// Trait for audio decoders that convert encoded audio into PCM samples.
///
/// The decoder reads encoded audio data and outputs interleaved f32 PCM
/// samples in the range [-1.0, 1.0].
///
/// ## Implementation Notes
///
/// - `decode_frames()` should return chunks of the requested size when
///   possible
/// - Seeking may not be supported by all formats (return an error if
///   unsupported)
/// - End of stream is indicated by returning `Ok(None)`
#[async_trait]
pub trait AudioDecoder: Send {
    /// Probe the audio stream and return format metadata.
    ///
    /// This should be called once before decoding begins.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The audio format is not recognized
    /// - The stream is corrupted
    /// - The required codec is not supported
    async fn probe(&mut self) -> Result<ProbeResult>;

    /// Decode up to `max_frames` audio frames from the current position.
    ///
    /// Returns `Ok(None)` when the end of stream is reached.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The stream contains corrupted data
    /// - A codec error occurs
    /// - The source is no longer available
    async fn decode_frames(&mut self, max_frames: usize) -> Result<Option<AudioFrameChunk>>;

    /// Seek to an absolute position in the audio stream.
    ///
    /// After seeking, the next call to `decode_frames()` will return audio
    /// from the requested position.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Seeking is not supported by this format
    /// - The requested position is out of bounds
    async fn seek(&mut self, position: Duration) -> Result<()>;
}

// ============================================================================
// Output Traits
// ============================================================================

/// Host-provided factory for audio output sessions.
///
/// This is the seam between the engine and the platform audio stack: hosts
/// implement it once (cpal, a native bridge, a test capture) and the engine
/// opens one sink per playing clip.
#[async_trait]
pub trait AudioOutput: Send + Sync {
    /// Open an output session for the given PCM format.
    ///
    /// # Errors
    ///
    /// Returns an error if the audio device is unavailable or the format
    /// cannot be satisfied.
    async fn open(&self, format: AudioFormat) -> Result<Box<dyn AudioSink>>;
}

/// One output session, consuming interleaved f32 PCM.
///
/// Sinks receive samples that are already volume-scaled. `write` is
/// expected to apply backpressure (e.g., await buffer space); the player's
/// decode loop is paced entirely by it.
#[async_trait]
pub trait AudioSink: Send {
    /// Write interleaved samples to the output.
    ///
    /// Blocks (asynchronously) until the sink has accepted every sample.
    async fn write(&mut self, samples: &[f32]) -> Result<()>;

    /// Wait until previously written samples have been consumed.
    ///
    /// Called once when a clip reaches its end so the tail is not cut off.
    async fn flush(&mut self) -> Result<()>;

    /// Drop any buffered, not-yet-played samples.
    ///
    /// Called on seek and pause-to-start transitions so stale audio is not
    /// heard after the jump.
    async fn discard(&mut self) -> Result<()>;

    /// Close the session and release device resources.
    async fn close(&mut self) -> Result<()>;
}

// ============================================================================
// Tests
// ============================================================================
