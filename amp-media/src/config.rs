//! # Playback Configuration
//!
//! Tunables for the decode-and-output pipeline.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Pipeline configuration.
///
/// Controls buffer sizes, decode chunk sizes, the position-notification
/// cadence, and remote fetch timeouts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Target output buffer size in frames (one frame = samples for all
    /// channels).
    ///
    /// Used to size the PCM ring buffer behind ring-backed outputs.
    /// Default: 2 seconds of CD-quality audio (88200 frames).
    #[serde(default = "default_buffer_frames")]
    pub buffer_frames: usize,

    /// Number of frames to decode per cycle.
    ///
    /// Larger values reduce overhead but increase latency.
    ///
    /// Default: 4096 frames (~93ms at 44.1kHz).
    #[serde(default = "default_decode_chunk_frames")]
    pub decode_chunk_frames: usize,

    /// Interval between position events while a clip is playing.
    ///
    /// Default: 250 ms.
    #[serde(default = "default_position_interval")]
    pub position_interval: Duration,

    /// Maximum duration to wait for a remote source to download.
    ///
    /// Default: 30 seconds.
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout: Duration,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            buffer_frames: default_buffer_frames(),
            decode_chunk_frames: default_decode_chunk_frames(),
            position_interval: default_position_interval(),
            fetch_timeout: default_fetch_timeout(),
        }
    }
}

impl PlaybackConfig {
    /// Create a configuration optimized for low latency.
    ///
    /// - Smaller buffer (0.5s)
    /// - Smaller decode chunks
    /// - Faster position updates
    pub fn low_latency() -> Self {
        Self {
            buffer_frames: 22050,      // 0.5s at 44.1kHz
            decode_chunk_frames: 2048, // ~46ms
            position_interval: Duration::from_millis(100),
            ..Default::default()
        }
    }

    /// Create a configuration optimized for stability.
    ///
    /// - Larger buffer (5s)
    /// - Larger decode chunks for efficiency
    pub fn high_quality() -> Self {
        Self {
            buffer_frames: 220500,     // 5s at 44.1kHz
            decode_chunk_frames: 8192, // ~186ms
            ..Default::default()
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.buffer_frames == 0 {
            return Err("buffer_frames must be > 0".to_string());
        }

        if self.decode_chunk_frames == 0 {
            return Err("decode_chunk_frames must be > 0".to_string());
        }

        if self.decode_chunk_frames > self.buffer_frames {
            return Err("decode_chunk_frames cannot exceed buffer_frames".to_string());
        }

        if self.position_interval.is_zero() {
            return Err("position_interval must be > 0".to_string());
        }

        if self.fetch_timeout.is_zero() {
            return Err("fetch_timeout must be > 0".to_string());
        }

        Ok(())
    }

    /// Calculate buffer size in samples for a given channel count.
    pub fn buffer_samples(&self, channels: u16) -> usize {
        self.buffer_frames * channels as usize
    }
}

// ============================================================================
// Default Functions (for serde)
// ============================================================================

fn default_buffer_frames() -> usize {
    88200 // 2 seconds at 44.1kHz
}

fn default_decode_chunk_frames() -> usize {
    4096 // ~93ms at 44.1kHz
}

fn default_position_interval() -> Duration {
    Duration::from_millis(250)
}

fn default_fetch_timeout() -> Duration {
    Duration::from_secs(30)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = PlaybackConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.buffer_frames, 88200);
        assert_eq!(config.position_interval, Duration::from_millis(250));
    }

    #[test]
    fn low_latency_config() {
        let config = PlaybackConfig::low_latency();
        assert!(config.validate().is_ok());
        assert!(config.buffer_frames < PlaybackConfig::default().buffer_frames);
        assert!(config.position_interval < PlaybackConfig::default().position_interval);
    }

    #[test]
    fn high_quality_config() {
        let config = PlaybackConfig::high_quality();
        assert!(config.validate().is_ok());
        assert!(config.buffer_frames > PlaybackConfig::default().buffer_frames);
    }

    #[test]
    fn config_validation() {
        let mut config = PlaybackConfig::default();
        assert!(config.validate().is_ok());

        config.buffer_frames = 0;
        assert!(config.validate().is_err());
        config.buffer_frames = 88200;

        config.decode_chunk_frames = 100000;
        assert!(config.validate().is_err());
        config.decode_chunk_frames = 4096;

        config.position_interval = Duration::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn buffer_samples_calculation() {
        let config = PlaybackConfig::default();

        assert_eq!(config.buffer_samples(1), 88200);
        assert_eq!(config.buffer_samples(2), 176400);
    }
}
