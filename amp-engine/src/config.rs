//! # Engine Configuration
//!
//! Builder-based configuration for [`PlayerEngine`](crate::PlayerEngine).
//!
//! ## Overview
//!
//! The configuration holds the host dependencies and tunables the engine
//! needs. It enforces fail-fast validation so a missing audio output is
//! reported at construction time with an actionable message, not as a
//! panic deep inside playback.
//!
//! ## Usage
//!
//! ```rust
//! use amp_engine::{EngineConfig, NullOutput};
//! use std::sync::Arc;
//!
//! let config = EngineConfig::builder()
//!     .output(Arc::new(NullOutput::new()))
//!     .event_capacity(128)
//!     .build()
//!     .expect("Failed to build config");
//! ```

use crate::error::{EngineError, Result};
use amp_media::traits::AudioOutput;
use amp_media::PlaybackConfig;
use amp_runtime::events::DEFAULT_EVENT_BUFFER_SIZE;
use std::sync::Arc;

/// Engine configuration.
///
/// Use [`EngineConfig::builder`] to construct instances.
#[derive(Clone)]
pub struct EngineConfig {
    /// Host audio output (required)
    pub output: Arc<dyn AudioOutput>,

    /// Decode/buffer pipeline tunables
    pub playback: PlaybackConfig,

    /// Event bus buffer capacity
    pub event_capacity: usize,
}

impl std::fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineConfig")
            .field("output", &"AudioOutput { ... }")
            .field("playback", &self.playback)
            .field("event_capacity", &self.event_capacity)
            .finish()
    }
}

impl EngineConfig {
    /// Start building a configuration.
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        self.playback
            .validate()
            .map_err(EngineError::Config)?;

        if self.event_capacity == 0 {
            return Err(EngineError::Config(
                "event_capacity must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for [`EngineConfig`].
#[derive(Default)]
pub struct EngineConfigBuilder {
    output: Option<Arc<dyn AudioOutput>>,
    playback: Option<PlaybackConfig>,
    event_capacity: Option<usize>,
}

impl EngineConfigBuilder {
    /// Set the host audio output (required).
    pub fn output(mut self, output: Arc<dyn AudioOutput>) -> Self {
        self.output = Some(output);
        self
    }

    /// Set the playback pipeline configuration.
    pub fn playback(mut self, playback: PlaybackConfig) -> Self {
        self.playback = Some(playback);
        self
    }

    /// Set the event bus buffer capacity.
    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = Some(capacity);
        self
    }

    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the audio output is missing or any tunable is
    /// invalid.
    pub fn build(self) -> Result<EngineConfig> {
        let output = self.output.ok_or_else(|| {
            EngineError::Config(
                "No AudioOutput implementation provided. \
                 Pass one via EngineConfigBuilder::output(); \
                 NullOutput works for headless hosts and tests."
                    .to_string(),
            )
        })?;

        let config = EngineConfig {
            output,
            playback: self.playback.unwrap_or_default(),
            event_capacity: self.event_capacity.unwrap_or(DEFAULT_EVENT_BUFFER_SIZE),
        };

        config.validate()?;
        Ok(config)
    }
}
