//! # Engine Error Types
//!
//! Error types for player registry and control operations.

use amp_media::MediaError;
use thiserror::Error;

/// Errors produced by the player engine and its managed players.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Tried to load a player under an audio id that is already in use.
    #[error("Player already loaded: {0}")]
    PlayerExists(String),

    /// A control call referenced an audio id with no loaded player.
    #[error("Unknown player: {0}")]
    UnknownPlayer(String),

    /// A control call referenced a player whose load has not finished yet.
    #[error("Player not ready: {0}")]
    PlayerNotReady(String),

    /// The player's playback task has terminated (released or failed).
    #[error("Player closed: {0}")]
    PlayerClosed(String),

    /// Loading a source failed; the player was removed again.
    #[error("Loading '{audio_id}' failed: {source}")]
    LoadFailed {
        /// The audio id the load was requested under.
        audio_id: String,
        /// Underlying media failure.
        #[source]
        source: MediaError,
    },

    /// Invalid volume value (must be in range [0.0, 1.0]).
    #[error("Invalid volume: {0} (must be between 0.0 and 1.0)")]
    InvalidVolume(f32),

    /// Seek position is out of bounds.
    #[error("Seek position out of bounds: {0:?}")]
    SeekOutOfBounds(std::time::Duration),

    /// A remote source was given but the `remote-sources` feature is off.
    #[error("Remote sources are not enabled. Enable the 'remote-sources' feature")]
    RemoteSourcesDisabled,

    /// Engine configuration is invalid or incomplete.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Media pipeline failure outside of load.
    #[error(transparent)]
    Media(#[from] MediaError),
}

impl EngineError {
    /// Returns `true` if the error is transient and the operation can be
    /// retried with the same arguments.
    pub fn is_transient(&self) -> bool {
        match self {
            EngineError::LoadFailed { source, .. } => source.is_transient(),
            EngineError::Media(source) => source.is_transient(),
            _ => false,
        }
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
