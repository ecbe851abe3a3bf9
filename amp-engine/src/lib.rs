//! # Player Engine
//!
//! Embeddable managed-audio-player core for host applications.
//!
//! ## Overview
//!
//! Hosts create a [`PlayerEngine`], load clips under caller-chosen audio
//! ids (from a local file, an in-memory buffer, or a remote URL), control
//! them with play/pause/seek/volume/release, and observe lifecycle events
//! (load complete, periodic position, completion) on a broadcast bus.
//!
//! The platform audio device sits behind the
//! [`AudioOutput`](amp_media::traits::AudioOutput) trait. [`NullOutput`]
//! and [`RingOutput`] ship with the engine; device-backed outputs are host
//! adapters.
//!
//! ## Features
//!
//! - `remote-sources`: enables loading `MediaSource::RemoteUrl` via HTTP.

pub mod config;
pub mod engine;
pub mod error;
pub mod output;
pub mod player;

pub use config::{EngineConfig, EngineConfigBuilder};
pub use engine::{LoadRequest, PlayerEngine};
pub use error::{EngineError, Result};
pub use output::{NullOutput, RingOutput};
pub use player::{ManagedPlayer, PlayOptions, PlayerState};

// Commonly used types from the sibling crates
pub use amp_media::{AudioCodec, AudioFormat, MediaSource, PlaybackConfig, RingBuffer};
pub use amp_runtime::events::{EventBus, EventStream, PlayerEvent};
