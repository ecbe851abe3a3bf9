//! # Player Engine
//!
//! Registry of managed players keyed by caller-chosen audio ids. This is
//! the façade hosts talk to: load a clip under an id, control it by id,
//! observe lifecycle events on the bus, release it when done.
//!
//! ## Overview
//!
//! ```no_run
//! use amp_engine::{EngineConfig, LoadRequest, NullOutput, PlayOptions, PlayerEngine};
//! use amp_media::MediaSource;
//! use std::sync::Arc;
//!
//! # async fn example() -> amp_engine::Result<()> {
//! let config = EngineConfig::builder()
//!     .output(Arc::new(NullOutput::new()))
//!     .build()?;
//! let engine = PlayerEngine::new(config)?;
//!
//! let mut events = engine.subscribe();
//!
//! engine
//!     .load(LoadRequest::new("click", MediaSource::local("/sounds/click.wav")))
//!     .await?;
//! engine.play("click", PlayOptions::new())?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Semantics
//!
//! - One player per audio id; loading an id twice is an error until the
//!   first player is released.
//! - Remote sources are registered immediately and fetched asynchronously;
//!   when the fetch or probe fails the player is removed again and `load`
//!   resolves with the failure.
//! - Control calls on ids that were never loaded (or already released)
//!   fail with [`EngineError::UnknownPlayer`].

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::player::{self, ManagedPlayer, PlayOptions, PlayerShared, PlayerState};
use amp_media::error::Result as MediaResult;
use amp_media::traits::{AudioDecoder, AudioOutput};
use amp_media::{MediaSource, PlaybackConfig, SymphoniaDecoder};
use amp_runtime::events::{EventBus, EventStream, PlayerEvent, Receiver};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument};

#[cfg(feature = "remote-sources")]
use amp_media::decoder::FormatDetector;
#[cfg(feature = "remote-sources")]
use amp_media::fetch::{url_extension, RemoteFetcher};

// ============================================================================
// Load Requests
// ============================================================================

/// Request to load a clip under an audio id.
#[derive(Debug, Clone)]
pub struct LoadRequest {
    /// Caller-chosen identifier; one player per id.
    pub audio_id: String,
    /// Where the encoded audio comes from.
    pub source: MediaSource,
    /// Restart automatically at end of stream.
    pub looping: bool,
}

impl LoadRequest {
    /// Create a non-looping load request.
    pub fn new(audio_id: impl Into<String>, source: MediaSource) -> Self {
        Self {
            audio_id: audio_id.into(),
            source,
            looping: false,
        }
    }

    /// Set the looping flag.
    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }
}

// ============================================================================
// Engine
// ============================================================================

/// Registry slot: a player is reserved while its source loads, so the id
/// is taken from the first moment even though remote fetches resolve
/// asynchronously.
enum PlayerSlot {
    Loading,
    Ready(PlayerEntry),
}

struct PlayerEntry {
    handle: ManagedPlayer,
    task: JoinHandle<()>,
}

struct EngineInner {
    players: Mutex<HashMap<String, PlayerSlot>>,
    events: EventBus,
    output: Arc<dyn AudioOutput>,
    playback: PlaybackConfig,
    #[cfg(feature = "remote-sources")]
    fetcher: RemoteFetcher,
}

impl Drop for EngineInner {
    fn drop(&mut self) {
        // Engines dropped without release_all() must not leak playback tasks
        for slot in self.players.lock().values() {
            if let PlayerSlot::Ready(entry) = slot {
                entry.handle.shared().cancel();
            }
        }
    }
}

/// The player engine façade.
///
/// Cheap to clone; clones share the same registry and event bus.
#[derive(Clone)]
pub struct PlayerEngine {
    inner: Arc<EngineInner>,
}

impl PlayerEngine {
    /// Create an engine from a validated configuration.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;

        #[cfg(feature = "remote-sources")]
        let fetcher = RemoteFetcher::new(config.playback.fetch_timeout)?;

        Ok(Self {
            inner: Arc::new(EngineInner {
                players: Mutex::new(HashMap::new()),
                events: EventBus::new(config.event_capacity),
                output: config.output,
                playback: config.playback,
                #[cfg(feature = "remote-sources")]
                fetcher,
            }),
        })
    }

    // ------------------------------------------------------------------
    // Loading
    // ------------------------------------------------------------------

    /// Load a clip and register it under its audio id.
    ///
    /// Local and in-memory sources load before this returns. Remote
    /// sources are fetched while the id is already registered; if the
    /// fetch or probe fails the registration is rolled back and the error
    /// returned.
    ///
    /// On success a [`PlayerEvent::Loaded`] event carries the clip
    /// duration (or `None` when the container does not report one).
    ///
    /// # Errors
    ///
    /// - [`EngineError::PlayerExists`] if the id is already in use
    /// - [`EngineError::RemoteSourcesDisabled`] for remote sources without
    ///   the `remote-sources` feature
    /// - [`EngineError::LoadFailed`] when the source cannot be opened,
    ///   fetched, or decoded
    #[instrument(skip(self, request), fields(audio_id = %request.audio_id))]
    pub async fn load(&self, request: LoadRequest) -> Result<()> {
        let LoadRequest {
            audio_id,
            source,
            looping,
        } = request;

        #[cfg(not(feature = "remote-sources"))]
        if source.is_remote() {
            return Err(EngineError::RemoteSourcesDisabled);
        }

        info!("Loading {} from {}", audio_id, source.describe());

        // Reserve the id before any (possibly slow) source work
        {
            let mut players = self.inner.players.lock();
            if players.contains_key(&audio_id) {
                return Err(EngineError::PlayerExists(audio_id));
            }
            players.insert(audio_id.clone(), PlayerSlot::Loading);
        }

        let built = self.build_player(&audio_id, source, looping).await;

        let mut players = self.inner.players.lock();
        match built {
            Ok((entry, duration)) => {
                if !matches!(players.get(&audio_id), Some(PlayerSlot::Loading)) {
                    // Released while the source was loading; the cancelled
                    // task winds itself down and closes its sink
                    drop(players);
                    entry.handle.shared().cancel();
                    return Err(EngineError::PlayerClosed(audio_id));
                }

                players.insert(audio_id.clone(), PlayerSlot::Ready(entry));
                drop(players);

                debug!("Loaded {} (duration: {:?})", audio_id, duration);
                self.inner
                    .events
                    .emit(PlayerEvent::Loaded { audio_id, duration })
                    .ok();
                Ok(())
            }
            Err(e) => {
                players.remove(&audio_id);
                drop(players);
                Err(EngineError::LoadFailed {
                    audio_id,
                    source: e,
                })
            }
        }
    }

    /// Resolve the source, open decoder and sink, and spawn the playback
    /// task.
    async fn build_player(
        &self,
        audio_id: &str,
        source: MediaSource,
        looping: bool,
    ) -> MediaResult<(PlayerEntry, Option<Duration>)> {
        let source = self.resolve_source(source).await?;

        let mut decoder = SymphoniaDecoder::new(source)?;
        let probe = decoder.probe().await?;
        let format = probe.format;
        let duration = probe.duration;

        let sink = self.inner.output.open(format.clone()).await?;

        let shared = PlayerShared::new(audio_id.to_string(), looping, duration);
        let handle = ManagedPlayer::new(Arc::clone(&shared), self.inner.events.clone());
        let task = player::spawn(
            Box::new(decoder),
            sink,
            shared,
            self.inner.events.clone(),
            self.inner.playback.clone(),
            format,
        );

        Ok((PlayerEntry { handle, task }, duration))
    }

    /// Download remote sources into memory; everything else passes through.
    #[cfg(feature = "remote-sources")]
    async fn resolve_source(&self, source: MediaSource) -> MediaResult<MediaSource> {
        match source {
            MediaSource::RemoteUrl { url, headers } => {
                let data = self.inner.fetcher.fetch(&url, &headers).await?;
                let codec_hint =
                    url_extension(&url).and_then(FormatDetector::codec_from_extension);
                Ok(MediaSource::MemoryBuffer { data, codec_hint })
            }
            other => Ok(other),
        }
    }

    #[cfg(not(feature = "remote-sources"))]
    async fn resolve_source(&self, source: MediaSource) -> MediaResult<MediaSource> {
        // Remote sources were rejected before reservation
        Ok(source)
    }

    // ------------------------------------------------------------------
    // Controls
    // ------------------------------------------------------------------

    /// Start or resume playback of a loaded clip.
    pub fn play(&self, audio_id: &str, options: PlayOptions) -> Result<()> {
        self.ready(audio_id)?.play(options)
    }

    /// Pause a playing clip, retaining its position.
    pub fn pause(&self, audio_id: &str) -> Result<()> {
        self.ready(audio_id)?.pause()
    }

    /// Seek a clip to an absolute position. Resolves once applied.
    pub async fn seek(&self, audio_id: &str, position: Duration) -> Result<()> {
        self.ready(audio_id)?.seek(position).await
    }

    /// Set a clip's volume in `[0.0, 1.0]`.
    pub fn set_volume(&self, audio_id: &str, volume: f32) -> Result<()> {
        self.ready(audio_id)?.set_volume(volume)
    }

    /// Release a player: stop its playback task, close its sink, and free
    /// its audio id.
    pub async fn release(&self, audio_id: &str) -> Result<()> {
        let slot = self.inner.players.lock().remove(audio_id);

        match slot {
            None => Err(EngineError::UnknownPlayer(audio_id.to_string())),
            Some(PlayerSlot::Loading) => {
                // The in-flight load notices the missing reservation
                self.emit_released(audio_id);
                Ok(())
            }
            Some(PlayerSlot::Ready(entry)) => {
                entry.handle.shared().cancel();
                entry.task.await.ok();
                self.emit_released(audio_id);
                Ok(())
            }
        }
    }

    /// Release every player. Called by hosts on teardown.
    pub async fn release_all(&self) {
        let audio_ids: Vec<String> = self.inner.players.lock().keys().cloned().collect();

        info!("Releasing all players ({})", audio_ids.len());
        for audio_id in audio_ids {
            self.release(&audio_id).await.ok();
        }
    }

    fn emit_released(&self, audio_id: &str) {
        info!("Released {}", audio_id);
        self.inner
            .events
            .emit(PlayerEvent::Released {
                audio_id: audio_id.to_string(),
            })
            .ok();
    }

    // ------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------

    /// Returns `true` if a player (loading or ready) occupies `audio_id`.
    pub fn contains(&self, audio_id: &str) -> bool {
        self.inner.players.lock().contains_key(audio_id)
    }

    /// Audio ids of all registered players.
    pub fn audio_ids(&self) -> Vec<String> {
        self.inner.players.lock().keys().cloned().collect()
    }

    /// Control handle for a loaded player.
    pub fn player(&self, audio_id: &str) -> Result<ManagedPlayer> {
        self.ready(audio_id)
    }

    /// Lifecycle state of a loaded player.
    pub fn state(&self, audio_id: &str) -> Result<PlayerState> {
        Ok(self.ready(audio_id)?.state())
    }

    /// Current position of a loaded player.
    pub fn position(&self, audio_id: &str) -> Result<Duration> {
        Ok(self.ready(audio_id)?.position())
    }

    /// Duration of a loaded player's clip, when known.
    pub fn duration(&self, audio_id: &str) -> Result<Option<Duration>> {
        Ok(self.ready(audio_id)?.duration())
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    /// Subscribe to the raw event stream.
    pub fn subscribe(&self) -> Receiver<PlayerEvent> {
        self.inner.events.subscribe()
    }

    /// Subscribe with an [`EventStream`] wrapper for filtered consumption.
    pub fn events(&self) -> EventStream {
        EventStream::new(self.inner.events.subscribe())
    }

    /// Clone of the underlying event bus.
    pub fn event_bus(&self) -> EventBus {
        self.inner.events.clone()
    }

    fn ready(&self, audio_id: &str) -> Result<ManagedPlayer> {
        let players = self.inner.players.lock();
        match players.get(audio_id) {
            None => Err(EngineError::UnknownPlayer(audio_id.to_string())),
            Some(PlayerSlot::Loading) => Err(EngineError::PlayerNotReady(audio_id.to_string())),
            Some(PlayerSlot::Ready(entry)) => Ok(entry.handle.clone()),
        }
    }
}

impl std::fmt::Debug for PlayerEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerEngine")
            .field("players", &self.audio_ids())
            .finish()
    }
}
