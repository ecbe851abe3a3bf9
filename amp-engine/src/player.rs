//! # Managed Player
//!
//! One loaded clip bound to one audio id. The player owns a background
//! playback task that drives the decode-and-output pipeline; control calls
//! flip shared state the task observes on its next cycle.
//!
//! ## Lifecycle
//!
//! ```text
//! load() ──> Idle ──play()──> Playing ──pause()──> Paused
//!                              │   ▲                 │
//!                              │   └────play()───────┘
//!                              │
//!                     end of stream / endpoint
//!                              │
//!                              ▼ (non-looping: rewind + Completed event)
//!                          Completed ──play()──> Playing
//! ```
//!
//! A looping player never enters `Completed`; at end of stream it seeks
//! back to zero and keeps going. Completion of a non-looping clip rewinds
//! the decoder so a later `play()` starts from the beginning, matching
//! what hosts expect from fire-and-forget clips.

use crate::error::{EngineError, Result};
use amp_media::traits::{AudioDecoder, AudioFormat, AudioSink};
use amp_media::{MediaError, PlaybackConfig};
use amp_runtime::events::{EventBus, PlayerEvent};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// How often the playback task re-checks shared state while it has nothing
/// to decode (paused, idle, completed).
const CONTROL_POLL: Duration = Duration::from_millis(10);

/// Playback lifecycle state of a managed player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    /// Loaded, never started (or stopped by a failed control call).
    Idle,
    /// Actively decoding and emitting samples.
    Playing,
    /// Paused; position retained.
    Paused,
    /// Non-looping clip reached its end; rewound to the start.
    Completed,
    /// The playback task died on an unrecoverable error.
    Failed,
}

/// Options for [`ManagedPlayer::play`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PlayOptions {
    /// Seek to the beginning before starting.
    pub from_start: bool,
    /// Stop playback (with a completion event) at this position.
    pub endpoint: Option<Duration>,
}

impl PlayOptions {
    /// Play from the current position to the end.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restart from the beginning.
    pub fn from_start() -> Self {
        Self {
            from_start: true,
            endpoint: None,
        }
    }

    /// Stop playback once `endpoint` is reached.
    pub fn with_endpoint(mut self, endpoint: Duration) -> Self {
        self.endpoint = Some(endpoint);
        self
    }
}

/// A seek waiting to be applied by the playback task.
struct SeekRequest {
    position: Duration,
    /// Present for caller-initiated seeks; the caller is unblocked once the
    /// task has applied (or rejected) the seek.
    ack: Option<oneshot::Sender<Result<()>>>,
}

/// State shared between control handles and the playback task.
pub(crate) struct PlayerShared {
    audio_id: String,
    looping: bool,
    state: Mutex<PlayerState>,
    volume: Mutex<f32>,
    position: Mutex<Duration>,
    duration: Mutex<Option<Duration>>,
    pending_seek: Mutex<Option<SeekRequest>>,
    endpoint: Mutex<Option<Duration>>,
    cancel: CancellationToken,
}

impl PlayerShared {
    pub(crate) fn new(audio_id: String, looping: bool, duration: Option<Duration>) -> Arc<Self> {
        Arc::new(Self {
            audio_id,
            looping,
            state: Mutex::new(PlayerState::Idle),
            volume: Mutex::new(1.0),
            position: Mutex::new(Duration::ZERO),
            duration: Mutex::new(duration),
            pending_seek: Mutex::new(None),
            endpoint: Mutex::new(None),
            cancel: CancellationToken::new(),
        })
    }

    pub(crate) fn cancel(&self) {
        self.cancel.cancel();
    }
}

/// Control handle for one loaded clip.
///
/// Handles are cheap to clone; all of them refer to the same underlying
/// player. After the player is released every control call fails with
/// [`EngineError::PlayerClosed`].
#[derive(Clone)]
pub struct ManagedPlayer {
    shared: Arc<PlayerShared>,
    events: EventBus,
}

impl ManagedPlayer {
    pub(crate) fn new(shared: Arc<PlayerShared>, events: EventBus) -> Self {
        Self { shared, events }
    }

    /// The audio id this player was loaded under.
    pub fn audio_id(&self) -> &str {
        &self.shared.audio_id
    }

    /// Whether the clip restarts automatically at end of stream.
    pub fn is_looping(&self) -> bool {
        self.shared.looping
    }

    /// Current lifecycle state.
    pub fn state(&self) -> PlayerState {
        *self.shared.state.lock()
    }

    /// Current playback position.
    pub fn position(&self) -> Duration {
        *self.shared.position.lock()
    }

    /// Clip duration, when the container reported one.
    pub fn duration(&self) -> Option<Duration> {
        *self.shared.duration.lock()
    }

    /// Current volume.
    pub fn volume(&self) -> f32 {
        *self.shared.volume.lock()
    }

    /// Start or resume playback.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::PlayerClosed`] if the player was released or
    /// its playback task failed.
    pub fn play(&self, options: PlayOptions) -> Result<()> {
        self.ensure_open()?;

        *self.shared.endpoint.lock() = options.endpoint;

        if options.from_start {
            // Queued like a caller seek, but nobody waits for it
            *self.shared.pending_seek.lock() = Some(SeekRequest {
                position: Duration::ZERO,
                ack: None,
            });
        }

        *self.shared.state.lock() = PlayerState::Playing;
        debug!(audio_id = %self.shared.audio_id, from_start = options.from_start, "play");

        self.events
            .emit(PlayerEvent::Started {
                audio_id: self.shared.audio_id.clone(),
            })
            .ok();

        Ok(())
    }

    /// Pause playback, retaining the current position.
    ///
    /// Pausing a player that is not playing is a no-op.
    pub fn pause(&self) -> Result<()> {
        self.ensure_open()?;

        let mut state = self.shared.state.lock();
        if *state != PlayerState::Playing {
            return Ok(());
        }
        *state = PlayerState::Paused;
        drop(state);

        let position = self.position();
        debug!(audio_id = %self.shared.audio_id, ?position, "pause");

        self.events
            .emit(PlayerEvent::Paused {
                audio_id: self.shared.audio_id.clone(),
                position,
            })
            .ok();

        Ok(())
    }

    /// Seek to an absolute position.
    ///
    /// Resolves once the playback task has applied the seek, mirroring the
    /// asynchronous seek-complete signal of platform media players.
    ///
    /// # Errors
    ///
    /// - [`EngineError::SeekOutOfBounds`] when the position lies beyond the
    ///   known duration
    /// - [`EngineError::PlayerClosed`] when the player is gone before the
    ///   seek could be applied
    pub async fn seek(&self, position: Duration) -> Result<()> {
        self.ensure_open()?;

        if let Some(duration) = self.duration() {
            if position > duration {
                return Err(EngineError::SeekOutOfBounds(position));
            }
        }

        let (tx, rx) = oneshot::channel();
        *self.shared.pending_seek.lock() = Some(SeekRequest {
            position,
            ack: Some(tx),
        });

        match rx.await {
            Ok(result) => result,
            // Task exited before applying the seek (release or failure)
            Err(_) => Err(EngineError::PlayerClosed(self.shared.audio_id.clone())),
        }
    }

    /// Set the playback volume.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidVolume`] unless `0.0 <= volume <= 1.0`.
    pub fn set_volume(&self, volume: f32) -> Result<()> {
        self.ensure_open()?;

        if !(0.0..=1.0).contains(&volume) {
            return Err(EngineError::InvalidVolume(volume));
        }

        *self.shared.volume.lock() = volume;
        Ok(())
    }

    pub(crate) fn shared(&self) -> &Arc<PlayerShared> {
        &self.shared
    }

    fn ensure_open(&self) -> Result<()> {
        if self.shared.cancel.is_cancelled() || self.state() == PlayerState::Failed {
            return Err(EngineError::PlayerClosed(self.shared.audio_id.clone()));
        }
        Ok(())
    }
}

impl std::fmt::Debug for ManagedPlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManagedPlayer")
            .field("audio_id", &self.shared.audio_id)
            .field("state", &self.state())
            .field("looping", &self.shared.looping)
            .finish()
    }
}

// ============================================================================
// Playback Task
// ============================================================================

/// Spawn the playback task for a loaded clip.
pub(crate) fn spawn(
    decoder: Box<dyn AudioDecoder>,
    sink: Box<dyn AudioSink>,
    shared: Arc<PlayerShared>,
    events: EventBus,
    config: PlaybackConfig,
    format: AudioFormat,
) -> JoinHandle<()> {
    tokio::spawn(run(decoder, sink, shared, events, config, format))
}

/// Playback task main loop.
///
/// The task is the sole owner of the decoder and sink. Controls never touch
/// them directly; they flip shared state (or park a seek request) and the
/// loop picks the change up within one cycle. Decoding is paced entirely by
/// the sink's backpressure.
async fn run(
    mut decoder: Box<dyn AudioDecoder>,
    mut sink: Box<dyn AudioSink>,
    shared: Arc<PlayerShared>,
    events: EventBus,
    config: PlaybackConfig,
    format: AudioFormat,
) {
    let audio_id = shared.audio_id.clone();
    let sample_rate = format.sample_rate.max(1);
    let mut last_position_emit = Instant::now();

    info!(audio_id = %audio_id, "playback task started");

    loop {
        if shared.cancel.is_cancelled() {
            debug!(audio_id = %audio_id, "playback task cancelled");
            break;
        }

        // Seeks apply in any state, so a paused player can be repositioned
        let request = shared.pending_seek.lock().take();
        if let Some(request) = request {
            let result = apply_seek(
                &mut decoder,
                &mut sink,
                &shared,
                &events,
                request.position,
            )
            .await;

            match request.ack {
                Some(ack) => {
                    ack.send(result).ok();
                }
                None => {
                    if let Err(e) = result {
                        warn!(audio_id = %audio_id, "restart seek failed: {}", e);
                    }
                }
            }
        }

        let state = *shared.state.lock();
        match state {
            PlayerState::Playing => {}
            PlayerState::Failed => break,
            PlayerState::Idle | PlayerState::Paused | PlayerState::Completed => {
                tokio::select! {
                    _ = shared.cancel.cancelled() => break,
                    _ = sleep(CONTROL_POLL) => {}
                }
                continue;
            }
        }

        let position = *shared.position.lock();
        let endpoint = *shared.endpoint.lock();

        if let Some(end) = endpoint {
            if position >= end {
                finish_clip(&mut decoder, &mut sink, &shared, &events).await;
                continue;
            }
        }

        match decoder.decode_frames(config.decode_chunk_frames).await {
            Ok(Some(mut chunk)) => {
                if chunk.is_empty() {
                    continue;
                }

                // Never emit past an endpoint: trim the chunk that crosses it
                if let Some(end) = endpoint {
                    let chunk_duration = chunk.duration(sample_rate);
                    if position + chunk_duration > end {
                        let remaining = end.saturating_sub(position);
                        let channels = chunk.samples.len() / chunk.frames;
                        let frames =
                            ((remaining.as_secs_f64() * sample_rate as f64) as usize)
                                .min(chunk.frames);
                        if frames == 0 {
                            // Less than one frame left before the endpoint
                            finish_clip(&mut decoder, &mut sink, &shared, &events).await;
                            continue;
                        }
                        chunk.samples.truncate(frames * channels);
                        chunk.frames = frames;
                    }
                }

                let gain = *shared.volume.lock();
                chunk.apply_gain(gain);

                let write_result = tokio::select! {
                    _ = shared.cancel.cancelled() => break,
                    result = sink.write(&chunk.samples) => result,
                };

                if let Err(e) = write_result {
                    fail(&shared, &events, &audio_id, &e);
                    break;
                }

                let new_position = position + chunk.duration(sample_rate);
                *shared.position.lock() = new_position;

                if last_position_emit.elapsed() >= config.position_interval {
                    last_position_emit = Instant::now();
                    events
                        .emit(PlayerEvent::Position {
                            audio_id: audio_id.clone(),
                            position: new_position,
                            duration: *shared.duration.lock(),
                        })
                        .ok();
                }
            }
            Ok(None) => {
                if shared.looping {
                    // Seamless restart; looping clips never complete
                    if let Err(e) = decoder.seek(Duration::ZERO).await {
                        fail(&shared, &events, &audio_id, &e);
                        break;
                    }
                    *shared.position.lock() = Duration::ZERO;
                    continue;
                }

                finish_clip(&mut decoder, &mut sink, &shared, &events).await;
            }
            Err(e) => {
                fail(&shared, &events, &audio_id, &e);
                break;
            }
        }
    }

    sink.close().await.ok();

    // Unblock any caller still waiting on a parked seek
    if let Some(request) = shared.pending_seek.lock().take() {
        if let Some(ack) = request.ack {
            ack.send(Err(EngineError::PlayerClosed(audio_id.clone()))).ok();
        }
    }

    info!(audio_id = %audio_id, "playback task stopped");
}

/// Apply a parked seek request: reposition the decoder, drop buffered
/// output, and move the shared position.
async fn apply_seek(
    decoder: &mut Box<dyn AudioDecoder>,
    sink: &mut Box<dyn AudioSink>,
    shared: &Arc<PlayerShared>,
    events: &EventBus,
    position: Duration,
) -> Result<()> {
    decoder.seek(position).await.map_err(|e| match e {
        MediaError::SeekOutOfBounds(p) => EngineError::SeekOutOfBounds(p),
        other => EngineError::Media(other),
    })?;

    sink.discard().await.map_err(EngineError::Media)?;
    *shared.position.lock() = position;

    events
        .emit(PlayerEvent::Position {
            audio_id: shared.audio_id.clone(),
            position,
            duration: *shared.duration.lock(),
        })
        .ok();

    Ok(())
}

/// Terminate a clip that reached its end (of stream or endpoint): drain the
/// sink, rewind, and notify.
async fn finish_clip(
    decoder: &mut Box<dyn AudioDecoder>,
    sink: &mut Box<dyn AudioSink>,
    shared: &Arc<PlayerShared>,
    events: &EventBus,
) {
    sink.flush().await.ok();

    // Rewind so a later play() starts from the beginning
    if let Err(e) = decoder.seek(Duration::ZERO).await {
        warn!(audio_id = %shared.audio_id, "rewind after completion failed: {}", e);
    }
    *shared.position.lock() = Duration::ZERO;
    *shared.endpoint.lock() = None;
    *shared.state.lock() = PlayerState::Completed;

    info!(audio_id = %shared.audio_id, "clip completed");

    events
        .emit(PlayerEvent::Completed {
            audio_id: shared.audio_id.clone(),
        })
        .ok();
}

/// Mark the player failed and notify subscribers.
fn fail(shared: &Arc<PlayerShared>, events: &EventBus, audio_id: &str, e: &MediaError) {
    error!(audio_id = %audio_id, "playback failed: {}", e);
    *shared.state.lock() = PlayerState::Failed;
    events
        .emit(PlayerEvent::Error {
            audio_id: audio_id.to_string(),
            message: e.to_string(),
            recoverable: e.is_transient(),
        })
        .ok();
}

// ============================================================================
// Tests
// ============================================================================
