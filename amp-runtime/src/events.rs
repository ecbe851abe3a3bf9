//! # Event Bus System
//!
//! Provides the notification surface of the playback core using
//! `tokio::sync::broadcast`. Every lifecycle transition of a managed player
//! (load complete, playback started, periodic position, completion, release,
//! error) is published here as a typed event keyed by the player's audio id.
//!
//! ## Overview
//!
//! The event bus system consists of:
//! - **Event Types**: Strongly-typed enum of player lifecycle events
//! - **EventBus**: Central broadcast channel for publishing events
//! - **EventStream**: Wrapper for consuming events with filtering
//! - **Subscription Management**: Multiple subscribers can listen independently
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐     emit      ┌───────────┐
//! │ Player task  ├──────────────>│           │
//! └──────────────┘               │ EventBus  │     subscribe    ┌────────────┐
//!                                │ (broadcast├─────────────────>│ Subscriber │
//! ┌──────────────┐     emit      │  channel) │                  └────────────┘
//! │ Engine       ├──────────────>│           │     subscribe    ┌────────────┐
//! └──────────────┘               │           ├─────────────────>│ Subscriber │
//!                                └───────────┘                  └────────────┘
//! ```
//!
//! ## Usage
//!
//! ### Publishing Events
//!
//! ```rust
//! use amp_runtime::events::{EventBus, PlayerEvent};
//!
//! # let event_bus = EventBus::new(100);
//! let event = PlayerEvent::Completed {
//!     audio_id: "intro-jingle".to_string(),
//! };
//!
//! event_bus.emit(event).ok();
//! ```
//!
//! ### Subscribing to Events
//!
//! ```rust
//! use amp_runtime::events::EventBus;
//! use tokio::sync::broadcast::error::RecvError;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let event_bus = EventBus::new(100);
//! let mut stream = event_bus.subscribe();
//!
//! tokio::spawn(async move {
//!     loop {
//!         match stream.recv().await {
//!             Ok(event) => println!("Received: {:?}", event),
//!             Err(RecvError::Lagged(n)) => {
//!                 eprintln!("Missed {} events", n);
//!             }
//!             Err(RecvError::Closed) => break,
//!         }
//!     }
//! });
//! # }
//! ```
//!
//! ### Filtering Events
//!
//! ```rust
//! use amp_runtime::events::{EventBus, EventStream, PlayerEvent};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let event_bus = EventBus::new(100);
//! let mut completions = EventStream::new(event_bus.subscribe())
//!     .filter(|event| matches!(event, PlayerEvent::Completed { .. }));
//! # }
//! ```
//!
//! ## Error Handling
//!
//! The event bus uses `tokio::sync::broadcast`, which can produce two types
//! of errors:
//!
//! - **`RecvError::Lagged(n)`**: Subscriber was too slow and missed `n`
//!   events. This is non-fatal; the subscriber can continue receiving new
//!   events. Position events are high-frequency, so subscribers that only
//!   care about terminal events should size their work accordingly.
//! - **`RecvError::Closed`**: All senders have been dropped. This indicates
//!   engine shutdown.
//!
//! ## Thread Safety
//!
//! The event bus is fully thread-safe (`Send + Sync`). It can be safely
//! shared across async tasks using `Arc` or by cloning the bus itself.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tokio::sync::broadcast;

// Re-export commonly used types
pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
///
/// Position events arrive a few times per second per playing clip, so the
/// buffer must absorb bursts from several concurrent players. Subscribers
/// that can't keep up will receive `RecvError::Lagged`.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 256;

// ============================================================================
// Player Events
// ============================================================================

/// Lifecycle events of managed players.
///
/// This is the delegate surface of the playback core: everything a host can
/// observe about a player arrives as one of these variants. Every variant
/// carries the `audio_id` the host chose at load time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum PlayerEvent {
    /// Media is loaded and its duration, when the container reports one,
    /// is known. `duration` is `None` for streams of unknown length.
    Loaded {
        /// The player's audio id.
        audio_id: String,
        /// Total clip duration, if known.
        duration: Option<Duration>,
    },
    /// Playback started (either initially or after a pause).
    Started {
        /// The player's audio id.
        audio_id: String,
    },
    /// Playback paused; position is retained.
    Paused {
        /// The player's audio id.
        audio_id: String,
        /// Position at which playback paused.
        position: Duration,
    },
    /// Periodic position notification while audio is playing.
    Position {
        /// The player's audio id.
        audio_id: String,
        /// Current playback position.
        position: Duration,
        /// Total clip duration, if known.
        duration: Option<Duration>,
    },
    /// A non-looping clip finished playback. The player rewinds to the
    /// start and stays loaded until released.
    Completed {
        /// The player's audio id.
        audio_id: String,
    },
    /// The player was released and its audio id is free for reuse.
    Released {
        /// The player's audio id.
        audio_id: String,
    },
    /// Playback failed.
    Error {
        /// The player's audio id.
        audio_id: String,
        /// Human-readable error message.
        message: String,
        /// Whether the clip can be retried (e.g. transient source errors).
        recoverable: bool,
    },
}

impl PlayerEvent {
    /// Returns the audio id the event refers to.
    pub fn audio_id(&self) -> &str {
        match self {
            PlayerEvent::Loaded { audio_id, .. }
            | PlayerEvent::Started { audio_id }
            | PlayerEvent::Paused { audio_id, .. }
            | PlayerEvent::Position { audio_id, .. }
            | PlayerEvent::Completed { audio_id }
            | PlayerEvent::Released { audio_id }
            | PlayerEvent::Error { audio_id, .. } => audio_id,
        }
    }

    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            PlayerEvent::Loaded { .. } => "Media loaded",
            PlayerEvent::Started { .. } => "Playback started",
            PlayerEvent::Paused { .. } => "Playback paused",
            PlayerEvent::Position { .. } => "Playback position changed",
            PlayerEvent::Completed { .. } => "Clip completed",
            PlayerEvent::Released { .. } => "Player released",
            PlayerEvent::Error { .. } => "Playback error",
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            PlayerEvent::Error { .. } => EventSeverity::Error,
            PlayerEvent::Loaded { .. } | PlayerEvent::Completed { .. } => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    /// Debug-level events (verbose)
    Debug,
    /// Informational events
    Info,
    /// Warning events
    Warning,
    /// Error events
    Error,
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus for publishing and subscribing to player events.
///
/// Uses `tokio::sync::broadcast` internally, which provides:
/// - Multiple producers (clone the `EventBus`)
/// - Multiple consumers (each `subscribe()` creates a new receiver)
/// - Non-blocking sends (events are cloned for each subscriber)
/// - Lagging detection (slow subscribers get `RecvError::Lagged`)
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<PlayerEvent>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer size.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum number of events to buffer per subscriber.
    ///   When a subscriber falls behind by more than this amount, it will
    ///   receive a `RecvError::Lagged` error.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event.
    /// Returns an error if there are no active subscribers; player tasks
    /// treat that as benign, since a host is free to never subscribe.
    pub fn emit(&self, event: PlayerEvent) -> Result<usize, SendError<PlayerEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber to receive events.
    ///
    /// Each call creates an independent receiver that will receive all
    /// future events. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<PlayerEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

/// Type alias for event filter functions.
type EventFilter = Box<dyn Fn(&PlayerEvent) -> bool + Send + Sync>;

/// A wrapper around `broadcast::Receiver` with additional filtering
/// capabilities.
///
/// This provides a more ergonomic API for consuming events with optional
/// filtering by variant or audio id.
///
/// # Example
///
/// ```rust
/// use amp_runtime::events::{EventBus, EventStream, PlayerEvent};
///
/// let event_bus = EventBus::new(100);
/// let stream = EventStream::new(event_bus.subscribe())
///     .filter(|event| event.audio_id() == "click");
/// ```
pub struct EventStream {
    receiver: Receiver<PlayerEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    /// Creates a new event stream from a receiver.
    pub fn new(receiver: Receiver<PlayerEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Adds a filter function to this stream.
    ///
    /// Only events that match the filter will be returned by `recv()`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&PlayerEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    /// Receives the next event that passes the filter (if any).
    ///
    /// This will skip events that don't match the filter and return the
    /// next matching event.
    ///
    /// # Errors
    ///
    /// Returns `RecvError::Lagged(n)` if the subscriber fell behind by `n`
    /// events. Returns `RecvError::Closed` if all senders have been dropped.
    pub async fn recv(&mut self) -> Result<PlayerEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;

            let Some(filter) = &self.filter else {
                return Ok(event);
            };

            if filter(&event) {
                return Ok(event);
            }
        }
    }

    /// Attempts to receive an event without blocking.
    ///
    /// Returns `None` if no events are currently available.
    pub fn try_recv(&mut self) -> Option<Result<PlayerEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    let Some(filter) = &self.filter else {
                        return Some(Ok(event));
                    };

                    if filter(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
