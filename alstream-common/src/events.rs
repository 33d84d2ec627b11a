//! Event types for the alstream event system
//!
//! Provides the playback/queue status enums shared by every crate, the
//! [`StreamEvent`] enum, and an [`EventBus`] built on `tokio::sync::broadcast`.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Playback state of a source
///
/// Queue draining is only meaningful while Playing or Paused.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    Initial,
    Playing,
    Paused,
    Stopped,
}

impl PlaybackState {
    /// True while the source holds a live queue (Playing or Paused)
    pub fn is_active(self) -> bool {
        matches!(self, PlaybackState::Playing | PlaybackState::Paused)
    }
}

impl std::fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaybackState::Initial => write!(f, "initial"),
            PlaybackState::Playing => write!(f, "playing"),
            PlaybackState::Paused => write!(f, "paused"),
            PlaybackState::Stopped => write!(f, "stopped"),
        }
    }
}

/// Health of a streaming queue
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub enum QueueStatus {
    /// Buffers are queued ahead of the play cursor
    Streaming,
    /// Queue emptied before end-of-stream was declared
    Underrun,
    /// End-of-stream declared, queued buffers still playing out
    Draining,
    /// End-of-stream declared and every queued buffer has played
    Drained,
}

impl std::fmt::Display for QueueStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueueStatus::Streaming => write!(f, "Streaming"),
            QueueStatus::Underrun => write!(f, "Underrun"),
            QueueStatus::Draining => write!(f, "Draining"),
            QueueStatus::Drained => write!(f, "Drained"),
        }
    }
}

/// Streaming queue events
///
/// Events are broadcast via [`EventBus`] and can be serialized for logging or
/// export.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StreamEvent {
    /// Controller playback state changed
    StateChanged {
        stream_id: Uuid,
        old_state: PlaybackState,
        new_state: PlaybackState,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Queue ran dry before end-of-stream
    Underrun {
        stream_id: Uuid,
        /// Total underruns seen by this stream, including this one
        underruns: u64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Playback restarted after an underrun
    Recovered {
        stream_id: Uuid,
        /// Buffers queued at the moment playback restarted
        queued: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// The fill callback (or the caller) declared end-of-stream
    EndOfStream {
        stream_id: Uuid,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Every queued buffer played out and the source was stopped
    Drained {
        stream_id: Uuid,
        retired: u64,
        refilled: u64,
        underruns: u64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl StreamEvent {
    /// Stream the event belongs to
    pub fn stream_id(&self) -> Uuid {
        match self {
            StreamEvent::StateChanged { stream_id, .. }
            | StreamEvent::Underrun { stream_id, .. }
            | StreamEvent::Recovered { stream_id, .. }
            | StreamEvent::EndOfStream { stream_id, .. }
            | StreamEvent::Drained { stream_id, .. } => *stream_id,
        }
    }
}

/// Broadcast bus for [`StreamEvent`]s
///
/// # Examples
///
/// ```
/// use alstream_common::events::{EventBus, PlaybackState, StreamEvent};
/// use uuid::Uuid;
///
/// let bus = EventBus::new(16);
/// let mut rx = bus.subscribe();
///
/// bus.emit_lossy(StreamEvent::StateChanged {
///     stream_id: Uuid::new_v4(),
///     old_state: PlaybackState::Initial,
///     new_state: PlaybackState::Playing,
///     timestamp: chrono::Utc::now(),
/// });
///
/// assert!(rx.try_recv().is_ok());
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<StreamEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// `capacity` is the number of events buffered before the oldest are
    /// dropped for slow receivers.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<StreamEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists,
    /// `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: StreamEvent,
    ) -> std::result::Result<usize, broadcast::error::SendError<StreamEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: StreamEvent) {
        let _ = self.tx.send(event);
    }

    /// Current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
