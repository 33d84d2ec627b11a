//! Streaming queue controller
//!
//! Keeps one source continuously fed from a bounded ring of buffers.
//!
//! Design:
//! - The caller owns the cadence: `poll_and_refill` is called once per tick
//!   (or on a completion notification). The controller never sleeps or spins.
//! - Retired buffers are handed to the caller's fill callback and, if it
//!   produced data, go back on the tail of the queue. Buffers without new data
//!   wait in the idle set until `admit_idle` is called.
//! - A queue that empties before end-of-stream was declared is an *underrun*;
//!   one that empties after is *drained*. The two are reported separately.
//! - Single writer: only the controller submits to or retires from its source.

use crate::audio::BufferFormat;
use crate::device::{AudioBackend, BufferId};
use crate::error::{Error, Result};
use crate::session::{Buffer, Source};
use alstream_common::events::{EventBus, PlaybackState, QueueStatus, StreamEvent};
use serde::Serialize;
use std::collections::VecDeque;
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

/// Result of one fill callback
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fill {
    /// New sample data for the buffer, in the buffer's format
    Data(Vec<u8>),
    /// Producer has nothing yet; the buffer goes idle
    NotReady,
    /// Input exhausted; no further fills are requested
    EndOfStream,
}

/// What the fill callback is asked to fill
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillRequest {
    /// Position of the buffer in the pool
    pub slot: usize,
    pub buffer: BufferId,
    pub format: BufferFormat,
    /// Times this buffer has been filled by the controller so far
    pub fills: u64,
}

/// Outcome of one `poll_and_refill`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollReport {
    /// Buffers that finished playing since the previous poll
    pub retired: usize,
    /// Retired buffers refilled and resubmitted (never more than `retired`)
    pub refilled: usize,
    /// Buffers on the queue after the poll
    pub queued: usize,
    pub status: QueueStatus,
}

/// Outcome of one `drain_and_stop`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainStatus {
    /// Buffers still playing out
    Pending { remaining: usize },
    /// Queue empty, source stopped
    Stopped,
}

/// Running totals
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StreamStats {
    pub retired: u64,
    pub refilled: u64,
    pub admitted: u64,
    pub underruns: u64,
    pub recoveries: u64,
}

/// Ring-buffer streaming controller for one source
pub struct StreamingQueue<B: AudioBackend> {
    // Must drop before `pool`: destroying the source releases its queue,
    // after which the buffers can be destroyed.
    source: Source<B>,
    pool: Vec<Buffer<B>>,
    fills: Vec<u64>,
    /// Pool slots on the source's queue, head first
    queued: VecDeque<usize>,
    /// Pool slots waiting for data
    idle: VecDeque<usize>,
    state: PlaybackState,
    status: QueueStatus,
    end_of_stream: bool,
    stats: StreamStats,
    id: Uuid,
    events: Option<EventBus>,
}

impl<B: AudioBackend> StreamingQueue<B> {
    /// Take ownership of `source` and `buffers` and queue the first
    /// `initial_submit_count` buffers in order
    ///
    /// Fails with `InvalidArgument` when the pool is empty, the count exceeds
    /// the pool, a buffer belongs to another session, an initial buffer holds
    /// no data, or the source already has a queue.
    pub fn initialize(
        source: Source<B>,
        buffers: Vec<Buffer<B>>,
        initial_submit_count: usize,
    ) -> Result<Self> {
        if buffers.is_empty() {
            return Err(Error::InvalidArgument("buffer pool is empty".to_string()));
        }
        if initial_submit_count > buffers.len() {
            return Err(Error::InvalidArgument(format!(
                "initial submit count {} exceeds pool size {}",
                initial_submit_count,
                buffers.len()
            )));
        }
        if let Some(foreign) = buffers.iter().find(|b| !source.shares_session(b)) {
            return Err(Error::InvalidArgument(format!(
                "{} belongs to another session",
                foreign.id()
            )));
        }
        if let Some(empty) = buffers[..initial_submit_count].iter().find(|b| b.is_empty()) {
            return Err(Error::InvalidArgument(format!(
                "{} is submitted initially but holds no data",
                empty.id()
            )));
        }
        let already_queued = source.queued_count()?;
        if already_queued > 0 {
            return Err(Error::InvalidArgument(format!(
                "{} already has {} queued buffers",
                source.id(),
                already_queued
            )));
        }

        let initial: Vec<BufferId> = buffers[..initial_submit_count]
            .iter()
            .map(|b| b.id())
            .collect();
        if !initial.is_empty() {
            source.submit_ids(&initial)?;
        }

        let id = Uuid::new_v4();
        debug!(
            "Stream {} initialized on {}: {} buffers, {} queued",
            id,
            source.id(),
            buffers.len(),
            initial_submit_count
        );

        let pool_len = buffers.len();
        Ok(Self {
            source,
            pool: buffers,
            fills: vec![0; pool_len],
            queued: (0..initial_submit_count).collect(),
            idle: (initial_submit_count..pool_len).collect(),
            state: PlaybackState::Initial,
            status: QueueStatus::Streaming,
            end_of_stream: false,
            stats: StreamStats::default(),
            id,
            events: None,
        })
    }

    /// Emit [`StreamEvent`]s on `bus`
    pub fn with_events(mut self, bus: EventBus) -> Self {
        self.events = Some(bus);
        self
    }

    /// Begin playback (Initial → Playing)
    pub fn start(&mut self) -> Result<()> {
        if self.state != PlaybackState::Initial {
            return Err(Error::InvalidArgument(format!(
                "cannot start a stream that is {}",
                self.state
            )));
        }
        self.source.play()?;
        self.set_state(PlaybackState::Playing);
        info!(
            "Stream {} playing with {}/{} buffers queued",
            self.id,
            self.queued.len(),
            self.pool.len()
        );
        Ok(())
    }

    /// Retire finished buffers and refill them through `fill`
    ///
    /// Only buffers retired during this call are offered to `fill`, so the
    /// report's `refilled` never exceeds `retired`. No finished buffers is a
    /// zero-progress report, not an error.
    pub fn poll_and_refill<F>(&mut self, mut fill: F) -> Result<PollReport>
    where
        F: FnMut(&FillRequest) -> Fill,
    {
        self.ensure_active("poll")?;

        let retired = self.retire()?;
        let mut refilled = 0;

        for (i, &slot) in retired.iter().enumerate() {
            if self.end_of_stream {
                self.idle.push_back(slot);
                continue;
            }
            match self.fill_slot(slot, &mut fill) {
                Ok(true) => {
                    if let Err(e) = self.submit_slot(slot) {
                        self.idle.extend(&retired[i + 1..]);
                        return Err(e);
                    }
                    refilled += 1;
                }
                Ok(false) => self.idle.push_back(slot),
                Err(e) => {
                    self.idle.extend(&retired[i..]);
                    return Err(e);
                }
            }
        }

        self.stats.refilled += refilled as u64;
        self.update_status(retired.len())?;

        trace!(
            "Stream {} poll: retired {}, refilled {}, queued {} ({})",
            self.id,
            retired.len(),
            refilled,
            self.queued.len(),
            self.status
        );

        Ok(PollReport {
            retired: retired.len(),
            refilled,
            queued: self.queued.len(),
            status: self.status,
        })
    }

    /// Fill idle buffers and put them on the queue
    ///
    /// Finished buffers are retired first and join the idle set, so a source
    /// that ran dry never replays them. Stops at the first `NotReady` or
    /// `EndOfStream`. Restarts a source that ran dry. Returns the number of
    /// buffers admitted.
    pub fn admit_idle<F>(&mut self, mut fill: F) -> Result<usize>
    where
        F: FnMut(&FillRequest) -> Fill,
    {
        if self.state == PlaybackState::Stopped {
            return Err(Error::InvalidArgument(
                "cannot admit buffers into a stopped stream".to_string(),
            ));
        }

        let retired_now = if self.state.is_active() {
            let retired = self.retire()?;
            self.idle.extend(&retired);
            retired.len()
        } else {
            0
        };

        let mut admitted = 0;
        while !self.end_of_stream {
            let Some(slot) = self.idle.pop_front() else {
                break;
            };
            match self.fill_slot(slot, &mut fill) {
                Ok(true) => {
                    self.submit_slot(slot)?;
                    admitted += 1;
                }
                Ok(false) => {
                    self.idle.push_front(slot);
                    break;
                }
                Err(e) => {
                    self.idle.push_front(slot);
                    return Err(e);
                }
            }
        }

        self.stats.admitted += admitted as u64;
        if admitted > 0 {
            debug!("Stream {} admitted {} idle buffers", self.id, admitted);
        }
        if self.state.is_active() {
            self.update_status(retired_now)?;
        }
        Ok(admitted)
    }

    /// Declare end-of-stream and play out whatever is queued
    ///
    /// Non-blocking: call once per tick until it returns
    /// [`DrainStatus::Stopped`]. A paused stream does not make progress.
    pub fn drain_and_stop(&mut self) -> Result<DrainStatus> {
        match self.state {
            PlaybackState::Stopped => return Ok(DrainStatus::Stopped),
            PlaybackState::Initial => {
                return Err(Error::InvalidArgument(
                    "cannot drain a stream that was never started".to_string(),
                ))
            }
            PlaybackState::Playing | PlaybackState::Paused => {}
        }

        self.declare_end_of_stream();
        let retired = self.retire()?;
        self.idle.extend(retired);

        if !self.queued.is_empty() {
            self.status = QueueStatus::Draining;
            return Ok(DrainStatus::Pending {
                remaining: self.queued.len(),
            });
        }

        self.source.stop()?;
        self.status = QueueStatus::Drained;
        self.set_state(PlaybackState::Stopped);
        info!(
            "Stream {} drained: {} retired, {} refilled, {} underruns",
            self.id, self.stats.retired, self.stats.refilled, self.stats.underruns
        );
        self.emit(StreamEvent::Drained {
            stream_id: self.id,
            retired: self.stats.retired,
            refilled: self.stats.refilled,
            underruns: self.stats.underruns,
            timestamp: chrono::Utc::now(),
        });
        Ok(DrainStatus::Stopped)
    }

    /// Mark the input as exhausted; the fill callback is not consulted again
    pub fn declare_end_of_stream(&mut self) {
        if self.end_of_stream {
            return;
        }
        self.end_of_stream = true;
        debug!("Stream {} reached end of stream", self.id);
        self.emit(StreamEvent::EndOfStream {
            stream_id: self.id,
            timestamp: chrono::Utc::now(),
        });
    }

    pub fn pause(&mut self) -> Result<()> {
        if self.state != PlaybackState::Playing {
            return Err(Error::InvalidArgument(format!(
                "cannot pause a stream that is {}",
                self.state
            )));
        }
        self.source.pause()?;
        self.set_state(PlaybackState::Paused);
        Ok(())
    }

    pub fn resume(&mut self) -> Result<()> {
        if self.state != PlaybackState::Paused {
            return Err(Error::InvalidArgument(format!(
                "cannot resume a stream that is {}",
                self.state
            )));
        }
        self.source.play()?;
        self.set_state(PlaybackState::Playing);
        Ok(())
    }

    /// Stop immediately without playing out the queue
    ///
    /// Every queued buffer is retired to the idle set.
    pub fn stop(&mut self) -> Result<()> {
        if self.state == PlaybackState::Stopped {
            return Ok(());
        }
        self.source.stop()?;
        let retired = self.retire()?;
        self.idle.extend(retired);
        self.set_state(PlaybackState::Stopped);
        Ok(())
    }

    /// Stop if needed and hand back the source and the buffer pool
    pub fn into_parts(mut self) -> Result<(Source<B>, Vec<Buffer<B>>)> {
        if self.state.is_active() {
            self.stop()?;
        }
        Ok((self.source, self.pool))
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn status(&self) -> QueueStatus {
        self.status
    }

    pub fn stats(&self) -> StreamStats {
        self.stats
    }

    pub fn is_end_of_stream(&self) -> bool {
        self.end_of_stream
    }

    /// Buffers queued and not yet retired
    pub fn queued_len(&self) -> usize {
        self.queued.len()
    }

    pub fn idle_len(&self) -> usize {
        self.idle.len()
    }

    /// Ring capacity (pool size)
    pub fn capacity(&self) -> usize {
        self.pool.len()
    }

    /// Queued buffer ids, head first
    pub fn queued_buffers(&self) -> Vec<BufferId> {
        self.queued.iter().map(|&slot| self.pool[slot].id()).collect()
    }

    pub fn source(&self) -> &Source<B> {
        &self.source
    }

    fn ensure_active(&self, op: &str) -> Result<()> {
        if self.state.is_active() {
            Ok(())
        } else {
            Err(Error::InvalidArgument(format!(
                "cannot {} a stream that is {}",
                op, self.state
            )))
        }
    }

    /// Detach finished buffers; the library must retire them in queue order
    fn retire(&mut self) -> Result<Vec<usize>> {
        let ids = self.source.retire_finished()?;
        let mut slots = Vec::with_capacity(ids.len());
        for id in ids {
            let head = self.queued.front().copied();
            match head {
                Some(slot) if self.pool[slot].id() == id => {
                    self.queued.pop_front();
                    slots.push(slot);
                }
                _ => {
                    self.idle.extend(slots);
                    return Err(Error::Device(format!(
                        "library retired {} out of queue order",
                        id
                    )));
                }
            }
        }
        self.stats.retired += slots.len() as u64;
        Ok(slots)
    }

    /// Ask `fill` for data; true when the buffer now holds new data
    fn fill_slot<F>(&mut self, slot: usize, fill: &mut F) -> Result<bool>
    where
        F: FnMut(&FillRequest) -> Fill,
    {
        let request = FillRequest {
            slot,
            buffer: self.pool[slot].id(),
            format: self.pool[slot].format(),
            fills: self.fills[slot],
        };
        match fill(&request) {
            Fill::Data(bytes) => {
                if bytes.is_empty() {
                    return Err(Error::InvalidArgument(format!(
                        "fill for {} returned no data",
                        request.buffer
                    )));
                }
                self.pool[slot].refill(&bytes)?;
                self.fills[slot] += 1;
                Ok(true)
            }
            Fill::NotReady => Ok(false),
            Fill::EndOfStream => {
                self.declare_end_of_stream();
                Ok(false)
            }
        }
    }

    fn submit_slot(&mut self, slot: usize) -> Result<()> {
        let id = self.pool[slot].id();
        if let Err(e) = self.source.submit_ids(&[id]) {
            self.idle.push_back(slot);
            return Err(e);
        }
        self.queued.push_back(slot);
        debug_assert!(self.queued.len() <= self.pool.len());
        Ok(())
    }

    /// Classify the queue after buffers were retired and/or submitted
    fn update_status(&mut self, retired_now: usize) -> Result<()> {
        if self.queued.is_empty() {
            if self.end_of_stream {
                self.status = QueueStatus::Drained;
            } else {
                self.mark_underrun();
            }
            return Ok(());
        }

        if self.end_of_stream {
            self.status = QueueStatus::Draining;
            return Ok(());
        }

        if self.state == PlaybackState::Playing
            && self.source.state()? == PlaybackState::Stopped
        {
            // Library played everything before the new data arrived
            if retired_now > 0 {
                self.mark_underrun();
            }
            self.source.play()?;
            self.stats.recoveries += 1;
            info!(
                "Stream {} resumed after underrun with {} buffers queued",
                self.id,
                self.queued.len()
            );
            self.emit(StreamEvent::Recovered {
                stream_id: self.id,
                queued: self.queued.len(),
                timestamp: chrono::Utc::now(),
            });
        }
        self.status = QueueStatus::Streaming;
        Ok(())
    }

    fn mark_underrun(&mut self) {
        if self.status == QueueStatus::Underrun {
            return;
        }
        self.status = QueueStatus::Underrun;
        self.stats.underruns += 1;
        warn!(
            "Stream {} underrun: queue empty before end of stream (total: {})",
            self.id, self.stats.underruns
        );
        self.emit(StreamEvent::Underrun {
            stream_id: self.id,
            underruns: self.stats.underruns,
            timestamp: chrono::Utc::now(),
        });
    }

    fn set_state(&mut self, new_state: PlaybackState) {
        let old_state = self.state;
        if old_state == new_state {
            return;
        }
        self.state = new_state;
        debug!("Stream {}: {} -> {}", self.id, old_state, new_state);
        self.emit(StreamEvent::StateChanged {
            stream_id: self.id,
            old_state,
            new_state,
            timestamp: chrono::Utc::now(),
        });
    }

    fn emit(&self, event: StreamEvent) {
        if let Some(bus) = &self.events {
            bus.emit_lossy(event);
        }
    }
}

impl<B: AudioBackend> std::fmt::Debug for StreamingQueue<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamingQueue")
            .field("id", &self.id)
            .field("source", &self.source)
            .field("capacity", &self.pool.len())
            .field("queued", &self.queued)
            .field("idle", &self.idle)
            .field("state", &self.state)
            .field("status", &self.status)
            .field("end_of_stream", &self.end_of_stream)
            .field("stats", &self.stats)
            .finish()
    }
}
