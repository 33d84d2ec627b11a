//! Software audio device
//!
//! An in-process implementation of [`AudioBackend`] that follows the
//! positional-audio library's object semantics without producing sound:
//! sources consume their queued buffers against a clock, fully played buffers
//! become *processed*, and the device reports the gain/pitch it would mix
//! each source with.
//!
//! Two clocks are available:
//! - [`DeviceClock::Manual`]: playback only advances through
//!   [`SoftwareDevice::advance`]. Deterministic, used by tests.
//! - [`DeviceClock::Realtime`]: every call first catches up with wall-clock
//!   time. Used by the demos.

use super::{AudioBackend, BufferId, SourceId};
use crate::audio::spatial::{compute_mix, ListenerState, SourceParams};
use crate::audio::{BufferFormat, ListenerProperty, MixParams, SourceProperty};
use crate::error::{Error, Result};
use alstream_common::events::PlaybackState;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace};

/// Device names the software device answers to
pub const DEVICE_NAMES: [&str; 2] = ["Software Renderer", "Null Output"];

/// How playback time advances
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceClock {
    Manual,
    Realtime,
}

/// Operations that can be made to fail with [`SoftwareDevice::fail_next`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceOp {
    MakeCurrent,
    SetListener,
    CreateSource,
    CreateBuffer,
    RefillBuffer,
    SetSourceProperty,
    QueryState,
    Play,
    Pause,
    Stop,
    Submit,
    Retire,
}

#[derive(Debug)]
struct BufferSlot {
    format: BufferFormat,
    byte_len: usize,
    frames: u64,
    /// Number of queue entries referencing this buffer
    queue_refs: usize,
}

#[derive(Debug)]
struct SourceSlot {
    params: SourceParams,
    state: PlaybackState,
    queue: Vec<BufferId>,
    /// Index of the buffer under the play cursor; everything before it has played
    play_index: usize,
    /// Frames consumed from `queue[play_index]`
    cursor: f64,
}

impl SourceSlot {
    fn new() -> Self {
        Self {
            params: SourceParams::default(),
            state: PlaybackState::Initial,
            queue: Vec::new(),
            play_index: 0,
            cursor: 0.0,
        }
    }

    fn processed(&self) -> usize {
        if self.params.looping {
            0
        } else {
            self.play_index
        }
    }
}

/// Software implementation of the audio library
#[derive(Debug)]
pub struct SoftwareDevice {
    name: String,
    clock: DeviceClock,
    last_sync: Instant,
    elapsed: Duration,
    open: bool,
    current: bool,
    listener: ListenerState,
    sources: HashMap<SourceId, SourceSlot>,
    buffers: HashMap<BufferId, BufferSlot>,
    next_id: u32,
    pending_failures: Vec<DeviceOp>,
}

impl SoftwareDevice {
    /// Open the named device, or the default one for `None`
    pub fn open(device_name: Option<&str>, clock: DeviceClock) -> Result<Self> {
        let name = match device_name {
            None => DEVICE_NAMES[0],
            Some(requested) => DEVICE_NAMES
                .iter()
                .copied()
                .find(|known| known.eq_ignore_ascii_case(requested))
                .ok_or_else(|| Error::Device(format!("no such device: {}", requested)))?,
        };

        info!("Opened audio device '{}' ({:?} clock)", name, clock);

        Ok(Self {
            name: name.to_string(),
            clock,
            last_sync: Instant::now(),
            elapsed: Duration::ZERO,
            open: true,
            current: false,
            listener: ListenerState::default(),
            sources: HashMap::new(),
            buffers: HashMap::new(),
            next_id: 1,
            pending_failures: Vec::new(),
        })
    }

    /// Make the next call of `op` fail with a device error
    pub fn fail_next(&mut self, op: DeviceOp) {
        self.pending_failures.push(op);
    }

    /// Advance playback by `dt` (manual clock; also valid on a realtime one)
    pub fn advance(&mut self, dt: Duration) {
        self.elapsed += dt;
        let listener = self.listener;
        for slot in self.sources.values_mut() {
            if slot.state == PlaybackState::Playing {
                render(slot, &self.buffers, &listener, dt);
            }
        }
    }

    /// Total playback time rendered so far
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn is_current(&self) -> bool {
        self.current
    }

    pub fn listener(&self) -> &ListenerState {
        &self.listener
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Processed-but-not-retired buffers on `source`
    pub fn processed_count(&mut self, source: SourceId) -> Result<usize> {
        self.sync()?;
        Ok(self.source(source)?.processed())
    }

    /// Number of live buffers (created and not destroyed)
    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }

    /// Number of live sources
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    fn sync(&mut self) -> Result<()> {
        if !self.open {
            return Err(Error::Device("device is closed".to_string()));
        }
        if self.clock == DeviceClock::Realtime {
            let now = Instant::now();
            let dt = now.duration_since(self.last_sync);
            self.last_sync = now;
            self.advance(dt);
        }
        Ok(())
    }

    fn check(&mut self, op: DeviceOp) -> Result<()> {
        self.sync()?;
        if let Some(pos) = self.pending_failures.iter().position(|&p| p == op) {
            self.pending_failures.remove(pos);
            return Err(Error::Device(format!("{:?} failed (injected)", op)));
        }
        Ok(())
    }

    fn allocate_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn source(&self, id: SourceId) -> Result<&SourceSlot> {
        self.sources
            .get(&id)
            .ok_or_else(|| Error::Device(format!("invalid source name: {}", id)))
    }

    fn source_mut(&mut self, id: SourceId) -> Result<&mut SourceSlot> {
        self.sources
            .get_mut(&id)
            .ok_or_else(|| Error::Device(format!("invalid source name: {}", id)))
    }

    fn buffer(&self, id: BufferId) -> Result<&BufferSlot> {
        self.buffers
            .get(&id)
            .ok_or_else(|| Error::Device(format!("invalid buffer name: {}", id)))
    }

    fn release_refs(&mut self, ids: &[BufferId]) {
        for id in ids {
            if let Some(slot) = self.buffers.get_mut(id) {
                slot.queue_refs = slot.queue_refs.saturating_sub(1);
            }
        }
    }
}

/// Consume `dt` of playback from a playing source's queue
fn render(
    slot: &mut SourceSlot,
    buffers: &HashMap<BufferId, BufferSlot>,
    listener: &ListenerState,
    dt: Duration,
) {
    let rate = compute_mix(listener, &slot.params).pitch as f64;
    if rate <= 0.0 {
        return;
    }
    let mut remaining = dt.as_secs_f64();

    if slot.params.looping {
        let cycle: f64 = slot
            .queue
            .iter()
            .filter_map(|id| buffers.get(id))
            .map(|b| b.frames as f64 / (b.format.sample_rate as f64 * rate))
            .sum();
        if cycle > 0.0 && remaining > cycle {
            remaining %= cycle;
        }
    }

    loop {
        if slot.play_index >= slot.queue.len() {
            if slot.params.looping && !slot.queue.is_empty() {
                slot.play_index = 0;
                continue;
            }
            slot.state = PlaybackState::Stopped;
            slot.cursor = 0.0;
            return;
        }

        let Some(buffer) = buffers.get(&slot.queue[slot.play_index]) else {
            // Destroyed out from under the queue; skip it
            slot.play_index += 1;
            slot.cursor = 0.0;
            continue;
        };

        let frames_per_sec = buffer.format.sample_rate as f64 * rate;
        let left = (buffer.frames as f64 - slot.cursor).max(0.0) / frames_per_sec;

        if remaining >= left {
            remaining -= left;
            slot.cursor = 0.0;
            slot.play_index += 1;
            if slot.play_index >= slot.queue.len() && !slot.params.looping {
                slot.state = PlaybackState::Stopped;
                return;
            }
        } else {
            slot.cursor += remaining * frames_per_sec;
            return;
        }
    }
}

impl AudioBackend for SoftwareDevice {
    fn device_name(&self) -> &str {
        &self.name
    }

    fn make_current(&mut self) -> Result<()> {
        self.check(DeviceOp::MakeCurrent)?;
        self.current = true;
        Ok(())
    }

    fn close(&mut self) {
        if !self.open {
            return;
        }
        if !self.sources.is_empty() || !self.buffers.is_empty() {
            debug!(
                "Closing '{}' with {} sources and {} buffers still alive",
                self.name,
                self.sources.len(),
                self.buffers.len()
            );
        }
        self.sources.clear();
        self.buffers.clear();
        self.current = false;
        self.open = false;
        info!("Closed audio device '{}'", self.name);
    }

    fn set_listener_property(&mut self, prop: ListenerProperty) -> Result<()> {
        self.check(DeviceOp::SetListener)?;
        prop.validate()
            .map_err(|e| Error::Device(format!("listener property rejected: {}", e)))?;
        self.listener.apply(prop);
        Ok(())
    }

    fn create_source(&mut self) -> Result<SourceId> {
        self.check(DeviceOp::CreateSource)?;
        let id = SourceId(self.allocate_id());
        self.sources.insert(id, SourceSlot::new());
        debug!("Created {}", id);
        Ok(id)
    }

    fn destroy_source(&mut self, source: SourceId) -> Result<()> {
        self.sync()?;
        let slot = self
            .sources
            .remove(&source)
            .ok_or_else(|| Error::Device(format!("invalid source name: {}", source)))?;
        self.release_refs(&slot.queue);
        debug!("Destroyed {} ({} buffers released)", source, slot.queue.len());
        Ok(())
    }

    fn create_buffer(&mut self, format: BufferFormat, data: &[u8]) -> Result<BufferId> {
        self.check(DeviceOp::CreateBuffer)?;
        format
            .check_len(data.len())
            .map_err(|e| Error::Device(e.to_string()))?;
        let id = BufferId(self.allocate_id());
        self.buffers.insert(
            id,
            BufferSlot {
                format,
                byte_len: data.len(),
                frames: format.frames_in(data.len()),
                queue_refs: 0,
            },
        );
        debug!("Created {} ({}, {} bytes)", id, format, data.len());
        Ok(id)
    }

    fn refill_buffer(&mut self, buffer: BufferId, format: BufferFormat, data: &[u8]) -> Result<()> {
        self.check(DeviceOp::RefillBuffer)?;
        format
            .check_len(data.len())
            .map_err(|e| Error::Device(e.to_string()))?;
        let slot = self
            .buffers
            .get_mut(&buffer)
            .ok_or_else(|| Error::Device(format!("invalid buffer name: {}", buffer)))?;
        if slot.queue_refs > 0 {
            return Err(Error::Device(format!(
                "{} is still queued and cannot be refilled",
                buffer
            )));
        }
        slot.format = format;
        slot.byte_len = data.len();
        slot.frames = format.frames_in(data.len());
        trace!("Refilled {} with {} bytes", buffer, data.len());
        Ok(())
    }

    fn destroy_buffer(&mut self, buffer: BufferId) -> Result<()> {
        self.sync()?;
        let slot = self.buffer(buffer)?;
        if slot.queue_refs > 0 {
            return Err(Error::Device(format!(
                "{} is still queued and cannot be destroyed",
                buffer
            )));
        }
        self.buffers.remove(&buffer);
        debug!("Destroyed {}", buffer);
        Ok(())
    }

    fn set_source_property(&mut self, source: SourceId, prop: SourceProperty) -> Result<()> {
        self.check(DeviceOp::SetSourceProperty)?;
        prop.validate()
            .map_err(|e| Error::Device(format!("source property rejected: {}", e)))?;
        self.source_mut(source)?.params.apply(prop);
        Ok(())
    }

    fn query_source_state(&mut self, source: SourceId) -> Result<PlaybackState> {
        self.check(DeviceOp::QueryState)?;
        Ok(self.source(source)?.state)
    }

    fn play(&mut self, source: SourceId) -> Result<()> {
        self.check(DeviceOp::Play)?;
        let slot = self.source_mut(source)?;
        if slot.state == PlaybackState::Paused {
            slot.state = PlaybackState::Playing;
        } else if slot.queue.is_empty() {
            slot.state = PlaybackState::Stopped;
        } else {
            slot.play_index = 0;
            slot.cursor = 0.0;
            slot.state = PlaybackState::Playing;
        }
        trace!("{} -> {}", source, slot.state);
        Ok(())
    }

    fn pause(&mut self, source: SourceId) -> Result<()> {
        self.check(DeviceOp::Pause)?;
        let slot = self.source_mut(source)?;
        if slot.state == PlaybackState::Playing {
            slot.state = PlaybackState::Paused;
        }
        Ok(())
    }

    fn stop(&mut self, source: SourceId) -> Result<()> {
        self.check(DeviceOp::Stop)?;
        let slot = self.source_mut(source)?;
        slot.state = PlaybackState::Stopped;
        slot.play_index = slot.queue.len();
        slot.cursor = 0.0;
        Ok(())
    }

    fn submit_buffers(&mut self, source: SourceId, buffers: &[BufferId]) -> Result<()> {
        self.check(DeviceOp::Submit)?;

        let queued_format = match self.source(source)?.queue.first() {
            Some(&first) => Some(self.buffer(first)?.format),
            None => None,
        };
        let mut format = queued_format;
        for &id in buffers {
            let slot = self.buffer(id)?;
            if slot.byte_len == 0 {
                return Err(Error::Device(format!("{} holds no data", id)));
            }
            match format {
                Some(f) if f != slot.format => {
                    return Err(Error::Device(format!(
                        "{} is {}, queue is {}",
                        id, slot.format, f
                    )))
                }
                _ => format = Some(slot.format),
            }
        }

        for &id in buffers {
            if let Some(slot) = self.buffers.get_mut(&id) {
                slot.queue_refs += 1;
            }
        }
        let slot = self.source_mut(source)?;
        slot.queue.extend_from_slice(buffers);
        trace!("Queued {} buffers on {} ({} total)", buffers.len(), source, slot.queue.len());
        Ok(())
    }

    fn queued_count(&mut self, source: SourceId) -> Result<usize> {
        self.sync()?;
        Ok(self.source(source)?.queue.len())
    }

    fn retire_finished_buffers(&mut self, source: SourceId) -> Result<Vec<BufferId>> {
        self.check(DeviceOp::Retire)?;
        let slot = self.source_mut(source)?;
        let processed = slot.processed();
        let retired: Vec<BufferId> = slot.queue.drain(..processed).collect();
        slot.play_index -= processed;
        self.release_refs(&retired);
        if !retired.is_empty() {
            trace!("Retired {} buffers from {}", retired.len(), source);
        }
        Ok(retired)
    }

    fn mix_params(&mut self, source: SourceId) -> Result<Option<MixParams>> {
        self.sync()?;
        let slot = self.source(source)?;
        Ok(Some(compute_mix(&self.listener, &slot.params)))
    }
}
