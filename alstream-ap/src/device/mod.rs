//! Audio library seam
//!
//! [`AudioBackend`] is the capability surface of a positional-audio library:
//! device/context lifecycle plus the source/buffer registry. Everything above
//! this module (session handles, streaming controller, demos) talks to the
//! library only through this trait.
//!
//! Any failure the library reports comes back as
//! [`Error::Device`](crate::Error::Device).

pub mod software;

use crate::audio::{BufferFormat, ListenerProperty, MixParams, SourceProperty};
use crate::error::Result;
use alstream_common::events::PlaybackState;

pub use software::{DeviceClock, DeviceOp, SoftwareDevice};

/// Library handle for a source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceId(pub u32);

/// Library handle for a buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(pub u32);

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "source#{}", self.0)
    }
}

impl std::fmt::Display for BufferId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "buffer#{}", self.0)
    }
}

/// Capability surface of the audio library
///
/// Implementations own one open device with one context. Queries take
/// `&mut self` because a backend may advance its clock on every call.
pub trait AudioBackend: Send {
    /// Name of the open device
    fn device_name(&self) -> &str;

    /// Make this backend's context the current one
    fn make_current(&mut self) -> Result<()>;

    /// Release the context and close the device
    ///
    /// Called once, after every source and buffer has been destroyed.
    fn close(&mut self);

    fn set_listener_property(&mut self, prop: ListenerProperty) -> Result<()>;

    fn create_source(&mut self) -> Result<SourceId>;
    fn destroy_source(&mut self, source: SourceId) -> Result<()>;

    /// Create a buffer holding `data` in `format`
    fn create_buffer(&mut self, format: BufferFormat, data: &[u8]) -> Result<BufferId>;

    /// Replace a buffer's contents; fails while any queue references it
    fn refill_buffer(&mut self, buffer: BufferId, format: BufferFormat, data: &[u8]) -> Result<()>;

    /// Destroy a buffer; fails while any queue references it
    fn destroy_buffer(&mut self, buffer: BufferId) -> Result<()>;

    fn set_source_property(&mut self, source: SourceId, prop: SourceProperty) -> Result<()>;

    fn query_source_state(&mut self, source: SourceId) -> Result<PlaybackState>;

    fn play(&mut self, source: SourceId) -> Result<()>;
    fn pause(&mut self, source: SourceId) -> Result<()>;
    fn stop(&mut self, source: SourceId) -> Result<()>;

    /// Append buffers to the tail of the source's queue, in order
    fn submit_buffers(&mut self, source: SourceId, buffers: &[BufferId]) -> Result<()>;

    /// Buffers attached to the source's queue, played or not
    fn queued_count(&mut self, source: SourceId) -> Result<usize>;

    /// Detach and return fully played buffers from the head of the queue
    fn retire_finished_buffers(&mut self, source: SourceId) -> Result<Vec<BufferId>>;

    /// Effective gain/pitch the library applies to the source, if it reports them
    fn mix_params(&mut self, _source: SourceId) -> Result<Option<MixParams>> {
        Ok(None)
    }
}
