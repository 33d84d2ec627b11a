//! Audio device session and scoped library handles
//!
//! A [`Session`] owns the open device and its context. Sources and buffers
//! are created through it and come back as [`Source`] / [`Buffer`] handles
//! that release their library object when dropped.
//!
//! Every handle keeps the session alive: the device is closed only after the
//! `Session` value *and* every handle created from it are gone, so
//! Source/Buffer teardown always happens before device teardown.

use crate::audio::{BufferFormat, Clip, ListenerProperty, MixParams, SourceProperty};
use crate::device::{AudioBackend, BufferId, DeviceClock, SoftwareDevice, SourceId};
use crate::error::{Error, Result};
use alstream_common::events::PlaybackState;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

struct SessionInner<B: AudioBackend> {
    id: Uuid,
    backend: Mutex<B>,
}

impl<B: AudioBackend> SessionInner<B> {
    fn with<R>(&self, f: impl FnOnce(&mut B) -> R) -> R {
        let mut backend = self.backend.lock();
        f(&mut *backend)
    }
}

impl<B: AudioBackend> Drop for SessionInner<B> {
    fn drop(&mut self) {
        let backend = self.backend.get_mut();
        info!("Closing session {} on '{}'", self.id, backend.device_name());
        backend.close();
    }
}

/// Open device + current context
pub struct Session<B: AudioBackend> {
    inner: Arc<SessionInner<B>>,
}

impl Session<SoftwareDevice> {
    /// Open the software device (`None` = default device) and make it current
    pub fn open(device_name: Option<&str>, clock: DeviceClock) -> Result<Self> {
        Self::new(SoftwareDevice::open(device_name, clock)?)
    }
}

impl<B: AudioBackend> Session<B> {
    /// Take ownership of an opened backend and make its context current
    pub fn new(mut backend: B) -> Result<Self> {
        backend.make_current()?;
        let id = Uuid::new_v4();
        info!("Session {} started on '{}'", id, backend.device_name());
        Ok(Self {
            inner: Arc::new(SessionInner {
                id,
                backend: Mutex::new(backend),
            }),
        })
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn device_name(&self) -> String {
        self.inner.with(|b| b.device_name().to_string())
    }

    /// Run `f` with exclusive access to the backend
    ///
    /// Handles created from this session lock the same backend, so `f` must
    /// not call back into them.
    pub fn with_backend<R>(&self, f: impl FnOnce(&mut B) -> R) -> R {
        self.inner.with(f)
    }

    pub fn make_current(&self) -> Result<()> {
        self.inner.with(|b| b.make_current())
    }

    pub fn set_listener(&self, prop: ListenerProperty) -> Result<()> {
        prop.validate()?;
        self.inner.with(|b| b.set_listener_property(prop))
    }

    pub fn create_source(&self) -> Result<Source<B>> {
        let id = self.inner.with(|b| b.create_source())?;
        Ok(Source {
            id,
            session: Arc::clone(&self.inner),
        })
    }

    /// Create a buffer holding a copy of `data`
    pub fn create_buffer(&self, format: BufferFormat, data: &[u8]) -> Result<Buffer<B>> {
        format.check_len(data.len())?;
        let id = self.inner.with(|b| b.create_buffer(format, data))?;
        Ok(Buffer {
            id,
            format,
            byte_len: data.len(),
            session: Arc::clone(&self.inner),
        })
    }

    pub fn create_buffer_from_clip(&self, clip: &Clip) -> Result<Buffer<B>> {
        self.create_buffer(clip.format, &clip.data)
    }

    /// Create `count` empty buffers in `format`, ready to be filled
    pub fn create_buffer_pool(&self, format: BufferFormat, count: usize) -> Result<Vec<Buffer<B>>> {
        (0..count).map(|_| self.create_buffer(format, &[])).collect()
    }
}

/// Playback voice
///
/// Destroyed (and its queue released) on drop.
pub struct Source<B: AudioBackend> {
    id: SourceId,
    session: Arc<SessionInner<B>>,
}

impl<B: AudioBackend> Source<B> {
    pub fn id(&self) -> SourceId {
        self.id
    }

    pub fn session_id(&self) -> Uuid {
        self.session.id
    }

    /// True when `buffer` was created by the same session
    pub fn shares_session(&self, buffer: &Buffer<B>) -> bool {
        Arc::ptr_eq(&self.session, &buffer.session)
    }

    /// Set one spatial attribute; out-of-range values are `InvalidArgument`
    pub fn set(&self, prop: SourceProperty) -> Result<()> {
        prop.validate()?;
        self.session.with(|b| b.set_source_property(self.id, prop))
    }

    pub fn state(&self) -> Result<PlaybackState> {
        self.session.with(|b| b.query_source_state(self.id))
    }

    pub fn play(&self) -> Result<()> {
        self.session.with(|b| b.play(self.id))
    }

    pub fn pause(&self) -> Result<()> {
        self.session.with(|b| b.pause(self.id))
    }

    pub fn stop(&self) -> Result<()> {
        self.session.with(|b| b.stop(self.id))
    }

    /// Append buffers to the tail of the queue
    pub fn submit(&self, buffers: &[&Buffer<B>]) -> Result<()> {
        if let Some(foreign) = buffers.iter().find(|b| !self.shares_session(b)) {
            return Err(Error::InvalidArgument(format!(
                "{} belongs to another session",
                foreign.id
            )));
        }
        let ids: Vec<BufferId> = buffers.iter().map(|b| b.id).collect();
        self.submit_ids(&ids)
    }

    pub(crate) fn submit_ids(&self, ids: &[BufferId]) -> Result<()> {
        self.session.with(|b| b.submit_buffers(self.id, ids))
    }

    pub fn queued_count(&self) -> Result<usize> {
        self.session.with(|b| b.queued_count(self.id))
    }

    /// Detach fully played buffers from the head of the queue
    pub fn retire_finished(&self) -> Result<Vec<BufferId>> {
        self.session.with(|b| b.retire_finished_buffers(self.id))
    }

    pub fn mix_params(&self) -> Result<Option<MixParams>> {
        self.session.with(|b| b.mix_params(self.id))
    }
}

impl<B: AudioBackend> Drop for Source<B> {
    fn drop(&mut self) {
        let id = self.id;
        if let Err(e) = self.session.with(|b| b.destroy_source(id)) {
            warn!("Failed to destroy {}: {}", id, e);
        }
    }
}

/// Block of sample data with its format
///
/// Destroyed on drop; the library refuses to destroy or refill a buffer
/// still attached to a queue.
pub struct Buffer<B: AudioBackend> {
    id: BufferId,
    format: BufferFormat,
    byte_len: usize,
    session: Arc<SessionInner<B>>,
}

impl<B: AudioBackend> Buffer<B> {
    pub fn id(&self) -> BufferId {
        self.id
    }

    pub fn format(&self) -> BufferFormat {
        self.format
    }

    pub fn byte_len(&self) -> usize {
        self.byte_len
    }

    pub fn is_empty(&self) -> bool {
        self.byte_len == 0
    }

    /// Playback length at normal pitch
    pub fn duration(&self) -> Duration {
        self.format.duration_of(self.byte_len)
    }

    /// Replace the buffer's contents, keeping its format
    pub fn refill(&mut self, data: &[u8]) -> Result<()> {
        self.refill_as(self.format, data)
    }

    /// Replace the buffer's contents and format
    pub fn refill_as(&mut self, format: BufferFormat, data: &[u8]) -> Result<()> {
        format.check_len(data.len())?;
        let id = self.id;
        self.session.with(|b| b.refill_buffer(id, format, data))?;
        self.format = format;
        self.byte_len = data.len();
        Ok(())
    }
}

impl<B: AudioBackend> Drop for Buffer<B> {
    fn drop(&mut self) {
        let id = self.id;
        match self.session.with(|b| b.destroy_buffer(id)) {
            Ok(()) => debug!("Released {}", id),
            Err(e) => warn!("Failed to destroy {}: {}", id, e),
        }
    }
}

impl<B: AudioBackend> std::fmt::Debug for Session<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session").field("id", &self.inner.id).finish()
    }
}

impl<B: AudioBackend> std::fmt::Debug for Source<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Source")
            .field("id", &self.id)
            .field("session", &self.session.id)
            .finish()
    }
}

impl<B: AudioBackend> std::fmt::Debug for Buffer<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Buffer")
            .field("id", &self.id)
            .field("format", &self.format)
            .field("byte_len", &self.byte_len)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session<SoftwareDevice> {
        Session::open(None, DeviceClock::Manual).unwrap()
    }

    #[test]
    fn test_session_makes_context_current() {
        let session = session();
        assert!(session.with_backend(|b| b.is_current()));
        assert_eq!(session.device_name(), "Software Renderer");
    }

    #[test]
    fn test_handles_release_on_drop() {
        let session = session();
        {
            let _source = session.create_source().unwrap();
            let _buffer = session
                .create_buffer(BufferFormat::mono16(1000), &[0u8; 20])
                .unwrap();
            assert_eq!(session.with_backend(|b| (b.source_count(), b.buffer_count())), (1, 1));
        }
        assert_eq!(session.with_backend(|b| (b.source_count(), b.buffer_count())), (0, 0));
    }

    #[test]
    fn test_source_outlives_session_value() {
        let session = session();
        let source = session.create_source().unwrap();
        drop(session);
        // Device stays open while a handle exists
        assert_eq!(source.state().unwrap(), PlaybackState::Initial);
    }

    #[test]
    fn test_property_validation_is_invalid_argument() {
        let session = session();
        let source = session.create_source().unwrap();
        let err = source.set(SourceProperty::Gain(-1.0)).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn test_submit_rejects_foreign_buffer() {
        let a = session();
        let b = session();
        let source = a.create_source().unwrap();
        let foreign = b.create_buffer(BufferFormat::mono16(1000), &[0u8; 20]).unwrap();
        let err = source.submit(&[&foreign]).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn test_refill_updates_metadata() {
        let session = session();
        let mut buffer = session.create_buffer(BufferFormat::mono16(1000), &[]).unwrap();
        assert!(buffer.is_empty());
        buffer.refill(&[0u8; 2000]).unwrap();
        assert_eq!(buffer.byte_len(), 2000);
        assert_eq!(buffer.duration(), Duration::from_secs(1));
    }
}
