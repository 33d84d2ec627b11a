//! # Positional Audio Streaming Library (alstream-ap)
//!
//! Streaming buffer-queue controller for a positional-audio library, plus the
//! pieces needed to exercise it: a software audio device, scoped
//! session/source/buffer handles, clip loading and spatial demo scenarios.
//!
//! **Architecture:** everything above [`device`] talks to the audio library
//! through the [`device::AudioBackend`] trait. [`playback::StreamingQueue`]
//! keeps one source fed from a fixed ring of buffers, driven by caller polls.

pub mod audio;
pub mod config;
pub mod demos;
pub mod device;
pub mod error;
pub mod playback;
pub mod session;

pub use error::{Error, Result};
pub use playback::{DrainStatus, Fill, FillRequest, PollReport, StreamStats, StreamingQueue};
pub use session::{Buffer, Session, Source};
