//! Error types for alstream-ap
//!
//! Two kinds matter to callers of the streaming controller:
//! - [`Error::InvalidArgument`]: a caller bug (bad capacity, call out of
//!   order). Returned immediately, never retried.
//! - [`Error::Device`]: the audio library reported a failure. Fatal to the
//!   current session, surfaced to the caller, never retried.
//!
//! Queue underrun is not an error; it is reported as
//! [`QueueStatus::Underrun`](alstream_common::events::QueueStatus).

use thiserror::Error;

/// Main error type for alstream-ap
#[derive(Error, Debug)]
pub enum Error {
    /// Precondition violated by the caller
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Audio device/session/library failure
    #[error("Device error: {0}")]
    Device(String),

    /// Configuration loading or validation errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Audio file could not be used as a buffer source
    #[error("Audio file error: {0}")]
    AudioFile(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Errors from the common crate (config files, WAV headers)
    #[error(transparent)]
    Common(#[from] alstream_common::Error),
}

impl Error {
    /// True for failures that end the session
    pub fn is_device(&self) -> bool {
        matches!(self, Error::Device(_))
    }
}

/// Convenience Result type using alstream-ap Error
pub type Result<T> = std::result::Result<T, Error>;
