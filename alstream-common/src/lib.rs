//! # alstream Common Library
//!
//! Shared code for the alstream workspace:
//! - Error type
//! - Configuration file resolution and TOML loading
//! - Stream event types and the EventBus
//! - Canonical WAV header reader

pub mod config;
pub mod error;
pub mod events;
pub mod wav;

pub use error::{Error, Result};
pub use wav::WavHeader;
