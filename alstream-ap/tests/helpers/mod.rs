//! Test helper modules for alstream-ap integration tests
//!
//! Provides reusable test infrastructure components:
//! - audio_generator: write real WAV files with hound
//! - error_injection: malformed and missing WAV files
//! - stream harness: manual-clock session with a filled buffer pool

#![allow(dead_code)]

pub mod audio_generator;
pub mod error_injection;

use alstream_ap::audio::BufferFormat;
use alstream_ap::device::{DeviceClock, SoftwareDevice};
use alstream_ap::{Buffer, Fill, FillRequest, Session, StreamingQueue};
use std::time::Duration;

/// 1000 frames of mono16 at 1 kHz: every buffer plays for exactly one second
pub const BUFFER_BYTES: usize = 2000;

pub fn test_format() -> BufferFormat {
    BufferFormat::mono16(1000)
}

/// Session on the default device with a manual clock
pub fn manual_session() -> Session<SoftwareDevice> {
    Session::open(None, DeviceClock::Manual).expect("software device opens")
}

/// `count` one-second buffers, all holding data
pub fn filled_pool(session: &Session<SoftwareDevice>, count: usize) -> Vec<Buffer<SoftwareDevice>> {
    (0..count)
        .map(|_| {
            session
                .create_buffer(test_format(), &[0u8; BUFFER_BYTES])
                .expect("buffer created")
        })
        .collect()
}

/// Controller over a fresh source and a filled pool
pub fn stream(
    session: &Session<SoftwareDevice>,
    pool: usize,
    initial: usize,
) -> StreamingQueue<SoftwareDevice> {
    let source = session.create_source().expect("source created");
    StreamingQueue::initialize(source, filled_pool(session, pool), initial)
        .expect("controller initialized")
}

/// Let the device play `buffers` buffers' worth of audio
pub fn play_buffers(session: &Session<SoftwareDevice>, buffers: u32) {
    session.with_backend(|b| b.advance(Duration::from_secs(buffers as u64)));
}

/// Fill callback that never runs out
pub fn infinite_fill(_: &FillRequest) -> Fill {
    Fill::Data(vec![0u8; BUFFER_BYTES])
}
