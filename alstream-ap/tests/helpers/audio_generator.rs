//! Audio Test File Generation Utilities
//!
//! Writes real WAV files with hound so the header reader and clip loader are
//! tested against an independent encoder.

use hound::{SampleFormat, WavSpec, WavWriter};
use std::f32::consts::PI;
use std::path::Path;

/// Standard test sample rate (44.1 kHz)
pub const TEST_SAMPLE_RATE: u32 = 44100;

fn spec(channels: u16, sample_rate: u32, bits: u16) -> WavSpec {
    WavSpec {
        channels,
        sample_rate,
        bits_per_sample: bits,
        sample_format: SampleFormat::Int,
    }
}

/// Silent 16-bit WAV with `channels` channels
pub fn generate_silent_wav<P: AsRef<Path>>(
    path: P,
    channels: u16,
    duration_ms: u64,
) -> Result<(), hound::Error> {
    let mut writer = WavWriter::create(path, spec(channels, TEST_SAMPLE_RATE, 16))?;
    let frames = (TEST_SAMPLE_RATE as u64 * duration_ms) / 1000;
    for _ in 0..frames * channels as u64 {
        writer.write_sample(0i16)?;
    }
    writer.finalize()
}

/// Mono 16-bit sine wave
pub fn generate_sine_wav<P: AsRef<Path>>(
    path: P,
    frequency: f32,
    sample_rate: u32,
    duration_ms: u64,
) -> Result<(), hound::Error> {
    let mut writer = WavWriter::create(path, spec(1, sample_rate, 16))?;
    let frames = (sample_rate as u64 * duration_ms) / 1000;
    for n in 0..frames {
        let t = n as f32 / sample_rate as f32;
        let sample = (2.0 * PI * frequency * t).sin() * 0.5;
        writer.write_sample((sample * i16::MAX as f32) as i16)?;
    }
    writer.finalize()
}

/// Mono 8-bit WAV holding `frames` frames of midpoint silence
pub fn generate_u8_wav<P: AsRef<Path>>(path: P, frames: u32) -> Result<(), hound::Error> {
    let mut writer = WavWriter::create(path, spec(1, 8000, 8))?;
    for _ in 0..frames {
        // hound takes 8-bit samples as signed and stores them offset by 128
        writer.write_sample(0i8)?;
    }
    writer.finalize()
}

/// 24-bit WAV, which the player does not accept
pub fn generate_24bit_wav<P: AsRef<Path>>(path: P) -> Result<(), hound::Error> {
    let mut writer = WavWriter::create(path, spec(1, TEST_SAMPLE_RATE, 24))?;
    for _ in 0..100 {
        writer.write_sample(0i32)?;
    }
    writer.finalize()
}
