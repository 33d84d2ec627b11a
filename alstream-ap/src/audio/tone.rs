//! Test tone generation
//!
//! Produces deterministic 16-bit PCM sine data for demos that run without a
//! WAV file and for tests that need buffers with known contents.

use super::types::{BufferFormat, Channels, SampleWidth};
use std::f64::consts::PI;

/// Continuous sine generator
///
/// Successive calls to [`ToneGenerator::next_chunk`] continue the waveform
/// without a phase jump, so chunks can be queued back to back.
#[derive(Debug, Clone)]
pub struct ToneGenerator {
    format: BufferFormat,
    frequency_hz: f64,
    amplitude: f64,
    phase: f64,
}

impl ToneGenerator {
    /// `amplitude` is clamped to 0.0..=1.0
    pub fn new(format: BufferFormat, frequency_hz: f64, amplitude: f64) -> Self {
        Self {
            format,
            frequency_hz,
            amplitude: amplitude.clamp(0.0, 1.0),
            phase: 0.0,
        }
    }

    pub fn format(&self) -> BufferFormat {
        self.format
    }

    /// Generate `frames` frames of PCM data in the generator's format
    pub fn next_chunk(&mut self, frames: usize) -> Vec<u8> {
        let channels = self.format.channels.count() as usize;
        let mut out = Vec::with_capacity(frames * self.format.bytes_per_frame());
        let step = 2.0 * PI * self.frequency_hz / self.format.sample_rate as f64;

        for _ in 0..frames {
            let value = self.phase.sin() * self.amplitude;
            for _ in 0..channels {
                match self.format.width {
                    SampleWidth::I16 => {
                        let s = (value * i16::MAX as f64) as i16;
                        out.extend_from_slice(&s.to_le_bytes());
                    }
                    SampleWidth::U8 => {
                        out.push((128.0 + value * 127.0) as u8);
                    }
                }
            }
            self.phase = (self.phase + step) % (2.0 * PI);
        }
        out
    }
}

/// One-shot helper: `secs` seconds of mono 16-bit sine at `sample_rate`
pub fn sine_pcm16(frequency_hz: f64, sample_rate: u32, secs: f64, amplitude: f64) -> Vec<u8> {
    let format = BufferFormat::new(Channels::Mono, SampleWidth::I16, sample_rate);
    let frames = (secs * sample_rate as f64) as usize;
    ToneGenerator::new(format, frequency_hz, amplitude).next_chunk(frames)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_length_matches_format() {
        let mut gen = ToneGenerator::new(BufferFormat::stereo16(44100), 440.0, 0.5);
        assert_eq!(gen.next_chunk(100).len(), 400);

        let mut gen8 = ToneGenerator::new(
            BufferFormat::new(Channels::Mono, SampleWidth::U8, 8000),
            440.0,
            0.5,
        );
        assert_eq!(gen8.next_chunk(10).len(), 10);
    }

    #[test]
    fn test_chunks_are_phase_continuous() {
        let format = BufferFormat::mono16(8000);
        let mut whole = ToneGenerator::new(format, 1000.0, 0.8);
        let mut split = ToneGenerator::new(format, 1000.0, 0.8);

        let a = whole.next_chunk(64);
        let mut b = split.next_chunk(32);
        b.extend(split.next_chunk(32));
        assert_eq!(a, b);
    }

    #[test]
    fn test_amplitude_bounds_samples() {
        let data = sine_pcm16(440.0, 44100, 0.01, 0.5);
        let peak = data
            .chunks_exact(2)
            .map(|c| i16::from_le_bytes([c[0], c[1]]).unsigned_abs())
            .max()
            .unwrap();
        assert!(peak <= (i16::MAX as f64 * 0.5) as u16 + 1);
        assert!(peak > 0);
    }
}
