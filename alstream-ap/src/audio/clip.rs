//! In-memory audio clips
//!
//! A [`Clip`] is decoded PCM plus its [`BufferFormat`], loaded from a
//! canonical WAV file or synthesized. [`ClipReader`] hands a clip out in
//! fixed-size chunks for streaming.

use super::tone::ToneGenerator;
use super::types::BufferFormat;
use crate::error::{Error, Result};
use alstream_common::wav::{WavHeader, WAV_HEADER_LEN};
use std::io::Read;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

/// PCM data with its format
#[derive(Debug, Clone, PartialEq)]
pub struct Clip {
    pub format: BufferFormat,
    pub data: Vec<u8>,
}

impl Clip {
    pub fn new(format: BufferFormat, data: Vec<u8>) -> Result<Self> {
        format.check_len(data.len())?;
        Ok(Self { format, data })
    }

    /// Sine tone of `duration` in `format`
    pub fn tone(format: BufferFormat, frequency_hz: f64, duration: Duration) -> Self {
        let frames = format.frames_in(format.bytes_for(duration)) as usize;
        let data = ToneGenerator::new(format, frequency_hz, 0.5).next_chunk(frames);
        Self { format, data }
    }

    pub fn duration(&self) -> Duration {
        self.format.duration_of(self.data.len())
    }

    pub fn len_bytes(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Chunked reader handing out `chunk` of audio per call
    pub fn reader(&self, chunk: Duration) -> ClipReader<'_> {
        let bytes = self.format.bytes_for(chunk).max(self.format.bytes_per_frame());
        ClipReader {
            clip: self,
            chunk_bytes: bytes,
            offset: 0,
        }
    }
}

/// Load a canonical WAV file as a clip
///
/// Reads the fixed 44-byte header, then up to `subchunk2_size` bytes of
/// sample data. A truncated data chunk is accepted with a warning and trimmed
/// to whole frames.
pub fn load_wav<P: AsRef<Path>>(path: P) -> Result<Clip> {
    let path = path.as_ref();
    let mut file = std::fs::File::open(path)
        .map_err(|e| Error::AudioFile(format!("{}: {}", path.display(), e)))?;

    let header = WavHeader::read_from(&mut file)?;
    if !header.is_canonical() {
        warn!(
            "{} does not have a canonical PCM header, reading it as one anyway",
            path.display()
        );
    }
    let format = BufferFormat::from_wav_header(&header)
        .map_err(|e| Error::AudioFile(format!("{}: {}", path.display(), e)))?;

    // The declared size is untrusted; never reserve more than the file holds
    let available = file
        .metadata()?
        .len()
        .saturating_sub(WAV_HEADER_LEN as u64)
        .min(header.subchunk2_size as u64);
    let mut data = Vec::with_capacity(available as usize);
    file.take(available).read_to_end(&mut data)?;

    if data.len() < header.subchunk2_size as usize {
        warn!(
            "{}: data chunk declares {} bytes, file holds {}",
            path.display(),
            header.subchunk2_size,
            data.len()
        );
    }
    let whole = data.len() - data.len() % format.bytes_per_frame();
    data.truncate(whole);

    debug!(
        "Loaded {} ({}, {} bytes after {}-byte header)",
        path.display(),
        format,
        data.len(),
        WAV_HEADER_LEN
    );
    Ok(Clip { format, data })
}

/// Sequential chunk reader over a clip
#[derive(Debug)]
pub struct ClipReader<'a> {
    clip: &'a Clip,
    chunk_bytes: usize,
    offset: usize,
}

impl<'a> ClipReader<'a> {
    /// Next chunk, or `None` once the clip is exhausted
    pub fn next_chunk(&mut self) -> Option<Vec<u8>> {
        if self.offset >= self.clip.data.len() {
            return None;
        }
        let end = (self.offset + self.chunk_bytes).min(self.clip.data.len());
        let chunk = self.clip.data[self.offset..end].to_vec();
        self.offset = end;
        Some(chunk)
    }

    pub fn chunk_bytes(&self) -> usize {
        self.chunk_bytes
    }

    pub fn remaining_bytes(&self) -> usize {
        self.clip.data.len() - self.offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tone_clip_duration() {
        let clip = Clip::tone(BufferFormat::mono16(8000), 440.0, Duration::from_millis(250));
        assert_eq!(clip.len_bytes(), 2000 * 2);
        assert_eq!(clip.duration(), Duration::from_millis(250));
    }

    #[test]
    fn test_reader_covers_clip_exactly() {
        let clip = Clip::tone(BufferFormat::mono16(8000), 440.0, Duration::from_millis(1000));
        let mut reader = clip.reader(Duration::from_millis(300));
        let mut total = 0;
        let mut chunks = 0;
        while let Some(chunk) = reader.next_chunk() {
            total += chunk.len();
            chunks += 1;
        }
        assert_eq!(total, clip.len_bytes());
        assert_eq!(chunks, 4);
        assert_eq!(reader.remaining_bytes(), 0);
    }

    #[test]
    fn test_new_rejects_partial_frames() {
        assert!(Clip::new(BufferFormat::stereo16(44100), vec![0u8; 6]).is_err());
    }
}
