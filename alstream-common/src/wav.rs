//! Canonical WAV header reader
//!
//! Reads the fixed 44-byte header of a canonical uncompressed WAV file
//! (RIFF chunk, 16-byte `fmt ` chunk, `data` chunk header) exactly as laid
//! out on disk. No chunk walking and no validation beyond the fixed layout;
//! [`WavHeader::is_canonical`] reports whether the tags look right.

use crate::{Error, Result};
use serde::Serialize;
use std::fmt;
use std::io::Read;
use std::path::Path;

/// Size of the canonical header in bytes
pub const WAV_HEADER_LEN: usize = 44;

/// PCM `audio_format` code
pub const WAVE_FORMAT_PCM: u16 = 1;

/// Canonical WAV header, field for field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavHeader {
    pub chunk_id: [u8; 4],
    pub chunk_size: u32,
    pub format: [u8; 4],

    pub subchunk1_id: [u8; 4],
    pub subchunk1_size: u32,
    pub audio_format: u16,
    pub num_channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,

    pub subchunk2_id: [u8; 4],
    pub subchunk2_size: u32,
}

impl WavHeader {
    /// Parse the header from the first 44 bytes of `bytes`
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < WAV_HEADER_LEN {
            return Err(Error::InvalidInput(format!(
                "short read: WAV header needs {} bytes, got {}",
                WAV_HEADER_LEN,
                bytes.len()
            )));
        }

        let tag = |at: usize| -> [u8; 4] { [bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]] };
        let u32_at = |at: usize| u32::from_le_bytes(tag(at));
        let u16_at = |at: usize| u16::from_le_bytes([bytes[at], bytes[at + 1]]);

        Ok(Self {
            chunk_id: tag(0),
            chunk_size: u32_at(4),
            format: tag(8),
            subchunk1_id: tag(12),
            subchunk1_size: u32_at(16),
            audio_format: u16_at(20),
            num_channels: u16_at(22),
            sample_rate: u32_at(24),
            byte_rate: u32_at(28),
            block_align: u16_at(32),
            bits_per_sample: u16_at(34),
            subchunk2_id: tag(36),
            subchunk2_size: u32_at(40),
        })
    }

    /// Read exactly one header from `reader`
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let mut buf = [0u8; WAV_HEADER_LEN];
        let mut filled = 0;
        while filled < WAV_HEADER_LEN {
            let n = reader.read(&mut buf[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        Self::parse(&buf[..filled])
    }

    /// Open `path` and read its header
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut file = std::fs::File::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::NotFound(path.display().to_string()),
            _ => Error::Io(e),
        })?;
        Self::read_from(&mut file)
    }

    /// Serialize back to the 44-byte on-disk layout
    pub fn to_bytes(&self) -> [u8; WAV_HEADER_LEN] {
        let mut out = [0u8; WAV_HEADER_LEN];
        out[0..4].copy_from_slice(&self.chunk_id);
        out[4..8].copy_from_slice(&self.chunk_size.to_le_bytes());
        out[8..12].copy_from_slice(&self.format);
        out[12..16].copy_from_slice(&self.subchunk1_id);
        out[16..20].copy_from_slice(&self.subchunk1_size.to_le_bytes());
        out[20..22].copy_from_slice(&self.audio_format.to_le_bytes());
        out[22..24].copy_from_slice(&self.num_channels.to_le_bytes());
        out[24..28].copy_from_slice(&self.sample_rate.to_le_bytes());
        out[28..32].copy_from_slice(&self.byte_rate.to_le_bytes());
        out[32..34].copy_from_slice(&self.block_align.to_le_bytes());
        out[34..36].copy_from_slice(&self.bits_per_sample.to_le_bytes());
        out[36..40].copy_from_slice(&self.subchunk2_id);
        out[40..44].copy_from_slice(&self.subchunk2_size.to_le_bytes());
        out
    }

    /// Build a PCM header for `data_len` bytes of sample data
    pub fn pcm(num_channels: u16, sample_rate: u32, bits_per_sample: u16, data_len: u32) -> Self {
        let block_align = num_channels.saturating_mul(bits_per_sample / 8);
        Self {
            chunk_id: *b"RIFF",
            chunk_size: data_len.saturating_add(36),
            format: *b"WAVE",
            subchunk1_id: *b"fmt ",
            subchunk1_size: 16,
            audio_format: WAVE_FORMAT_PCM,
            num_channels,
            sample_rate,
            byte_rate: sample_rate.saturating_mul(block_align as u32),
            block_align,
            bits_per_sample,
            subchunk2_id: *b"data",
            subchunk2_size: data_len,
        }
    }

    /// True when the tags match a canonical PCM file
    pub fn is_canonical(&self) -> bool {
        &self.chunk_id == b"RIFF"
            && &self.format == b"WAVE"
            && &self.subchunk1_id == b"fmt "
            && self.subchunk1_size == 16
            && self.audio_format == WAVE_FORMAT_PCM
            && &self.subchunk2_id == b"data"
    }

    /// Playback duration of the data chunk in seconds (0.0 if byte rate is 0)
    pub fn duration_secs(&self) -> f64 {
        if self.byte_rate == 0 {
            return 0.0;
        }
        self.subchunk2_size as f64 / self.byte_rate as f64
    }

    /// Serialisable view with tags rendered as text
    pub fn report(&self) -> WavHeaderReport {
        WavHeaderReport {
            chunk_id: tag_text(&self.chunk_id),
            chunk_size: self.chunk_size,
            format: tag_text(&self.format),
            subchunk1_id: tag_text(&self.subchunk1_id),
            subchunk1_size: self.subchunk1_size,
            audio_format: self.audio_format,
            num_channels: self.num_channels,
            sample_rate: self.sample_rate,
            byte_rate: self.byte_rate,
            block_align: self.block_align,
            bits_per_sample: self.bits_per_sample,
            subchunk2_id: tag_text(&self.subchunk2_id),
            subchunk2_size: self.subchunk2_size,
        }
    }
}

/// Four-byte tag as text, with non-printable bytes replaced by `.`
fn tag_text(tag: &[u8; 4]) -> String {
    tag.iter()
        .map(|&b| if b.is_ascii_graphic() || b == b' ' { b as char } else { '.' })
        .collect()
}

impl fmt::Display for WavHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  chunkId: {}", tag_text(&self.chunk_id))?;
        writeln!(f, "  chunkSize: {}", self.chunk_size)?;
        writeln!(f, "  format: {}", tag_text(&self.format))?;
        writeln!(f, "  subchunk1Id: {}", tag_text(&self.subchunk1_id))?;
        writeln!(f, "  subchunk1Size: {}", self.subchunk1_size)?;
        writeln!(f, "  audioFormat: {}", self.audio_format)?;
        writeln!(f, "  numChannels: {}", self.num_channels)?;
        writeln!(f, "  sampleRate: {}", self.sample_rate)?;
        writeln!(f, "  byteRate: {}", self.byte_rate)?;
        writeln!(f, "  blockAlign: {}", self.block_align)?;
        writeln!(f, "  bitsPerSample: {}", self.bits_per_sample)?;
        writeln!(f, "  subchunk2Id: {}", tag_text(&self.subchunk2_id))?;
        write!(f, "  subchunk2Size: {}", self.subchunk2_size)
    }
}

/// Header fields in a serialisable form
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct WavHeaderReport {
    pub chunk_id: String,
    pub chunk_size: u32,
    pub format: String,
    pub subchunk1_id: String,
    pub subchunk1_size: u32,
    pub audio_format: u16,
    pub num_channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
    pub subchunk2_id: String,
    pub subchunk2_size: u32,
}
