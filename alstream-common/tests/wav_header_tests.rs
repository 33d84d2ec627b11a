//! WAV header reader tests against files written by hound

use alstream_common::wav::{WavHeader, WAV_HEADER_LEN};
use alstream_common::Error;
use hound::{SampleFormat, WavSpec, WavWriter};
use std::path::Path;
use tempfile::TempDir;

fn write_wav(path: &Path, channels: u16, sample_rate: u32, frames: u32) {
    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec).unwrap();
    for _ in 0..frames * channels as u32 {
        writer.write_sample(0i16).unwrap();
    }
    writer.finalize().unwrap();
}

#[test]
fn test_hound_file_has_canonical_header() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("test.wav");
    write_wav(&path, 2, 44100, 441);

    let header = WavHeader::open(&path).unwrap();
    assert!(header.is_canonical());
    assert_eq!(&header.chunk_id, b"RIFF");
    assert_eq!(&header.format, b"WAVE");
    assert_eq!(header.num_channels, 2);
    assert_eq!(header.sample_rate, 44100);
    assert_eq!(header.bits_per_sample, 16);
    assert_eq!(header.block_align, 4);
    assert_eq!(header.byte_rate, 44100 * 4);
    assert_eq!(header.subchunk2_size, 441 * 4);
    assert_eq!(header.chunk_size, 36 + 441 * 4);
    assert!((header.duration_secs() - 0.01).abs() < 1e-9);
}

#[test]
fn test_to_bytes_matches_file_prefix() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("mono.wav");
    write_wav(&path, 1, 8000, 80);

    let bytes = std::fs::read(&path).unwrap();
    let header = WavHeader::parse(&bytes).unwrap();
    assert_eq!(header.to_bytes().as_slice(), &bytes[..WAV_HEADER_LEN]);
}

#[test]
fn test_display_lists_every_field() {
    let header = WavHeader::pcm(1, 8000, 16, 1600);
    let text = header.to_string();
    for field in [
        "chunkId", "chunkSize", "format", "subchunk1Id", "subchunk1Size", "audioFormat",
        "numChannels", "sampleRate", "byteRate", "blockAlign", "bitsPerSample",
        "subchunk2Id", "subchunk2Size",
    ] {
        assert!(text.contains(&format!("  {}: ", field)), "missing {}", field);
    }
    assert_eq!(text.lines().count(), 13);
}

#[test]
fn test_report_serializes_tags_as_text() {
    let header = WavHeader::pcm(2, 22050, 8, 100);
    let json = serde_json::to_value(header.report()).unwrap();
    assert_eq!(json["chunk_id"], "RIFF");
    assert_eq!(json["subchunk2_id"], "data");
    assert_eq!(json["num_channels"], 2);
}

#[test]
fn test_missing_file_is_not_found() {
    let dir = TempDir::new().unwrap();
    let err = WavHeader::open(dir.path().join("absent.wav")).unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[test]
fn test_short_file_is_invalid_input() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("short.wav");
    std::fs::write(&path, [0u8; WAV_HEADER_LEN - 1]).unwrap();
    let err = WavHeader::open(&path).unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));
}

#[test]
fn test_garbage_is_read_but_not_canonical() {
    let header = WavHeader::parse(&[0xABu8; WAV_HEADER_LEN]).unwrap();
    assert!(!header.is_canonical());
    assert!(header.to_string().contains("chunkId: ...."));
}
