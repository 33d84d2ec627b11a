//! Error injection test utilities
//!
//! Builds broken inputs in a temporary directory: missing files, files too
//! short to hold a header, and files whose data chunk is cut short.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Result type for error injection operations
pub type InjectionResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Test file generator for error injection scenarios
pub struct ErrorInjectionBuilder {
    temp_dir: TempDir,
}

impl ErrorInjectionBuilder {
    pub fn new() -> InjectionResult<Self> {
        Ok(Self {
            temp_dir: TempDir::new()?,
        })
    }

    pub fn temp_path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn file_path(&self, filename: &str) -> PathBuf {
        self.temp_dir.path().join(filename)
    }

    pub fn nonexistent_file(&self) -> PathBuf {
        self.file_path("nonexistent_file.wav")
    }

    /// File shorter than the 44-byte header
    pub fn short_file(&self) -> InjectionResult<PathBuf> {
        let path = self.file_path("short.wav");
        fs::write(&path, b"RIFF\x10\x00\x00\x00WAVE")?;
        Ok(path)
    }

    /// Copy of `source` with its last `cut` bytes removed
    pub fn truncated_copy(&self, source: &Path, cut: usize) -> InjectionResult<PathBuf> {
        let bytes = fs::read(source)?;
        let path = self.file_path("truncated.wav");
        fs::write(&path, &bytes[..bytes.len().saturating_sub(cut)])?;
        Ok(path)
    }

    /// Mono 16-bit header declaring a `u32::MAX` data chunk, followed by
    /// only `data_len` bytes of samples
    pub fn oversized_data_chunk(&self, data_len: usize) -> InjectionResult<PathBuf> {
        let path = self.file_path("oversized.wav");
        let mut bytes = alstream_common::WavHeader::pcm(1, 8000, 16, u32::MAX)
            .to_bytes()
            .to_vec();
        bytes.resize(bytes.len() + data_len, 0);
        fs::write(&path, bytes)?;
        Ok(path)
    }
}
