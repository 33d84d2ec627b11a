//! WAV header dump
//!
//! Reads the fixed 44-byte canonical header of a WAV file and prints every
//! field, as text or JSON.
//!
//! Usage:
//!   wav-info [FILE] [--json]

use std::path::PathBuf;

use alstream_common::WavHeader;
use anyhow::{Context, Result};
use clap::Parser;
use tracing::warn;

#[derive(Parser, Debug)]
#[command(name = "wav-info")]
#[command(about = "Print the canonical header of a WAV file")]
#[command(version)]
struct Args {
    /// WAV file to inspect
    #[arg(default_value = "test.wav")]
    file: PathBuf,

    /// Print the header as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let header = WavHeader::open(&args.file)
        .with_context(|| format!("Failed to read header of {}", args.file.display()))?;

    if !header.is_canonical() {
        warn!("{} is not a canonical PCM WAV file", args.file.display());
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&header.report())?);
    } else {
        println!("{}:", args.file.display());
        println!("{}", header);
    }

    Ok(())
}
