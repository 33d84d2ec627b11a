//! Positional audio demo player (alstream-ap) - Main entry point
//!
//! Runs one of the spatial-audio demo scenarios on the software device:
//! a fixed source, a moving source, a Doppler fly-by, a rotating sound cone,
//! or a clip streamed through a ring of buffers.

use std::path::PathBuf;

use alstream_ap::config::PlayerConfig;
use alstream_ap::demos::{self, DemoContext, DemoReport};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for alstream-ap
#[derive(Parser, Debug)]
#[command(name = "alstream-ap")]
#[command(about = "Positional audio demos on a software audio device")]
#[command(version)]
struct Args {
    /// Config file (overrides ALSTREAM_CONFIG and the per-user file)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Audio device to open (overrides the configured device)
    #[arg(short, long, env = "ALSTREAM_DEVICE")]
    device: Option<String>,

    /// Print the final report as JSON on stdout
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    demo: Demo,
}

#[derive(Subcommand, Debug)]
enum Demo {
    /// Fixed source at (-8, 0, 0), played once
    Static(ClipArgs),
    /// Source swinging along the (-dx, 0, dx) diagonal
    Motion(ClipArgs),
    /// Source flying past the listener
    Doppler(ClipArgs),
    /// Directional source rotating in place
    Cone(ClipArgs),
    /// Clip streamed through the buffer ring
    Stream(ClipArgs),
}

#[derive(clap::Args, Debug)]
struct ClipArgs {
    /// WAV file to play (a sine tone is generated when omitted)
    #[arg(short, long)]
    wav: Option<PathBuf>,
}

impl Demo {
    fn clip(&self) -> &ClipArgs {
        match self {
            Demo::Static(a) | Demo::Motion(a) | Demo::Doppler(a) | Demo::Cone(a) | Demo::Stream(a) => a,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let (mut config, config_path) =
        PlayerConfig::load(args.config.as_deref()).context("Failed to load configuration")?;

    // Initialize tracing: RUST_LOG wins, configured level otherwise
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter(&config.logging.level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting alstream-ap (git {} built {} [{}])",
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    match &config_path {
        Some(path) => info!("Configuration: {}", path.display()),
        None => info!("Configuration: built-in defaults"),
    }

    if args.device.is_some() {
        config.device = args.device.clone();
    }

    let ctx = DemoContext::open(config, args.demo.clip().wav.as_deref())
        .context("Failed to set up audio session")?;
    info!("Audio device: {}", ctx.session.device_name());

    let report = tokio::select! {
        report = run_demo(&args.demo, &ctx) => report?,
        _ = shutdown_signal() => {
            warn!("Demo interrupted");
            return Ok(());
        }
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    info!("Shutdown complete");
    Ok(())
}

async fn run_demo(demo: &Demo, ctx: &DemoContext) -> Result<DemoReport> {
    let report = match demo {
        Demo::Static(_) => demos::static_play::run(ctx).await,
        Demo::Motion(_) => demos::motion::run(ctx).await,
        Demo::Doppler(_) => demos::doppler::run(ctx).await,
        Demo::Cone(_) => demos::cone::run(ctx).await,
        Demo::Stream(_) => demos::streaming::run(ctx).await,
    };
    report.context("Demo failed")
}

/// Filter directive for a configured level
///
/// A bare level applies to this workspace's crates; anything containing `=`
/// or `,` is used verbatim as a directive.
fn default_filter(level: &str) -> String {
    if level.contains('=') || level.contains(',') {
        level.to_string()
    } else {
        format!("alstream_ap={level},alstream_common={level}")
    }
}

/// Ctrl+C / SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
