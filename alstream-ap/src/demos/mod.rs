//! Positional-audio demo scenarios
//!
//! Every demo runs on a realtime-clock session with the listener at the
//! origin facing +Z (up +Y), plays one clip (a WAV file or a generated tone)
//! and polls source state once per tick until playback ends.
//!
//! | Demo      | What moves                                          |
//! |-----------|-----------------------------------------------------|
//! | `static`  | nothing; source fixed at (-8, 0, 0)                 |
//! | `motion`  | source swings along the (-dx, 0, dx) diagonal       |
//! | `doppler` | source flies past along X with constant velocity    |
//! | `cone`    | directional source rotates about Y                  |
//! | `stream`  | nothing; clip is streamed through a buffer ring     |

pub mod cone;
pub mod doppler;
pub mod motion;
pub mod static_play;
pub mod streaming;

use crate::audio::{load_wav, BufferFormat, Clip, ListenerProperty, MixParams, SourceProperty, Vec3};
use crate::config::PlayerConfig;
use crate::device::{DeviceClock, SoftwareDevice};
use crate::error::Result;
use crate::playback::StreamStats;
use crate::session::{Buffer, Session, Source};
use alstream_common::events::PlaybackState;
use serde::Serialize;
use std::path::Path;
use std::time::Instant;
use tokio::time::{interval, Interval, MissedTickBehavior};
use tracing::info;

/// Sample rate of the generated fallback tone
pub const TONE_SAMPLE_RATE: u32 = 44_100;

/// Where the static demo places its source
pub const STATIC_POSITION: Vec3 = Vec3::new(-8.0, 0.0, 0.0);

/// Summary printed when a demo ends
#[derive(Debug, Clone, Serialize)]
pub struct DemoReport {
    pub demo: &'static str,
    pub ticks: u64,
    pub elapsed_ms: u64,
    pub final_state: PlaybackState,
    pub last_mix: Option<MixParams>,
    pub stream: Option<StreamStats>,
}

/// Open session, loaded clip and settings shared by the demos
pub struct DemoContext {
    pub session: Session<SoftwareDevice>,
    pub clip: Clip,
    pub config: PlayerConfig,
}

impl DemoContext {
    /// Open the configured device, place the listener and load the clip
    ///
    /// `wav` = `None` synthesizes a tone from the demo settings.
    pub fn open(config: PlayerConfig, wav: Option<&Path>) -> Result<Self> {
        let session = Session::open(config.device.as_deref(), DeviceClock::Realtime)?;

        session.set_listener(ListenerProperty::Position(Vec3::ZERO))?;
        session.set_listener(ListenerProperty::Velocity(Vec3::ZERO))?;
        session.set_listener(ListenerProperty::Orientation {
            at: Vec3::new(0.0, 0.0, 1.0),
            up: Vec3::new(0.0, 1.0, 0.0),
        })?;

        let clip = match wav {
            Some(path) => {
                let clip = load_wav(path)?;
                info!(
                    "Loaded {} ({}, {:.2}s)",
                    path.display(),
                    clip.format,
                    clip.duration().as_secs_f64()
                );
                clip
            }
            None => {
                let clip = Clip::tone(
                    BufferFormat::mono16(TONE_SAMPLE_RATE),
                    config.demo.tone_hz as f64,
                    config.demo.tone_duration(),
                );
                info!(
                    "Generated {} Hz tone ({:.2}s)",
                    config.demo.tone_hz,
                    clip.duration().as_secs_f64()
                );
                clip
            }
        };

        Ok(Self {
            session,
            clip,
            config,
        })
    }

    /// Source with the whole clip queued as a single buffer
    ///
    /// The buffer is returned alongside so it outlives its queue entry.
    pub fn clip_source(
        &self,
        looping: bool,
    ) -> Result<(Source<SoftwareDevice>, Buffer<SoftwareDevice>)> {
        let buffer = self.session.create_buffer_from_clip(&self.clip)?;
        let source = self.session.create_source()?;
        source.set(SourceProperty::Pitch(1.0))?;
        source.set(SourceProperty::Gain(1.0))?;
        source.set(SourceProperty::Velocity(Vec3::ZERO))?;
        source.set(SourceProperty::Looping(looping))?;
        source.submit(&[&buffer])?;
        Ok((source, buffer))
    }

    /// Tick timer at the configured demo cadence
    pub fn ticker(&self) -> Interval {
        ticker(self.config.demo.tick())
    }
}

/// Interval that skips missed ticks instead of bursting
pub(crate) fn ticker(period: std::time::Duration) -> Interval {
    let mut tick = interval(period);
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
    tick
}

/// Poll `source` once per tick until it leaves Playing
///
/// `on_tick` runs before each state query with the tick number and elapsed
/// seconds; it is where demos move things around.
pub(crate) async fn run_until_stopped<F>(
    demo: &'static str,
    source: &Source<SoftwareDevice>,
    mut tick: Interval,
    max_ticks: Option<u64>,
    mut on_tick: F,
) -> Result<DemoReport>
where
    F: FnMut(u64, f32) -> Result<()>,
{
    let started = Instant::now();
    let mut ticks = 0u64;
    let mut last_mix = None;

    // First tick completes immediately
    tick.tick().await;
    source.play()?;

    let final_state = loop {
        tick.tick().await;
        ticks += 1;
        on_tick(ticks, started.elapsed().as_secs_f32())?;
        last_mix = source.mix_params()?;

        let state = source.state()?;
        if state != PlaybackState::Playing {
            break state;
        }
        if max_ticks.is_some_and(|max| ticks >= max) {
            source.stop()?;
            break PlaybackState::Stopped;
        }
    };

    let report = DemoReport {
        demo,
        ticks,
        elapsed_ms: started.elapsed().as_millis() as u64,
        final_state,
        last_mix,
        stream: None,
    };
    info!(
        "Demo '{}' finished after {} ticks ({} ms), source {}",
        demo, report.ticks, report.elapsed_ms, report.final_state
    );
    Ok(report)
}
