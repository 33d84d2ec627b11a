//! Source flying past the listener along X
//!
//! Position is integrated from a constant velocity once per tick; the source
//! velocity is what drives the Doppler shift, so both are set every tick.

use super::{run_until_stopped, DemoContext, DemoReport};
use crate::audio::{SourceProperty, Vec3};
use crate::error::Result;
use std::time::Duration;
use tracing::debug;

/// Distance in front of the listener at the closest point
const PASS_DISTANCE: f32 = 2.0;

/// Straight-line pass from x = -extent to x = +extent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlyBy {
    pub start: Vec3,
    pub velocity: Vec3,
    pub duration: Duration,
}

impl FlyBy {
    pub fn new(extent: f32, speed: f32) -> Self {
        let extent = extent.abs().max(1.0);
        let speed = speed.abs().max(f32::EPSILON);
        Self {
            start: Vec3::new(-extent, 0.0, -PASS_DISTANCE),
            velocity: Vec3::new(speed, 0.0, 0.0),
            duration: Duration::from_secs_f32(2.0 * extent / speed),
        }
    }

    pub fn position_at(&self, secs: f32) -> Vec3 {
        self.start + self.velocity * secs
    }

    /// Ticks needed to cover the pass at `tick` cadence
    pub fn ticks(&self, tick: Duration) -> u64 {
        (self.duration.as_secs_f64() / tick.as_secs_f64()).ceil().max(1.0) as u64
    }
}

pub async fn run(ctx: &DemoContext) -> Result<DemoReport> {
    let demo = &ctx.config.demo;
    let (source, _buffer) = ctx.clip_source(true)?;

    let flight = FlyBy::new(demo.motion_extent, demo.doppler_speed);
    source.set(SourceProperty::Position(flight.start))?;
    source.set(SourceProperty::Velocity(flight.velocity))?;

    let tick_source = &source;
    run_until_stopped(
        "doppler",
        &source,
        ctx.ticker(),
        Some(flight.ticks(demo.tick())),
        |_, elapsed| {
            let position = flight.position_at(elapsed);
            tick_source.set(SourceProperty::Position(position))?;
            if let Some(mix) = tick_source.mix_params()? {
                debug!("x={:.2} doppler={:.3} gain={:.3}", position.x, mix.doppler, mix.gain);
            }
            Ok(())
        },
    )
    .await
}
