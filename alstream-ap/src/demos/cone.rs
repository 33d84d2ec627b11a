//! Directional source turning in place
//!
//! The source sits in front of the listener and its cone axis rotates about
//! Y for one full turn. Gain follows the cone: full inside the inner cone,
//! `cone_outer_gain` outside the outer one.

use super::{run_until_stopped, DemoContext, DemoReport};
use crate::audio::{SourceProperty, Vec3};
use crate::error::Result;
use std::time::Duration;
use tracing::debug;

pub const CONE_POSITION: Vec3 = Vec3::new(0.0, 0.0, -4.0);

const DEGREES_PER_SEC: f32 = 90.0;

/// Cone axis after `secs` of rotation; at 0 it points at the listener
pub fn direction_at(secs: f32) -> Vec3 {
    let theta = (secs * DEGREES_PER_SEC).to_radians();
    Vec3::new(theta.sin(), 0.0, theta.cos())
}

/// Ticks for one full turn
pub fn turn_ticks(tick: Duration) -> u64 {
    let turn = 360.0 / DEGREES_PER_SEC as f64;
    (turn / tick.as_secs_f64()).ceil().max(1.0) as u64
}

pub async fn run(ctx: &DemoContext) -> Result<DemoReport> {
    let demo = &ctx.config.demo;
    let (source, _buffer) = ctx.clip_source(true)?;
    source.set(SourceProperty::Position(CONE_POSITION))?;
    source.set(SourceProperty::ConeInnerAngle(demo.cone_inner_deg))?;
    source.set(SourceProperty::ConeOuterAngle(demo.cone_outer_deg))?;
    source.set(SourceProperty::ConeOuterGain(demo.cone_outer_gain))?;
    source.set(SourceProperty::Direction(direction_at(0.0)))?;

    let tick_source = &source;
    run_until_stopped(
        "cone",
        &source,
        ctx.ticker(),
        Some(turn_ticks(demo.tick())),
        |_, elapsed| {
            tick_source.set(SourceProperty::Direction(direction_at(elapsed)))?;
            if let Some(mix) = tick_source.mix_params()? {
                debug!(
                    "angle={:.0} cone_gain={:.3}",
                    (elapsed * DEGREES_PER_SEC) % 360.0,
                    mix.cone_gain
                );
            }
            Ok(())
        },
    )
    .await
}
