//! Source swinging back and forth across the listener
//!
//! `dx` walks from -extent to +extent and back in unit steps; the source sits
//! at (-dx, 0, dx), so it sweeps the diagonal in front-left/back-right of the
//! listener. The clip loops; the demo ends after `motion_steps` steps.

use super::{run_until_stopped, ticker, DemoContext, DemoReport};
use crate::audio::{SourceProperty, Vec3};
use crate::error::Result;
use tracing::debug;

/// Bouncing walk between -extent and +extent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Oscillator {
    dx: f32,
    extent: f32,
    direction: f32,
}

impl Oscillator {
    /// Start at -extent moving right
    pub fn new(extent: f32) -> Self {
        let extent = extent.abs();
        Self {
            dx: -extent,
            extent,
            direction: 1.0,
        }
    }

    pub fn dx(&self) -> f32 {
        self.dx
    }

    /// Take one unit step, turning around at either end
    pub fn step(&mut self) -> f32 {
        if self.extent == 0.0 {
            return 0.0;
        }
        self.dx = (self.dx + self.direction).clamp(-self.extent, self.extent);
        if self.dx >= self.extent {
            self.direction = -1.0;
        } else if self.dx <= -self.extent {
            self.direction = 1.0;
        }
        self.dx
    }

    pub fn position(&self) -> Vec3 {
        Vec3::new(-self.dx, 0.0, self.dx)
    }
}

pub async fn run(ctx: &DemoContext) -> Result<DemoReport> {
    let demo = &ctx.config.demo;
    let (source, _buffer) = ctx.clip_source(true)?;

    let mut walk = Oscillator::new(demo.motion_extent);
    source.set(SourceProperty::Position(walk.position()))?;
    debug!("dx={}", walk.dx());

    let step_source = &source;
    run_until_stopped(
        "motion",
        &source,
        ticker(demo.motion_step()),
        Some(u64::from(demo.motion_steps)),
        |_, _| {
            walk.step();
            debug!("dx={}", walk.dx());
            step_source.set(SourceProperty::Position(walk.position()))
        },
    )
    .await
}
