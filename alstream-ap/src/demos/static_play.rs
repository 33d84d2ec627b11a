//! Fixed source left of the listener, played once

use super::{run_until_stopped, DemoContext, DemoReport, STATIC_POSITION};
use crate::audio::SourceProperty;
use crate::error::Result;
use tracing::info;

pub async fn run(ctx: &DemoContext) -> Result<DemoReport> {
    let (source, _buffer) = ctx.clip_source(false)?;
    source.set(SourceProperty::Position(STATIC_POSITION))?;
    info!(
        "Playing {:.2}s clip from ({}, {}, {})",
        ctx.clip.duration().as_secs_f64(),
        STATIC_POSITION.x,
        STATIC_POSITION.y,
        STATIC_POSITION.z
    );

    run_until_stopped("static", &source, ctx.ticker(), None, |_, _| Ok(())).await
}
