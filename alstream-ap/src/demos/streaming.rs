//! Clip streamed through a ring of buffers
//!
//! The clip is cut into `buffer_ms` chunks. `initial_submit` buffers are
//! filled up front and the spares are admitted right after `play`, so the
//! whole ring is in flight. After that, every poll refills whatever finished
//! playing with the next chunk. When the clip runs out the queue is drained
//! and the source stopped.

use super::{ticker, DemoContext, DemoReport, STATIC_POSITION};
use crate::audio::{ClipReader, SourceProperty};
use crate::error::Result;
use crate::playback::{DrainStatus, Fill, FillRequest, StreamingQueue};
use alstream_common::events::{PlaybackState, QueueStatus};
use std::time::Instant;
use tracing::{debug, info, warn};

fn next_chunk(reader: &mut ClipReader<'_>) -> Fill {
    match reader.next_chunk() {
        Some(chunk) => Fill::Data(chunk),
        None => Fill::EndOfStream,
    }
}

pub async fn run(ctx: &DemoContext) -> Result<DemoReport> {
    let settings = &ctx.config.streaming;
    let mut reader = ctx.clip.reader(settings.buffer_duration());

    let mut pool = ctx
        .session
        .create_buffer_pool(ctx.clip.format, settings.buffer_count)?;
    let mut primed = 0;
    for buffer in pool.iter_mut().take(settings.initial_submit) {
        match reader.next_chunk() {
            Some(chunk) => {
                buffer.refill(&chunk)?;
                primed += 1;
            }
            None => break,
        }
    }
    if primed < settings.initial_submit {
        warn!(
            "Clip fills only {} of {} initial buffers",
            primed, settings.initial_submit
        );
    }

    let source = ctx.session.create_source()?;
    source.set(SourceProperty::Position(STATIC_POSITION))?;

    let mut stream = StreamingQueue::initialize(source, pool, primed)?;
    info!(
        "Streaming {:.2}s clip through {} x {} ms buffers ({} primed)",
        ctx.clip.duration().as_secs_f64(),
        stream.capacity(),
        settings.buffer_ms,
        primed
    );

    let started = Instant::now();
    let mut tick = ticker(settings.poll_interval());
    let mut ticks = 0u64;
    let mut fill = |_: &FillRequest| next_chunk(&mut reader);

    tick.tick().await;
    stream.start()?;
    let spares = stream.admit_idle(&mut fill)?;
    debug!("Admitted {} spare buffers after start", spares);

    loop {
        tick.tick().await;
        ticks += 1;

        if stream.is_end_of_stream() {
            match stream.drain_and_stop()? {
                DrainStatus::Stopped => break,
                DrainStatus::Pending { remaining } => {
                    debug!("Draining, {} buffers left", remaining);
                }
            }
            continue;
        }

        let report = stream.poll_and_refill(&mut fill)?;
        if report.status == QueueStatus::Underrun {
            // Spare buffers are the only way back once the queue ran dry
            let admitted = stream.admit_idle(&mut fill)?;
            debug!("Admitted {} idle buffers after underrun", admitted);
        }
    }

    let stats = stream.stats();
    let report = DemoReport {
        demo: "stream",
        ticks,
        elapsed_ms: started.elapsed().as_millis() as u64,
        final_state: stream.state(),
        last_mix: stream.source().mix_params()?,
        stream: Some(stats),
    };
    debug_assert_eq!(report.final_state, PlaybackState::Stopped);
    info!(
        "Stream finished: {} retired, {} refilled, {} admitted, {} underruns, {} recoveries",
        stats.retired, stats.refilled, stats.admitted, stats.underruns, stats.recoveries
    );
    Ok(report)
}
