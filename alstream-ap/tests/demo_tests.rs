//! Demo scenarios run end to end on the realtime software device
//!
//! Clips and tick intervals are kept short so each demo finishes in well
//! under a second.

use alstream_ap::audio::Vec3;
use alstream_ap::config::PlayerConfig;
use alstream_ap::demos::{self, DemoContext};
use alstream_common::events::PlaybackState;

fn fast_config() -> PlayerConfig {
    let mut config = PlayerConfig::default();
    config.demo.tick_ms = 10;
    config.demo.motion_step_ms = 10;
    config.demo.motion_steps = 5;
    config.demo.tone_secs = 0.3;
    config.streaming.buffer_ms = 50;
    config.streaming.poll_interval_ms = 10;
    config.validate().unwrap();
    config
}

#[tokio::test]
async fn test_context_places_listener_at_origin_facing_plus_z() {
    let ctx = DemoContext::open(fast_config(), None).unwrap();
    let listener = ctx.session.with_backend(|b| *b.listener());
    assert_eq!(listener.position, Vec3::ZERO);
    assert_eq!(listener.at, Vec3::new(0.0, 0.0, 1.0));
    assert_eq!(listener.up, Vec3::new(0.0, 1.0, 0.0));
}

#[tokio::test]
async fn test_static_demo_plays_to_end() {
    let ctx = DemoContext::open(fast_config(), None).unwrap();
    let report = demos::static_play::run(&ctx).await.unwrap();
    assert_eq!(report.final_state, PlaybackState::Stopped);
    assert!(report.ticks >= 1);
    let mix = report.last_mix.unwrap();
    assert!((mix.distance - 8.0).abs() < 1e-4);
}

#[tokio::test]
async fn test_motion_demo_is_bounded_by_steps() {
    let ctx = DemoContext::open(fast_config(), None).unwrap();
    let report = demos::motion::run(&ctx).await.unwrap();
    assert_eq!(report.ticks, 5);
    assert_eq!(report.final_state, PlaybackState::Stopped);
}

#[tokio::test]
async fn test_stream_demo_plays_every_chunk_once() {
    let ctx = DemoContext::open(fast_config(), None).unwrap();
    let report = demos::streaming::run(&ctx).await.unwrap();
    assert_eq!(report.final_state, PlaybackState::Stopped);

    // 300 ms of tone in 50 ms chunks; three are primed before start and
    // the fourth buffer joins right after it
    let stats = report.stream.unwrap();
    assert_eq!(stats.retired, 6);
    assert!(stats.admitted >= 1);
    assert_eq!(stats.refilled + stats.admitted + 3, 6);
}

#[tokio::test]
async fn test_unknown_device_fails_to_open() {
    let mut config = fast_config();
    config.device = Some("Imaginary Card".to_string());
    let err = DemoContext::open(config, None).err().unwrap();
    assert!(err.is_device());
}
