//! Integration tests for session, source and buffer handles

mod helpers;

use alstream_ap::audio::{BufferFormat, ListenerProperty, SourceProperty, Vec3};
use alstream_ap::device::{DeviceClock, DeviceOp};
use alstream_ap::{Error, Session};
use alstream_common::events::PlaybackState;
use helpers::*;
use std::time::Duration;

#[test]
fn test_open_named_device() {
    let session = Session::open(Some("Null Output"), DeviceClock::Manual).unwrap();
    assert_eq!(session.device_name(), "Null Output");

    let err = Session::open(Some("No Such Card"), DeviceClock::Manual).unwrap_err();
    assert!(err.is_device());
}

#[test]
fn test_failed_make_current_is_device_error() {
    let mut device =
        alstream_ap::device::SoftwareDevice::open(None, DeviceClock::Manual).unwrap();
    device.fail_next(DeviceOp::MakeCurrent);
    let err = Session::new(device).unwrap_err();
    assert!(err.is_device());
}

#[test]
fn test_single_buffer_plays_to_stopped() {
    let session = manual_session();
    let source = session.create_source().unwrap();
    let buffer = session
        .create_buffer(test_format(), &[0u8; BUFFER_BYTES])
        .unwrap();
    assert_eq!(buffer.duration(), Duration::from_secs(1));

    source.set(SourceProperty::Position(Vec3::new(-8.0, 0.0, 0.0))).unwrap();
    source.submit(&[&buffer]).unwrap();
    assert_eq!(source.state().unwrap(), PlaybackState::Initial);

    source.play().unwrap();
    play_buffers(&session, 0);
    assert_eq!(source.state().unwrap(), PlaybackState::Playing);

    play_buffers(&session, 1);
    assert_eq!(source.state().unwrap(), PlaybackState::Stopped);
    assert_eq!(source.retire_finished().unwrap(), vec![buffer.id()]);
}

#[test]
fn test_mix_params_follow_position() {
    let session = manual_session();
    session
        .set_listener(ListenerProperty::Orientation {
            at: Vec3::new(0.0, 0.0, -1.0),
            up: Vec3::new(0.0, 1.0, 0.0),
        })
        .unwrap();
    let source = session.create_source().unwrap();

    source.set(SourceProperty::Position(Vec3::new(-8.0, 0.0, 0.0))).unwrap();
    let far = source.mix_params().unwrap().unwrap();
    source.set(SourceProperty::Position(Vec3::new(-2.0, 0.0, 0.0))).unwrap();
    let near = source.mix_params().unwrap().unwrap();

    assert!((far.distance - 8.0).abs() < 1e-5);
    assert!(near.gain > far.gain);
}

#[test]
fn test_invalid_properties_rejected_before_the_device() {
    let session = manual_session();
    let source = session.create_source().unwrap();

    assert!(matches!(
        source.set(SourceProperty::Pitch(0.0)),
        Err(Error::InvalidArgument(_))
    ));
    assert!(matches!(
        source.set(SourceProperty::Position(Vec3::new(f32::NAN, 0.0, 0.0))),
        Err(Error::InvalidArgument(_))
    ));
    assert!(matches!(
        session.set_listener(ListenerProperty::Gain(-0.5)),
        Err(Error::InvalidArgument(_))
    ));
}

#[test]
fn test_buffer_rejects_partial_frames() {
    let session = manual_session();
    let err = session
        .create_buffer(BufferFormat::stereo16(1000), &[0u8; 6])
        .unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
}

#[test]
fn test_buffer_rejects_zero_sample_rate() {
    let session = manual_session();
    let err = session
        .create_buffer(BufferFormat::mono16(0), &[0u8; BUFFER_BYTES])
        .unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
}

#[test]
fn test_queued_buffer_cannot_be_refilled() {
    let session = manual_session();
    let source = session.create_source().unwrap();
    let mut buffer = session
        .create_buffer(test_format(), &[0u8; BUFFER_BYTES])
        .unwrap();
    source.submit(&[&buffer]).unwrap();

    assert!(buffer.refill(&[0u8; 4]).unwrap_err().is_device());

    source.stop().unwrap();
    source.retire_finished().unwrap();
    buffer.refill(&[0u8; 4]).unwrap();
    assert_eq!(buffer.byte_len(), 4);
}

#[test]
fn test_device_closes_after_last_handle() {
    let session = manual_session();
    let source = session.create_source().unwrap();
    let buffer = session.create_buffer(test_format(), &[0u8; 2]).unwrap();
    source.submit(&[&buffer]).unwrap();

    drop(session);
    drop(source);
    // Queue released with the source, so the buffer can now be destroyed
    drop(buffer);
}
