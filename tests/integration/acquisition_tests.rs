//! AcquisitionLoop → FrameBuffer: interval pacing and stale-frame behaviour.

use super::mock_sensor::{Read, RecordingSink, ScriptedSensor, uniform};

use heatwatch::acquisition::AcquisitionLoop;
use heatwatch::app::events::AppEvent;
use heatwatch::config::SystemConfig;
use heatwatch::error::AcquisitionError;
use heatwatch::frame_buffer::FrameBuffer;

fn setup() -> (AcquisitionLoop, FrameBuffer, RecordingSink) {
    let config = SystemConfig::default();
    let mut sink = RecordingSink::new();
    let buffer = FrameBuffer::new(config.geometry());
    let mut acq = AcquisitionLoop::new(config.frame_interval_ms);
    acq.start(&buffer, &mut sink);
    (acq, buffer, sink)
}

#[test]
fn boot_buffer_is_all_zero() {
    let (_, buffer, sink) = setup();
    assert_eq!(buffer.generation(), 0);
    assert!(buffer.snapshot().samples().iter().all(|&t| t == 0.0));
    assert!(matches!(sink.events[0], AppEvent::Started(_)));
}

#[test]
fn reads_once_per_interval() {
    let (mut acq, buffer, mut sink) = setup();
    let mut sensor = ScriptedSensor::new()
        .then(Read::Frame(uniform(20.0)))
        .then(Read::Frame(uniform(21.0)));

    for now in (0..2000).step_by(100) {
        acq.tick(now, &mut sensor, &buffer, &mut sink);
    }
    assert_eq!(sensor.reads, 2);
    assert_eq!(buffer.generation(), 2);
    assert_eq!(buffer.snapshot().samples()[0], 21.0);
}

#[test]
fn fault_keeps_previous_frame() {
    let (mut acq, buffer, mut sink) = setup();
    let mut sensor = ScriptedSensor::new()
        .then(Read::Frame(uniform(20.0)))
        .then(Read::Fault(AcquisitionError::HardwareFault(-2)));

    acq.tick(0, &mut sensor, &buffer, &mut sink);
    let before = buffer.snapshot();
    acq.tick(1000, &mut sensor, &buffer, &mut sink);

    assert_eq!(buffer.snapshot(), before);
    assert_eq!(buffer.generation(), 1);
    assert_eq!(sink.failures(), 1);
    assert_eq!(acq.stats().failed, 1);
}

#[test]
fn short_frame_is_discarded_whole() {
    let (mut acq, buffer, mut sink) = setup();
    let mut sensor = ScriptedSensor::new()
        .then(Read::Frame(uniform(20.0)))
        .then(Read::Short(700));

    acq.tick(0, &mut sensor, &buffer, &mut sink);
    acq.tick(1000, &mut sensor, &buffer, &mut sink);

    let frame = buffer.snapshot();
    assert!(frame.samples().iter().all(|&t| t == 20.0));
    assert!(sink.events.iter().any(|e| matches!(
        e,
        AppEvent::AcquisitionFailed(AcquisitionError::ShortFrame {
            expected: 768,
            got: 700
        })
    )));
}

#[test]
fn recovers_after_failures() {
    let (mut acq, buffer, mut sink) = setup();
    let mut sensor = ScriptedSensor::new()
        .then(Read::Fault(AcquisitionError::HardwareFault(-1)))
        .then(Read::Fault(AcquisitionError::HardwareFault(-1)))
        .then(Read::Frame(uniform(22.5)));

    for now in [0, 1000, 2000] {
        acq.tick(now, &mut sensor, &buffer, &mut sink);
    }
    assert_eq!(buffer.generation(), 1);
    assert_eq!(acq.stats().consecutive_failures, 0);
    assert_eq!(acq.stats().acquired, 1);
}
