//! Acquisition → pipeline → ResultEndpoint, end to end.

use std::sync::Arc;

use super::mock_sensor::{Read, RecordingSink, ScriptedSensor, uniform, with_block};

use heatwatch::acquisition::AcquisitionLoop;
use heatwatch::config::SystemConfig;
use heatwatch::endpoint::ResultEndpoint;
use heatwatch::error::AcquisitionError;
use heatwatch::frame_buffer::FrameBuffer;
use heatwatch::pipeline::Pipeline;

struct Rig {
    acq: AcquisitionLoop,
    buffer: Arc<FrameBuffer>,
    endpoint: ResultEndpoint,
    sink: RecordingSink,
}

impl Rig {
    fn new(config: &SystemConfig) -> Self {
        let buffer = Arc::new(FrameBuffer::new(config.geometry()));
        Self {
            acq: AcquisitionLoop::new(config.frame_interval_ms),
            endpoint: ResultEndpoint::new(Pipeline::new(config), Arc::clone(&buffer)),
            buffer,
            sink: RecordingSink::new(),
        }
    }

    fn acquire(&mut self, now_ms: u32, sensor: &mut ScriptedSensor) {
        self.acq.tick(now_ms, sensor, &self.buffer, &mut self.sink);
    }

    fn get(&mut self, uri: &str) -> (u16, serde_json::Value) {
        let resp = self.endpoint.handle(uri, &mut self.sink);
        let json = serde_json::from_slice(&resp.body).unwrap_or(serde_json::Value::Null);
        (resp.status, json)
    }
}

fn data_values(v: &serde_json::Value) -> Vec<f32> {
    v["data"]
        .as_str()
        .unwrap()
        .split(',')
        .map(|s| s.parse().unwrap())
        .collect()
}

#[test]
fn uniform_scene_reports_no_person() {
    let mut rig = Rig::new(&SystemConfig::default());
    let mut sensor = ScriptedSensor::new().then(Read::Frame(uniform(20.0)));
    rig.acquire(0, &mut sensor);

    let (status, v) = rig.get("/raw");
    assert_eq!(status, 200);
    assert_eq!(v["sensor"], "MLX90640");
    assert_eq!(v["rows"], 24);
    assert_eq!(v["cols"], 32);
    assert_eq!(v["min"].as_f64(), Some(20.0));
    assert_eq!(v["max"].as_f64(), Some(20.0));
    assert_eq!(v["avg"].as_f64(), Some(20.0));
    assert_eq!(v["person_detected"], false);
    assert_eq!(data_values(&v).len(), 768);
}

#[test]
fn warm_block_reports_person() {
    let mut rig = Rig::new(&SystemConfig::default());
    let mut sensor =
        ScriptedSensor::new().then(Read::Frame(with_block(20.0, 30.0, 5..=7, 5..=7)));
    rig.acquire(0, &mut sensor);

    let (status, v) = rig.get("/raw");
    assert_eq!(status, 200);
    assert_eq!(v["max"].as_f64(), Some(30.0));
    assert_eq!(v["min"].as_f64(), Some(20.0));
    assert_eq!(v["person_detected"], true);
    assert_eq!(rig.sink.served(), 1);
}

#[test]
fn lone_hot_corner_pixel_is_noise() {
    let mut rig = Rig::new(&SystemConfig::default());
    let mut sensor =
        ScriptedSensor::new().then(Read::Frame(with_block(20.0, 30.0, 0..=0, 0..=0)));
    rig.acquire(0, &mut sensor);

    let (_, v) = rig.get("/raw");
    assert_eq!(v["max"].as_f64(), Some(30.0));
    assert_eq!(v["person_detected"], false);
}

#[test]
fn data_field_recovers_frame_in_row_major_order() {
    let mut rig = Rig::new(&SystemConfig::default());
    let samples: Vec<f32> = (0..768).map(|i| 15.0 + (i % 97) as f32 * 0.1).collect();
    let mut sensor = ScriptedSensor::new().then(Read::Frame(samples.clone()));
    rig.acquire(0, &mut sensor);

    let (_, v) = rig.get("/raw");
    for (got, want) in data_values(&v).iter().zip(&samples) {
        assert!((got - want).abs() <= 0.05 + 1e-4, "{got} vs {want}");
    }
}

#[test]
fn failed_refresh_serves_stale_frame() {
    let mut rig = Rig::new(&SystemConfig::default());
    let mut sensor = ScriptedSensor::new()
        .then(Read::Frame(with_block(20.0, 30.0, 5..=7, 5..=7)))
        .then(Read::Fault(AcquisitionError::HardwareFault(-5)));
    rig.acquire(0, &mut sensor);
    let (_, first) = rig.get("/raw");

    rig.acquire(1000, &mut sensor);
    let (status, second) = rig.get("/raw");
    assert_eq!(status, 200);
    assert_eq!(first, second);
    assert_eq!(rig.sink.failures(), 1);
}

#[test]
fn before_first_frame_serves_zeros() {
    let mut rig = Rig::new(&SystemConfig::default());
    let (status, v) = rig.get("/raw");
    assert_eq!(status, 200);
    assert!(data_values(&v).iter().all(|&t| t == 0.0));
    assert_eq!(v["person_detected"], false);
}

#[test]
fn unknown_route_is_404() {
    let mut rig = Rig::new(&SystemConfig::default());
    let resp = rig.endpoint.handle("/index.html", &mut rig.sink);
    assert_eq!(resp.status, 404);
    assert_eq!(resp.content_type, "text/plain");
    assert_eq!(resp.body, b"Not found");
    assert_eq!(rig.sink.served(), 0);
}

#[test]
fn oversized_record_is_500_not_truncated() {
    let config = SystemConfig {
        max_record_bytes: 1024,
        ..Default::default()
    };
    let mut rig = Rig::new(&config);
    let mut sensor = ScriptedSensor::new().then(Read::Frame(uniform(-12.3)));
    rig.acquire(0, &mut sensor);

    let resp = rig.endpoint.handle("/raw", &mut rig.sink);
    assert_eq!(resp.status, 500);
    assert_eq!(resp.content_type, "text/plain");
    assert!(!resp.body.starts_with(b"{"));
}
