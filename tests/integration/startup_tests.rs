//! Startup wiring on the host: NVS config, WiFi credentials, simulated
//! sensor, HTTP adapter.

use std::sync::Arc;

use super::mock_sensor::RecordingSink;

use heatwatch::acquisition::AcquisitionLoop;
use heatwatch::adapters::http_server::HttpServerAdapter;
use heatwatch::adapters::nvs::NvsAdapter;
use heatwatch::adapters::wifi::{WifiAdapter, WifiCredentials};
use heatwatch::app::ports::ConfigPort;
use heatwatch::endpoint::ResultEndpoint;
use heatwatch::frame_buffer::FrameBuffer;
use heatwatch::pipeline::Pipeline;
use heatwatch::sensors::mlx90640::{self, Mlx90640, SensorSettings};

#[test]
fn boots_from_stored_config_and_serves_sim_frames() {
    let mut nvs = NvsAdapter::new().unwrap();
    let mut stored = nvs.load().unwrap();
    stored.frame_interval_ms = 500;
    nvs.save(&stored).unwrap();
    WifiCredentials::new("Lab", "labpassword")
        .unwrap()
        .store(&mut nvs)
        .unwrap();

    let config = nvs.load().unwrap();
    assert_eq!(config.geometry(), mlx90640::NATIVE_GEOMETRY);

    let mut camera = Mlx90640::new(
        mlx90640::I2C_ADDR_DEFAULT,
        SensorSettings::from_config(&config),
    );
    camera.begin().unwrap();

    let mut wifi = WifiAdapter::new();
    wifi.set_credentials(WifiCredentials::load(&nvs).unwrap());
    wifi.connect().unwrap();

    let buffer = Arc::new(FrameBuffer::new(config.geometry()));
    let endpoint = Arc::new(ResultEndpoint::new(
        Pipeline::new(&config),
        Arc::clone(&buffer),
    ));
    let mut http = HttpServerAdapter::new(config.http_port);
    http.start(endpoint).unwrap();

    let mut sink = RecordingSink::new();
    let mut acq = AcquisitionLoop::new(config.frame_interval_ms);
    acq.start(&buffer, &mut sink);
    for now in [0, 250, 500] {
        acq.tick(now, &mut camera, &buffer, &mut sink);
    }
    assert_eq!(buffer.generation(), 2);

    let resp = http.dispatch("/raw");
    assert_eq!(resp.status, 200);
    let v: serde_json::Value = serde_json::from_slice(&resp.body).unwrap();
    assert_eq!(v["min"].as_f64(), Some(22.0));
    assert_eq!(v["person_detected"], false);
}

#[test]
fn http_task_reads_while_main_task_writes() {
    let config = heatwatch::config::SystemConfig::default();
    let buffer = Arc::new(FrameBuffer::new(config.geometry()));
    let endpoint = Arc::new(ResultEndpoint::new(
        Pipeline::new(&config),
        Arc::clone(&buffer),
    ));

    let reader = {
        let endpoint = Arc::clone(&endpoint);
        std::thread::spawn(move || {
            let mut sink = RecordingSink::new();
            for _ in 0..50 {
                let resp = endpoint.handle("/raw", &mut sink);
                assert_eq!(resp.status, 200);
                let v: serde_json::Value = serde_json::from_slice(&resp.body).unwrap();
                // Every frame is uniform, so a torn read would show min != max.
                assert_eq!(v["min"], v["max"]);
            }
        })
    };

    let mut camera = Mlx90640::new(
        mlx90640::I2C_ADDR_DEFAULT,
        SensorSettings::from_config(&config),
    );
    camera.begin().unwrap();
    let mut sink = RecordingSink::new();
    let mut acq = AcquisitionLoop::new(config.frame_interval_ms);
    for i in 0..50u32 {
        camera.sim_push_frame(vec![20.0 + i as f32; 768]);
        acq.tick(i * 1000, &mut camera, &buffer, &mut sink);
    }

    reader.join().unwrap();
    assert_eq!(buffer.generation(), 50);
}
