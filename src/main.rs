//! Heatwatch Firmware: Main Entry Point
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  Mlx90640        LogEventSink   NvsAdapter     Esp32Time       │
//! │  (FrameSource)   (EventSink)    (Config+NVS)                   │
//! │  WifiAdapter     HttpServerAdapter                             │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │  AcquisitionLoop ──▶ FrameBuffer ──▶ Pipeline          │    │
//! │  │  (main task)         (Arc, mutex)    (HTTP task)       │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::prelude::Peripherals;
use esp_idf_svc::wifi::{BlockingWifi, EspWifi};
use log::{error, info, warn};

use heatwatch::acquisition::AcquisitionLoop;
use heatwatch::adapters::http_server::HttpServerAdapter;
use heatwatch::adapters::log_sink::LogEventSink;
use heatwatch::adapters::nvs::NvsAdapter;
use heatwatch::adapters::time::Esp32TimeAdapter;
use heatwatch::adapters::wifi::{WifiAdapter, WifiCredentials};
use heatwatch::app::events::AppEvent;
use heatwatch::app::ports::{ConfigPort, EventSink};
use heatwatch::config::SystemConfig;
use heatwatch::endpoint::ResultEndpoint;
use heatwatch::frame_buffer::FrameBuffer;
use heatwatch::pipeline::Pipeline;
use heatwatch::sensors::mlx90640::{self, Mlx90640, SensorSettings};

/// Pause between WiFi join attempts.
const JOIN_RETRY: Duration = Duration::from_millis(500);

/// Upper bound on one main-loop sleep, so WiFi drops are noticed promptly.
const MAX_IDLE_MS: u32 = 100;

fn halt(reason: &str) -> ! {
    error!("{}: halting", reason);
    loop {
        std::thread::sleep(Duration::from_secs(1));
    }
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Heatwatch v{}                       ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Load config from NVS (or defaults) ─────────────────
    let nvs = match NvsAdapter::new() {
        Ok(n) => n,
        Err(e) => {
            warn!("NVS init failed ({}), running with defaults and no persistence", e);
            NvsAdapter::default()
        }
    };
    let config = match nvs.load() {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!("NVS config load failed ({}), using defaults", e);
            SystemConfig::default()
        }
    };
    if config.geometry() != mlx90640::NATIVE_GEOMETRY {
        error!(
            "Config geometry {}x{} does not match the sensor",
            config.rows, config.cols
        );
        halt("invalid geometry");
    }

    // ── 3. Thermal sensor ─────────────────────────────────────
    let mut camera = Mlx90640::new(
        mlx90640::I2C_ADDR_DEFAULT,
        SensorSettings::from_config(&config),
    );
    if let Err(e) = camera.begin() {
        error!("MLX90640 not found: {}", e);
        halt("no sensor");
    }

    // ── 4. Shared frame buffer + pipeline ─────────────────────
    let buffer = Arc::new(FrameBuffer::new(config.geometry()));
    let endpoint = Arc::new(ResultEndpoint::new(
        Pipeline::new(&config),
        Arc::clone(&buffer),
    ));
    let mut log_sink = LogEventSink::new();

    // ── 5. WiFi station (blocks until joined) ─────────────────
    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let driver = BlockingWifi::wrap(
        EspWifi::new(peripherals.modem, sysloop.clone(), None)?,
        sysloop,
    )?;
    let mut wifi = WifiAdapter::new(driver);

    match WifiCredentials::load(&nvs) {
        Ok(creds) => wifi.set_credentials(creds),
        Err(e) => halt(&format!("WiFi credentials unavailable: {e}")),
    }
    while wifi.connect().is_err() {
        std::thread::sleep(JOIN_RETRY);
    }
    log_sink.emit(&AppEvent::NetworkJoined);

    // ── 6. HTTP server ────────────────────────────────────────
    let mut http = HttpServerAdapter::new(config.http_port);
    http.start(Arc::clone(&endpoint))
        .map_err(heatwatch::error::Error::from)?;

    // ── 7. Acquisition loop ───────────────────────────────────
    let time = Esp32TimeAdapter::new();
    let mut acquisition = AcquisitionLoop::new(config.frame_interval_ms);
    acquisition.start(&buffer, &mut log_sink);

    info!("System ready. Entering acquisition loop.");

    loop {
        let now_ms = time.uptime_ms();
        acquisition.tick(now_ms, &mut camera, &buffer, &mut log_sink);

        if wifi.poll() {
            log_sink.emit(&AppEvent::NetworkJoined);
        }

        let idle = acquisition.sleep_hint_ms(time.uptime_ms()).min(MAX_IDLE_MS);
        std::thread::sleep(Duration::from_millis(u64::from(idle.max(1))));
    }
}
