//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter       | Implements         | Connects to              |
//! |---------------|--------------------|--------------------------|
//! | `http_server` | (ResultEndpoint)   | EspHttpServer            |
//! | `log_sink`    | EventSink          | Serial log output        |
//! | `nvs`         | ConfigPort         | NVS / in-memory store    |
//! |               | StoragePort        |                          |
//! | `time`        |                    | ESP32 system timer       |
//! | `wifi`        |                    | ESP-IDF WiFi STA         |
//!
//! The thermal sensor adapter lives in [`crate::sensors`].

pub mod http_server;
pub mod log_sink;
pub mod nvs;
pub mod time;
pub mod wifi;
