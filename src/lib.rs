//! Heatwatch firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.
//!
//! ```text
//!  Mlx90640 ──▶ AcquisitionLoop ──▶ FrameBuffer ──▶ Pipeline ──▶ ResultEndpoint ──▶ HTTP
//!                                                  stats · presence · record
//! ```

#![deny(unused_must_use)]

pub mod acquisition;
pub mod app;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod frame;
pub mod frame_buffer;
pub mod pipeline;
pub mod presence;
pub mod record;
pub mod stats;

// Dual-target: hardware-backed on ESP-IDF, simulated elsewhere.
pub mod adapters;
pub mod sensors;

mod esp_link_shims;
