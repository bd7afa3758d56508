//! System configuration parameters
//!
//! All tunable parameters for the Heatwatch sensor.
//! Values can be overridden via NVS (non-volatile storage).

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::frame::Geometry;
use crate::sensors::mlx90640::{ReadoutMode, RefreshRate, Resolution};

/// Maximum length of the sensor identifier reported in every record.
pub const SENSOR_ID_CAP: usize = 32;

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Identity ---
    /// Identifier reported in the `"sensor"` field of every record
    pub sensor_id: heapless::String<SENSOR_ID_CAP>,

    // --- Geometry ---
    /// Sensor rows
    pub rows: u16,
    /// Sensor columns
    pub cols: u16,

    // --- Presence detection ---
    /// Degrees above the frame mean a seed pixel must exceed (Celsius)
    pub human_delta_c: f32,
    /// How far below the seed threshold a neighbour may sit and still count (Celsius)
    pub neighbor_margin_c: f32,
    /// Cells (seed included) a 3x3 window needs for a presence decision
    pub min_blob_cells: u8,

    // --- Sensor ---
    pub readout_mode: ReadoutMode,
    pub resolution: Resolution,
    pub refresh_rate: RefreshRate,

    // --- Timing ---
    /// Frame acquisition interval (milliseconds)
    pub frame_interval_ms: u32,

    // --- Transport ---
    /// HTTP listen port
    pub http_port: u16,
    /// Upper bound on a serialized record (bytes)
    pub max_record_bytes: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        let mut sensor_id = heapless::String::new();
        // Fits: the literal is well under SENSOR_ID_CAP.
        let _ = sensor_id.push_str("MLX90640");

        Self {
            sensor_id,

            // MLX90640 native array
            rows: 24,
            cols: 32,

            human_delta_c: 3.5,
            neighbor_margin_c: 2.0,
            min_blob_cells: 5,

            readout_mode: ReadoutMode::Chess,
            resolution: Resolution::Adc18Bit,
            refresh_rate: RefreshRate::Hz4,

            frame_interval_ms: 1000, // 1 Hz

            http_port: 80,
            // 768 samples at up to 7 bytes each plus the envelope
            max_record_bytes: 8192,
        }
    }
}

impl SystemConfig {
    /// Geometry described by `rows` / `cols`.
    pub fn geometry(&self) -> Geometry {
        Geometry::new(self.rows as usize, self.cols as usize)
    }

    /// Range-check every field. Called before the config is used or persisted.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sensor_id.is_empty() {
            return Err(ConfigError::ValidationFailed("sensor_id must not be empty"));
        }
        if !(1..=256).contains(&self.rows) || !(1..=256).contains(&self.cols) {
            return Err(ConfigError::ValidationFailed("rows and cols must be 1–256"));
        }
        if !(0.5..=50.0).contains(&self.human_delta_c) {
            return Err(ConfigError::ValidationFailed("human_delta_c must be 0.5–50.0"));
        }
        if !(0.0..=self.human_delta_c).contains(&self.neighbor_margin_c) {
            return Err(ConfigError::ValidationFailed(
                "neighbor_margin_c must be 0.0–human_delta_c",
            ));
        }
        if !(1..=9).contains(&self.min_blob_cells) {
            return Err(ConfigError::ValidationFailed("min_blob_cells must be 1–9"));
        }
        if !(100..=60_000).contains(&self.frame_interval_ms) {
            return Err(ConfigError::ValidationFailed("frame_interval_ms must be 100–60000"));
        }
        if self.http_port == 0 {
            return Err(ConfigError::ValidationFailed("http_port must be non-zero"));
        }
        if !(256..=65_536).contains(&self.max_record_bytes) {
            return Err(ConfigError::ValidationFailed("max_record_bytes must be 256–65536"));
        }
        Ok(())
    }
}
