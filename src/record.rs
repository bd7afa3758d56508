//! Result record serializer.
//!
//! Wire format (field order fixed):
//! ```text
//! {"sensor":"MLX90640","rows":24,"cols":32,"data":"20.1,20.3,...",
//!  "min":19.8,"max":31.2,"avg":21.4,"person_detected":true}
//! ```
//!
//! `data` carries every sample in row-major order, one decimal place,
//! comma-separated. The encoded record is bounded: anything longer than the
//! configured limit is rejected whole.

use core::fmt::Write;

use serde::Serialize;

use crate::error::EncodingError;
use crate::frame::{Geometry, RawFrame};
use crate::stats::FrameStats;

#[derive(Serialize)]
struct Record<'a> {
    sensor: &'a str,
    rows: usize,
    cols: usize,
    data: &'a str,
    min: f32,
    max: f32,
    avg: f32,
    person_detected: bool,
}

/// Encodes records, refusing any larger than `limit` bytes.
#[derive(Debug, Clone, Copy)]
pub struct RecordSerializer {
    limit: usize,
}

impl RecordSerializer {
    pub const fn new(limit: usize) -> Self {
        Self { limit }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Encode one record, or fail with [`EncodingError::TooLarge`] if it
    /// would exceed the limit. Nothing partial is ever returned.
    ///
    /// Non-finite samples render as `NaN`/`inf` inside `data`. A non-finite
    /// `min`, `max` or `avg` is written as JSON `null`, since JSON has no
    /// NaN literal.
    pub fn serialize(
        &self,
        sensor_id: &str,
        geometry: Geometry,
        frame: &RawFrame,
        stats: &FrameStats,
        presence: bool,
    ) -> Result<Vec<u8>, EncodingError> {
        let data = format_samples(frame.samples());
        if data.len() > self.limit {
            return Err(EncodingError::TooLarge {
                size: data.len(),
                limit: self.limit,
            });
        }

        let record = Record {
            sensor: sensor_id,
            rows: geometry.rows(),
            cols: geometry.cols(),
            data: &data,
            min: stats.min,
            max: stats.max,
            avg: stats.mean,
            person_detected: presence,
        };
        let bytes = serde_json::to_vec(&record).map_err(|_| EncodingError::Serialize)?;
        if bytes.len() > self.limit {
            return Err(EncodingError::TooLarge {
                size: bytes.len(),
                limit: self.limit,
            });
        }
        Ok(bytes)
    }
}

/// `v0,v1,...` with one decimal place each.
pub fn format_samples(samples: &[f32]) -> String {
    let mut out = String::with_capacity(samples.len() * 5);
    for (i, t) in samples.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        // Writing into a String cannot fail.
        let _ = write!(out, "{t:.1}");
    }
    out
}
