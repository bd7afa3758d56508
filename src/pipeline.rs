//! Snapshot → stats → presence → record, as one synchronous call.
//!
//! ```text
//!  FrameBuffer ──snapshot──▶ stats::compute ──▶ PresenceDetector ──▶ RecordSerializer
//! ```
//!
//! Every run works on its own snapshot; nothing is cached between runs.

use crate::config::{SENSOR_ID_CAP, SystemConfig};
use crate::error::EncodingError;
use crate::frame::Geometry;
use crate::frame_buffer::FrameBuffer;
use crate::presence::{BlobSeed, PresenceDetector};
use crate::record::RecordSerializer;
use crate::stats::{self, FrameStats};

/// What one pipeline run produced.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub stats: FrameStats,
    pub seed: Option<BlobSeed>,
    pub body: Vec<u8>,
}

impl PipelineOutput {
    pub fn person_detected(&self) -> bool {
        self.seed.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct Pipeline {
    sensor_id: heapless::String<SENSOR_ID_CAP>,
    geometry: Geometry,
    detector: PresenceDetector,
    serializer: RecordSerializer,
}

impl Pipeline {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            sensor_id: config.sensor_id.clone(),
            geometry: config.geometry(),
            detector: PresenceDetector::from_config(config),
            serializer: RecordSerializer::new(config.max_record_bytes as usize),
        }
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    /// Build a record from the buffer's current frame.
    pub fn run(&self, buffer: &FrameBuffer) -> Result<PipelineOutput, EncodingError> {
        let frame = buffer.snapshot();
        let stats = stats::compute(&frame);
        let seed = self.detector.locate(&frame.grid(), &stats);
        let body = self.serializer.serialize(
            &self.sensor_id,
            self.geometry,
            &frame,
            &stats,
            seed.is_some(),
        )?;
        Ok(PipelineOutput { stats, seed, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::RawFrame;

    #[test]
    fn boot_frame_produces_zero_record() {
        let config = SystemConfig::default();
        let buffer = FrameBuffer::new(config.geometry());
        let out = Pipeline::new(&config).run(&buffer).unwrap();
        assert_eq!(out.stats.max, 0.0);
        assert!(!out.person_detected());
    }

    #[test]
    fn warm_block_sets_person_detected() {
        let config = SystemConfig::default();
        let buffer = FrameBuffer::new(config.geometry());
        let mut frame = RawFrame::filled(config.geometry(), 20.0);
        for r in 5..=7 {
            for c in 5..=7 {
                frame.set(r, c, 30.0);
            }
        }
        assert!(buffer.store(frame));
        let out = Pipeline::new(&config).run(&buffer).unwrap();
        assert!(out.person_detected());
        let v: serde_json::Value = serde_json::from_slice(&out.body).unwrap();
        assert_eq!(v["person_detected"], true);
        assert_eq!(v["max"].as_f64(), Some(30.0));
    }

    #[test]
    fn tight_bound_surfaces_encoding_error() {
        let config = SystemConfig {
            max_record_bytes: 256,
            ..Default::default()
        };
        let buffer = FrameBuffer::new(config.geometry());
        assert!(matches!(
            Pipeline::new(&config).run(&buffer),
            Err(EncodingError::TooLarge { limit: 256, .. })
        ));
    }
}
