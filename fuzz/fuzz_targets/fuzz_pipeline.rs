//! Fuzz target: `FrameBuffer::refresh` → `Pipeline::run`
//!
//! Reinterprets arbitrary bytes as little-endian `f32` samples (NaN and
//! infinities included), stores them as a frame and runs the full
//! pipeline. The pipeline must never panic and must never return a record
//! above its bound.
//!
//! cargo fuzz run fuzz_pipeline

#![no_main]

use heatwatch::app::ports::FrameSource;
use heatwatch::config::SystemConfig;
use heatwatch::error::{AcquisitionError, EncodingError};
use heatwatch::frame_buffer::FrameBuffer;
use heatwatch::pipeline::Pipeline;
use libfuzzer_sys::fuzz_target;

struct BytesSource<'a>(&'a [u8]);

impl FrameSource for BytesSource<'_> {
    fn read_frame(&mut self, out: &mut [f32]) -> Result<usize, AcquisitionError> {
        let mut n = 0;
        for (slot, chunk) in out.iter_mut().zip(self.0.chunks_exact(4)) {
            *slot = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            n += 1;
        }
        Ok(n)
    }
}

fuzz_target!(|data: &[u8]| {
    let config = SystemConfig {
        rows: 4,
        cols: 6,
        max_record_bytes: 512,
        ..Default::default()
    };
    let buffer = FrameBuffer::new(config.geometry());
    let refreshed = buffer.refresh(&mut BytesSource(data)).is_ok();
    assert_eq!(refreshed, data.len() / 4 >= config.geometry().total());

    match Pipeline::new(&config).run(&buffer) {
        Ok(out) => assert!(out.body.len() <= 512),
        Err(EncodingError::TooLarge { limit, .. }) => assert_eq!(limit, 512),
        Err(EncodingError::Serialize) => {}
    }
});
