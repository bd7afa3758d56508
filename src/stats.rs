//! Single-pass frame statistics.

use serde::Serialize;

use crate::frame::RawFrame;

/// Minimum, maximum and mean of one frame (°C).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FrameStats {
    pub min: f32,
    pub max: f32,
    pub mean: f32,
}

/// Compute [`FrameStats`] in one linear pass.
///
/// `min`/`max` start from the first sample so all-negative frames are
/// handled. NaN samples are not filtered: a NaN poisons the mean and, when
/// it is the first sample, both extremes.
pub fn compute(frame: &RawFrame) -> FrameStats {
    let samples = frame.samples();
    let Some(&first) = samples.first() else {
        // Unreachable for frames built through RawFrame constructors.
        return FrameStats {
            min: 0.0,
            max: 0.0,
            mean: 0.0,
        };
    };

    let mut min = first;
    let mut max = first;
    let mut sum = 0.0_f32;

    for &t in samples {
        if t > max {
            max = t;
        }
        if t < min {
            min = t;
        }
        sum += t;
    }

    FrameStats {
        min,
        max,
        mean: sum / samples.len() as f32,
    }
}
