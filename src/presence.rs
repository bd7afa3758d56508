//! Presence detection as an 8-connectivity density filter.
//!
//! A seed pixel must exceed the primary threshold `mean + human_delta`.
//! Its 3×3 window is then counted against the secondary threshold
//! `primary - neighbor_margin` (fixed per frame, independent of the seed's
//! own value) so a body's cooler edges still contribute:
//!
//! ```text
//!   .  .  .        o  o  .        o = neighbour above secondary threshold
//!   .  S  .   →    o  S  o        S = seed above primary threshold
//!   .  .  .        .  o  .        count = 1 + 5 = 6 ≥ min_blob_cells
//! ```
//!
//! An isolated hot pixel is treated as sensor noise. Out-of-grid neighbours
//! are absent and never counted.

use crate::config::SystemConfig;
use crate::frame::Grid2D;
use crate::stats::FrameStats;

/// Offsets of the 8 neighbours around a seed cell.
const NEIGHBOURS: [(isize, isize); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// The first cell that triggered a presence decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlobSeed {
    pub row: usize,
    pub col: usize,
    /// Seed plus qualifying neighbours (1..=9).
    pub support: u8,
}

#[derive(Debug, Clone, Copy)]
pub struct PresenceDetector {
    human_delta: f32,
    neighbor_margin: f32,
    min_blob_cells: u8,
}

impl Default for PresenceDetector {
    fn default() -> Self {
        Self::new(3.5, 2.0, 5)
    }
}

impl PresenceDetector {
    pub const fn new(human_delta: f32, neighbor_margin: f32, min_blob_cells: u8) -> Self {
        Self {
            human_delta,
            neighbor_margin,
            min_blob_cells,
        }
    }

    pub fn from_config(config: &SystemConfig) -> Self {
        Self::new(
            config.human_delta_c,
            config.neighbor_margin_c,
            config.min_blob_cells,
        )
    }

    /// Seed threshold for a frame with these stats.
    pub fn threshold(&self, stats: &FrameStats) -> f32 {
        stats.mean + self.human_delta
    }

    /// `true` iff some seed pixel has enough warm support around it.
    pub fn detect(&self, grid: &Grid2D<'_>, stats: &FrameStats) -> bool {
        self.locate(grid, stats).is_some()
    }

    /// Scan in row-major order and return the first qualifying seed.
    pub fn locate(&self, grid: &Grid2D<'_>, stats: &FrameStats) -> Option<BlobSeed> {
        let threshold = self.threshold(stats);
        let secondary = threshold - self.neighbor_margin;

        for (row, col, _) in grid.cells().filter(|&(_, _, v)| v > threshold) {
            let (r, c) = (row as isize, col as isize);
            let support = 1 + NEIGHBOURS
                .iter()
                .filter_map(|(dr, dc)| grid.get(r + dr, c + dc))
                .filter(|&n| n > secondary)
                .count() as u8;

            if support >= self.min_blob_cells {
                return Some(BlobSeed { row, col, support });
            }
        }
        None
    }
}
