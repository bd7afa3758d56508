//! The live frame, shared between the acquisition loop and the HTTP task.
//!
//! ```text
//! ┌──────────────────┐  refresh() ┌─────────────┐  snapshot() ┌──────────────┐
//! │ Acquisition loop │───────────▶│ FrameBuffer │────────────▶│ HTTP handler │
//! │ (single writer)  │  swap-in   │  (mutex)    │  clone-out  │  (readers)   │
//! └──────────────────┘            └─────────────┘             └──────────────┘
//! ```
//!
//! A refresh reads the sensor into a scratch frame with the lock released,
//! then swaps the completed frame in. Readers never observe a partial frame,
//! and a failed read leaves the previous frame in place.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use log::debug;

use crate::app::ports::FrameSource;
use crate::error::AcquisitionError;
use crate::frame::{Geometry, RawFrame};

struct Live {
    frame: RawFrame,
    generation: u64,
}

pub struct FrameBuffer {
    geometry: Geometry,
    live: Mutex<CriticalSectionRawMutex, RefCell<Live>>,
}

impl FrameBuffer {
    /// A buffer holding an all-zero frame until the first refresh.
    pub fn new(geometry: Geometry) -> Self {
        Self {
            geometry,
            live: Mutex::new(RefCell::new(Live {
                frame: RawFrame::zeroed(geometry),
                generation: 0,
            })),
        }
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    /// Overwrite the buffer with a fresh frame from `source`.
    ///
    /// On error the previous contents are kept.
    pub fn refresh(&self, source: &mut impl FrameSource) -> Result<(), AcquisitionError> {
        let mut scratch = RawFrame::zeroed(self.geometry);
        let expected = self.geometry.total();
        let got = source.read_frame(scratch.samples_mut())?;
        if got < expected {
            return Err(AcquisitionError::ShortFrame { expected, got });
        }

        let generation = self.live.lock(|cell| {
            let mut live = cell.borrow_mut();
            live.frame = scratch;
            live.generation += 1;
            live.generation
        });
        debug!("FrameBuffer: frame #{} stored", generation);
        Ok(())
    }

    /// Copy of the current frame.
    pub fn snapshot(&self) -> RawFrame {
        self.live.lock(|cell| cell.borrow().frame.clone())
    }

    /// Number of successful refreshes so far (0 = still the boot frame).
    pub fn generation(&self) -> u64 {
        self.live.lock(|cell| cell.borrow().generation)
    }

    /// Store an already-built frame. Frames of another geometry are rejected.
    #[cfg(test)]
    pub(crate) fn store(&self, frame: RawFrame) -> bool {
        if frame.geometry() != self.geometry {
            return false;
        }
        self.live.lock(|cell| {
            let mut live = cell.borrow_mut();
            live.frame = frame;
            live.generation += 1;
        });
        true
    }
}
