//! Periodic frame acquisition.
//!
//! ```text
//!  main loop ──now_ms──▶ AcquisitionLoop::tick ──due?──▶ FrameBuffer::refresh(source)
//!                                  │
//!                                  └──▶ EventSink (FrameAcquired / AcquisitionFailed)
//! ```
//!
//! A failed refresh is never fatal: the buffer keeps serving the previous
//! frame and the next interval tries again.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::{EventSink, FrameSource};
use crate::frame_buffer::FrameBuffer;

/// Fires once per elapsed `interval_ms` on a wrapping millisecond counter.
#[derive(Debug, Clone, Copy)]
pub struct IntervalTimer {
    interval_ms: u32,
    last_ms: Option<u32>,
}

impl IntervalTimer {
    pub const fn new(interval_ms: u32) -> Self {
        Self {
            interval_ms,
            last_ms: None,
        }
    }

    pub fn interval_ms(&self) -> u32 {
        self.interval_ms
    }

    /// `true` if an interval has passed since the last fire.
    ///
    /// The first poll always fires. Elapsed time is computed with wrapping
    /// subtraction, so a counter rollover does not stall or double-fire.
    pub fn poll(&mut self, now_ms: u32) -> bool {
        match self.last_ms {
            Some(last) if now_ms.wrapping_sub(last) < self.interval_ms => false,
            _ => {
                self.last_ms = Some(now_ms);
                true
            }
        }
    }

    /// Milliseconds until the next fire (0 if already due).
    pub fn remaining_ms(&self, now_ms: u32) -> u32 {
        match self.last_ms {
            Some(last) => self.interval_ms.saturating_sub(now_ms.wrapping_sub(last)),
            None => 0,
        }
    }
}

/// Counters kept across ticks, reported on failure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AcquisitionStats {
    pub acquired: u64,
    pub failed: u64,
    pub consecutive_failures: u32,
}

/// Sole writer of the [`FrameBuffer`].
pub struct AcquisitionLoop {
    timer: IntervalTimer,
    stats: AcquisitionStats,
}

impl AcquisitionLoop {
    pub fn new(interval_ms: u32) -> Self {
        Self {
            timer: IntervalTimer::new(interval_ms),
            stats: AcquisitionStats::default(),
        }
    }

    pub fn start(&mut self, buffer: &FrameBuffer, sink: &mut impl EventSink) {
        sink.emit(&AppEvent::Started(buffer.geometry()));
        info!(
            "Acquisition started: {}x{} every {} ms",
            buffer.geometry().rows(),
            buffer.geometry().cols(),
            self.timer.interval_ms()
        );
    }

    /// Refresh the buffer if the interval has elapsed.
    ///
    /// Returns `true` if a refresh was attempted.
    pub fn tick(
        &mut self,
        now_ms: u32,
        source: &mut impl FrameSource,
        buffer: &FrameBuffer,
        sink: &mut impl EventSink,
    ) -> bool {
        if !self.timer.poll(now_ms) {
            return false;
        }

        match buffer.refresh(source) {
            Ok(()) => {
                if self.stats.consecutive_failures > 0 {
                    info!(
                        "Acquisition recovered after {} failed reads",
                        self.stats.consecutive_failures
                    );
                }
                self.stats.acquired += 1;
                self.stats.consecutive_failures = 0;
                sink.emit(&AppEvent::FrameAcquired {
                    generation: buffer.generation(),
                });
            }
            Err(e) => {
                self.stats.failed += 1;
                self.stats.consecutive_failures = self.stats.consecutive_failures.saturating_add(1);
                warn!(
                    "Acquisition failed ({} in a row): {}",
                    self.stats.consecutive_failures, e
                );
                sink.emit(&AppEvent::AcquisitionFailed(e));
            }
        }
        true
    }

    /// Milliseconds the caller may sleep before the next tick is due.
    pub fn sleep_hint_ms(&self, now_ms: u32) -> u32 {
        self.timer.remaining_ms(now_ms)
    }

    pub fn stats(&self) -> AcquisitionStats {
        self.stats
    }
}
