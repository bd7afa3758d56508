//! Mock sensor and event sink for integration tests.
//!
//! The sensor plays back a script of reads; the sink records every event
//! so tests can assert on the full history.

use std::collections::VecDeque;

use heatwatch::app::events::AppEvent;
use heatwatch::app::ports::{EventSink, FrameSource};
use heatwatch::error::AcquisitionError;

// ── Scripted sensor ───────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum Read {
    Frame(Vec<f32>),
    Short(usize),
    Fault(AcquisitionError),
}

#[derive(Default)]
pub struct ScriptedSensor {
    script: VecDeque<Read>,
    pub reads: usize,
}

#[allow(dead_code)]
impl ScriptedSensor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(mut self, read: Read) -> Self {
        self.script.push_back(read);
        self
    }

    pub fn push(&mut self, read: Read) {
        self.script.push_back(read);
    }
}

impl FrameSource for ScriptedSensor {
    fn read_frame(&mut self, out: &mut [f32]) -> Result<usize, AcquisitionError> {
        self.reads += 1;
        match self.script.pop_front() {
            Some(Read::Frame(samples)) => {
                let n = samples.len().min(out.len());
                out[..n].copy_from_slice(&samples[..n]);
                Ok(n)
            }
            Some(Read::Short(n)) => {
                let n = n.min(out.len());
                out[..n].fill(99.0);
                Ok(n)
            }
            Some(Read::Fault(e)) => Err(e),
            None => Err(AcquisitionError::SensorNotFound),
        }
    }
}

// ── Recording sink ────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failures(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, AppEvent::AcquisitionFailed(_)))
            .count()
    }

    pub fn served(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, AppEvent::RecordServed { .. }))
            .count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Frame builders ────────────────────────────────────────────

pub const ROWS: usize = 24;
pub const COLS: usize = 32;

pub fn uniform(value: f32) -> Vec<f32> {
    vec![value; ROWS * COLS]
}

/// `base` everywhere, `hot` over the inclusive block.
pub fn with_block(
    base: f32,
    hot: f32,
    rows: core::ops::RangeInclusive<usize>,
    cols: core::ops::RangeInclusive<usize>,
) -> Vec<f32> {
    let mut v = uniform(base);
    for r in rows {
        for c in cols.clone() {
            v[r * COLS + c] = hot;
        }
    }
    v
}
