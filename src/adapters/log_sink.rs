//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART / USB-CDC in production).

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started(geometry) => {
                info!(
                    "START | {}x{} ({} px)",
                    geometry.rows(),
                    geometry.cols(),
                    geometry.total()
                );
            }
            AppEvent::FrameAcquired { generation } => {
                info!("FRAME | #{}", generation);
            }
            AppEvent::AcquisitionFailed(e) => {
                warn!("FRAME | failed: {} (keeping previous frame)", e);
            }
            AppEvent::RecordServed { bytes, stats, seed } => match seed {
                Some(s) => info!(
                    "SERVE | {}B | min={:.1} max={:.1} avg={:.1} | person at ({},{}) support={}",
                    bytes, stats.min, stats.max, stats.mean, s.row, s.col, s.support
                ),
                None => info!(
                    "SERVE | {}B | min={:.1} max={:.1} avg={:.1} | no person",
                    bytes, stats.min, stats.max, stats.mean
                ),
            },
            AppEvent::EncodingFailed(e) => {
                warn!("SERVE | encoding failed: {}", e);
            }
            AppEvent::NetworkJoined => {
                info!("NET   | joined");
            }
        }
    }
}
