//! Outbound application events.
//!
//! The acquisition loop and the result endpoint emit these through the
//! [`EventSink`](super::ports::EventSink) port. Adapters on the other
//! side decide what to do with them.

use crate::error::{AcquisitionError, EncodingError};
use crate::frame::Geometry;
use crate::presence::BlobSeed;
use crate::stats::FrameStats;

/// Structured events emitted by the application core.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// Acquisition started with this frame geometry.
    Started(Geometry),

    /// A complete frame replaced the buffer contents.
    FrameAcquired { generation: u64 },

    /// A refresh failed; the buffer still holds the previous frame.
    AcquisitionFailed(AcquisitionError),

    /// A result record was produced and sent.
    RecordServed {
        bytes: usize,
        stats: FrameStats,
        seed: Option<BlobSeed>,
    },

    /// A result record could not be produced.
    EncodingFailed(EncodingError),

    /// The station interface joined the access point.
    NetworkJoined,
}
