//! Application core boundary.
//!
//! Port traits in [`ports`] keep the frame pipeline free of hardware
//! access; [`events`] is what the core reports outward.

pub mod events;
pub mod ports;
