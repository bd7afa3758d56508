//! Sensor drivers.
//!
//! Each driver implements [`FrameSource`](crate::app::ports::FrameSource)
//! and is dual-target: real hardware on ESP-IDF, an injectable simulation
//! everywhere else.

pub mod mlx90640;
