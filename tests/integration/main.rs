//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises one flow against mock
//! adapters. All tests run on the host with no real hardware required.

mod acquisition_tests;
mod endpoint_tests;
mod mock_sensor;
mod startup_tests;
