//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a specific subsystem
//! against mock adapters. All tests run on the host (x86_64) with no
//! real hardware; time is driven by the manual-clock `SoftTimers`.

#![cfg(not(target_os = "espidf"))]

mod bridge_tests;
mod controller_tests;
mod mock_hw;
mod timer_tests;
