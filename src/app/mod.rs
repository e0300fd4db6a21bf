//! Application core — pure domain logic, zero I/O.
//!
//! This module contains the rules of the terrarium controller: actuator
//! transitions, the sensor fallback pipeline, the long-press factory reset
//! and the status indication. All interaction with hardware, timers and
//! the protocol stack happens through **port traits** defined in
//! [`ports`], keeping this layer fully testable without real peripherals.

pub mod controller;
pub mod ports;
pub mod state;
pub mod status;
