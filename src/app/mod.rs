//! Application core: pure domain logic, zero I/O.
//!
//! Command decoding, the fan actuator state machine, and the dispatch loop
//! that feeds one into the other.  All interaction with hardware happens
//! through **port traits** defined in [`ports`], keeping this layer fully
//! testable without real peripherals.

pub mod commands;
pub mod controller;
pub mod decoder;
pub mod dispatch;
pub mod events;
pub mod ports;
