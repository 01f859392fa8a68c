//! Motor driver, hardware initialisation, and the task watchdog.

pub mod h_bridge;
pub mod hw_init;
pub mod watchdog;
