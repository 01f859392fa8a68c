//! Hardware adapter. Bridges the board's motor driver to [`ActuatorPort`].
//!
//! Owns the [`MotorBridge`] built by `hw_init` and is the only module in
//! the system that touches the motor outputs.  On non-espidf targets the
//! bridge runs on sim pins.

use crate::app::ports::ActuatorPort;
use crate::config::SystemConfig;
use crate::drivers::hw_init::{self, HwInitError, MotorBridge};
use crate::error::{ActuatorError, DriveLine};

/// Concrete adapter for the fan's dual half-bridge.
pub struct HardwareAdapter {
    bridge: MotorBridge,
}

impl HardwareAdapter {
    /// Claim and configure the motor outputs, all driven to the stopped
    /// level.
    pub fn init(config: &SystemConfig) -> Result<Self, HwInitError> {
        Ok(Self {
            bridge: hw_init::init_motor_driver(config)?,
        })
    }

    pub fn bridge(&self) -> &MotorBridge {
        &self.bridge
    }
}

// ── ActuatorPort implementation ───────────────────────────────

impl ActuatorPort for HardwareAdapter {
    fn set_enable(&mut self, line: DriveLine, on: bool) -> Result<(), ActuatorError> {
        self.bridge.set_enable(line, on)
    }

    fn set_duty(&mut self, line: DriveLine, value: f32) -> Result<(), ActuatorError> {
        self.bridge.set_duty(line, value)
    }
}
