//! Normalized commands produced by the [`decoder`](super::decoder).
//!
//! Whatever wire grammar the phone app used, the
//! [`FanController`](super::controller::FanController) only ever sees one
//! of these variants.

use crate::error::DecodeError;

/// Highest speed percentage the controller accepts.
pub const MAX_SPEED_PERCENT: u8 = 100;

/// Commands that the wireless transport can deliver to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Run forward at the given percentage (always `0..=100`).
    SetSpeed(u8),

    /// Turn the fan on at the configured default speed.
    PowerOn,

    /// Stop the fan.
    PowerOff,

    /// The payload matched no grammar.  Carries the reason for diagnostics;
    /// dispatching it never touches the actuator.
    Invalid(DecodeError),
}

impl Command {
    pub fn is_valid(&self) -> bool {
        !matches!(self, Self::Invalid(_))
    }
}
