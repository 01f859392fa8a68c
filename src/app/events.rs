//! Outbound application events.
//!
//! The [`FanController`](super::controller::FanController) emits these
//! through the [`EventSink`](super::ports::EventSink) port.  Adapters on
//! the other side decide what to do with them (log to serial, notify a
//! BLE characteristic).

use crate::error::{ActuatorError, ControlError, CommsError};

/// Structured events emitted by the application core.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppEvent {
    /// The controller drove the actuator into its initial stopped state.
    Started,

    /// A forward speed was applied (`percent > 0`).
    SpeedApplied { percent: u8 },

    /// The fan was brought to the stopped state.
    Stopped,

    /// A command was refused without touching the actuator.
    CommandRejected(ControlError),

    /// A hardware write failed.  The recorded state still moved.
    ActuatorFault(ActuatorError),

    /// The shutdown sequence ran; the actuator is stopped.
    ShutdownComplete {
        reason: ShutdownReason,
        stats: DispatchStats,
    },
}

/// Why the dispatch loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    /// Explicit termination request.
    Requested,
    /// The wireless transport failed.
    TransportFailed(CommsError),
    /// The controlling thread is unwinding from a panic.
    Panicked,
}

/// Running totals kept by the controller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Commands applied to the actuator (including ones that hit a fault).
    pub accepted: u32,
    /// Commands refused without touching the actuator.
    pub rejected: u32,
    /// Hardware write failures.
    pub actuator_faults: u32,
}
