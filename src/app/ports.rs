//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   CommandSource ──▶ dispatch loop ──▶ FanController ──▶ ActuatorPort
//!                                            │
//!                                            └──▶ EventSink
//! ```
//!
//! Driven adapters (motor driver, event sinks) and the driving adapter
//! (the inbound command queue) implement these traits, so the domain core
//! never touches hardware or the BLE stack directly.

use crate::error::{ActuatorError, CommsError, DriveLine};
use crate::inbound::Payload;

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port to the dual-enable, dual-PWM motor driver.
///
/// Write-only: the core never reads pin state back.  Every write can fail
/// with a typed [`ActuatorError`].
pub trait ActuatorPort {
    /// Assert (`on = true`) or release one half-bridge enable line.
    fn set_enable(&mut self, line: DriveLine, on: bool) -> Result<(), ActuatorError>;

    /// Set one PWM input's duty cycle, `0.0..=1.0`.
    fn set_duty(&mut self, line: DriveLine, value: f32) -> Result<(), ActuatorError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Command source port (driving adapter: transport → domain)
// ───────────────────────────────────────────────────────────────

/// What the dispatch loop gets back from one wait on its source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// One payload exactly as the transport delivered it.
    Payload(Payload),
    /// Nothing arrived within the idle interval.
    Idle,
    /// Orderly termination was requested.
    Shutdown,
}

/// Blocking source of inbound payloads, consumed one at a time.
pub trait CommandSource {
    /// Wait for the next inbound event.  `Err` is fatal to the loop.
    fn next_inbound(&mut self) -> Result<Inbound, CommsError>;
}
