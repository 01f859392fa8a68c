//! Fan actuator controller, the only owner of the motor driver.
//!
//! [`FanController`] holds the [`ActuatorState`] and the actuator handle.
//! Two operations mutate it, [`apply_speed`] and [`stop`]; everything else
//! (commands, startup, shutdown, drop) funnels through those two.
//!
//! ```text
//!            apply_speed(p > 0)
//!  STOPPED ─────────────────────▶ RUNNING(p/100) ──┐ apply_speed(p > 0)
//!     ▲  ◀─────────────────────        │   ▲ ──────┘
//!     │    apply_speed(0) / stop()     │
//!     └── stop() ──────────────────────┘
//! ```
//!
//! ## Write ordering
//!
//! Activation asserts both enable lines before any duty is driven; stop
//! zeroes both duties before the enables are released.  A non-zero duty is
//! therefore never presented to a disabled (floating) driver stage.
//!
//! ## Faults
//!
//! A failed hardware write is reported through the [`EventSink`] and the
//! returned [`ControlError`], never by panicking.  The recorded state still
//! moves to the intended value; there is no rollback.
//!
//! [`apply_speed`]: FanController::apply_speed
//! [`stop`]: FanController::stop

use log::{debug, error, info, warn};

use crate::config::SystemConfig;
use crate::error::{ActuatorError, ControlError, DriveLine};

use super::commands::{Command, MAX_SPEED_PERCENT};
use super::decoder::decode;
use super::events::{AppEvent, DispatchStats, ShutdownReason};
use super::ports::{ActuatorPort, EventSink};

// ───────────────────────────────────────────────────────────────
// State
// ───────────────────────────────────────────────────────────────

/// Recorded (intended) state of the motor driver.
///
/// `duty > 0.0` implies `enabled`, and `!enabled` implies `duty == 0.0`.
/// Reverse duty is not represented: it is held at `0.0` unconditionally.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActuatorState {
    /// Both half-bridge enable lines asserted.
    pub enabled: bool,
    /// Forward duty cycle, `0.0..=1.0`.
    pub duty: f32,
}

impl ActuatorState {
    pub const STOPPED: Self = Self {
        enabled: false,
        duty: 0.0,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanMode {
    Stopped,
    Running { percent: u8 },
}

// ───────────────────────────────────────────────────────────────
// FanController
// ───────────────────────────────────────────────────────────────

pub struct FanController<A: ActuatorPort> {
    actuator: A,
    state: ActuatorState,
    percent: u8,
    default_power_on_speed: u8,
    stats: DispatchStats,
}

impl<A: ActuatorPort> FanController<A> {
    /// Take ownership of the actuator.
    ///
    /// Does **not** touch the hardware; call [`start`](Self::start) next.
    pub fn new(actuator: A, config: &SystemConfig) -> Self {
        Self {
            actuator,
            state: ActuatorState::STOPPED,
            percent: 0,
            default_power_on_speed: config.default_power_on_speed.min(MAX_SPEED_PERCENT),
            stats: DispatchStats::default(),
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Drive the actuator into the stopped state so the recorded and the
    /// physical state agree before the first command arrives.
    pub fn start(&mut self, sink: &mut impl EventSink) -> Result<(), ControlError> {
        let result = self.stop(sink);
        sink.emit(&AppEvent::Started);
        info!(
            "FanController started (power-on default {}%)",
            self.default_power_on_speed
        );
        result
    }

    /// Run the shutdown sequence.  Always stops the actuator, whatever the
    /// reason, and reports the final statistics.
    pub fn shutdown(&mut self, reason: ShutdownReason, sink: &mut impl EventSink) {
        if let Err(e) = self.stop(sink) {
            error!("Shutdown stop sequence incomplete: {}", e);
        }
        sink.emit(&AppEvent::ShutdownComplete {
            reason,
            stats: self.stats,
        });
    }

    // ── Command handling ──────────────────────────────────────

    /// Decode one raw payload and apply it.
    pub fn dispatch_payload(
        &mut self,
        bytes: &[u8],
        sink: &mut impl EventSink,
    ) -> Result<(), ControlError> {
        let command = decode(bytes);
        debug!("Decoded {} byte payload as {:?}", bytes.len(), command);
        self.dispatch(command, sink)
    }

    /// Apply one decoded command.
    pub fn dispatch(&mut self, command: Command, sink: &mut impl EventSink) -> Result<(), ControlError> {
        let result = match command {
            Command::SetSpeed(percent) => self.apply_speed(percent, sink),
            Command::PowerOn => self.apply_speed(self.default_power_on_speed, sink),
            Command::PowerOff => self.stop(sink),
            Command::Invalid(reason) => {
                warn!("Invalid command ignored: {}", reason);
                let err = ControlError::InvalidCommand(reason);
                sink.emit(&AppEvent::CommandRejected(err));
                Err(err)
            }
        };

        match result {
            Ok(()) | Err(ControlError::Actuator(_)) => {
                self.stats.accepted = self.stats.accepted.saturating_add(1);
            }
            Err(ControlError::InvalidCommand(_) | ControlError::SpeedOutOfRange(_)) => {
                self.stats.rejected = self.stats.rejected.saturating_add(1);
            }
        }
        result
    }

    /// Run forward at `percent`.  `0` is the same as [`stop`](Self::stop).
    ///
    /// Out-of-range values are refused with the state unchanged, even
    /// though the decoder already rejects them.
    pub fn apply_speed(&mut self, percent: u8, sink: &mut impl EventSink) -> Result<(), ControlError> {
        if percent > MAX_SPEED_PERCENT {
            warn!("Speed {}% rejected (max {}%)", percent, MAX_SPEED_PERCENT);
            let err = ControlError::SpeedOutOfRange(percent);
            sink.emit(&AppEvent::CommandRejected(err));
            return Err(err);
        }
        if percent == 0 {
            return self.stop(sink);
        }

        let duty = f32::from(percent) / 100.0;
        let written = self.write_activation(duty);

        self.state = ActuatorState {
            enabled: true,
            duty,
        };
        self.percent = percent;

        match written {
            Ok(()) => {
                info!("Fan speed set to {}%", percent);
                sink.emit(&AppEvent::SpeedApplied { percent });
                Ok(())
            }
            Err(e) => {
                self.report_fault(e, sink);
                Err(e.into())
            }
        }
    }

    /// Bring the fan to rest.  Idempotent; the stop writes are re-issued
    /// on every call.
    pub fn stop(&mut self, sink: &mut impl EventSink) -> Result<(), ControlError> {
        let written = self.write_stop_sequence();

        self.state = ActuatorState::STOPPED;
        self.percent = 0;

        match written {
            Ok(()) => {
                info!("Fan stopped");
                sink.emit(&AppEvent::Stopped);
                Ok(())
            }
            Err(e) => {
                self.report_fault(e, sink);
                Err(e.into())
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self) -> ActuatorState {
        self.state
    }

    pub fn mode(&self) -> FanMode {
        if self.state.enabled {
            FanMode::Running {
                percent: self.percent,
            }
        } else {
            FanMode::Stopped
        }
    }

    pub fn stats(&self) -> DispatchStats {
        self.stats
    }

    pub fn default_power_on_speed(&self) -> u8 {
        self.default_power_on_speed
    }

    /// Borrow the actuator (inspection in tests and diagnostics).
    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    // ── Internal ──────────────────────────────────────────────

    /// Enables first, then forward duty, then reverse duty back to zero.
    /// Stops at the first failing write.
    fn write_activation(&mut self, duty: f32) -> Result<(), ActuatorError> {
        self.actuator.set_enable(DriveLine::Forward, true)?;
        self.actuator.set_enable(DriveLine::Reverse, true)?;
        self.actuator.set_duty(DriveLine::Forward, duty)?;
        self.actuator.set_duty(DriveLine::Reverse, 0.0)
    }

    /// Duties to zero, then enables released.  Every write is attempted;
    /// the first failure is returned.
    fn write_stop_sequence(&mut self) -> Result<(), ActuatorError> {
        let results = [
            self.actuator.set_duty(DriveLine::Forward, 0.0),
            self.actuator.set_duty(DriveLine::Reverse, 0.0),
            self.actuator.set_enable(DriveLine::Forward, false),
            self.actuator.set_enable(DriveLine::Reverse, false),
        ];
        results.into_iter().find_map(Result::err).map_or(Ok(()), Err)
    }

    fn report_fault(&mut self, e: ActuatorError, sink: &mut impl EventSink) {
        warn!("Actuator write fault: {}", e);
        self.stats.actuator_faults = self.stats.actuator_faults.saturating_add(1);
        sink.emit(&AppEvent::ActuatorFault(e));
    }
}

impl<A: ActuatorPort> Drop for FanController<A> {
    /// The actuator handle is released right after this runs, so the stop
    /// sequence goes out first no matter how the owner went away.
    fn drop(&mut self) {
        if let Err(e) = self.write_stop_sequence() {
            error!("Stop on release failed: {}", e);
        }
        self.state = ActuatorState::STOPPED;
    }
}
