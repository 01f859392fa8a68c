//! Dispatch loop: the single consumer of the inbound command stream.
//!
//! ```text
//!  CommandSource ──▶ next_inbound()
//!                      │
//!       Payload ───────┼──▶ FanController::dispatch_payload ──▶ heartbeat
//!       Idle ──────────┼──▶ heartbeat
//!       Shutdown ──────┼──▶ exit (Requested)
//!       Err(comms) ────┴──▶ exit (TransportFailed)
//!
//!  every exit, including unwinding ──▶ ShutdownGuard::drop ──▶ shutdown()
//! ```
//!
//! Commands are handled strictly one at a time, in arrival order.  A
//! rejected or faulted command never ends the loop; only the source can.

use log::{debug, info, warn};

use super::controller::FanController;
use super::events::ShutdownReason;
use super::ports::{ActuatorPort, CommandSource, EventSink, Inbound};
use crate::error::CommsError;

/// Runs the controller's shutdown sequence when dropped.
///
/// The reason defaults to [`ShutdownReason::Requested`]; a guard dropped
/// while the thread is unwinding reports [`ShutdownReason::Panicked`]
/// instead.
pub struct ShutdownGuard<'a, A: ActuatorPort, E: EventSink> {
    controller: &'a mut FanController<A>,
    sink: &'a mut E,
    reason: ShutdownReason,
}

impl<'a, A: ActuatorPort, E: EventSink> ShutdownGuard<'a, A, E> {
    pub fn new(controller: &'a mut FanController<A>, sink: &'a mut E) -> Self {
        Self {
            controller,
            sink,
            reason: ShutdownReason::Requested,
        }
    }

    /// Record why the guarded scope is ending.
    pub fn set_reason(&mut self, reason: ShutdownReason) {
        self.reason = reason;
    }

    /// Borrow the controller and the sink for the guarded scope.
    pub fn parts(&mut self) -> (&mut FanController<A>, &mut E) {
        (&mut *self.controller, &mut *self.sink)
    }
}

impl<A: ActuatorPort, E: EventSink> Drop for ShutdownGuard<'_, A, E> {
    fn drop(&mut self) {
        let reason = if std::thread::panicking() {
            ShutdownReason::Panicked
        } else {
            self.reason
        };
        info!("Dispatch loop exiting ({:?}), stopping fan", reason);
        self.controller.shutdown(reason, &mut *self.sink);
    }
}

/// Consume `source` until it requests shutdown or fails.
///
/// `heartbeat` runs after every idle wake and after every command, which is
/// where the caller feeds its watchdog.  Returns `Ok(())` on an orderly
/// shutdown and the transport error otherwise; the actuator is stopped
/// either way before this returns.
pub fn serve<A, S, E>(
    controller: &mut FanController<A>,
    source: &mut S,
    sink: &mut E,
    mut heartbeat: impl FnMut(),
) -> Result<(), CommsError>
where
    A: ActuatorPort,
    S: CommandSource,
    E: EventSink,
{
    let mut guard = ShutdownGuard::new(controller, sink);
    info!("Dispatch loop running");

    loop {
        match source.next_inbound() {
            Ok(Inbound::Payload(payload)) => {
                let (controller, sink) = guard.parts();
                if let Err(e) = controller.dispatch_payload(&payload, sink) {
                    debug!("Command not applied cleanly: {}", e);
                }
                heartbeat();
            }
            Ok(Inbound::Idle) => heartbeat(),
            Ok(Inbound::Shutdown) => {
                guard.set_reason(ShutdownReason::Requested);
                return Ok(());
            }
            Err(e) => {
                warn!("Command source failed: {}", e);
                guard.set_reason(ShutdownReason::TransportFailed(e));
                return Err(e);
            }
        }
    }
}
