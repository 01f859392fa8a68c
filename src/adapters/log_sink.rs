//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART / USB-CDC in production).

use log::{error, info, warn};

use crate::app::events::{AppEvent, ShutdownReason};
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started => {
                info!("START | actuator stopped, awaiting commands");
            }
            AppEvent::SpeedApplied { percent } => {
                info!("SPEED | {}%", percent);
            }
            AppEvent::Stopped => {
                info!("STOP  | fan stopped");
            }
            AppEvent::CommandRejected(e) => {
                warn!("REJECT | {}", e);
            }
            AppEvent::ActuatorFault(e) => {
                error!("FAULT | {}", e);
            }
            AppEvent::ShutdownComplete { reason, stats } => {
                let why = match reason {
                    ShutdownReason::Requested => "requested",
                    ShutdownReason::TransportFailed(_) => "transport failed",
                    ShutdownReason::Panicked => "panic",
                };
                info!(
                    "SHUTDOWN | reason={} | accepted={} rejected={} faults={}",
                    why, stats.accepted, stats.rejected, stats.actuator_faults,
                );
            }
        }
    }
}
