//! Inbound command queue between the BLE host task and the dispatch loop.
//!
//! The GATT write handler runs on the Bluetooth task and must not block or
//! touch the actuator.  It copies each payload into a bounded
//! `embassy-sync` channel and returns; the dispatch loop drains the channel
//! on its own thread.
//!
//! ```text
//! ┌──────────────┐   Payload    ┌───────────────┐
//! │  BLE (GATTS) │─────────────▶│ Dispatch loop │
//! │  callback    │  depth 8     │ (ChannelSource)│
//! └──────────────┘              └───────────────┘
//!         │  ShutdownRequest           ▲
//!         └───────── Signal ───────────┘
//! ```

use core::time::Duration;

use async_io_mini::Timer;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;
use futures_lite::future::{block_on, or};
use heapless::Vec;
use log::warn;

use crate::app::ports::{CommandSource, Inbound};
use crate::error::CommsError;

/// Largest payload accepted from the transport (bytes).
pub const MAX_PAYLOAD_LEN: usize = 128;

/// Payloads buffered before the transport starts dropping writes.
pub const COMMAND_QUEUE_DEPTH: usize = 8;

/// One raw inbound write.
pub type Payload = Vec<u8, MAX_PAYLOAD_LEN>;

pub type CommandChannel = Channel<CriticalSectionRawMutex, Payload, COMMAND_QUEUE_DEPTH>;
pub type ShutdownSignal = Signal<CriticalSectionRawMutex, ShutdownRequest>;

/// Why the dispatch loop is being asked to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownRequest {
    /// Orderly stop requested by the application.
    Requested,
    /// The transport died and no more commands can arrive.
    TransportFailed(CommsError),
}

/// Transport → dispatch loop.
pub static COMMAND_CHANNEL: CommandChannel = Channel::new();

/// Raised once to end the dispatch loop.
pub static SHUTDOWN: ShutdownSignal = Signal::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboundError {
    /// Payload exceeds [`MAX_PAYLOAD_LEN`].
    PayloadTooLarge(usize),
    /// All [`COMMAND_QUEUE_DEPTH`] slots are occupied.
    QueueFull,
}

impl core::fmt::Display for InboundError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::PayloadTooLarge(n) => {
                write!(f, "payload of {n} bytes exceeds {MAX_PAYLOAD_LEN}")
            }
            Self::QueueFull => write!(f, "command queue full"),
        }
    }
}

/// Enqueue one payload without blocking.  Safe to call from any task.
pub fn submit(channel: &CommandChannel, bytes: &[u8]) -> Result<(), InboundError> {
    let payload = Payload::from_slice(bytes).map_err(|_| {
        warn!("Inbound: dropping {} byte payload (max {})", bytes.len(), MAX_PAYLOAD_LEN);
        InboundError::PayloadTooLarge(bytes.len())
    })?;
    channel.try_send(payload).map_err(|_| {
        warn!("Inbound: command queue full, dropping payload");
        InboundError::QueueFull
    })
}

/// Ask the dispatch loop to stop.  The latest request wins.
pub fn request_shutdown(signal: &ShutdownSignal, request: ShutdownRequest) {
    signal.signal(request);
}

// ── ChannelSource ─────────────────────────────────────────────

enum Wake {
    Shutdown(ShutdownRequest),
    Payload(Payload),
    Idle,
}

/// [`CommandSource`] backed by a [`CommandChannel`] and a [`ShutdownSignal`].
///
/// Blocks the calling thread until a payload arrives, shutdown is raised,
/// or `idle` elapses.  Shutdown takes precedence over queued payloads.
pub struct ChannelSource<'a> {
    commands: &'a CommandChannel,
    shutdown: &'a ShutdownSignal,
    idle: Duration,
}

impl<'a> ChannelSource<'a> {
    pub fn new(commands: &'a CommandChannel, shutdown: &'a ShutdownSignal, idle: Duration) -> Self {
        Self {
            commands,
            shutdown,
            idle,
        }
    }
}

impl CommandSource for ChannelSource<'_> {
    fn next_inbound(&mut self) -> Result<Inbound, CommsError> {
        let (commands, signal, idle) = (self.commands, self.shutdown, self.idle);

        let shutdown = async move { Wake::Shutdown(signal.wait().await) };
        let payload = async move { Wake::Payload(commands.receive().await) };
        let idle = async move {
            Timer::after(idle).await;
            Wake::Idle
        };

        match block_on(or(shutdown, or(payload, idle))) {
            Wake::Shutdown(ShutdownRequest::Requested) => Ok(Inbound::Shutdown),
            Wake::Shutdown(ShutdownRequest::TransportFailed(e)) => Err(e),
            Wake::Payload(p) => Ok(Inbound::Payload(p)),
            Wake::Idle => Ok(Inbound::Idle),
        }
    }
}
