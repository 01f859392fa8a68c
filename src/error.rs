//! Unified error types for the WindTrax firmware.
//!
//! A single top-level `Error` enum that every subsystem converts into, so
//! the entry point handles failures uniformly.  All variants are `Copy` so
//! they can be passed through the controller and event sink without
//! allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// An inbound payload could not be decoded into a command.
    Decode(DecodeError),
    /// The controller refused or failed to apply a command.
    Control(ControlError),
    /// A write to the motor driver failed.
    Actuator(ActuatorError),
    /// The wireless transport failed.
    Comms(CommsError),
    /// Peripheral initialisation failed.
    Init(&'static str),
    /// Configuration is invalid or could not be loaded.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decode(e) => write!(f, "decode: {e}"),
            Self::Control(e) => write!(f, "control: {e}"),
            Self::Actuator(e) => write!(f, "actuator: {e}"),
            Self::Comms(e) => write!(f, "comms: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Decode errors
// ---------------------------------------------------------------------------

/// Why an inbound payload was decoded as [`Command::Invalid`].
///
/// These never propagate out of the decoder; they ride along inside the
/// `Invalid` variant purely for diagnostics.
///
/// [`Command::Invalid`]: crate::app::commands::Command::Invalid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// Payload bytes are not valid UTF-8.
    NotUtf8,
    /// `speed` was an integer outside `0..=100`.
    SpeedOutOfRange(i64),
    /// `speed` was present but not an integer.
    SpeedNotInteger,
    /// `power` was present but not boolean-like.
    PowerNotBoolean,
    /// A well-formed record carried neither `speed` nor `power`.
    UnrecognizedRecord,
    /// Plain text that matches no literal command.
    UnknownLiteral,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotUtf8 => write!(f, "payload is not valid UTF-8"),
            Self::SpeedOutOfRange(v) => write!(f, "speed {v} outside 0..=100"),
            Self::SpeedNotInteger => write!(f, "speed is not an integer"),
            Self::PowerNotBoolean => write!(f, "power is not boolean-like"),
            Self::UnrecognizedRecord => write!(f, "record has neither speed nor power"),
            Self::UnknownLiteral => write!(f, "unrecognised command text"),
        }
    }
}

impl From<DecodeError> for Error {
    fn from(e: DecodeError) -> Self {
        Self::Decode(e)
    }
}

// ---------------------------------------------------------------------------
// Actuator errors
// ---------------------------------------------------------------------------

/// One half of the dual-PWM motor driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveLine {
    Forward,
    Reverse,
}

impl fmt::Display for DriveLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Forward => write!(f, "forward"),
            Self::Reverse => write!(f, "reverse"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorError {
    /// Enable-line GPIO write failed.
    GpioWriteFailed(DriveLine),
    /// PWM duty-cycle write failed.
    PwmWriteFailed(DriveLine),
    /// Requested duty is not a finite value in `0.0..=1.0`.
    DutyOutOfRange(DriveLine),
}

impl fmt::Display for ActuatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GpioWriteFailed(line) => write!(f, "{line} enable write failed"),
            Self::PwmWriteFailed(line) => write!(f, "{line} PWM write failed"),
            Self::DutyOutOfRange(line) => write!(f, "{line} duty out of range"),
        }
    }
}

impl From<ActuatorError> for Error {
    fn from(e: ActuatorError) -> Self {
        Self::Actuator(e)
    }
}

// ---------------------------------------------------------------------------
// Controller errors
// ---------------------------------------------------------------------------

/// Failures reported by the actuator controller.  None of these are fatal
/// to the dispatch loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlError {
    /// The command decoded as `Invalid`; nothing was applied.
    InvalidCommand(DecodeError),
    /// `apply_speed` was called with a percentage above 100.
    SpeedOutOfRange(u8),
    /// The hardware write failed; the recorded state still moved.
    Actuator(ActuatorError),
}

impl fmt::Display for ControlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCommand(e) => write!(f, "invalid command: {e}"),
            Self::SpeedOutOfRange(p) => write!(f, "speed {p}% rejected"),
            Self::Actuator(e) => write!(f, "{e}"),
        }
    }
}

impl From<ActuatorError> for ControlError {
    fn from(e: ActuatorError) -> Self {
        Self::Actuator(e)
    }
}

impl From<ControlError> for Error {
    fn from(e: ControlError) -> Self {
        Self::Control(e)
    }
}

// ---------------------------------------------------------------------------
// Communications errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommsError {
    BleInitFailed,
    GattRegisterFailed,
    AdvertisingFailed,
    /// The inbound command stream closed unexpectedly.
    TransportClosed,
}

impl fmt::Display for CommsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BleInitFailed => write!(f, "BLE init failed"),
            Self::GattRegisterFailed => write!(f, "GATT service registration failed"),
            Self::AdvertisingFailed => write!(f, "BLE advertising failed"),
            Self::TransportClosed => write!(f, "command transport closed"),
        }
    }
}

impl From<CommsError> for Error {
    fn from(e: CommsError) -> Self {
        Self::Comms(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
