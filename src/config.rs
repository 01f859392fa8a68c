//! System configuration parameters
//!
//! All tunable parameters for the WindTrax controller.  Defaults are
//! compiled in; a JSON override can be baked into the image at build time
//! through the `WINDTRAX_CONFIG_JSON` environment variable.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Build-time JSON override, applied on top of [`SystemConfig::default`].
const BUILD_OVERRIDE: Option<&str> = option_env!("WINDTRAX_CONFIG_JSON");

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    // --- Fan ---
    /// Speed (0-100%) applied by a bare power-on command
    pub default_power_on_speed: u8,
    /// LEDC PWM frequency for both driver PWM inputs (Hz)
    pub pwm_frequency_hz: u32,

    // --- Timing ---
    /// Dispatch loop wakes at least this often to feed the watchdog (ms)
    pub idle_wake_ms: u32,
    /// Task watchdog timeout (ms)
    pub watchdog_timeout_ms: u32,

    // --- BLE ---
    /// Advertised GAP device name
    pub device_name: heapless::String<24>,
}

impl Default for SystemConfig {
    fn default() -> Self {
        let mut device_name = heapless::String::new();
        let _ = device_name.push_str("WindTrax");
        Self {
            default_power_on_speed: 60,
            pwm_frequency_hz: 1_000,
            idle_wake_ms: 1_000,
            watchdog_timeout_ms: 10_000,
            device_name,
        }
    }
}

impl SystemConfig {
    /// Defaults plus the build-time override, validated.
    pub fn load() -> Result<Self, ConfigError> {
        let config = match BUILD_OVERRIDE {
            Some(json) => Self::from_json(json)?,
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse a (possibly partial) JSON document; missing fields keep their
    /// defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|_| ConfigError::Malformed)
    }

    /// Reject out-of-range values.  Nothing is clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_power_on_speed == 0 || self.default_power_on_speed > 100 {
            return Err(ConfigError::ValidationFailed(
                "default_power_on_speed must be 1..=100",
            ));
        }
        if !(100..=40_000).contains(&self.pwm_frequency_hz) {
            return Err(ConfigError::ValidationFailed(
                "pwm_frequency_hz must be 100..=40000",
            ));
        }
        if self.idle_wake_ms == 0 {
            return Err(ConfigError::ValidationFailed("idle_wake_ms must be non-zero"));
        }
        if self.watchdog_timeout_ms <= self.idle_wake_ms {
            return Err(ConfigError::ValidationFailed(
                "watchdog_timeout_ms must exceed idle_wake_ms",
            ));
        }
        if self.device_name.is_empty()
            || !self.device_name.bytes().all(|b| (0x20..=0x7E).contains(&b))
        {
            return Err(ConfigError::ValidationFailed(
                "device_name must be 1-24 printable ASCII bytes",
            ));
        }
        Ok(())
    }
}

/// Errors from loading or validating [`SystemConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// The override document is not valid JSON for this struct.
    Malformed,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed => write!(f, "config override is malformed"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for crate::error::Error {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::Malformed => Self::Config("override is malformed"),
            ConfigError::ValidationFailed(msg) => Self::Config(msg),
        }
    }
}
