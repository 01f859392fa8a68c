//! WindTrax firmware entry point
//!
//! Hexagonal architecture: one dispatch loop, one fan controller.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  BleAdapter ──▶ COMMAND_CHANNEL      HardwareAdapter           │
//! │  (GATT write)   (bounded, depth 8)   (ActuatorPort)            │
//! │                        │             LogEventSink (EventSink)  │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                        ▼                                       │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │  dispatch::serve ──▶ decode ──▶ FanController          │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  Watchdog (fed per wake) · panic hook (forces outputs low)     │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use core::time::Duration;

use anyhow::{Result, anyhow};
use log::{error, info, warn};

use windtrax::adapters::ble::BleAdapter;
use windtrax::adapters::hardware::HardwareAdapter;
use windtrax::adapters::log_sink::LogEventSink;
use windtrax::app::controller::FanController;
use windtrax::app::dispatch;
use windtrax::app::events::ShutdownReason;
use windtrax::config::SystemConfig;
use windtrax::diagnostics;
use windtrax::drivers::watchdog::Watchdog;
use windtrax::error::Error;
use windtrax::inbound::{COMMAND_CHANNEL, ChannelSource, SHUTDOWN};

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  WindTrax v{}                        ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Configuration ──────────────────────────────────────
    let config = SystemConfig::load()?;
    info!(
        "Config: power-on {}%, PWM {} Hz, idle wake {} ms, name '{}'",
        config.default_power_on_speed,
        config.pwm_frequency_hz,
        config.idle_wake_ms,
        config.device_name
    );

    // ── 3. Motor outputs (driven to stopped before anything else) ──
    let hw = HardwareAdapter::init(&config).map_err(|e| {
        error!("HAL init failed: {}", e);
        anyhow!(Error::from(e))
    })?;
    diagnostics::install_panic_handler();

    let mut sink = LogEventSink::new();
    let mut fan = FanController::new(hw, &config);
    if let Err(e) = fan.start(&mut sink) {
        warn!("Initial stop sequence incomplete: {}", e);
    }

    // ── 4. BLE transport ──────────────────────────────────────
    let mut ble = BleAdapter::new(config.device_name.clone());
    if let Err(e) = ble.start() {
        fan.shutdown(ShutdownReason::TransportFailed(e), &mut sink);
        return Err(anyhow!(Error::from(e)));
    }

    // ── 5. Dispatch loop ──────────────────────────────────────
    let watchdog = Watchdog::new(config.watchdog_timeout_ms);
    let mut source = ChannelSource::new(
        &COMMAND_CHANNEL,
        &SHUTDOWN,
        Duration::from_millis(u64::from(config.idle_wake_ms)),
    );

    info!("System ready. Entering dispatch loop.");
    let result = dispatch::serve(&mut fan, &mut source, &mut sink, || watchdog.feed());

    ble.stop();
    result.map_err(|e| anyhow!(Error::from(e)))
}
