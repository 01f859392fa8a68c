//! One-shot motor driver initialisation.
//!
//! Claims the two enable GPIOs and the two LEDC channels named in
//! [`pins`], configures the LEDC timer, and drives every output to the
//! stopped level before handing back an [`HBridge`].  Called once from
//! `main()` before the dispatch loop starts.
//!
//! On host targets the same entry point returns an `HBridge` over
//! [`SimPin`] / [`SimPwm`].

use crate::config::SystemConfig;
use crate::drivers::h_bridge::HBridge;
#[cfg(target_os = "espidf")]
use crate::pins;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    PeripheralsTaken,
    GpioConfigFailed(i32),
    LedcInitFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::PeripheralsTaken     => write!(f, "peripherals already taken"),
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
            Self::LedcInitFailed(rc)   => write!(f, "LEDC timer/channel config failed (rc={})", rc),
        }
    }
}

impl From<HwInitError> for crate::error::Error {
    fn from(_: HwInitError) -> Self {
        Self::Init("motor driver init failed")
    }
}

// ── Target ────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
use esp_idf_hal::gpio::{AnyOutputPin, Output, PinDriver};
#[cfg(target_os = "espidf")]
use esp_idf_hal::ledc::{config::TimerConfig, LedcDriver, LedcTimerDriver, Resolution};
#[cfg(target_os = "espidf")]
use esp_idf_hal::peripherals::Peripherals;
#[cfg(target_os = "espidf")]
use esp_idf_hal::units::Hertz;
#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;
#[cfg(target_os = "espidf")]
use log::info;

#[cfg(target_os = "espidf")]
pub type MotorBridge = HBridge<PinDriver<'static, AnyOutputPin, Output>, LedcDriver<'static>>;

#[cfg(target_os = "espidf")]
pub fn init_motor_driver(config: &SystemConfig) -> Result<MotorBridge, HwInitError> {
    let p = Peripherals::take().map_err(|_| HwInitError::PeripheralsTaken)?;

    // SAFETY: pin numbers come from pins.rs and are claimed nowhere else.
    let (fwd_en, rev_en, fwd_pwm, rev_pwm) = unsafe {
        (
            AnyOutputPin::new(pins::FWD_ENABLE_GPIO),
            AnyOutputPin::new(pins::REV_ENABLE_GPIO),
            AnyOutputPin::new(pins::FWD_PWM_GPIO),
            AnyOutputPin::new(pins::REV_PWM_GPIO),
        )
    };

    let gpio_err = |e: EspError| HwInitError::GpioConfigFailed(e.code());
    let mut fwd_enable = PinDriver::output(fwd_en).map_err(gpio_err)?;
    let mut rev_enable = PinDriver::output(rev_en).map_err(gpio_err)?;
    fwd_enable.set_low().map_err(gpio_err)?;
    rev_enable.set_low().map_err(gpio_err)?;

    let ledc_err = |e: EspError| HwInitError::LedcInitFailed(e.code());
    let timer_cfg = TimerConfig::default()
        .frequency(Hertz(config.pwm_frequency_hz))
        .resolution(Resolution::Bits8);
    // Both channels share the timer for the life of the firmware.
    let timer = Box::leak(Box::new(
        LedcTimerDriver::new(p.ledc.timer0, &timer_cfg).map_err(ledc_err)?,
    ));

    let mut fwd = LedcDriver::new(p.ledc.channel0, &*timer, fwd_pwm).map_err(ledc_err)?;
    let mut rev = LedcDriver::new(p.ledc.channel1, &*timer, rev_pwm).map_err(ledc_err)?;
    fwd.set_duty(0).map_err(ledc_err)?;
    rev.set_duty(0).map_err(ledc_err)?;

    info!(
        "hw_init: H-bridge ready (EN={},{} PWM={},{} @ {} Hz, {}-bit)",
        pins::FWD_ENABLE_GPIO,
        pins::REV_ENABLE_GPIO,
        pins::FWD_PWM_GPIO,
        pins::REV_PWM_GPIO,
        config.pwm_frequency_hz,
        pins::PWM_RESOLUTION_BITS,
    );
    Ok(HBridge::new(fwd_enable, rev_enable, fwd, rev))
}

/// Force every motor output to its stopped level with raw register-level
/// calls.  Usable from the panic hook, where the owning driver may be
/// mid-borrow or already gone.
#[cfg(target_os = "espidf")]
pub fn force_safe_outputs() {
    // SAFETY: duty/level writes on already-configured channels and pins;
    // no allocation, no locks beyond the driver's own ISR-safe spinlock.
    unsafe {
        for ch in [pins::LEDC_CH_FWD, pins::LEDC_CH_REV] {
            ledc_set_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, ch, 0);
            ledc_update_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, ch);
        }
        gpio_set_level(pins::FWD_ENABLE_GPIO, 0);
        gpio_set_level(pins::REV_ENABLE_GPIO, 0);
    }
}

// ── Host simulation ───────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
pub type MotorBridge = HBridge<SimPin, SimPwm>;

#[cfg(not(target_os = "espidf"))]
pub fn init_motor_driver(config: &SystemConfig) -> Result<MotorBridge, HwInitError> {
    log::info!(
        "hw_init(sim): H-bridge on sim pins ({} Hz)",
        config.pwm_frequency_hz
    );
    Ok(HBridge::new(
        SimPin::new(),
        SimPin::new(),
        SimPwm::new(u16::MAX >> (16 - crate::pins::PWM_RESOLUTION_BITS)),
        SimPwm::new(u16::MAX >> (16 - crate::pins::PWM_RESOLUTION_BITS)),
    ))
}

#[cfg(not(target_os = "espidf"))]
pub fn force_safe_outputs() {}

/// In-memory GPIO output.  Starts low.
#[derive(Debug, Default)]
pub struct SimPin {
    high: bool,
}

impl SimPin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_high(&self) -> bool {
        self.high
    }
}

impl embedded_hal::digital::ErrorType for SimPin {
    type Error = core::convert::Infallible;
}

impl embedded_hal::digital::OutputPin for SimPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.high = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.high = true;
        Ok(())
    }
}

/// In-memory PWM channel.  Starts at zero duty.
#[derive(Debug)]
pub struct SimPwm {
    duty: u16,
    max: u16,
}

impl SimPwm {
    pub fn new(max: u16) -> Self {
        Self { duty: 0, max }
    }

    pub fn duty(&self) -> u16 {
        self.duty
    }
}

impl embedded_hal::pwm::ErrorType for SimPwm {
    type Error = core::convert::Infallible;
}

impl embedded_hal::pwm::SetDutyCycle for SimPwm {
    fn max_duty_cycle(&self) -> u16 {
        self.max
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
        self.duty = duty.min(self.max);
        Ok(())
    }
}
