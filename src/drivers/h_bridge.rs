//! Dual half-bridge motor driver (BTS7960 class).
//!
//! Four inputs: two enable lines (R_EN / L_EN) and two PWM lines
//! (RPWM / LPWM).  The driver is generic over the `embedded-hal` 1.0
//! output and PWM traits, so the same code runs against the ESP-IDF
//! `PinDriver` / `LedcDriver` on target and against sim pins on host.
//!
//! This is a dumb actuator: it performs exactly the write it is asked
//! for.  Sequencing lives in the controller.

use embedded_hal::digital::OutputPin;
use embedded_hal::pwm::SetDutyCycle;

use crate::app::ports::ActuatorPort;
use crate::error::{ActuatorError, DriveLine};

pub struct HBridge<EN, PWM> {
    fwd_enable: EN,
    rev_enable: EN,
    fwd_pwm: PWM,
    rev_pwm: PWM,
}

impl<EN: OutputPin, PWM: SetDutyCycle> HBridge<EN, PWM> {
    pub fn new(fwd_enable: EN, rev_enable: EN, fwd_pwm: PWM, rev_pwm: PWM) -> Self {
        Self {
            fwd_enable,
            rev_enable,
            fwd_pwm,
            rev_pwm,
        }
    }

    pub fn enable_pin(&self, line: DriveLine) -> &EN {
        match line {
            DriveLine::Forward => &self.fwd_enable,
            DriveLine::Reverse => &self.rev_enable,
        }
    }

    pub fn pwm(&self, line: DriveLine) -> &PWM {
        match line {
            DriveLine::Forward => &self.fwd_pwm,
            DriveLine::Reverse => &self.rev_pwm,
        }
    }
}

impl<EN: OutputPin, PWM: SetDutyCycle> ActuatorPort for HBridge<EN, PWM> {
    fn set_enable(&mut self, line: DriveLine, on: bool) -> Result<(), ActuatorError> {
        let pin = match line {
            DriveLine::Forward => &mut self.fwd_enable,
            DriveLine::Reverse => &mut self.rev_enable,
        };
        let result = if on { pin.set_high() } else { pin.set_low() };
        result.map_err(|_| ActuatorError::GpioWriteFailed(line))
    }

    fn set_duty(&mut self, line: DriveLine, value: f32) -> Result<(), ActuatorError> {
        let pwm = match line {
            DriveLine::Forward => &mut self.fwd_pwm,
            DriveLine::Reverse => &mut self.rev_pwm,
        };
        let counts = duty_counts(value, pwm.max_duty_cycle())
            .ok_or(ActuatorError::DutyOutOfRange(line))?;
        pwm.set_duty_cycle(counts)
            .map_err(|_| ActuatorError::PwmWriteFailed(line))
    }
}

/// Convert a `0.0..=1.0` duty fraction to timer counts, rounding to the
/// nearest step.  `None` for NaN or anything outside the range.
pub fn duty_counts(value: f32, max: u16) -> Option<u16> {
    if !(0.0..=1.0).contains(&value) {
        return None;
    }
    let counts = (value * f32::from(max)).round() as u16;
    Some(counts.min(max))
}
