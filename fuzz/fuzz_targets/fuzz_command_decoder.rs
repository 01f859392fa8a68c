//! Fuzz target: `decode` + `FanController::dispatch_payload`
//!
//! Drives arbitrary byte sequences through the command decoder and into a
//! controller backed by a pin model.  Asserts that decoding never panics,
//! that only the exact literals and in-range speeds are accepted, and that
//! the recorded actuator state stays consistent.
//!
//! cargo fuzz run fuzz_command_decoder

#![no_main]

use libfuzzer_sys::fuzz_target;
use windtrax::app::commands::Command;
use windtrax::app::controller::FanController;
use windtrax::app::decoder::decode;
use windtrax::app::events::AppEvent;
use windtrax::app::ports::{ActuatorPort, EventSink};
use windtrax::config::SystemConfig;
use windtrax::error::{ActuatorError, DriveLine};

struct Pins;

impl ActuatorPort for Pins {
    fn set_enable(&mut self, _line: DriveLine, _on: bool) -> Result<(), ActuatorError> {
        Ok(())
    }

    fn set_duty(&mut self, line: DriveLine, value: f32) -> Result<(), ActuatorError> {
        assert!((0.0..=1.0).contains(&value), "{line} duty {value} out of range");
        Ok(())
    }
}

struct Discard;

impl EventSink for Discard {
    fn emit(&mut self, _event: &AppEvent) {}
}

fuzz_target!(|data: &[u8]| {
    match decode(data) {
        Command::SetSpeed(p) => assert!(p <= 100, "decoder produced speed {p}"),
        Command::PowerOn | Command::PowerOff | Command::Invalid(_) => {}
    }

    let mut fan = FanController::new(Pins, &SystemConfig::default());
    let _ = fan.dispatch_payload(data, &mut Discard);
    let state = fan.state();
    assert!(state.duty == 0.0 || state.enabled, "duty without enable");
});
