//! Integration tests for the payload → decoder → FanController → actuator
//! pipeline, against the recording mock.

use crate::mock_hw::{ActuatorCall, FaultPlan, MockHardware, RecordingSink};

use windtrax::app::commands::Command;
use windtrax::app::controller::{ActuatorState, FanController, FanMode};
use windtrax::app::events::AppEvent;
use windtrax::config::SystemConfig;
use windtrax::error::{ActuatorError, ControlError, DecodeError, DriveLine};

fn running(duty: f32) -> ActuatorState {
    ActuatorState {
        enabled: true,
        duty,
    }
}

// ── Startup ───────────────────────────────────────────────────

#[test]
fn start_drives_outputs_to_stopped_and_announces() {
    let (hw, log) = MockHardware::new();
    let mut fan = FanController::new(hw, &SystemConfig::default());
    let mut sink = RecordingSink::new();

    fan.start(&mut sink).unwrap();

    assert_eq!(fan.state(), ActuatorState::STOPPED);
    assert_eq!(log.borrow().calls.len(), 4, "full stop sequence issued");
    assert!(log.borrow().pins.is_stopped());
    assert_eq!(sink.last(), Some(&AppEvent::Started));
}

// ── Wire grammar ──────────────────────────────────────────────

#[test]
fn structured_speed_sets_forward_duty() {
    let (hw, log) = MockHardware::new();
    let mut fan = FanController::new(hw, &SystemConfig::default());
    let mut sink = RecordingSink::new();

    fan.dispatch_payload(br#"{"speed": 75}"#, &mut sink).unwrap();

    assert_eq!(fan.state(), running(0.75));
    let pins = log.borrow().pins;
    assert!(pins.fwd_enable && pins.rev_enable);
    assert_eq!(pins.fwd_duty, 0.75);
    assert_eq!(pins.rev_duty, 0.0);
    assert_eq!(sink.last(), Some(&AppEvent::SpeedApplied { percent: 75 }));
}

#[test]
fn power_literals_toggle_at_default_speed() {
    let (hw, log) = MockHardware::new();
    let mut fan = FanController::new(hw, &SystemConfig::default());
    let mut sink = RecordingSink::new();

    fan.dispatch_payload(b"1", &mut sink).unwrap();
    assert_eq!(fan.state(), running(0.60));
    assert_eq!(fan.mode(), FanMode::Running { percent: 60 });

    fan.dispatch_payload(b"0", &mut sink).unwrap();
    assert_eq!(fan.state(), ActuatorState::STOPPED);
    assert!(log.borrow().pins.is_stopped());
}

#[test]
fn structured_power_matches_literals() {
    let (hw, _log) = MockHardware::new();
    let mut fan = FanController::new(hw, &SystemConfig::default());
    let mut sink = RecordingSink::new();

    fan.dispatch_payload(br#"{"power": true}"#, &mut sink).unwrap();
    assert_eq!(fan.state(), running(0.60));
    fan.dispatch_payload(br#"{"power": false}"#, &mut sink).unwrap();
    assert_eq!(fan.state(), ActuatorState::STOPPED);
}

#[test]
fn invalid_payloads_never_touch_the_actuator() {
    let (hw, log) = MockHardware::new();
    let mut fan = FanController::new(hw, &SystemConfig::default());
    let mut sink = RecordingSink::new();

    fan.dispatch_payload(br#"{"speed": 40}"#, &mut sink).unwrap();
    let writes_before = log.borrow().calls.len();

    for bad in [
        &br#"{"speed": 150}"#[..],
        &b"garbage"[..],
        &b"yes"[..],
        &[0xc3_u8, 0x28][..],
        &br#"{"speed": 12.5}"#[..],
        &br#"{"mode": "turbo"}"#[..],
    ] {
        let err = fan.dispatch_payload(bad, &mut sink).unwrap_err();
        assert!(matches!(err, ControlError::InvalidCommand(_)), "{err:?}");
    }

    assert_eq!(log.borrow().calls.len(), writes_before);
    assert_eq!(fan.state(), running(0.40));
    assert_eq!(fan.stats().rejected, 6);
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::CommandRejected(_))),
        6
    );
}

#[test]
fn out_of_range_speed_reports_the_value() {
    let (hw, _log) = MockHardware::new();
    let mut fan = FanController::new(hw, &SystemConfig::default());
    let mut sink = RecordingSink::new();

    assert_eq!(
        fan.dispatch_payload(br#"{"speed": 150}"#, &mut sink),
        Err(ControlError::InvalidCommand(DecodeError::SpeedOutOfRange(150)))
    );
}

// ── apply_speed / stop ────────────────────────────────────────

#[test]
fn defensive_range_check_at_apply_speed() {
    let (hw, log) = MockHardware::new();
    let mut fan = FanController::new(hw, &SystemConfig::default());
    let mut sink = RecordingSink::new();

    assert_eq!(
        fan.dispatch(Command::SetSpeed(101), &mut sink),
        Err(ControlError::SpeedOutOfRange(101))
    );
    assert!(log.borrow().calls.is_empty());
    assert_eq!(fan.state(), ActuatorState::STOPPED);
}

#[test]
fn speed_zero_is_a_full_stop() {
    let (hw, log) = MockHardware::new();
    let mut fan = FanController::new(hw, &SystemConfig::default());
    let mut sink = RecordingSink::new();

    fan.apply_speed(90, &mut sink).unwrap();
    fan.dispatch_payload(br#"{"speed": 0}"#, &mut sink).unwrap();

    assert_eq!(fan.state(), ActuatorState::STOPPED);
    assert!(log.borrow().pins.is_stopped());
    assert_eq!(sink.last(), Some(&AppEvent::Stopped));
}

#[test]
fn activation_and_stop_follow_write_order() {
    let (hw, log) = MockHardware::new();
    let mut fan = FanController::new(hw, &SystemConfig::default());
    let mut sink = RecordingSink::new();

    fan.apply_speed(30, &mut sink).unwrap();
    fan.stop(&mut sink).unwrap();

    use ActuatorCall::{Duty, Enable};
    use DriveLine::{Forward, Reverse};
    assert_eq!(
        log.borrow().calls,
        vec![
            Enable { line: Forward, on: true },
            Enable { line: Reverse, on: true },
            Duty { line: Forward, value: 0.3 },
            Duty { line: Reverse, value: 0.0 },
            Duty { line: Forward, value: 0.0 },
            Duty { line: Reverse, value: 0.0 },
            Enable { line: Forward, on: false },
            Enable { line: Reverse, on: false },
        ]
    );
    assert_eq!(log.borrow().order_violations, 0);
}

#[test]
fn stop_is_idempotent_and_reasserts() {
    let (hw, log) = MockHardware::new();
    let mut fan = FanController::new(hw, &SystemConfig::default());
    let mut sink = RecordingSink::new();

    fan.apply_speed(55, &mut sink).unwrap();
    fan.stop(&mut sink).unwrap();
    let once = fan.state();
    fan.stop(&mut sink).unwrap();

    assert_eq!(fan.state(), once);
    assert_eq!(fan.state(), ActuatorState::STOPPED);
    assert_eq!(log.borrow().calls.len(), 4 + 4 + 4);
}

#[test]
fn repeating_a_speed_is_a_no_op() {
    let (hw, log) = MockHardware::new();
    let mut fan = FanController::new(hw, &SystemConfig::default());
    let mut sink = RecordingSink::new();

    fan.dispatch(Command::SetSpeed(64), &mut sink).unwrap();
    let state = fan.state();
    let pins = log.borrow().pins;

    fan.dispatch(Command::SetSpeed(64), &mut sink).unwrap();
    assert_eq!(fan.state(), state);
    assert_eq!(log.borrow().pins, pins);
}

// ── Faults ────────────────────────────────────────────────────

#[test]
fn activation_fault_aborts_sequence_but_records_intent() {
    // Call 1 is the reverse enable: forward duty must never be written.
    let (hw, log) = MockHardware::with_faults(FaultPlan {
        fail_call: Some(1),
        ..Default::default()
    });
    let mut fan = FanController::new(hw, &SystemConfig::default());
    let mut sink = RecordingSink::new();

    let err = fan.apply_speed(80, &mut sink).unwrap_err();
    assert_eq!(
        err,
        ControlError::Actuator(ActuatorError::GpioWriteFailed(DriveLine::Reverse))
    );
    assert_eq!(log.borrow().calls.len(), 2);
    assert_eq!(log.borrow().pins.fwd_duty, 0.0);
    assert_eq!(fan.state(), running(0.80));
    assert_eq!(fan.stats().actuator_faults, 1);
    assert_eq!(
        sink.last(),
        Some(&AppEvent::ActuatorFault(ActuatorError::GpioWriteFailed(
            DriveLine::Reverse
        )))
    );
}

#[test]
fn stop_attempts_every_write_and_reports_first_fault() {
    let (hw, log) = MockHardware::with_faults(FaultPlan {
        fail_duty_on: Some(DriveLine::Forward),
        ..Default::default()
    });
    let mut fan = FanController::new(hw, &SystemConfig::default());
    let mut sink = RecordingSink::new();

    let err = fan.stop(&mut sink).unwrap_err();
    assert_eq!(
        err,
        ControlError::Actuator(ActuatorError::PwmWriteFailed(DriveLine::Forward))
    );
    assert_eq!(log.borrow().calls.len(), 4);
    let pins = log.borrow().pins;
    assert!(!pins.fwd_enable && !pins.rev_enable);
    assert_eq!(fan.state(), ActuatorState::STOPPED);
}

#[test]
fn faulted_command_still_counts_as_accepted() {
    let (hw, _log) = MockHardware::with_faults(FaultPlan {
        fail_call: Some(2),
        ..Default::default()
    });
    let mut fan = FanController::new(hw, &SystemConfig::default());
    let mut sink = RecordingSink::new();

    assert!(fan.dispatch(Command::PowerOn, &mut sink).is_err());
    fan.dispatch(Command::PowerOff, &mut sink).unwrap();

    let stats = fan.stats();
    assert_eq!(stats.accepted, 2);
    assert_eq!(stats.rejected, 0);
    assert_eq!(stats.actuator_faults, 1);
}

// ── Release ───────────────────────────────────────────────────

#[test]
fn dropping_the_controller_stops_the_fan() {
    let (hw, log) = MockHardware::new();
    {
        let mut fan = FanController::new(hw, &SystemConfig::default());
        let mut sink = RecordingSink::new();
        fan.apply_speed(100, &mut sink).unwrap();
        assert!(!log.borrow().pins.is_stopped());
    }
    assert!(log.borrow().pins.is_stopped());
    assert_eq!(log.borrow().order_violations, 0);
}

#[test]
fn configured_power_on_speed_is_used() {
    let mut config = SystemConfig::default();
    config.default_power_on_speed = 25;
    let (hw, _log) = MockHardware::new();
    let mut fan = FanController::new(hw, &config);
    let mut sink = RecordingSink::new();

    fan.dispatch_payload(b"1", &mut sink).unwrap();
    assert_eq!(fan.state(), running(0.25));
}
