//! Mock hardware adapter for integration tests.
//!
//! Records every actuator call so tests can assert on the full write
//! history without touching real GPIO/PWM registers.  The log is shared
//! through `Rc<RefCell<..>>` so it stays readable after the controller
//! that owned the mock has been dropped.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use windtrax::app::events::AppEvent;
use windtrax::app::ports::{ActuatorPort, CommandSource, EventSink, Inbound};
use windtrax::error::{ActuatorError, CommsError, DriveLine};
use windtrax::inbound::Payload;

// ── Actuator call record ──────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ActuatorCall {
    Enable { line: DriveLine, on: bool },
    Duty { line: DriveLine, value: f32 },
}

/// What the mock pins would physically show.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PinLevels {
    pub fwd_enable: bool,
    pub rev_enable: bool,
    pub fwd_duty: f32,
    pub rev_duty: f32,
}

impl PinLevels {
    pub fn is_stopped(&self) -> bool {
        !self.fwd_enable && !self.rev_enable && self.fwd_duty == 0.0 && self.rev_duty == 0.0
    }

    /// A non-zero duty presented to a released half-bridge.
    fn duty_without_enable(&self) -> bool {
        (self.fwd_duty > 0.0 && !self.fwd_enable) || (self.rev_duty > 0.0 && !self.rev_enable)
    }
}

#[derive(Debug, Default)]
pub struct MockLog {
    pub calls: Vec<ActuatorCall>,
    pub pins: PinLevels,
    /// Writes after which `duty_without_enable` held.
    pub order_violations: u32,
    /// Failed writes (not applied to `pins`).
    pub failed: u32,
}

// ── Fault plan ────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct FaultPlan {
    /// Fail exactly this call (0-based, counted across all writes).
    pub fail_call: Option<usize>,
    /// Fail every duty write on this line.
    pub fail_duty_on: Option<DriveLine>,
    /// Panic on this call (0-based).  Fires once.
    pub panic_on_call: Option<usize>,
}

// ── MockHardware ──────────────────────────────────────────────

pub struct MockHardware {
    log: Rc<RefCell<MockLog>>,
    plan: FaultPlan,
    call_index: usize,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new() -> (Self, Rc<RefCell<MockLog>>) {
        Self::with_faults(FaultPlan::default())
    }

    pub fn with_faults(plan: FaultPlan) -> (Self, Rc<RefCell<MockLog>>) {
        let log = Rc::new(RefCell::new(MockLog::default()));
        let hw = Self {
            log: Rc::clone(&log),
            plan,
            call_index: 0,
        };
        (hw, log)
    }

    pub fn disarm(&mut self) {
        self.plan = FaultPlan::default();
    }

    fn record(&mut self, call: ActuatorCall) -> Result<(), ActuatorError> {
        let index = self.call_index;
        self.call_index += 1;

        if self.plan.panic_on_call == Some(index) {
            self.plan.panic_on_call = None;
            panic!("mock actuator panicked on call {index}");
        }

        let fail = self.plan.fail_call == Some(index)
            || matches!(
                (call, self.plan.fail_duty_on),
                (ActuatorCall::Duty { line, .. }, Some(bad)) if line == bad
            );

        let mut log = self.log.borrow_mut();
        log.calls.push(call);
        if fail {
            log.failed += 1;
            return Err(match call {
                ActuatorCall::Enable { line, .. } => ActuatorError::GpioWriteFailed(line),
                ActuatorCall::Duty { line, .. } => ActuatorError::PwmWriteFailed(line),
            });
        }

        match call {
            ActuatorCall::Enable { line: DriveLine::Forward, on } => log.pins.fwd_enable = on,
            ActuatorCall::Enable { line: DriveLine::Reverse, on } => log.pins.rev_enable = on,
            ActuatorCall::Duty { line: DriveLine::Forward, value } => log.pins.fwd_duty = value,
            ActuatorCall::Duty { line: DriveLine::Reverse, value } => log.pins.rev_duty = value,
        }
        if log.pins.duty_without_enable() {
            log.order_violations += 1;
        }
        Ok(())
    }
}

impl ActuatorPort for MockHardware {
    fn set_enable(&mut self, line: DriveLine, on: bool) -> Result<(), ActuatorError> {
        self.record(ActuatorCall::Enable { line, on })
    }

    fn set_duty(&mut self, line: DriveLine, value: f32) -> Result<(), ActuatorError> {
        self.record(ActuatorCall::Duty { line, value })
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<&AppEvent> {
        self.events.last()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(*event);
    }
}

// ── ScriptedSource ────────────────────────────────────────────

/// Replays a fixed script, then reports `Shutdown` forever.
pub struct ScriptedSource {
    script: VecDeque<Result<Inbound, CommsError>>,
}

#[allow(dead_code)]
impl ScriptedSource {
    pub fn new() -> Self {
        Self {
            script: VecDeque::new(),
        }
    }

    pub fn payload(mut self, bytes: &[u8]) -> Self {
        let payload = Payload::from_slice(bytes).expect("test payload fits");
        self.script.push_back(Ok(Inbound::Payload(payload)));
        self
    }

    pub fn idle(mut self) -> Self {
        self.script.push_back(Ok(Inbound::Idle));
        self
    }

    pub fn shutdown(mut self) -> Self {
        self.script.push_back(Ok(Inbound::Shutdown));
        self
    }

    pub fn fail(mut self, e: CommsError) -> Self {
        self.script.push_back(Err(e));
        self
    }
}

impl CommandSource for ScriptedSource {
    fn next_inbound(&mut self) -> Result<Inbound, CommsError> {
        self.script.pop_front().unwrap_or(Ok(Inbound::Shutdown))
    }
}
