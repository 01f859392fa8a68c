//! Panic-path diagnostics.
//!
//! The panic hook is the last line of defence for the motor outputs.  It
//! runs before unwinding starts, so it cannot rely on the controller's
//! `Drop` or the dispatch guard; it forces the outputs low at the register
//! level and then hands over to the previously installed hook.

use log::error;

use crate::drivers::hw_init;

/// Best-effort text of a panic payload.
pub fn panic_reason<'a>(payload: &'a (dyn core::any::Any + Send)) -> &'a str {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "unknown panic"
    }
}

/// Install a panic hook that stops the fan before anything else runs.
///
/// Must be called once during init, after the motor outputs are
/// configured.  The previous hook (the default one on a fresh boot) still
/// runs afterwards.
pub fn install_panic_handler() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        hw_init::force_safe_outputs();

        let location = info
            .location()
            .map_or_else(|| "<unknown>".into(), |l| format!("{}:{}", l.file(), l.line()));
        error!("PANIC at {}: {} (motor outputs forced low)", location, panic_reason(info.payload()));

        previous(info);
    }));
}
