//! Inbound payload decoder.
//!
//! Two wire grammars are accepted on the same characteristic:
//!
//! ```text
//!  bytes ──▶ UTF-8? ──no──▶ Invalid
//!              │yes
//!              ▼
//!        JSON object? ──no──▶ literal "1" / "0" ──else──▶ Invalid
//!              │yes
//!              ▼
//!        "speed" (integer 0..=100)  ──▶ SetSpeed
//!        "power" (boolean-like)     ──▶ PowerOn / PowerOff
//!        neither                    ──▶ Invalid
//! ```
//!
//! The structured grammar is always tried first.  Decoding is a pure
//! function: it never panics and every failure lands in
//! [`Command::Invalid`].

use serde_json::{Map, Value};

use super::commands::{Command, MAX_SPEED_PERCENT};
use crate::error::DecodeError;

/// Decode one inbound payload into exactly one [`Command`].
pub fn decode(bytes: &[u8]) -> Command {
    let Ok(text) = core::str::from_utf8(bytes) else {
        return Command::Invalid(DecodeError::NotUtf8);
    };

    match serde_json::from_str::<Map<String, Value>>(text) {
        Ok(record) => decode_record(&record),
        Err(_) => decode_literal(text),
    }
}

fn decode_record(record: &Map<String, Value>) -> Command {
    if let Some(speed) = record.get("speed") {
        return match decode_speed(speed) {
            Ok(percent) => Command::SetSpeed(percent),
            Err(e) => Command::Invalid(e),
        };
    }

    if let Some(power) = record.get("power") {
        return match power_flag(power) {
            Some(true) => Command::PowerOn,
            Some(false) => Command::PowerOff,
            None => Command::Invalid(DecodeError::PowerNotBoolean),
        };
    }

    Command::Invalid(DecodeError::UnrecognizedRecord)
}

fn decode_speed(value: &Value) -> Result<u8, DecodeError> {
    let Value::Number(n) = value else {
        return Err(DecodeError::SpeedNotInteger);
    };

    if let Some(v) = n.as_i64() {
        return u8::try_from(v)
            .ok()
            .filter(|p| *p <= MAX_SPEED_PERCENT)
            .ok_or(DecodeError::SpeedOutOfRange(v));
    }

    // Integers beyond i64::MAX are still integers, just absurdly large.
    if n.is_u64() {
        return Err(DecodeError::SpeedOutOfRange(i64::MAX));
    }

    Err(DecodeError::SpeedNotInteger)
}

/// JSON booleans, `0`/`1`, and the usual on/off spellings.
fn power_flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_u64() {
            Some(1) => Some(true),
            Some(0) => Some(false),
            _ => None,
        },
        Value::String(s) => {
            if ["on", "true", "1"].iter().any(|t| s.eq_ignore_ascii_case(t)) {
                Some(true)
            } else if ["off", "false", "0"].iter().any(|f| s.eq_ignore_ascii_case(f)) {
                Some(false)
            } else {
                None
            }
        }
        _ => None,
    }
}

fn decode_literal(text: &str) -> Command {
    match text {
        "1" => Command::PowerOn,
        "0" => Command::PowerOff,
        _ => Command::Invalid(DecodeError::UnknownLiteral),
    }
}
