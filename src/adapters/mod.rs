//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements   | Connects to                   |
//! |------------|--------------|-------------------------------|
//! | `ble`      | (producer)   | Bluedroid GATT server → queue |
//! | `hardware` | ActuatorPort | ESP32 LEDC PWM, GPIO          |
//! | `log_sink` | EventSink    | Serial log output             |

pub mod ble;
pub mod hardware;
pub mod log_sink;
