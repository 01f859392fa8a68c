//! GPIO / peripheral pin assignments for the WindTrax controller board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.  Change a pin here and it propagates everywhere.

// ---------------------------------------------------------------------------
// Fan motor driver (BTS7960 dual half-bridge)
// ---------------------------------------------------------------------------

/// Digital output: R_EN, enables the forward half-bridge (active HIGH).
pub const FWD_ENABLE_GPIO: i32 = 4;
/// Digital output: L_EN, enables the reverse half-bridge (active HIGH).
pub const REV_ENABLE_GPIO: i32 = 5;
/// LEDC PWM output: RPWM, forward drive.
pub const FWD_PWM_GPIO: i32 = 6;
/// LEDC PWM output: LPWM, reverse drive.  Always held at 0% duty.
pub const REV_PWM_GPIO: i32 = 7;

// ---------------------------------------------------------------------------
// PWM configuration
// ---------------------------------------------------------------------------

/// LEDC timer resolution (bits).  8-bit gives 0 – 255 duty levels.
pub const PWM_RESOLUTION_BITS: u32 = 8;
/// LEDC channel driving RPWM.
pub const LEDC_CH_FWD: u32 = 0;
/// LEDC channel driving LPWM.
pub const LEDC_CH_REV: u32 = 1;
