use std::time::Duration;

// Axis limits, degrees
pub const PAN_MIN: f32 = 0.0;
pub const PAN_MAX: f32 = 180.0;
pub const PAN_CENTER: f32 = 90.0;
pub const TILT_MIN: f32 = 90.0;
pub const TILT_MAX: f32 = 180.0;
pub const TILT_CENTER: f32 = 110.0;

/// Position-mode approach rate in degrees per second.
pub const MAX_RATE_OF_CHANGE: f32 = 60.0;
/// Distance below which an axis counts as arrived at its target.
pub const POSITION_EPSILON: f32 = 0.5;
/// Minimum wall-clock time between two update steps.
pub const TICK_FLOOR: Duration = Duration::from_millis(10);

// Servo board (xArm / Hiwonder bus-servo controller)
pub const VENDOR_ID: u16 = 0x0483;
pub const PRODUCT_ID: u16 = 0x5750;
pub const SIGNATURE: u8 = 0x55;
pub const CMD_SERVO_MOVE: u8 = 0x03;
pub const CMD_GET_BATTERY_VOLTAGE: u8 = 0x0f;
pub const BOARD_ANGLE_MIN: f32 = -125.0;
pub const BOARD_ANGLE_MAX: f32 = 125.0;
pub const BOARD_POSITION_MAX: u16 = 1000;
pub const DEFAULT_PAN_SERVO_ID: u8 = 6;
pub const DEFAULT_TILT_SERVO_ID: u8 = 5;
