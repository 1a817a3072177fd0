mod axis;
mod calibration;
mod command;
mod controller;
mod types;
#[cfg(feature = "xarm")]
mod transport;

pub mod actuator;
pub mod client;
pub mod constants;
pub mod frame;
pub mod logging;
pub mod scheduler;
#[cfg(feature = "xarm")]
pub mod xarm;

pub use axis::AxisState;
pub use calibration::CalibrationSweep;
pub use command::{Command, CommandError, HELP};
pub use controller::{MotionController, TickOutcome};
pub use types::{Angles, Axis, AxisLimits};

// Re-export commonly used items
pub use actuator::{Actuator, ActuatorError, SimActuator};
pub use client::{ClientError, PanTiltClient};
pub use scheduler::{spawn_line_reader, Iteration, Scheduler};
