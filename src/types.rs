use crate::constants::*;
use strum_macros::{AsRefStr, Display, EnumIter};

#[derive(Debug, EnumIter, Display, AsRefStr, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Axis {
    Pan,
    Tilt,
}

impl Axis {
    pub fn limits(self) -> AxisLimits {
        match self {
            Axis::Pan => AxisLimits {
                min: PAN_MIN,
                max: PAN_MAX,
                center: PAN_CENTER,
            },
            Axis::Tilt => AxisLimits {
                min: TILT_MIN,
                max: TILT_MAX,
                center: TILT_CENTER,
            },
        }
    }
}

/// Hard mechanical range of one axis, in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisLimits {
    pub min: f32,
    pub max: f32,
    pub center: f32,
}

impl AxisLimits {
    pub fn clamp(&self, angle: f32) -> f32 {
        angle.max(self.min).min(self.max)
    }

    pub fn contains(&self, angle: f32) -> bool {
        (self.min..=self.max).contains(&angle)
    }
}

/// Integer angles as written to the actuator.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Angles {
    pub pan: i32,
    pub tilt: i32,
}
