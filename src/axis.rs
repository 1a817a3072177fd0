use crate::constants::POSITION_EPSILON;
use crate::types::{Axis, AxisLimits};
use tracing::trace;

/// Motion state of a single axis.
///
/// An axis is in velocity mode while `velocity` is non-zero and in position
/// mode otherwise. `current` never leaves the axis limits.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisState {
    axis: Axis,
    limits: AxisLimits,
    current: f32,
    target: f32,
    velocity: f32,
}

impl AxisState {
    pub fn new(axis: Axis) -> Self {
        let limits = axis.limits();
        AxisState {
            axis,
            limits,
            current: limits.center,
            target: limits.center,
            velocity: 0.0,
        }
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    pub fn limits(&self) -> AxisLimits {
        self.limits
    }

    pub fn current(&self) -> f32 {
        self.current
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    pub fn in_velocity_mode(&self) -> bool {
        self.velocity != 0.0
    }

    /// True when the axis is idle in position mode within epsilon of its target.
    pub fn at_target(&self) -> bool {
        !self.in_velocity_mode()
            && (self.current - self.limits.clamp(self.target)).abs() <= POSITION_EPSILON
    }

    /// Angle sent to the actuator.
    pub fn output_angle(&self) -> i32 {
        self.current.round() as i32
    }

    /// Target is stored as given; clamping happens in [`AxisState::update`].
    pub fn set_target(&mut self, degrees: f32) {
        self.target = degrees;
    }

    pub fn set_velocity(&mut self, degrees_per_sec: f32) {
        self.velocity = degrees_per_sec;
    }

    pub fn stop(&mut self) {
        self.velocity = 0.0;
    }

    pub fn center(&mut self) {
        self.velocity = 0.0;
        self.target = self.limits.center;
    }

    /// Advance the axis by `delta` seconds. Returns whether `current` moved.
    pub fn update(&mut self, delta: f32, max_rate: f32) -> bool {
        if delta <= 0.0 {
            return false;
        }
        let previous = self.current;

        if self.in_velocity_mode() {
            self.current = self.limits.clamp(self.current + self.velocity * delta);
            self.target = self.current;

            let saturated = (self.velocity > 0.0 && self.current >= self.limits.max)
                || (self.velocity < 0.0 && self.current <= self.limits.min);
            if saturated {
                trace!(axis = %self.axis, position = self.current, "velocity stopped at limit");
                self.velocity = 0.0;
            }
        } else {
            self.target = self.limits.clamp(self.target);
            let distance = self.target - self.current;
            if distance.abs() > POSITION_EPSILON {
                let max_step = max_rate * delta;
                if distance.abs() <= max_step {
                    self.current = self.target;
                } else {
                    self.current += distance.signum() * max_step;
                }
            }
        }

        let moved = self.current != previous;
        if moved {
            trace!(axis = %self.axis, position = self.current, target = self.target, "axis moved");
        }
        moved
    }
}
