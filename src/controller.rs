use crate::{
    axis::AxisState,
    calibration::CalibrationSweep,
    command::Command,
    constants::MAX_RATE_OF_CHANGE,
    types::{Angles, Axis},
};
use strum::IntoEnumIterator;
use tracing::debug;

/// Result of one update step over both axes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickOutcome {
    pub moved: bool,
    pub calibration_finished: bool,
}

/// Owns both axis states and applies commands and update steps to them.
#[derive(Debug, Clone)]
pub struct MotionController {
    pan: AxisState,
    tilt: AxisState,
    calibration: Option<CalibrationSweep>,
    max_rate: f32,
}

impl MotionController {
    pub fn new() -> Self {
        MotionController {
            pan: AxisState::new(Axis::Pan),
            tilt: AxisState::new(Axis::Tilt),
            calibration: None,
            max_rate: MAX_RATE_OF_CHANGE,
        }
    }

    pub fn axis(&self, axis: Axis) -> &AxisState {
        match axis {
            Axis::Pan => &self.pan,
            Axis::Tilt => &self.tilt,
        }
    }

    fn axis_mut(&mut self, axis: Axis) -> &mut AxisState {
        match axis {
            Axis::Pan => &mut self.pan,
            Axis::Tilt => &mut self.tilt,
        }
    }

    pub fn angles(&self) -> Angles {
        Angles {
            pan: self.pan.output_angle(),
            tilt: self.tilt.output_angle(),
        }
    }

    pub fn is_calibrating(&self) -> bool {
        self.calibration.is_some()
    }

    /// Apply a parsed command. Returns the acknowledgment line for the
    /// operator, if the command has one.
    pub fn apply(&mut self, command: Command) -> Option<String> {
        if self.calibration.take().is_some() {
            debug!(?command, "calibration cancelled");
        }

        match command {
            Command::Center => {
                self.pan.center();
                self.tilt.center();
                debug!("centering both axes");
                None
            }
            Command::StopAll => {
                self.pan.stop();
                self.tilt.stop();
                debug!("stopped all velocity motion");
                None
            }
            Command::Stop(axis) => {
                self.axis_mut(axis).stop();
                debug!(%axis, "stopped velocity motion");
                None
            }
            Command::MoveTo { axis, degrees } => {
                self.axis_mut(axis).set_target(degrees as f32);
                debug!(%axis, degrees, "new target");
                None
            }
            Command::MoveBoth { pan, tilt } => {
                self.pan.set_target(pan as f32);
                self.tilt.set_target(tilt as f32);
                debug!(pan, tilt, "new targets");
                None
            }
            Command::Velocity { axis, degrees_per_sec } => {
                self.axis_mut(axis).set_velocity(degrees_per_sec);
                debug!(%axis, degrees_per_sec, "new velocity");
                Some(format!("{} velocity: {}", axis, degrees_per_sec))
            }
            Command::Calibrate => {
                let mut sweep = CalibrationSweep::new();
                sweep.begin(&mut self.pan, &mut self.tilt);
                self.calibration = Some(sweep);
                Some("Calibrating...".to_string())
            }
        }
    }

    /// Advance both axes by `delta` seconds.
    pub fn tick(&mut self, delta: f32) -> TickOutcome {
        let max_rate = self.max_rate;
        let mut moved = false;
        for axis in Axis::iter() {
            moved |= self.axis_mut(axis).update(delta, max_rate);
        }

        let mut calibration_finished = false;
        if let Some(sweep) = self.calibration.as_mut() {
            if sweep.advance(&mut self.pan) {
                self.calibration = None;
                calibration_finished = true;
            }
        }

        TickOutcome {
            moved,
            calibration_finished,
        }
    }
}

impl Default for MotionController {
    fn default() -> Self {
        Self::new()
    }
}
