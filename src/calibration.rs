use crate::axis::AxisState;
use crate::types::Axis;
use std::collections::VecDeque;
use tracing::debug;

/// Pan sweep used to check the mount's full travel: center, min, max, center.
#[derive(Debug, Clone)]
pub struct CalibrationSweep {
    waypoints: VecDeque<f32>,
}

impl CalibrationSweep {
    pub fn new() -> Self {
        let limits = Axis::Pan.limits();
        CalibrationSweep {
            waypoints: VecDeque::from([limits.center, limits.min, limits.max, limits.center]),
        }
    }

    /// Put both axes into position mode and issue the first pan waypoint.
    pub fn begin(&mut self, pan: &mut AxisState, tilt: &mut AxisState) {
        tilt.center();
        pan.stop();
        if let Some(&first) = self.waypoints.front() {
            pan.set_target(first);
        }
    }

    /// Called after every update step. Issues the next waypoint once pan has
    /// reached the current one; returns true when the sweep is finished.
    pub fn advance(&mut self, pan: &mut AxisState) -> bool {
        if !pan.at_target() {
            return false;
        }
        self.waypoints.pop_front();
        match self.waypoints.front() {
            Some(&next) => {
                debug!(waypoint = next, remaining = self.waypoints.len(), "calibration waypoint");
                pan.set_target(next);
                false
            }
            None => true,
        }
    }

    pub fn remaining(&self) -> usize {
        self.waypoints.len()
    }
}

impl Default for CalibrationSweep {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::MAX_RATE_OF_CHANGE;

    #[test]
    fn sweep_visits_center_min_max_center() {
        let mut pan = AxisState::new(Axis::Pan);
        let mut tilt = AxisState::new(Axis::Tilt);
        tilt.set_target(170.0);

        let mut sweep = CalibrationSweep::new();
        sweep.begin(&mut pan, &mut tilt);
        assert_eq!(tilt.target(), 110.0);

        let mut visited = vec![pan.target()];
        let mut finished = false;
        for _ in 0..2000 {
            pan.update(0.01, MAX_RATE_OF_CHANGE);
            let before = pan.target();
            finished = sweep.advance(&mut pan);
            if finished {
                break;
            }
            if pan.target() != before {
                visited.push(pan.target());
            }
        }

        assert!(finished);
        assert_eq!(visited, vec![90.0, 0.0, 180.0, 90.0]);
        assert_eq!(sweep.remaining(), 0);
    }

    #[test]
    fn advance_waits_while_pan_is_moving() {
        let mut pan = AxisState::new(Axis::Pan);
        let mut tilt = AxisState::new(Axis::Tilt);
        let mut sweep = CalibrationSweep::new();
        sweep.begin(&mut pan, &mut tilt);

        // already at center: the first waypoint completes immediately
        assert!(!sweep.advance(&mut pan));
        assert_eq!(pan.target(), 0.0);

        pan.update(0.01, MAX_RATE_OF_CHANGE);
        assert!(!sweep.advance(&mut pan));
        assert_eq!(pan.target(), 0.0);
        assert_eq!(sweep.remaining(), 3);
    }
}
