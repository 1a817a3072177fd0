//! Output side of the controller: anything that can hold the two servo angles.

use crate::types::Angles;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ActuatorError {
    #[error("Device error: {0}")]
    Device(String),
    #[error(transparent)]
    Frame(#[from] crate::frame::FrameError),
}

/// A two-axis pan-tilt actuator.
///
/// `write` is called only when at least one axis moved during a tick.
#[async_trait]
pub trait Actuator: Send {
    async fn write(&mut self, angles: Angles) -> Result<(), ActuatorError>;
}

/// In-process actuator. Clones share the same log, so a clone kept outside
/// the scheduler can inspect what was written.
///
/// `new` records every write; `echoing` keeps only the latest one.
#[derive(Debug, Clone, Default)]
pub struct SimActuator {
    writes: Arc<Mutex<Vec<Angles>>>,
    echo: bool,
}

impl SimActuator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log every write at info level, for interactive use without hardware.
    /// Runs indefinitely, so nothing but the last write is retained.
    pub fn echoing() -> Self {
        SimActuator {
            writes: Arc::default(),
            echo: true,
        }
    }

    pub fn writes(&self) -> Vec<Angles> {
        self.writes.lock().clone()
    }

    pub fn last(&self) -> Option<Angles> {
        self.writes.lock().last().copied()
    }

    pub fn write_count(&self) -> usize {
        self.writes.lock().len()
    }
}

#[async_trait]
impl Actuator for SimActuator {
    async fn write(&mut self, angles: Angles) -> Result<(), ActuatorError> {
        let mut writes = self.writes.lock();
        if self.echo {
            info!(pan = angles.pan, tilt = angles.tilt, "servo write");
            writes.clear();
        }
        writes.push(angles);
        Ok(())
    }
}
