//! Host-side client that drives a pan-tilt controller over any byte stream:
//! a serial device, a child process' stdin, or an in-process duplex.

use crate::command::Command;
use crate::types::Axis;
use thiserror::Error;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::trace;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{axis} angle must be between {min} and {max}, got {angle}")]
    OutOfRange {
        axis: Axis,
        angle: i32,
        min: i32,
        max: i32,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub struct PanTiltClient<W> {
    writer: W,
}

fn check_range(axis: Axis, angle: i32) -> Result<(), ClientError> {
    let limits = axis.limits();
    if limits.contains(angle as f32) {
        Ok(())
    } else {
        Err(ClientError::OutOfRange {
            axis,
            angle,
            min: limits.min as i32,
            max: limits.max as i32,
        })
    }
}

impl<W: AsyncWrite + Unpin> PanTiltClient<W> {
    pub fn new(writer: W) -> Self {
        PanTiltClient { writer }
    }

    pub async fn send(&mut self, command: Command) -> Result<(), ClientError> {
        let line = format!("{}\n", command);
        trace!(line = line.trim_end(), "sending");
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.flush().await?;
        Ok(())
    }

    pub async fn center(&mut self) -> Result<(), ClientError> {
        self.send(Command::Center).await
    }

    pub async fn calibrate(&mut self) -> Result<(), ClientError> {
        self.send(Command::Calibrate).await
    }

    pub async fn move_pan(&mut self, angle: i32) -> Result<(), ClientError> {
        check_range(Axis::Pan, angle)?;
        self.send(Command::MoveTo { axis: Axis::Pan, degrees: angle }).await
    }

    pub async fn move_tilt(&mut self, angle: i32) -> Result<(), ClientError> {
        check_range(Axis::Tilt, angle)?;
        self.send(Command::MoveTo { axis: Axis::Tilt, degrees: angle }).await
    }

    pub async fn move_both(&mut self, pan: i32, tilt: i32) -> Result<(), ClientError> {
        check_range(Axis::Pan, pan)?;
        check_range(Axis::Tilt, tilt)?;
        self.send(Command::MoveBoth { pan, tilt }).await
    }

    /// Positive pans right, negative left; zero stops.
    pub async fn set_pan_velocity(&mut self, degrees_per_sec: f32) -> Result<(), ClientError> {
        self.send(Command::Velocity { axis: Axis::Pan, degrees_per_sec }).await
    }

    /// Positive tilts up, negative down; zero stops.
    pub async fn set_tilt_velocity(&mut self, degrees_per_sec: f32) -> Result<(), ClientError> {
        self.send(Command::Velocity { axis: Axis::Tilt, degrees_per_sec }).await
    }

    pub async fn stop_all(&mut self) -> Result<(), ClientError> {
        self.send(Command::StopAll).await
    }

    pub async fn stop_pan(&mut self) -> Result<(), ClientError> {
        self.send(Command::Stop(Axis::Pan)).await
    }

    pub async fn stop_tilt(&mut self) -> Result<(), ClientError> {
        self.send(Command::Stop(Axis::Tilt)).await
    }
}
