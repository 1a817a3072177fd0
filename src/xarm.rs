use crate::{
    actuator::{Actuator, ActuatorError},
    constants::*,
    frame,
    transport::{Transport, TransportError},
    types::Angles,
};
use async_trait::async_trait;
use tracing::{debug, info};

/// Board-side move duration for each write; one tick of travel.
const MOVE_DURATION_MS: u16 = 20;

impl From<TransportError> for ActuatorError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Frame(e) => ActuatorError::Frame(e),
            other => ActuatorError::Device(other.to_string()),
        }
    }
}

/// Pan-tilt mount built from two bus servos on an xArm style controller board.
pub struct XArmActuator {
    transport: Transport,
    pan_servo: u8,
    tilt_servo: u8,
}

impl XArmActuator {
    pub async fn connect(pan_servo: u8, tilt_servo: u8) -> Result<Self, ActuatorError> {
        let mut actuator = XArmActuator {
            transport: Transport::connect().await?,
            pan_servo,
            tilt_servo,
        };
        if let Ok(voltage) = actuator.battery_voltage().await {
            info!(voltage, "servo board battery");
        }
        Ok(actuator)
    }

    pub async fn battery_voltage(&mut self) -> Result<f32, ActuatorError> {
        self.transport.send(CMD_GET_BATTERY_VOLTAGE, &[]).await?;
        let data = self.transport.recv().await?;
        frame::battery_millivolts(&data)
            .map(|mv| mv as f32 / 1000.0)
            .ok_or_else(|| ActuatorError::Device("Invalid battery voltage data".into()))
    }
}

#[async_trait]
impl Actuator for XArmActuator {
    async fn write(&mut self, angles: Angles) -> Result<(), ActuatorError> {
        let moves = frame::pan_tilt_moves(self.pan_servo, self.tilt_servo, angles)?;
        debug!(?moves, "servo move");
        let payload = frame::servo_move_payload(MOVE_DURATION_MS, &moves);
        self.transport.send(CMD_SERVO_MOVE, &payload).await?;
        Ok(())
    }
}
