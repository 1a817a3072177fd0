//! Frames spoken by the bus-servo controller board.
//!
//! Every frame is `0x55 0x55 <len> <cmd> <payload…>` where `len` counts the
//! length byte, the command byte and the payload.

use crate::constants::*;
use crate::types::Angles;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("Invalid response data: expected length {expected_len} but got {actual_len}. Raw data: {raw_data:02x?}")]
    InvalidResponse {
        expected_len: usize,
        actual_len: usize,
        raw_data: Vec<u8>,
    },
    #[error("Invalid signature: {0:02x} {1:02x}")]
    InvalidSignature(u8, u8),
    #[error("Payload of {0} bytes does not fit a frame")]
    TooLong(usize),
    #[error("Angle {angle} for servo {servo} is outside the board range")]
    AngleOutOfRange { servo: u8, angle: i32 },
}

pub fn encode(cmd: u8, payload: &[u8]) -> Result<Vec<u8>, FrameError> {
    let len = u8::try_from(payload.len() + 2).map_err(|_| FrameError::TooLong(payload.len()))?;
    let mut frame = Vec::with_capacity(payload.len() + 4);
    frame.extend_from_slice(&[SIGNATURE, SIGNATURE, len, cmd]);
    frame.extend_from_slice(payload);
    Ok(frame)
}

/// Extract the payload of a response frame.
pub fn decode(buf: &[u8]) -> Result<&[u8], FrameError> {
    if buf.len() < 4 {
        return Err(FrameError::InvalidResponse {
            expected_len: 4,
            actual_len: buf.len(),
            raw_data: buf.to_vec(),
        });
    }
    if buf[0] != SIGNATURE || buf[1] != SIGNATURE {
        return Err(FrameError::InvalidSignature(buf[0], buf[1]));
    }

    let length = buf[2] as usize;
    let end = 4 + length.saturating_sub(2);
    if buf.len() < end {
        return Err(FrameError::InvalidResponse {
            expected_len: end,
            actual_len: buf.len(),
            raw_data: buf.to_vec(),
        });
    }
    Ok(&buf[4..end])
}

/// Map a controller angle (0..180, 90 = mechanical zero) onto the board's
/// 0..1000 position scale. `None` if the angle falls outside the board range.
pub fn angle_to_position(degrees: f32) -> Option<u16> {
    let board_angle = degrees - 90.0;
    if !(BOARD_ANGLE_MIN..=BOARD_ANGLE_MAX).contains(&board_angle) {
        return None;
    }
    let span = BOARD_ANGLE_MAX - BOARD_ANGLE_MIN;
    Some(((board_angle - BOARD_ANGLE_MIN) * BOARD_POSITION_MAX as f32 / span).round() as u16)
}

pub fn position_to_angle(position: u16) -> f32 {
    let span = BOARD_ANGLE_MAX - BOARD_ANGLE_MIN;
    position as f32 * span / BOARD_POSITION_MAX as f32 + BOARD_ANGLE_MIN + 90.0
}

/// Payload of a `CMD_SERVO_MOVE` frame moving every listed servo over `duration_ms`.
pub fn servo_move_payload(duration_ms: u16, moves: &[(u8, u16)]) -> Vec<u8> {
    let mut data = Vec::with_capacity(3 + moves.len() * 3);
    data.push(moves.len() as u8);
    data.extend_from_slice(&duration_ms.to_le_bytes());
    for &(servo, position) in moves {
        data.push(servo);
        data.extend_from_slice(&position.to_le_bytes());
    }
    data
}

/// Pair each axis with its bus-servo id and board position, pan first.
pub fn pan_tilt_moves(pan_servo: u8, tilt_servo: u8, angles: Angles) -> Result<[(u8, u16); 2], FrameError> {
    let place = |servo: u8, angle: i32| {
        angle_to_position(angle as f32)
            .map(|position| (servo, position))
            .ok_or(FrameError::AngleOutOfRange { servo, angle })
    };
    Ok([place(pan_servo, angles.pan)?, place(tilt_servo, angles.tilt)?])
}

pub fn battery_millivolts(payload: &[u8]) -> Option<u16> {
    match payload {
        [lo, hi, ..] => Some(u16::from_le_bytes([*lo, *hi])),
        _ => None,
    }
}
