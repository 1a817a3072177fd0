//! Line-oriented command grammar.
//!
//! | Line            | Command                         |
//! |-----------------|---------------------------------|
//! | `c`             | center both axes                |
//! | `stop`          | zero both velocities            |
//! | `sp` / `st`     | zero pan / tilt velocity        |
//! | `p:<int>`       | pan target                      |
//! | `t:<int>`       | tilt target                     |
//! | `b:<int>,<int>` | pan and tilt targets together   |
//! | `vp:<float>`    | pan velocity (deg/s)            |
//! | `vt:<float>`    | tilt velocity (deg/s)           |
//! | `cal`           | calibration sweep               |
//!
//! Keywords are case-insensitive and surrounding whitespace is ignored.

use crate::types::Axis;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Lines listed in the startup banner.
pub const HELP: &[&str] = &[
    "c             - center both axes",
    "stop          - stop all velocity motion",
    "sp / st       - stop pan / tilt velocity",
    "p:<deg>       - move pan to angle",
    "t:<deg>       - move tilt to angle",
    "b:<pan>,<tilt> - move both axes",
    "vp:<deg/s>    - pan velocity",
    "vt:<deg/s>    - tilt velocity",
    "cal           - calibration sweep",
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Center,
    StopAll,
    Stop(Axis),
    MoveTo { axis: Axis, degrees: i32 },
    MoveBoth { pan: i32, tilt: i32 },
    Velocity { axis: Axis, degrees_per_sec: f32 },
    Calibrate,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("Empty command")]
    Empty,
    #[error("Unknown command: {0}")]
    Unknown(String),
    #[error("Invalid format, expected b:<pan>,<tilt>: {0}")]
    MissingComma(String),
    #[error("Invalid angle '{0}'")]
    InvalidAngle(String),
    #[error("Invalid velocity '{0}'")]
    InvalidVelocity(String),
}

fn parse_angle(value: &str) -> Result<i32, CommandError> {
    let value = value.trim();
    value
        .parse::<i32>()
        .map_err(|_| CommandError::InvalidAngle(value.to_string()))
}

fn parse_velocity(value: &str) -> Result<f32, CommandError> {
    let value = value.trim();
    match value.parse::<f32>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(CommandError::InvalidVelocity(value.to_string())),
    }
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim().to_ascii_lowercase();
        if line.is_empty() {
            return Err(CommandError::Empty);
        }

        match line.as_str() {
            "c" => return Ok(Command::Center),
            "stop" => return Ok(Command::StopAll),
            "sp" => return Ok(Command::Stop(Axis::Pan)),
            "st" => return Ok(Command::Stop(Axis::Tilt)),
            "cal" => return Ok(Command::Calibrate),
            _ => {}
        }

        let Some((keyword, value)) = line.split_once(':') else {
            return Err(CommandError::Unknown(line.clone()));
        };

        match keyword.trim() {
            "p" => Ok(Command::MoveTo {
                axis: Axis::Pan,
                degrees: parse_angle(value)?,
            }),
            "t" => Ok(Command::MoveTo {
                axis: Axis::Tilt,
                degrees: parse_angle(value)?,
            }),
            "b" => {
                let (pan, tilt) = value
                    .split_once(',')
                    .ok_or_else(|| CommandError::MissingComma(line.clone()))?;
                Ok(Command::MoveBoth {
                    pan: parse_angle(pan)?,
                    tilt: parse_angle(tilt)?,
                })
            }
            "vp" => Ok(Command::Velocity {
                axis: Axis::Pan,
                degrees_per_sec: parse_velocity(value)?,
            }),
            "vt" => Ok(Command::Velocity {
                axis: Axis::Tilt,
                degrees_per_sec: parse_velocity(value)?,
            }),
            _ => Err(CommandError::Unknown(line.clone())),
        }
    }
}

/// Wire form of the command, accepted back by [`Command::from_str`].
impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Center => write!(f, "c"),
            Command::StopAll => write!(f, "stop"),
            Command::Stop(Axis::Pan) => write!(f, "sp"),
            Command::Stop(Axis::Tilt) => write!(f, "st"),
            Command::MoveTo { axis: Axis::Pan, degrees } => write!(f, "p:{}", degrees),
            Command::MoveTo { axis: Axis::Tilt, degrees } => write!(f, "t:{}", degrees),
            Command::MoveBoth { pan, tilt } => write!(f, "b:{},{}", pan, tilt),
            Command::Velocity { axis: Axis::Pan, degrees_per_sec } => write!(f, "vp:{}", degrees_per_sec),
            Command::Velocity { axis: Axis::Tilt, degrees_per_sec } => write!(f, "vt:{}", degrees_per_sec),
            Command::Calibrate => write!(f, "cal"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Result<Command, CommandError> {
        line.parse()
    }

    #[test]
    fn parses_bare_keywords_case_insensitively() {
        assert_eq!(parse("c"), Ok(Command::Center));
        assert_eq!(parse("  STOP \r"), Ok(Command::StopAll));
        assert_eq!(parse("Sp"), Ok(Command::Stop(Axis::Pan)));
        assert_eq!(parse("sT"), Ok(Command::Stop(Axis::Tilt)));
        assert_eq!(parse("CAL"), Ok(Command::Calibrate));
    }

    #[test]
    fn parses_position_commands_without_clamping() {
        assert_eq!(
            parse("p:45"),
            Ok(Command::MoveTo { axis: Axis::Pan, degrees: 45 })
        );
        assert_eq!(
            parse("T:250"),
            Ok(Command::MoveTo { axis: Axis::Tilt, degrees: 250 })
        );
        assert_eq!(
            parse("p: -20 "),
            Ok(Command::MoveTo { axis: Axis::Pan, degrees: -20 })
        );
    }

    #[test]
    fn parses_paired_position() {
        assert_eq!(
            parse("b:90,110"),
            Ok(Command::MoveBoth { pan: 90, tilt: 110 })
        );
        assert_eq!(
            parse("B: 10 , 170"),
            Ok(Command::MoveBoth { pan: 10, tilt: 170 })
        );
    }

    #[test]
    fn paired_position_without_comma_is_rejected() {
        assert_eq!(
            parse("b:90"),
            Err(CommandError::MissingComma("b:90".to_string()))
        );
        assert!(matches!(parse("b:90,"), Err(CommandError::InvalidAngle(_))));
    }

    #[test]
    fn parses_signed_fractional_velocities() {
        assert_eq!(
            parse("vp:30"),
            Ok(Command::Velocity { axis: Axis::Pan, degrees_per_sec: 30.0 })
        );
        assert_eq!(
            parse("VT:-12.5"),
            Ok(Command::Velocity { axis: Axis::Tilt, degrees_per_sec: -12.5 })
        );
    }

    #[test]
    fn rejects_non_finite_velocity() {
        assert!(matches!(parse("vp:nan"), Err(CommandError::InvalidVelocity(_))));
        assert!(matches!(parse("vt:inf"), Err(CommandError::InvalidVelocity(_))));
        assert!(matches!(parse("vt:fast"), Err(CommandError::InvalidVelocity(_))));
    }

    #[test]
    fn rejects_unknown_and_malformed_lines() {
        assert_eq!(parse(""), Err(CommandError::Empty));
        assert_eq!(parse("   "), Err(CommandError::Empty));
        assert_eq!(parse("jump"), Err(CommandError::Unknown("jump".to_string())));
        assert_eq!(parse("x:10"), Err(CommandError::Unknown("x:10".to_string())));
        assert!(matches!(parse("p:12.5"), Err(CommandError::InvalidAngle(_))));
        assert!(matches!(parse("t:"), Err(CommandError::InvalidAngle(_))));
    }

    #[test]
    fn wire_form_parses_back() {
        let commands = [
            Command::Center,
            Command::StopAll,
            Command::Stop(Axis::Tilt),
            Command::MoveTo { axis: Axis::Pan, degrees: 135 },
            Command::MoveBoth { pan: 0, tilt: 180 },
            Command::Velocity { axis: Axis::Tilt, degrees_per_sec: -7.25 },
            Command::Calibrate,
        ];
        for command in commands {
            assert_eq!(parse(&command.to_string()), Ok(command));
        }
    }

    #[test]
    fn errors_read_well_on_the_operator_channel() {
        let err = parse("b:90").unwrap_err();
        assert_eq!(err.to_string(), "Invalid format, expected b:<pan>,<tilt>: b:90");
    }
}
