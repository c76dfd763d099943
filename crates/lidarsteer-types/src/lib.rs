//! Shared data model for the lidarsteer workspace.
//!
//! Everything that crosses a crate boundary lives here: the per-direction
//! density scores produced by perception, the waypoint and control command
//! produced by the control laws, the configuration sections, and the
//! boundary error type.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod config;

pub use config::{
    CameraConfig, ControlMode, LidarConfig, OutputConfig, PlannerConfig, ProjectionConfig,
    PursuitConfig, SimulationConfig, SteeringConfig, VehicleConfig,
};

/// Camera viewing direction relative to the vehicle.
///
/// A closed set: every density score and every debug image is keyed by one
/// of these three variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Front,
    Left,
    Right,
}

impl Direction {
    /// All directions in a fixed processing order.
    pub const ALL: [Direction; 3] = [Direction::Front, Direction::Left, Direction::Right];

    /// Lower-case name, used for log fields and output directory names.
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Front => "front",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Weighted obstacle density per camera direction.
///
/// A direction that was never set reads as `0.0`, which the control laws
/// interpret as "no obstacle". A vehicle running without one of the three
/// cameras is therefore biased toward the unobserved side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DirectionalDensity {
    pub front: f32,
    pub left: f32,
    pub right: f32,
}

impl DirectionalDensity {
    pub fn new(front: f32, left: f32, right: f32) -> Self {
        Self { front, left, right }
    }

    pub fn get(&self, direction: Direction) -> f32 {
        match direction {
            Direction::Front => self.front,
            Direction::Left => self.left,
            Direction::Right => self.right,
        }
    }

    pub fn set(&mut self, direction: Direction, density: f32) {
        match direction {
            Direction::Front => self.front = density,
            Direction::Left => self.left = density,
            Direction::Right => self.right = density,
        }
    }

    /// `true` when the front is strictly clearer than both sides.
    ///
    /// Ties with either side are *not* front-clear.
    pub fn front_is_clearest(&self) -> bool {
        self.front < self.left && self.front < self.right
    }
}

/// Target point in the vehicle frame (X forward, Y right, Z up), metres.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub forward: f32,
    pub lateral: f32,
    pub vertical: f32,
}

impl Waypoint {
    /// A waypoint on the ground plane (`vertical == 0`).
    pub fn on_ground(forward: f32, lateral: f32) -> Self {
        Self {
            forward,
            lateral,
            vertical: 0.0,
        }
    }
}

/// Maneuver chosen from the directional densities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Maneuver {
    Straight,
    Left,
    Right,
}

impl Maneuver {
    pub fn as_str(self) -> &'static str {
        match self {
            Maneuver::Straight => "STRAIGHT",
            Maneuver::Left => "LEFT",
            Maneuver::Right => "RIGHT",
        }
    }
}

impl fmt::Display for Maneuver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Actuation command handed to the vehicle once per tick.
///
/// `throttle ∈ [0, 1]`, `steer ∈ [-1, 1]` (positive = right),
/// `brake ∈ [0, 1]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ControlCommand {
    pub throttle: f32,
    pub steer: f32,
    pub brake: f32,
}

impl ControlCommand {
    /// Build a command with every field clamped to its valid range.
    ///
    /// NaN inputs collapse to `0.0`.
    pub fn clamped(throttle: f32, steer: f32, brake: f32) -> Self {
        Self {
            throttle: clamp_or_zero(throttle, 0.0, 1.0),
            steer: clamp_or_zero(steer, -1.0, 1.0),
            brake: clamp_or_zero(brake, 0.0, 1.0),
        }
    }

    /// Full stop: no throttle, no steer, full brake.
    pub fn stop() -> Self {
        Self {
            throttle: 0.0,
            steer: 0.0,
            brake: 1.0,
        }
    }
}

fn clamp_or_zero(value: f32, min: f32, max: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(min, max)
    }
}

/// Errors raised at the simulation boundary.
///
/// The perception and control crates never fail; only sensor delivery,
/// actuation, persistence and configuration can.
#[derive(Error, Debug, Serialize, Deserialize)]
pub enum DriveError {
    #[error("Sensor '{sensor}' did not deliver frame {frame} within {waited_ms} ms")]
    SensorTimeout {
        sensor: String,
        frame: u64,
        waited_ms: u64,
    },

    #[error("Sensor '{sensor}' delivered frame {got} while tick {expected} was pending")]
    SensorOutOfSync {
        sensor: String,
        expected: u64,
        got: u64,
    },

    #[error("Sensor '{0}' disconnected")]
    SensorDisconnected(String),

    #[error("Actuation failed on {vehicle}: {details}")]
    Actuation { vehicle: String, details: String },

    #[error("Failed to write image {path}: {details}")]
    ImageWrite { path: String, details: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Simulation backend error: {0}")]
    Backend(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_direction_reads_as_zero() {
        let mut d = DirectionalDensity::default();
        d.set(Direction::Left, 3.0);
        assert_eq!(d.get(Direction::Left), 3.0);
        assert_eq!(d.get(Direction::Front), 0.0);
        assert_eq!(d.get(Direction::Right), 0.0);
    }

    #[test]
    fn front_clear_requires_strictly_lower_front() {
        assert!(DirectionalDensity::new(1.0, 10.0, 2.0).front_is_clearest());
        assert!(!DirectionalDensity::new(5.0, 5.0, 5.0).front_is_clearest());
        assert!(!DirectionalDensity::new(2.0, 2.0, 9.0).front_is_clearest());
    }

    #[test]
    fn clamped_command_respects_ranges() {
        let cmd = ControlCommand::clamped(3.0, -7.5, -0.2);
        assert_eq!(cmd.throttle, 1.0);
        assert_eq!(cmd.steer, -1.0);
        assert_eq!(cmd.brake, 0.0);

        let nan = ControlCommand::clamped(f32::NAN, f32::NAN, f32::NAN);
        assert_eq!(nan, ControlCommand::default());
    }

    #[test]
    fn direction_serializes_lowercase() {
        let json = serde_json::to_string(&Direction::Right).unwrap();
        assert_eq!(json, "\"right\"");
        let back: Direction = serde_json::from_str("\"left\"").unwrap();
        assert_eq!(back, Direction::Left);
    }

    #[test]
    fn maneuver_display_matches_log_labels() {
        assert_eq!(Maneuver::Straight.to_string(), "STRAIGHT");
        assert_eq!(Maneuver::Left.to_string(), "LEFT");
        assert_eq!(Maneuver::Right.to_string(), "RIGHT");
    }

    #[test]
    fn drive_error_display() {
        let err = DriveError::SensorTimeout {
            sensor: "lidar".to_string(),
            frame: 42,
            waited_ms: 2000,
        };
        let msg = err.to_string();
        assert!(msg.contains("lidar"));
        assert!(msg.contains("42"));

        let err2 = DriveError::Actuation {
            vehicle: "ego".to_string(),
            details: "rejected".to_string(),
        };
        assert!(err2.to_string().contains("ego"));
    }
}
