//! Configuration sections.
//!
//! Each section is deserialised independently so a config file may omit any
//! field; the missing ones fall back to the defaults below. Functions that
//! consume a section always take it as an explicit argument.

use serde::{Deserialize, Serialize};

// ────────────────────────────────────────────────────────────────────────────
// Simulation timing
// ────────────────────────────────────────────────────────────────────────────

/// Fixed-step simulation timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Simulation ticks per second. `fixed_delta_seconds = 1 / fps`.
    #[serde(default = "default_fps")]
    pub fps: u32,
    /// Total simulated time, in seconds.
    #[serde(default = "default_simulation_duration")]
    pub simulation_duration: f64,
    /// Interval between debug image captures, in seconds.
    #[serde(default = "default_capture_interval")]
    pub capture_interval: f64,
}

impl SimulationConfig {
    /// Length of one simulation step in seconds.
    pub fn fixed_delta_seconds(&self) -> f32 {
        1.0 / self.fps as f32
    }

    /// Number of ticks in a full run: `floor(simulation_duration * fps)`.
    pub fn total_ticks(&self) -> u64 {
        whole_ticks(self.simulation_duration, self.fps)
    }

    /// Ticks between two debug image captures (never zero).
    pub fn capture_interval_ticks(&self) -> u64 {
        whole_ticks(self.capture_interval, self.fps).max(1)
    }
}

/// `floor(seconds * fps)`, treating a product within rounding error of an
/// integer as that integer (`2.3 * 10` is `22.999…` in binary).
fn whole_ticks(seconds: f64, fps: u32) -> u64 {
    let exact = seconds.max(0.0) * f64::from(fps);
    let nearest = exact.round();
    if (exact - nearest).abs() <= 1e-9 * nearest.max(1.0) {
        nearest as u64
    } else {
        exact.floor() as u64
    }
}

fn default_fps() -> u32 {
    20
}
fn default_simulation_duration() -> f64 {
    30.0
}
fn default_capture_interval() -> f64 {
    0.5
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            fps: default_fps(),
            simulation_duration: default_simulation_duration(),
            capture_interval: default_capture_interval(),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Sensors
// ────────────────────────────────────────────────────────────────────────────

/// RGB camera settings shared by all three cameras.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraConfig {
    #[serde(default = "default_camera_width")]
    pub width: u32,
    #[serde(default = "default_camera_height")]
    pub height: u32,
    /// Horizontal field of view in degrees.
    #[serde(default = "default_camera_fov")]
    pub fov: f32,
}

fn default_camera_width() -> u32 {
    800
}
fn default_camera_height() -> u32 {
    600
}
fn default_camera_fov() -> f32 {
    90.0
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            width: default_camera_width(),
            height: default_camera_height(),
            fov: default_camera_fov(),
        }
    }
}

/// Rotating LiDAR settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LidarConfig {
    #[serde(default = "default_lidar_channels")]
    pub channels: u32,
    #[serde(default = "default_lidar_points_per_second")]
    pub points_per_second: u32,
    #[serde(default = "default_lidar_rotation_frequency")]
    pub rotation_frequency: f32,
    /// Maximum range in metres.
    #[serde(default = "default_lidar_range")]
    pub range: f32,
    /// Upper vertical FOV limit in degrees.
    #[serde(default = "default_lidar_upper_fov")]
    pub upper_fov: f32,
    /// Lower vertical FOV limit in degrees.
    #[serde(default = "default_lidar_lower_fov")]
    pub lower_fov: f32,
}

fn default_lidar_channels() -> u32 {
    16
}
fn default_lidar_points_per_second() -> u32 {
    300_000
}
fn default_lidar_rotation_frequency() -> f32 {
    20.0
}
fn default_lidar_range() -> f32 {
    100.0
}
fn default_lidar_upper_fov() -> f32 {
    10.0
}
fn default_lidar_lower_fov() -> f32 {
    -30.0
}

impl Default for LidarConfig {
    fn default() -> Self {
        Self {
            channels: default_lidar_channels(),
            points_per_second: default_lidar_points_per_second(),
            rotation_frequency: default_lidar_rotation_frequency(),
            range: default_lidar_range(),
            upper_fov: default_lidar_upper_fov(),
            lower_fov: default_lidar_lower_fov(),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Projection + control
// ────────────────────────────────────────────────────────────────────────────

/// Projection engine parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionConfig {
    /// Points closer than this depth (metres) get the close weight.
    #[serde(default = "default_close_distance_threshold")]
    pub close_distance_threshold: f32,
    /// Weight of a close point; far points weigh `1.0`.
    #[serde(default = "default_close_weight_multiplier")]
    pub close_weight_multiplier: f32,
    /// Half-width in pixels of the square drawn per projected point.
    #[serde(default = "default_dot_extent")]
    pub dot_extent: u32,
}

fn default_close_distance_threshold() -> f32 {
    25.0
}
fn default_close_weight_multiplier() -> f32 {
    4.0
}
fn default_dot_extent() -> u32 {
    2
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            close_distance_threshold: default_close_distance_threshold(),
            close_weight_multiplier: default_close_weight_multiplier(),
            dot_extent: default_dot_extent(),
        }
    }
}

/// Reactive (density-to-steer) law parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SteeringConfig {
    /// Constant throttle in reactive mode.
    #[serde(default = "default_throttle")]
    pub throttle: f32,
    #[serde(default = "default_steering_gain")]
    pub steering_gain: f32,
}

fn default_throttle() -> f32 {
    0.3
}
fn default_steering_gain() -> f32 {
    0.8
}

impl Default for SteeringConfig {
    fn default() -> Self {
        Self {
            throttle: default_throttle(),
            steering_gain: default_steering_gain(),
        }
    }
}

/// Waypoint planner parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Forward distance of the generated waypoint, metres.
    #[serde(default = "default_lookahead_distance")]
    pub lookahead_distance: f32,
    /// Largest allowed lateral offset, metres.
    #[serde(default = "default_max_lateral_offset")]
    pub max_lateral_offset: f32,
}

fn default_lookahead_distance() -> f32 {
    10.0
}
fn default_max_lateral_offset() -> f32 {
    5.0
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            lookahead_distance: default_lookahead_distance(),
            max_lateral_offset: default_max_lateral_offset(),
        }
    }
}

/// Pure-pursuit trajectory controller parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PursuitConfig {
    /// Throttle before turn reduction.
    #[serde(default = "default_throttle")]
    pub throttle: f32,
    /// Steering lock in degrees; maps to `steer = ±1`.
    #[serde(default = "default_max_steering_angle")]
    pub max_steering_angle: f32,
    /// Fraction of throttle removed at full steer.
    #[serde(default = "default_steering_throttle_reduction")]
    pub steering_throttle_reduction: f32,
    /// `|steer|` above which the controller brakes instead of accelerating.
    #[serde(default = "default_brake_steering_threshold")]
    pub brake_steering_threshold: f32,
    #[serde(default = "default_brake_strength")]
    pub brake_strength: f32,
}

fn default_max_steering_angle() -> f32 {
    25.0
}
fn default_steering_throttle_reduction() -> f32 {
    0.5
}
fn default_brake_steering_threshold() -> f32 {
    0.7
}
fn default_brake_strength() -> f32 {
    0.3
}

impl Default for PursuitConfig {
    fn default() -> Self {
        Self {
            throttle: default_throttle(),
            max_steering_angle: default_max_steering_angle(),
            steering_throttle_reduction: default_steering_throttle_reduction(),
            brake_steering_threshold: default_brake_steering_threshold(),
            brake_strength: default_brake_strength(),
        }
    }
}

/// Which control path drives the vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlMode {
    /// Densities map straight to throttle/steer.
    Reactive,
    /// Densities map to a waypoint, pure pursuit maps that to actuation.
    #[default]
    Waypoint,
}

impl std::fmt::Display for ControlMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ControlMode::Reactive => write!(f, "reactive"),
            ControlMode::Waypoint => write!(f, "waypoint"),
        }
    }
}

impl std::str::FromStr for ControlMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reactive" => Ok(ControlMode::Reactive),
            "waypoint" => Ok(ControlMode::Waypoint),
            other => Err(format!("unknown control mode '{other}'")),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Output + vehicle
// ────────────────────────────────────────────────────────────────────────────

/// Debug image persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_base_dir")]
    pub base_dir: String,
    #[serde(default = "default_save_images")]
    pub save_images: bool,
}

fn default_output_base_dir() -> String {
    "output".to_string()
}
fn default_save_images() -> bool {
    true
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            base_dir: default_output_base_dir(),
            save_images: default_save_images(),
        }
    }
}

/// Ego vehicle spawn pose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleConfig {
    #[serde(default = "default_spawn_x")]
    pub spawn_x: f32,
    #[serde(default = "default_spawn_y")]
    pub spawn_y: f32,
    #[serde(default = "default_spawn_z")]
    pub spawn_z: f32,
    /// Spawn heading in degrees.
    #[serde(default = "default_spawn_yaw")]
    pub spawn_yaw: f32,
}

fn default_spawn_x() -> f32 {
    -64.6
}
fn default_spawn_y() -> f32 {
    24.5
}
fn default_spawn_z() -> f32 {
    0.6
}
fn default_spawn_yaw() -> f32 {
    0.2
}

impl Default for VehicleConfig {
    fn default() -> Self {
        Self {
            spawn_x: default_spawn_x(),
            spawn_y: default_spawn_y(),
            spawn_z: default_spawn_z(),
            spawn_yaw: default_spawn_yaw(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_delta_is_inverse_fps() {
        let sim = SimulationConfig {
            fps: 20,
            ..SimulationConfig::default()
        };
        assert!((sim.fixed_delta_seconds() - 0.05).abs() < 1e-7);

        let sim = SimulationConfig {
            fps: 30,
            ..SimulationConfig::default()
        };
        assert!((sim.fixed_delta_seconds() - 1.0 / 30.0).abs() < 1e-7);
    }

    #[test]
    fn total_ticks_is_floor_of_duration_times_fps() {
        let sim = SimulationConfig::default();
        assert_eq!(sim.total_ticks(), 600);

        let sim = SimulationConfig {
            fps: 20,
            simulation_duration: 1.26,
            capture_interval: 0.5,
        };
        assert_eq!(sim.total_ticks(), 25);

        // Decimal durations whose binary product lands just below the integer.
        for (fps, secs, ticks) in [(10, 0.7, 7), (10, 2.3, 23), (20, 0.7, 14), (30, 4.1, 123)] {
            let sim = SimulationConfig {
                fps,
                simulation_duration: secs,
                capture_interval: 0.5,
            };
            assert_eq!(sim.total_ticks(), ticks, "{secs} s at {fps} fps");
        }
    }

    #[test]
    fn capture_interval_ticks_survive_decimal_intervals() {
        let sim = SimulationConfig {
            fps: 10,
            simulation_duration: 10.0,
            capture_interval: 0.3,
        };
        assert_eq!(sim.capture_interval_ticks(), 3);

        let sim = SimulationConfig {
            capture_interval: 0.7,
            ..sim
        };
        assert_eq!(sim.capture_interval_ticks(), 7);
    }

    #[test]
    fn capture_interval_never_zero() {
        assert_eq!(SimulationConfig::default().capture_interval_ticks(), 10);
        let sim = SimulationConfig {
            capture_interval: 0.0,
            ..SimulationConfig::default()
        };
        assert_eq!(sim.capture_interval_ticks(), 1);
    }

    #[test]
    fn partial_section_uses_defaults() {
        let cfg: PursuitConfig = toml::from_str("brake_strength = 0.9").unwrap();
        assert_eq!(cfg.brake_strength, 0.9);
        assert_eq!(cfg.max_steering_angle, 25.0);
        assert_eq!(cfg.throttle, 0.3);
    }

    #[test]
    fn control_mode_parses_case_insensitively() {
        assert_eq!("Reactive".parse::<ControlMode>(), Ok(ControlMode::Reactive));
        assert_eq!(" waypoint ".parse::<ControlMode>(), Ok(ControlMode::Waypoint));
        assert!("autopilot".parse::<ControlMode>().is_err());
        assert_eq!(ControlMode::default(), ControlMode::Waypoint);
    }
}
