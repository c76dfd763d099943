//! Pure-pursuit trajectory controller.
//!
//! Converts a vehicle-frame waypoint into throttle/steer/brake.
//!
//! Steering follows the pure-pursuit arc through the waypoint:
//! ```text
//! δ = atan(2 · y / x)          (x forward, y lateral)
//! steer = clamp(δ / δ_max, -1, 1)
//! ```
//! A waypoint with `x ≤ 1e-4` (beside or behind the vehicle) cannot be
//! pursued by this approximation and yields `steer = 0`.
//!
//! Throttle is reduced in proportion to `|steer|`; above
//! `brake_steering_threshold` the controller brakes instead and throttle is
//! forced to zero.
//!
//! # Example
//!
//! ```rust
//! use lidarsteer_control::pursuit::TrajectoryController;
//! use lidarsteer_types::{PursuitConfig, Waypoint};
//!
//! let mut ctrl = TrajectoryController::new(PursuitConfig::default());
//! let (cmd, diag) = ctrl.convert(&Waypoint::on_ground(10.0, 0.0), 4.2);
//! assert_eq!(cmd.steer, 0.0);
//! assert_eq!(diag.vehicle_speed, 4.2);
//! ```

use std::fmt;

use lidarsteer_types::{ControlCommand, PursuitConfig, Waypoint};
use serde::Serialize;
use tracing::debug;

/// Forward distances at or below this are treated as unpursuable.
const MIN_FORWARD: f32 = 1e-4;

/// Everything computed during one [`TrajectoryController::convert`] call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ControlDiagnostics {
    /// Lateral distance of the waypoint from the vehicle heading, metres.
    pub cross_track_error: f32,
    /// Forward distance of the waypoint, metres.
    pub lookahead_distance: f32,
    pub steering_angle_rad: f32,
    pub steering_angle_deg: f32,
    pub steer: f32,
    pub throttle: f32,
    pub brake: f32,
    /// Vehicle speed in m/s at conversion time.
    pub vehicle_speed: f32,
    /// `|steer|` used by the throttle and brake laws.
    pub steering_magnitude: f32,
}

impl fmt::Display for ControlDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Steer:{:+.2} Throttle:{:.2} Brake:{:.2} Speed:{:.1}m/s",
            self.steer, self.throttle, self.brake, self.vehicle_speed
        )
    }
}

/// Waypoint-to-actuation converter.
///
/// Memoryless per tick; the last vehicle speed is kept for diagnostics only.
#[derive(Debug, Clone)]
pub struct TrajectoryController {
    config: PursuitConfig,
    last_vehicle_speed: f32,
}

impl TrajectoryController {
    pub fn new(config: PursuitConfig) -> Self {
        Self {
            config,
            last_vehicle_speed: 0.0,
        }
    }

    pub fn config(&self) -> &PursuitConfig {
        &self.config
    }

    /// Speed passed to the most recent [`convert`][Self::convert] call.
    pub fn last_vehicle_speed(&self) -> f32 {
        self.last_vehicle_speed
    }

    /// Convert `waypoint` (vehicle frame) into a control command.
    pub fn convert(
        &mut self,
        waypoint: &Waypoint,
        vehicle_speed: f32,
    ) -> (ControlCommand, ControlDiagnostics) {
        self.last_vehicle_speed = vehicle_speed;
        let cfg = &self.config;
        let forward = waypoint.forward;
        let lateral = waypoint.lateral;

        let (steering_angle, steer) = if forward > MIN_FORWARD {
            let angle = (2.0 * lateral / forward).atan();
            let steer = angle / cfg.max_steering_angle.to_radians();
            (angle, if steer.is_nan() { 0.0 } else { steer.clamp(-1.0, 1.0) })
        } else {
            (0.0, 0.0)
        };

        let steering_magnitude = steer.abs();
        let mut throttle = cfg.throttle * (1.0 - steering_magnitude * cfg.steering_throttle_reduction);
        let mut brake = 0.0;
        if steering_magnitude > cfg.brake_steering_threshold {
            brake = steering_magnitude * cfg.brake_strength;
            throttle = 0.0;
        }

        let cmd = ControlCommand::clamped(throttle, steer, brake);
        let diagnostics = ControlDiagnostics {
            cross_track_error: lateral,
            lookahead_distance: forward,
            steering_angle_rad: steering_angle,
            steering_angle_deg: steering_angle.to_degrees(),
            steer: cmd.steer,
            throttle: cmd.throttle,
            brake: cmd.brake,
            vehicle_speed,
            steering_magnitude,
        };

        debug!(
            cross_track = lateral,
            steer = cmd.steer,
            throttle = cmd.throttle,
            brake = cmd.brake,
            speed = vehicle_speed,
            "control conversion"
        );
        (cmd, diagnostics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> TrajectoryController {
        TrajectoryController::new(PursuitConfig {
            throttle: 0.3,
            max_steering_angle: 25.0,
            steering_throttle_reduction: 0.5,
            brake_steering_threshold: 0.7,
            brake_strength: 0.3,
        })
    }

    #[test]
    fn zero_lateral_gives_exactly_zero_steer() {
        let mut ctrl = controller();
        for speed in [0.0, 3.5, 27.0] {
            let (cmd, diag) = ctrl.convert(&Waypoint::on_ground(10.0, 0.0), speed);
            assert_eq!(cmd.steer, 0.0);
            assert_eq!(cmd.throttle, 0.3);
            assert_eq!(cmd.brake, 0.0);
            assert_eq!(diag.steering_angle_deg, 0.0);
        }
    }

    #[test]
    fn pure_pursuit_angle_and_normalisation() {
        let mut ctrl = controller();
        let (cmd, diag) = ctrl.convert(&Waypoint::on_ground(10.0, 1.0), 5.0);
        let expected_angle = (2.0f32 * 1.0 / 10.0).atan();
        assert!((diag.steering_angle_rad - expected_angle).abs() < 1e-6);
        assert!((diag.steering_angle_deg - expected_angle.to_degrees()).abs() < 1e-4);
        let expected_steer = expected_angle / 25.0f32.to_radians();
        assert!((cmd.steer - expected_steer).abs() < 1e-6);
        // Below brake threshold: reduced throttle, no brake.
        assert!((cmd.throttle - 0.3 * (1.0 - expected_steer * 0.5)).abs() < 1e-6);
        assert_eq!(cmd.brake, 0.0);
    }

    #[test]
    fn left_waypoint_steers_left() {
        let mut ctrl = controller();
        let (cmd, _) = ctrl.convert(&Waypoint::on_ground(10.0, -1.0), 5.0);
        assert!(cmd.steer < 0.0);
    }

    #[test]
    fn sharp_turn_brakes_and_cuts_throttle() {
        let mut ctrl = controller();
        // atan(2·5/10) = 45° > 25° lock → steer saturates at 1.
        let (cmd, diag) = ctrl.convert(&Waypoint::on_ground(10.0, 5.0), 8.0);
        assert_eq!(cmd.steer, 1.0);
        assert_eq!(cmd.throttle, 0.0);
        assert!((cmd.brake - 0.3).abs() < 1e-6);
        assert_eq!(diag.steering_magnitude, 1.0);
    }

    #[test]
    fn degenerate_forward_distance_gives_zero_steer() {
        let mut ctrl = controller();
        for forward in [0.0, 1e-5, -4.0] {
            let (cmd, diag) = ctrl.convert(&Waypoint::on_ground(forward, 3.0), 1.0);
            assert_eq!(cmd.steer, 0.0);
            assert_eq!(diag.steering_angle_rad, 0.0);
            assert_eq!(cmd.throttle, 0.3);
        }
    }

    #[test]
    fn brake_and_throttle_are_exclusive() {
        let mut ctrl = controller();
        for i in 0..=40 {
            let lateral = -10.0 + i as f32 * 0.5;
            let (cmd, diag) = ctrl.convert(&Waypoint::on_ground(10.0, lateral), 3.0);
            if diag.steering_magnitude > 0.7 {
                assert_eq!(cmd.throttle, 0.0, "lateral {lateral}");
                assert!(cmd.brake > 0.0);
            } else {
                assert_eq!(cmd.brake, 0.0, "lateral {lateral}");
            }
        }
    }

    #[test]
    fn outputs_always_within_ranges() {
        let mut ctrl = TrajectoryController::new(PursuitConfig {
            throttle: 4.0,
            max_steering_angle: 1.0,
            steering_throttle_reduction: -3.0,
            brake_steering_threshold: 0.1,
            brake_strength: 9.0,
        });
        for (x, y) in [(10.0, 0.0), (10.0, 0.01), (0.5, 30.0), (1000.0, -1.0), (-5.0, 2.0)] {
            let (cmd, _) = ctrl.convert(&Waypoint::on_ground(x, y), 10.0);
            assert!((0.0..=1.0).contains(&cmd.throttle), "{cmd:?}");
            assert!((-1.0..=1.0).contains(&cmd.steer), "{cmd:?}");
            assert!((0.0..=1.0).contains(&cmd.brake), "{cmd:?}");
        }
    }

    #[test]
    fn zero_steering_lock_does_not_produce_nan() {
        let mut ctrl = TrajectoryController::new(PursuitConfig {
            max_steering_angle: 0.0,
            ..PursuitConfig::default()
        });
        let (cmd, _) = ctrl.convert(&Waypoint::on_ground(10.0, 0.0), 0.0);
        assert_eq!(cmd.steer, 0.0);
        let (cmd, _) = ctrl.convert(&Waypoint::on_ground(10.0, 1.0), 0.0);
        assert_eq!(cmd.steer, 1.0);
    }

    #[test]
    fn remembers_last_speed() {
        let mut ctrl = controller();
        assert_eq!(ctrl.last_vehicle_speed(), 0.0);
        ctrl.convert(&Waypoint::on_ground(10.0, 0.0), 12.5);
        assert_eq!(ctrl.last_vehicle_speed(), 12.5);
    }

    #[test]
    fn summary_line_format() {
        let mut ctrl = controller();
        let (_, diag) = ctrl.convert(&Waypoint::on_ground(10.0, 0.0), 4.2);
        assert_eq!(diag.to_string(), "Steer:+0.00 Throttle:0.30 Brake:0.00 Speed:4.2m/s");
    }
}
