//! Reactive steering law: densities straight to throttle/steer.
//!
//! - Front strictly clearer than both sides → drive straight.
//! - Otherwise steer proportionally to the side imbalance,
//!   `steer = (left - right) / (left + right) · gain`, so a denser left side
//!   gives a positive (rightward) steer.
//!
//! Throttle is constant and brake is always zero in this mode.
//!
//! # Example
//!
//! ```rust
//! use lidarsteer_control::steering::reactive_steer;
//! use lidarsteer_types::{DirectionalDensity, SteeringConfig};
//!
//! let cfg = SteeringConfig { throttle: 0.3, steering_gain: 0.8 };
//! let cmd = reactive_steer(&DirectionalDensity::new(10.0, 8.0, 2.0), &cfg);
//! assert!(cmd.steer > 0.0);
//! assert_eq!(cmd.brake, 0.0);
//! ```

use lidarsteer_types::{ControlCommand, DirectionalDensity, SteeringConfig};
use tracing::debug;

/// Map the three directional densities to an actuation command.
pub fn reactive_steer(densities: &DirectionalDensity, config: &SteeringConfig) -> ControlCommand {
    let steer = if densities.front_is_clearest() {
        0.0
    } else {
        let total_side = densities.left + densities.right;
        if total_side > 0.0 {
            (densities.left - densities.right) / total_side * config.steering_gain
        } else {
            0.0
        }
    };

    let cmd = ControlCommand::clamped(config.throttle, steer, 0.0);
    debug!(
        front = densities.front,
        left = densities.left,
        right = densities.right,
        direction = steering_direction(densities),
        steer = cmd.steer,
        throttle = cmd.throttle,
        "reactive steering"
    );
    cmd
}

/// Human-readable steering decision for logs.
pub fn steering_direction(densities: &DirectionalDensity) -> &'static str {
    if densities.front_is_clearest() {
        "STRAIGHT (front clear)"
    } else if densities.left > densities.right {
        "RIGHT"
    } else if densities.right > densities.left {
        "LEFT"
    } else {
        "STRAIGHT"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(gain: f32) -> SteeringConfig {
        SteeringConfig {
            throttle: 0.3,
            steering_gain: gain,
        }
    }

    fn steer(front: f32, left: f32, right: f32) -> ControlCommand {
        reactive_steer(&DirectionalDensity::new(front, left, right), &cfg(0.8))
    }

    #[test]
    fn all_equal_falls_through_to_zero_steer() {
        let cmd = steer(5.0, 5.0, 5.0);
        assert_eq!(cmd.steer, 0.0);
        assert_eq!(steering_direction(&DirectionalDensity::new(5.0, 5.0, 5.0)), "STRAIGHT");
    }

    #[test]
    fn front_strictly_clearest_goes_straight() {
        let cmd = steer(1.0, 10.0, 2.0);
        assert_eq!(cmd.steer, 0.0);
        assert_eq!(
            steering_direction(&DirectionalDensity::new(1.0, 10.0, 2.0)),
            "STRAIGHT (front clear)"
        );
    }

    #[test]
    fn front_tied_with_one_side_steers_proportionally() {
        // front == right, so the straight branch does not apply.
        let cmd = steer(2.0, 6.0, 2.0);
        assert!((cmd.steer - 0.5 * 0.8).abs() < 1e-6);
    }

    #[test]
    fn denser_left_steers_right() {
        let cmd = steer(10.0, 8.0, 2.0);
        assert!(cmd.steer > 0.0);
        assert!((cmd.steer - (6.0 / 10.0) * 0.8).abs() < 1e-6);
        assert_eq!(steering_direction(&DirectionalDensity::new(10.0, 8.0, 2.0)), "RIGHT");
    }

    #[test]
    fn denser_right_steers_left() {
        let cmd = steer(10.0, 2.0, 8.0);
        assert!(cmd.steer < 0.0);
        assert_eq!(steering_direction(&DirectionalDensity::new(10.0, 2.0, 8.0)), "LEFT");
    }

    #[test]
    fn no_side_density_gives_zero_steer() {
        let cmd = steer(3.0, 0.0, 0.0);
        assert_eq!(cmd.steer, 0.0);
        assert_eq!(steer(0.0, 0.0, 0.0).steer, 0.0);
    }

    #[test]
    fn large_gain_is_clamped() {
        let cmd = reactive_steer(&DirectionalDensity::new(10.0, 9.0, 1.0), &cfg(50.0));
        assert_eq!(cmd.steer, 1.0);
        let cmd = reactive_steer(&DirectionalDensity::new(10.0, 1.0, 9.0), &cfg(50.0));
        assert_eq!(cmd.steer, -1.0);
    }

    #[test]
    fn throttle_constant_and_brake_zero() {
        for d in [(1.0, 2.0, 3.0), (9.0, 1.0, 1.0), (4.0, 8.0, 0.0)] {
            let cmd = steer(d.0, d.1, d.2);
            assert_eq!(cmd.throttle, 0.3);
            assert_eq!(cmd.brake, 0.0);
        }
    }

    #[test]
    fn out_of_range_throttle_is_clamped() {
        let cmd = reactive_steer(
            &DirectionalDensity::new(1.0, 2.0, 3.0),
            &SteeringConfig {
                throttle: 1.7,
                steering_gain: 0.8,
            },
        );
        assert_eq!(cmd.throttle, 1.0);
    }
}
