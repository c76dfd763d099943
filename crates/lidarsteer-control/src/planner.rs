//! Waypoint planner: densities to a single lookahead waypoint.
//!
//! Uses the same front/left/right comparison as the reactive law, but emits
//! a target point `(lookahead, lateral, 0)` in the vehicle frame instead of
//! actuation. A denser left side yields a positive (rightward) lateral
//! offset; a denser right side a negative one. The imbalance is normalised
//! by `max(left + right, 1)`.

use std::fmt;

use lidarsteer_types::{DirectionalDensity, Maneuver, PlannerConfig, Waypoint};
use serde::Serialize;
use tracing::debug;

/// Planner decision plus the inputs that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WaypointPlan {
    pub waypoint: Waypoint,
    pub maneuver: Maneuver,
    /// Signed lateral offset in metres (positive = right).
    pub lateral_offset: f32,
    pub lookahead_distance: f32,
    pub densities: DirectionalDensity,
}

impl fmt::Display for WaypointPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.maneuver {
            Maneuver::Straight => write!(f, "STRAIGHT (front clear)"),
            Maneuver::Left | Maneuver::Right => {
                write!(f, "{} ({:.2}m)", self.maneuver, self.lateral_offset)
            }
        }
    }
}

/// Choose a waypoint from the directional densities.
pub fn plan_waypoint(densities: &DirectionalDensity, config: &PlannerConfig) -> WaypointPlan {
    let max_offset = config.max_lateral_offset.abs();
    let (left, right) = (densities.left, densities.right);

    let (maneuver, raw_offset) = if densities.front_is_clearest() {
        (Maneuver::Straight, 0.0)
    } else {
        let total = (left + right).max(1.0);
        if left > right {
            (Maneuver::Right, (left - right) / total * max_offset)
        } else {
            (Maneuver::Left, -((right - left) / total) * max_offset)
        }
    };

    let lateral_offset = if raw_offset.is_nan() {
        0.0
    } else {
        raw_offset.clamp(-max_offset, max_offset)
    };

    let plan = WaypointPlan {
        waypoint: Waypoint::on_ground(config.lookahead_distance, lateral_offset),
        maneuver,
        lateral_offset,
        lookahead_distance: config.lookahead_distance,
        densities: *densities,
    };

    debug!(
        direction = %plan.maneuver,
        left = left,
        front = densities.front,
        right = right,
        lateral_offset = plan.lateral_offset,
        "waypoint decision"
    );
    plan
}
