//! `lidarsteer-control` – density-driven control laws.
//!
//! Consumes the per-direction densities from `lidarsteer-perception` and
//! produces a [`ControlCommand`][lidarsteer_types::ControlCommand]. Exactly
//! one of two paths is used per tick:
//!
//! - [`steering`] – [`reactive_steer`][steering::reactive_steer]: densities
//!   map directly to throttle and steer.
//! - [`planner`] + [`pursuit`] – [`plan_waypoint`][planner::plan_waypoint]
//!   picks a lookahead waypoint, then
//!   [`TrajectoryController`][pursuit::TrajectoryController] converts it with
//!   a pure-pursuit steering law and a turn-aware throttle/brake law.
//!
//! None of these functions fail: degenerate geometry falls back to zero
//! steer and every output is clamped to its valid range.

pub mod planner;
pub mod pursuit;
pub mod steering;

pub use planner::{plan_waypoint, WaypointPlan};
pub use pursuit::{ControlDiagnostics, TrajectoryController};
pub use steering::{reactive_steer, steering_direction};
