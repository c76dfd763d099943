//! `lidarsteer-hal` – the simulator boundary
//!
//! Everything that touches the world outside the control stack lives here:
//! the [`SimulationBackend`][backend::SimulationBackend] trait the drive loop
//! steps, the sensor frames it produces, and the queues that line those
//! frames up with simulation ticks.
//!
//! # Modules
//!
//! - [`backend`] – [`SimulationBackend`][backend::SimulationBackend]: tick,
//!   apply control, read ego speed and pose.
//! - [`camera`] – [`CameraFrame`][camera::CameraFrame] and
//!   [`LidarSweep`][camera::LidarSweep], both [`Stamped`][camera::Stamped]
//!   with their frame number.
//! - [`sensor_queue`] – [`SensorQueue`][sensor_queue::SensorQueue]: one
//!   channel per sensor with stale-frame dropping and a bounded wait.
//! - [`rig`] – [`SensorLayout`][rig::SensorLayout] mount poses and the
//!   [`SensorRig`][rig::SensorRig] of queues built from it.
//! - [`sim`] – [`SimWorld`][sim::SimWorld]: a deterministic headless
//!   backend with a kinematic vehicle and pillar obstacles.

pub mod backend;
pub mod camera;
pub mod rig;
pub mod sensor_queue;
pub mod sim;

pub use backend::SimulationBackend;
pub use camera::{CameraFrame, LidarSweep, Stamped};
pub use rig::{SensorFeeds, SensorLayout, SensorRig};
pub use sensor_queue::{SensorFeed, SensorQueue};
pub use sim::{Pillar, SimScene, SimWorld, SimWorldBuilder};
