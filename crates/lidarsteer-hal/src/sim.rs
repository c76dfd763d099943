//! Headless simulation backend for tests and offline runs.
//!
//! [`SimWorld`] stands in for the external simulator: a kinematic bicycle
//! vehicle drives among static cylindrical pillars, a LiDAR returns the
//! pillar surface samples within range and vertical FOV (no occlusion), and
//! every camera returns a flat grey frame. It is fully deterministic.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use lidarsteer_hal::backend::SimulationBackend;
//! use lidarsteer_hal::sim::{SimScene, SimWorld};
//! use lidarsteer_perception::Pose;
//!
//! let scene = SimScene::slalom(&Pose::identity(), 3, 12.0, 2.0);
//! let (mut world, rig) = SimWorld::builder().scene(scene).build();
//!
//! let frame = world.tick().expect("sim tick must succeed");
//! let sweep = rig.lidar.recv_frame(frame, Duration::from_millis(50)).unwrap();
//! assert!(!sweep.cloud.is_empty());
//! ```

use image::{Rgb, RgbImage};
use lidarsteer_perception::{LidarPoint, PointCloudFrame, Pose, Rotation, Vec3};
use lidarsteer_types::{
    CameraConfig, ControlCommand, DriveError, LidarConfig, SimulationConfig, VehicleConfig,
};
use tracing::{debug, trace};

use crate::backend::SimulationBackend;
use crate::camera::{CameraFrame, LidarSweep};
use crate::rig::{SensorFeeds, SensorLayout, SensorRig};

// ────────────────────────────────────────────────────────────────────────────
// Vehicle model constants
// ────────────────────────────────────────────────────────────────────────────

const WHEELBASE_M: f32 = 2.9;
const MAX_STEER_DEG: f32 = 35.0;
const MAX_ACCEL: f32 = 4.0;
const MAX_DECEL: f32 = 8.0;
const DRAG: f32 = 0.05;
/// Atmospheric attenuation used for LiDAR intensity: `exp(-a · d)`.
const LIDAR_ATTENUATION: f32 = 0.004;
const CAMERA_FILL: Rgb<u8> = Rgb([96, 96, 96]);

// ────────────────────────────────────────────────────────────────────────────
// Scene
// ────────────────────────────────────────────────────────────────────────────

/// Vertical cylinder standing on the ground plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pillar {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub height: f32,
}

/// Static obstacles of the simulated world.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimScene {
    pub pillars: Vec<Pillar>,
}

impl SimScene {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_pillar(mut self, pillar: Pillar) -> Self {
        self.pillars.push(pillar);
        self
    }

    /// `count` pillars every `spacing` metres ahead of `start`, alternating
    /// `offset` metres right and left of its heading.
    pub fn slalom(start: &Pose, count: usize, spacing: f32, offset: f32) -> Self {
        let pillars = (0..count)
            .map(|i| {
                let lateral = if i % 2 == 0 { offset } else { -offset };
                let at = start.transform_point(Vec3::new(spacing * (i + 1) as f32, lateral, 0.0));
                Pillar {
                    x: at.x,
                    y: at.y,
                    radius: 0.6,
                    height: 3.0,
                }
            })
            .collect();
        Self { pillars }
    }

    /// World-frame points on every pillar surface: rings every 0.25 m,
    /// 24 samples per ring.
    fn surface_samples(&self) -> Vec<Vec3> {
        const RING_STEP: f32 = 0.25;
        const PER_RING: usize = 24;
        let mut samples = Vec::new();
        for p in &self.pillars {
            let rings = (p.height / RING_STEP).floor() as usize + 1;
            for r in 0..rings {
                let z = r as f32 * RING_STEP;
                for k in 0..PER_RING {
                    let a = k as f32 / PER_RING as f32 * std::f32::consts::TAU;
                    samples.push(Vec3::new(p.x + p.radius * a.cos(), p.y + p.radius * a.sin(), z));
                }
            }
        }
        samples
    }
}

// ────────────────────────────────────────────────────────────────────────────
// SimWorld builder
// ────────────────────────────────────────────────────────────────────────────

/// Builder for [`SimWorld`]; every setting defaults to the stock config.
#[derive(Default)]
pub struct SimWorldBuilder {
    simulation: SimulationConfig,
    vehicle: VehicleConfig,
    lidar: LidarConfig,
    camera: CameraConfig,
    layout: SensorLayout,
    scene: SimScene,
}

impl SimWorldBuilder {
    pub fn simulation(mut self, config: &SimulationConfig) -> Self {
        self.simulation = config.clone();
        self
    }

    pub fn vehicle(mut self, config: &VehicleConfig) -> Self {
        self.vehicle = config.clone();
        self
    }

    pub fn lidar(mut self, config: &LidarConfig) -> Self {
        self.lidar = config.clone();
        self
    }

    pub fn camera(mut self, config: &CameraConfig) -> Self {
        self.camera = config.clone();
        self
    }

    pub fn layout(mut self, layout: SensorLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn scene(mut self, scene: SimScene) -> Self {
        self.scene = scene;
        self
    }

    /// Spawn the vehicle and return the world with the consumer side of its
    /// sensor queues.
    pub fn build(self) -> (SimWorld, SensorRig) {
        let (rig, feeds) = SensorRig::for_layout(&self.layout);
        let samples = self.scene.surface_samples();
        debug!(
            pillars = self.scene.pillars.len(),
            samples = samples.len(),
            cameras = self.layout.cameras.len(),
            "sim world spawned"
        );
        let world = SimWorld {
            vehicle_id: "ego".to_string(),
            frame: 0,
            dt: self.simulation.fixed_delta_seconds(),
            x: self.vehicle.spawn_x,
            y: self.vehicle.spawn_y,
            z: self.vehicle.spawn_z,
            yaw_deg: self.vehicle.spawn_yaw,
            speed: 0.0,
            control: ControlCommand::default(),
            layout: self.layout,
            lidar: self.lidar,
            camera: self.camera,
            samples,
            feeds,
        };
        (world, rig)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// SimWorld
// ────────────────────────────────────────────────────────────────────────────

/// Deterministic stand-in for the external simulator.
pub struct SimWorld {
    vehicle_id: String,
    frame: u64,
    dt: f32,
    x: f32,
    y: f32,
    z: f32,
    yaw_deg: f32,
    speed: f32,
    control: ControlCommand,
    layout: SensorLayout,
    lidar: LidarConfig,
    camera: CameraConfig,
    samples: Vec<Vec3>,
    feeds: SensorFeeds,
}

impl SimWorld {
    pub fn builder() -> SimWorldBuilder {
        SimWorldBuilder::default()
    }

    /// Frame number of the most recent tick (0 before the first tick).
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Command currently applied to the vehicle.
    pub fn control(&self) -> ControlCommand {
        self.control
    }

    fn step_vehicle(&mut self) {
        let c = self.control;
        let accel = c.throttle * MAX_ACCEL - c.brake * MAX_DECEL - DRAG * self.speed;
        self.speed = (self.speed + accel * self.dt).max(0.0);

        let steer_angle = (c.steer * MAX_STEER_DEG).to_radians();
        let yaw_rate = self.speed / WHEELBASE_M * steer_angle.tan();
        self.yaw_deg += yaw_rate.to_degrees() * self.dt;

        let (sin, cos) = self.yaw_deg.to_radians().sin_cos();
        self.x += self.speed * cos * self.dt;
        self.y += self.speed * sin * self.dt;
    }

    /// Pillar samples visible to a LiDAR at `lidar_pose`, in its local frame.
    fn sweep(&self, lidar_pose: &Pose) -> PointCloudFrame {
        let to_local = lidar_pose.inverse_matrix();
        self.samples
            .iter()
            .filter_map(|world| {
                let p = to_local.transform_point(*world);
                let distance = p.norm();
                let elevation = p.z.atan2((p.x * p.x + p.y * p.y).sqrt()).to_degrees();
                let in_view = distance > 0.0
                    && distance <= self.lidar.range
                    && elevation >= self.lidar.lower_fov
                    && elevation <= self.lidar.upper_fov;
                in_view.then(|| {
                    LidarPoint::new(p.x, p.y, p.z, (-LIDAR_ATTENUATION * distance).exp())
                })
            })
            .collect()
    }
}

impl SimulationBackend for SimWorld {
    fn vehicle_id(&self) -> &str {
        &self.vehicle_id
    }

    fn tick(&mut self) -> Result<u64, DriveError> {
        self.step_vehicle();
        self.frame += 1;
        let frame = self.frame;

        let vehicle_pose = self.vehicle_pose();
        let lidar_pose = vehicle_pose.compose(&self.layout.lidar);
        let cloud = self.sweep(&lidar_pose);
        trace!(frame, points = cloud.len(), "sim lidar sweep");
        self.feeds.lidar.publish(LidarSweep {
            frame,
            pose: lidar_pose,
            cloud,
        })?;

        for (direction, mount) in &self.layout.cameras {
            if let Some(feed) = self.feeds.cameras.get(direction) {
                feed.publish(CameraFrame {
                    frame,
                    direction: *direction,
                    pose: vehicle_pose.compose(mount),
                    image: RgbImage::from_pixel(self.camera.width, self.camera.height, CAMERA_FILL),
                })?;
            }
        }
        Ok(frame)
    }

    fn apply_control(&mut self, control: &ControlCommand) -> Result<(), DriveError> {
        if control.throttle.is_nan() || control.steer.is_nan() || control.brake.is_nan() {
            return Err(DriveError::Actuation {
                vehicle: self.vehicle_id.clone(),
                details: format!("non-finite command {control:?}"),
            });
        }
        self.control = ControlCommand::clamped(control.throttle, control.steer, control.brake);
        Ok(())
    }

    fn vehicle_speed(&self) -> f32 {
        self.speed
    }

    fn vehicle_pose(&self) -> Pose {
        Pose::new(
            Vec3::new(self.x, self.y, self.z),
            Rotation::from_yaw(self.yaw_deg),
        )
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
