//! [`DriveLoop`] – the per-tick sense → project → decide → act cycle.
//!
//! Each [`step`][DriveLoop::step]:
//!
//! 1. **Tick** – advance the [`SimulationBackend`] one fixed step.
//! 2. **Sense** – pull the LiDAR sweep and every mounted camera frame for
//!    that frame number from the [`SensorRig`], waiting at most
//!    [`DriveLoopConfig::sensor_timeout`] per sensor.
//! 3. **Project** – project the sweep into each camera and aggregate the
//!    weighted densities into a [`DirectionalDensity`].
//! 4. **Decide** – run the reactive law or the planner + pure-pursuit path,
//!    depending on [`ControlMode`].
//! 5. **Act** – apply the command to the ego vehicle.
//! 6. **Capture** – on capture ticks, write the projected images as JPEGs.
//!
//! [`run`][DriveLoop::run] repeats this for the configured duration or until
//! the shutdown flag is raised, then brakes the vehicle to a stop.
//!
//! # Example
//!
//! ```rust
//! use std::sync::atomic::AtomicBool;
//! use lidarsteer_hal::sim::{SimScene, SimWorld};
//! use lidarsteer_runtime::drive_loop::{DriveLoop, DriveLoopConfig};
//! use lidarsteer_types::{CameraConfig, SimulationConfig};
//!
//! let config = DriveLoopConfig {
//!     simulation: SimulationConfig { fps: 10, simulation_duration: 0.5, capture_interval: 0.5 },
//!     camera: CameraConfig { width: 64, height: 48, fov: 90.0 },
//!     ..DriveLoopConfig::default()
//! };
//! let (world, rig) = SimWorld::builder()
//!     .simulation(&config.simulation)
//!     .camera(&config.camera)
//!     .scene(SimScene::empty())
//!     .build();
//!
//! let mut drive = DriveLoop::new(world, rig, config);
//! let summary = drive.run(&AtomicBool::new(false)).unwrap();
//! assert_eq!(summary.ticks, 5);
//! ```

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use lidarsteer_control::{
    plan_waypoint, reactive_steer, steering_direction, ControlDiagnostics, TrajectoryController,
    WaypointPlan,
};
use lidarsteer_hal::{SensorRig, SimulationBackend};
use lidarsteer_perception::density::aggregate_observed;
use lidarsteer_perception::{project, CameraIntrinsics};
use lidarsteer_types::{
    CameraConfig, ControlCommand, ControlMode, Direction, DirectionalDensity, DriveError,
    PlannerConfig, ProjectionConfig, PursuitConfig, SimulationConfig, SteeringConfig,
};
use serde::Serialize;
use tracing::{debug, debug_span, info, trace, warn};
use uuid::Uuid;

use crate::clock::SimClock;
use crate::debug_images::ProjectionWriter;

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Bounded wait for a sensor frame; matches the simulator client timeout.
pub const DEFAULT_SENSOR_TIMEOUT: Duration = Duration::from_secs(20);

/// Configuration bundle for [`DriveLoop`].
#[derive(Debug, Clone)]
pub struct DriveLoopConfig {
    pub mode: ControlMode,
    pub simulation: SimulationConfig,
    pub camera: CameraConfig,
    pub projection: ProjectionConfig,
    pub steering: SteeringConfig,
    pub planner: PlannerConfig,
    pub pursuit: PursuitConfig,
    pub sensor_timeout: Duration,
}

impl Default for DriveLoopConfig {
    fn default() -> Self {
        Self {
            mode: ControlMode::default(),
            simulation: SimulationConfig::default(),
            camera: CameraConfig::default(),
            projection: ProjectionConfig::default(),
            steering: SteeringConfig::default(),
            planner: PlannerConfig::default(),
            pursuit: PursuitConfig::default(),
            sensor_timeout: DEFAULT_SENSOR_TIMEOUT,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Reports
// ─────────────────────────────────────────────────────────────────────────────

/// What the active control path decided, with its diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum Decision {
    Reactive { direction: &'static str },
    Waypoint {
        plan: WaypointPlan,
        diagnostics: ControlDiagnostics,
    },
}

/// Outcome of one [`DriveLoop::step`].
#[derive(Debug, Clone, Serialize)]
pub struct TickReport {
    /// Zero-based tick index within the run.
    pub tick: u64,
    /// Simulator frame number.
    pub frame: u64,
    pub densities: DirectionalDensity,
    /// Projected point count per camera.
    pub visible_points: BTreeMap<Direction, usize>,
    pub decision: Decision,
    pub command: ControlCommand,
    /// Ego speed before the command was applied, m/s.
    pub speed: f32,
    pub images_written: usize,
}

/// Totals over a whole [`DriveLoop::run`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub mode: ControlMode,
    pub ticks: u64,
    /// `true` if the shutdown flag ended the run early.
    pub interrupted: bool,
    pub images_written: usize,
    /// Ticks on which the brake was applied.
    pub braking_ticks: u64,
    pub max_abs_steer: f32,
    /// Approximate distance driven, metres.
    pub distance: f32,
    pub final_speed: f32,
}

impl RunSummary {
    fn new(run_id: Uuid, mode: ControlMode) -> Self {
        Self {
            run_id,
            mode,
            ticks: 0,
            interrupted: false,
            images_written: 0,
            braking_ticks: 0,
            max_abs_steer: 0.0,
            distance: 0.0,
            final_speed: 0.0,
        }
    }

    fn record(&mut self, report: &TickReport, dt: f32) {
        self.ticks += 1;
        self.images_written += report.images_written;
        if report.command.brake > 0.0 {
            self.braking_ticks += 1;
        }
        self.max_abs_steer = self.max_abs_steer.max(report.command.steer.abs());
        self.distance += report.speed * dt;
        self.final_speed = report.speed;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// DriveLoop
// ─────────────────────────────────────────────────────────────────────────────

/// Owns the backend, the sensor queues and the controller state for one run.
pub struct DriveLoop<B: SimulationBackend> {
    run_id: Uuid,
    backend: B,
    rig: SensorRig,
    intrinsics: CameraIntrinsics,
    clock: SimClock,
    pursuit: TrajectoryController,
    writer: Option<ProjectionWriter>,
    config: DriveLoopConfig,
}

impl<B: SimulationBackend> DriveLoop<B> {
    pub fn new(backend: B, rig: SensorRig, config: DriveLoopConfig) -> Self {
        let intrinsics =
            CameraIntrinsics::from_fov(config.camera.width, config.camera.height, config.camera.fov);
        Self {
            run_id: Uuid::new_v4(),
            backend,
            rig,
            intrinsics,
            clock: SimClock::new(&config.simulation),
            pursuit: TrajectoryController::new(config.pursuit.clone()),
            writer: None,
            config,
        }
    }

    /// Write projected images on capture ticks.
    pub fn with_image_writer(mut self, writer: ProjectionWriter) -> Self {
        self.writer = Some(writer);
        self
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    /// Run one tick. Returns `Ok(None)` once the configured duration is over.
    ///
    /// # Errors
    ///
    /// Propagates sensor queue faults ([`DriveError::SensorTimeout`],
    /// [`DriveError::SensorOutOfSync`], [`DriveError::SensorDisconnected`])
    /// and backend faults ([`DriveError::Backend`], [`DriveError::Actuation`]).
    /// A failed debug image write is logged and skipped.
    pub fn step(&mut self) -> Result<Option<TickReport>, DriveError> {
        let Some(tick) = self.clock.advance() else {
            return Ok(None);
        };
        let _span = debug_span!("tick", tick).entered();
        let timeout = self.config.sensor_timeout;

        let frame = self.backend.tick()?;
        let sweep = self.rig.lidar.recv_frame(frame, timeout)?;
        let capture = self.writer.is_some() && self.clock.should_capture(tick);

        let mut observed = Vec::with_capacity(self.rig.cameras.len());
        let mut visible_points = BTreeMap::new();
        let mut images_written = 0;
        for (direction, queue) in &self.rig.cameras {
            let camera = queue.recv_frame(frame, timeout)?;
            let projection = project(
                &sweep.cloud,
                &sweep.pose,
                &camera.pose,
                &self.intrinsics,
                &self.config.projection,
                &camera.image,
            );
            trace!(
                %direction,
                points = projection.visible_points(),
                density = projection.weighted_density,
                "camera projected"
            );
            if capture {
                if let Some(writer) = &self.writer {
                    match writer.write(*direction, tick, &projection.image) {
                        Ok(_) => images_written += 1,
                        Err(e) => warn!(error = %e, "skipping projection image"),
                    }
                }
            }
            observed.push((*direction, projection.weighted_density));
            visible_points.insert(*direction, projection.visible_points());
        }
        let densities = aggregate_observed(observed);

        let speed = self.backend.vehicle_speed();
        let (command, decision) = match self.config.mode {
            ControlMode::Reactive => (
                reactive_steer(&densities, &self.config.steering),
                Decision::Reactive {
                    direction: steering_direction(&densities),
                },
            ),
            ControlMode::Waypoint => {
                let plan = plan_waypoint(&densities, &self.config.planner);
                let (command, diagnostics) = self.pursuit.convert(&plan.waypoint, speed);
                (command, Decision::Waypoint { plan, diagnostics })
            }
        };
        self.backend.apply_control(&command)?;

        debug!(
            frame,
            front = densities.front,
            left = densities.left,
            right = densities.right,
            throttle = command.throttle,
            steer = command.steer,
            brake = command.brake,
            speed,
            "tick complete"
        );

        Ok(Some(TickReport {
            tick,
            frame,
            densities,
            visible_points,
            decision,
            command,
            speed,
            images_written,
        }))
    }

    /// Drive until the clock runs out or `shutdown` is raised, then brake.
    ///
    /// # Errors
    ///
    /// Stops at the first error from [`step`][Self::step]; the vehicle is
    /// still sent a brake command before the error is returned.
    pub fn run(&mut self, shutdown: &AtomicBool) -> Result<RunSummary, DriveError> {
        info!(
            run_id = %self.run_id,
            vehicle = self.backend.vehicle_id(),
            mode = %self.config.mode,
            total_ticks = self.clock.total_ticks(),
            "drive loop started"
        );
        let result = self.drive(shutdown);
        if let Err(e) = self.backend.apply_control(&ControlCommand::stop()) {
            warn!(error = %e, "failed to brake at end of run");
        }
        match &result {
            Ok(summary) => info!(
                run_id = %self.run_id,
                ticks = summary.ticks,
                interrupted = summary.interrupted,
                images = summary.images_written,
                distance = summary.distance,
                "drive loop finished"
            ),
            Err(e) => warn!(run_id = %self.run_id, tick = self.clock.tick(), error = %e, "drive loop aborted"),
        }
        result
    }

    fn drive(&mut self, shutdown: &AtomicBool) -> Result<RunSummary, DriveError> {
        let mut summary = RunSummary::new(self.run_id, self.config.mode);
        let dt = self.config.simulation.fixed_delta_seconds();
        let progress_every = u64::from(self.config.simulation.fps.max(1));
        while !shutdown.load(Ordering::Relaxed) {
            let Some(report) = self.step()? else {
                break;
            };
            summary.record(&report, dt);
            if (report.tick + 1) % progress_every == 0 {
                info!(
                    elapsed_s = self.clock.elapsed(),
                    speed = report.speed,
                    steer = report.command.steer,
                    "progress"
                );
            }
        }
        summary.interrupted = !self.clock.is_finished();
        Ok(summary)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use lidarsteer_hal::sim::{Pillar, SimScene, SimWorld};
    use lidarsteer_hal::SensorLayout;
    use lidarsteer_perception::Pose;
    use lidarsteer_types::VehicleConfig;

    fn origin() -> VehicleConfig {
        VehicleConfig {
            spawn_x: 0.0,
            spawn_y: 0.0,
            spawn_z: 0.0,
            spawn_yaw: 0.0,
        }
    }

    fn small_config(mode: ControlMode, ticks: u32) -> DriveLoopConfig {
        DriveLoopConfig {
            mode,
            simulation: SimulationConfig {
                fps: 10,
                simulation_duration: f64::from(ticks) / 10.0,
                capture_interval: 0.2,
            },
            camera: CameraConfig {
                width: 80,
                height: 60,
                fov: 90.0,
            },
            sensor_timeout: Duration::from_millis(200),
            ..DriveLoopConfig::default()
        }
    }

    fn drive_loop(config: &DriveLoopConfig, scene: SimScene) -> DriveLoop<SimWorld> {
        let (world, rig) = SimWorld::builder()
            .simulation(&config.simulation)
            .camera(&config.camera)
            .vehicle(&origin())
            .scene(scene)
            .build();
        DriveLoop::new(world, rig, config.clone())
    }

    #[test]
    fn empty_scene_drives_straight() {
        let config = small_config(ControlMode::Reactive, 3);
        let mut drive = drive_loop(&config, SimScene::empty());
        let report = drive.step().unwrap().unwrap();
        assert_eq!(report.tick, 0);
        assert_eq!(report.frame, 1);
        assert_eq!(report.densities, DirectionalDensity::default());
        assert_eq!(report.command.steer, 0.0);
        assert!((report.command.throttle - 0.3).abs() < 1e-6);
        assert_eq!(
            report.decision,
            Decision::Reactive {
                direction: "STRAIGHT"
            }
        );
    }

    #[test]
    fn obstacle_on_the_left_steers_right() {
        // Pillar 8 m to the left of the car, in the left camera's view only.
        let scene = SimScene::empty().with_pillar(Pillar {
            x: 0.0,
            y: -8.0,
            radius: 1.0,
            height: 3.0,
        });
        let config = small_config(ControlMode::Reactive, 1);
        let mut drive = drive_loop(&config, scene);
        let report = drive.step().unwrap().unwrap();
        assert!(report.densities.left > 0.0);
        assert_eq!(report.densities.right, 0.0);
        assert!(report.visible_points[&Direction::Left] > 0);
        assert!(report.command.steer > 0.0);
    }

    #[test]
    fn waypoint_mode_reports_plan_and_diagnostics() {
        let scene = SimScene::empty().with_pillar(Pillar {
            x: 0.0,
            y: 8.0,
            radius: 1.0,
            height: 3.0,
        });
        let config = small_config(ControlMode::Waypoint, 1);
        let mut drive = drive_loop(&config, scene);
        let report = drive.step().unwrap().unwrap();
        match report.decision {
            Decision::Waypoint { plan, diagnostics } => {
                assert!(plan.lateral_offset < 0.0, "dense right side plans left");
                assert!((plan.waypoint.forward - 10.0).abs() < 1e-6);
                assert_eq!(diagnostics.steer, report.command.steer);
            }
            other => panic!("unexpected decision {other:?}"),
        }
        assert!(report.command.steer < 0.0);
    }

    #[test]
    fn step_returns_none_after_last_tick() {
        let config = small_config(ControlMode::Reactive, 2);
        let mut drive = drive_loop(&config, SimScene::empty());
        assert!(drive.step().unwrap().is_some());
        assert!(drive.step().unwrap().is_some());
        assert!(drive.step().unwrap().is_none());
    }

    #[test]
    fn raised_shutdown_interrupts_and_brakes() {
        let config = small_config(ControlMode::Waypoint, 10);
        let mut drive = drive_loop(&config, SimScene::empty());
        let summary = drive.run(&AtomicBool::new(true)).unwrap();
        assert_eq!(summary.ticks, 0);
        assert!(summary.interrupted);
        assert_eq!(drive.backend().control(), ControlCommand::stop());
    }

    #[test]
    fn full_run_counts_every_tick() {
        let config = small_config(ControlMode::Waypoint, 10);
        let mut drive = drive_loop(&config, SimScene::slalom(&Pose::identity(), 2, 15.0, 2.0));
        let summary = drive.run(&AtomicBool::new(false)).unwrap();
        assert_eq!(summary.ticks, 10);
        assert!(!summary.interrupted);
        assert_eq!(summary.run_id, drive.run_id());
        assert_eq!(summary.images_written, 0);
        assert!(summary.distance > 0.0);
    }

    #[test]
    fn capture_ticks_write_one_image_per_camera() {
        let tmp = tempfile::tempdir().unwrap();
        let config = small_config(ControlMode::Reactive, 4);
        let writer = ProjectionWriter::at(tmp.path(), &Direction::ALL).unwrap();
        let root = writer.root().to_path_buf();
        let mut drive = drive_loop(&config, SimScene::empty()).with_image_writer(writer);
        let summary = drive.run(&AtomicBool::new(false)).unwrap();

        // capture_interval 0.2 s at 10 fps: ticks 0 and 2.
        assert_eq!(summary.images_written, 6);
        assert!(root.join("front/frame_000000.jpg").is_file());
        assert!(root.join("right/frame_000002.jpg").is_file());
        assert!(!root.join("left/frame_000001.jpg").exists());
    }

    #[test]
    fn reduced_layout_leaves_missing_directions_at_zero() {
        let config = small_config(ControlMode::Reactive, 1);
        let layout = SensorLayout::standard().with_directions(&[Direction::Front]);
        let scene = SimScene::empty().with_pillar(Pillar {
            x: 0.0,
            y: -8.0,
            radius: 1.0,
            height: 3.0,
        });
        let (world, rig) = SimWorld::builder()
            .simulation(&config.simulation)
            .camera(&config.camera)
            .vehicle(&origin())
            .layout(layout)
            .scene(scene)
            .build();
        let mut drive = DriveLoop::new(world, rig, config);
        let report = drive.step().unwrap().unwrap();
        assert_eq!(report.visible_points.len(), 1);
        assert_eq!(report.densities.left, 0.0);
    }

    #[test]
    fn lost_sensor_aborts_the_run() {
        let config = small_config(ControlMode::Reactive, 5);
        let (world, rig) = SimWorld::builder()
            .simulation(&config.simulation)
            .camera(&config.camera)
            .build();
        // Queues of another world; the world's own consumers are gone.
        let (_other_world, other_rig) = SimWorld::builder().build();
        drop(rig);
        let mut drive = DriveLoop::new(world, other_rig, config);
        let err = drive.run(&AtomicBool::new(false)).unwrap_err();
        assert!(matches!(err, DriveError::SensorDisconnected(_)));
    }

    #[test]
    fn sensor_frames_are_tick_aligned() {
        let config = small_config(ControlMode::Reactive, 3);
        let (mut world, rig) = SimWorld::builder()
            .simulation(&config.simulation)
            .camera(&config.camera)
            .build();
        // Frames published before the loop starts are stale by its first tick.
        world.tick().unwrap();
        let mut drive = DriveLoop::new(world, rig, config);
        let report = drive.step().unwrap().unwrap();
        assert_eq!(report.frame, 2);
        assert_eq!(drive.rig.lidar.drain(), 0);
    }
}
