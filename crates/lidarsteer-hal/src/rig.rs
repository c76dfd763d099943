//! Sensor mounting layout and the per-sensor queues of one vehicle.
//!
//! Mount poses are relative to the vehicle origin (X forward, Y right,
//! Z up). The world pose of a sensor is `vehicle_pose.compose(mount)`.

use std::collections::BTreeMap;

use lidarsteer_perception::{Pose, Rotation, Vec3};
use lidarsteer_types::Direction;

use crate::camera::{CameraFrame, LidarSweep};
use crate::sensor_queue::{SensorFeed, SensorQueue};

/// Where each sensor sits on the vehicle.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorLayout {
    pub lidar: Pose,
    pub cameras: BTreeMap<Direction, Pose>,
}

impl SensorLayout {
    /// Roof LiDAR plus front, left and right cameras.
    ///
    /// | Sensor | Location (m) | Yaw |
    /// |---|---|---|
    /// | LiDAR | (0, 0, 2.5) | 0° |
    /// | front | (2.5, 0, 1.0) | 0° |
    /// | left | (0, -1.0, 1.0) | -90° |
    /// | right | (0, 1.0, 1.0) | 90° |
    pub fn standard() -> Self {
        let mut cameras = BTreeMap::new();
        cameras.insert(
            Direction::Front,
            Pose::new(Vec3::new(2.5, 0.0, 1.0), Rotation::from_yaw(0.0)),
        );
        cameras.insert(
            Direction::Left,
            Pose::new(Vec3::new(0.0, -1.0, 1.0), Rotation::from_yaw(-90.0)),
        );
        cameras.insert(
            Direction::Right,
            Pose::new(Vec3::new(0.0, 1.0, 1.0), Rotation::from_yaw(90.0)),
        );
        Self {
            lidar: Pose::new(Vec3::new(0.0, 0.0, 2.5), Rotation::identity()),
            cameras,
        }
    }

    /// Keep only the cameras facing `directions`.
    pub fn with_directions(mut self, directions: &[Direction]) -> Self {
        self.cameras.retain(|d, _| directions.contains(d));
        self
    }

    pub fn directions(&self) -> impl Iterator<Item = Direction> + '_ {
        self.cameras.keys().copied()
    }
}

impl Default for SensorLayout {
    fn default() -> Self {
        Self::standard()
    }
}

/// Consumer side: one queue per mounted sensor.
#[derive(Debug)]
pub struct SensorRig {
    pub lidar: SensorQueue<LidarSweep>,
    pub cameras: BTreeMap<Direction, SensorQueue<CameraFrame>>,
}

/// Producer side handed to the simulation backend.
#[derive(Debug, Clone)]
pub struct SensorFeeds {
    pub lidar: SensorFeed<LidarSweep>,
    pub cameras: BTreeMap<Direction, SensorFeed<CameraFrame>>,
}

impl SensorRig {
    /// Create queues for the LiDAR and every camera in `layout`.
    pub fn for_layout(layout: &SensorLayout) -> (Self, SensorFeeds) {
        let (lidar, lidar_feed) = SensorQueue::new("lidar");
        let mut cameras = BTreeMap::new();
        let mut camera_feeds = BTreeMap::new();
        for direction in layout.directions() {
            let (queue, feed) = SensorQueue::new(format!("camera_{direction}"));
            cameras.insert(direction, queue);
            camera_feeds.insert(direction, feed);
        }
        (
            Self { lidar, cameras },
            SensorFeeds {
                lidar: lidar_feed,
                cameras: camera_feeds,
            },
        )
    }
}
