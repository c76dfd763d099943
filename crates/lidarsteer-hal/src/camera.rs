//! Camera and LiDAR frames as delivered by the simulation backend.

use image::RgbImage;
use lidarsteer_perception::{PointCloudFrame, Pose};
use lidarsteer_types::Direction;

/// Anything tagged with the simulation frame it was captured on.
pub trait Stamped {
    fn frame(&self) -> u64;
}

/// One RGB image from a mounted camera.
#[derive(Debug, Clone)]
pub struct CameraFrame {
    /// Simulation frame the image belongs to.
    pub frame: u64,
    pub direction: Direction,
    /// World pose of the camera at capture time.
    pub pose: Pose,
    pub image: RgbImage,
}

impl Stamped for CameraFrame {
    fn frame(&self) -> u64 {
        self.frame
    }
}

/// One full LiDAR sweep.
#[derive(Debug, Clone)]
pub struct LidarSweep {
    pub frame: u64,
    /// World pose of the LiDAR at capture time.
    pub pose: Pose,
    pub cloud: PointCloudFrame,
}

impl Stamped for LidarSweep {
    fn frame(&self) -> u64 {
        self.frame
    }
}
