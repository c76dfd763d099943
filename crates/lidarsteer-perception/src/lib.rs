//! `lidarsteer-perception` – geometry and LiDAR-to-camera projection.
//!
//! Turns one LiDAR sweep plus up to three camera images into the
//! per-direction obstacle densities the control laws consume.
//!
//! # Modules
//!
//! - [`transform`] – [`Pose`][transform::Pose]: rigid 4×4 transforms between
//!   sensor, vehicle, world and camera frames.
//! - [`camera`] – [`CameraIntrinsics`][camera::CameraIntrinsics]: pinhole
//!   `K` matrix derived from field of view and image size.
//! - [`pointcloud`] – [`PointCloudFrame`][pointcloud::PointCloudFrame]:
//!   `(x, y, z, intensity)` sweeps and their raw-buffer decoding.
//! - [`colormap`] – shared viridis lookup table for intensity colouring.
//! - [`projection`] – [`project`][projection::project]: projects a sweep into
//!   one camera, filters to the image, scores distance-weighted density and
//!   paints the points onto the image.
//! - [`density`] – [`aggregate`][density::aggregate]: packages the three
//!   camera scores into a [`DirectionalDensity`][lidarsteer_types::DirectionalDensity].

pub mod camera;
pub mod colormap;
pub mod density;
pub mod pointcloud;
pub mod projection;
pub mod transform;

pub use camera::CameraIntrinsics;
pub use pointcloud::{LidarPoint, PointCloudFrame};
pub use projection::{project, ProjectedPoint, Projection};
pub use transform::{Mat4, Pose, Rotation, Vec3};
