//! LiDAR → camera projection and distance-weighted density scoring.
//!
//! For one LiDAR sweep and one camera, [`project`]:
//!
//! 1. lifts every point from the LiDAR frame to the world
//!    (`lidar_pose.matrix()`) and then into the camera frame
//!    (`camera_pose.inverse_matrix()`);
//! 2. re-axes from sensor convention (forward, right, up) to camera
//!    convention (right, down, forward): `(y, -z, x)`;
//! 3. applies `K` and divides by depth;
//! 4. keeps only points with `0 < u < width`, `0 < v < height`, `depth > 0`;
//! 5. sums a per-point weight: `close_weight_multiplier` below
//!    `close_distance_threshold`, `1.0` otherwise;
//! 6. paints a viridis-coloured square of half-width `dot_extent` per point
//!    onto a copy of the camera image, in point order (later points win).
//!
//! The function is pure: identical inputs give identical outputs.
//!
//! # Example
//!
//! ```rust
//! use image::RgbImage;
//! use lidarsteer_perception::camera::CameraIntrinsics;
//! use lidarsteer_perception::pointcloud::{LidarPoint, PointCloudFrame};
//! use lidarsteer_perception::projection::project;
//! use lidarsteer_perception::transform::Pose;
//! use lidarsteer_types::ProjectionConfig;
//!
//! let k = CameraIntrinsics::from_fov(80, 60, 90.0);
//! let background = RgbImage::new(80, 60);
//! // One point 5 m straight ahead of a LiDAR that sits on the camera.
//! let cloud = PointCloudFrame::new(vec![LidarPoint::new(5.0, 0.0, 0.0, 1.0)]);
//!
//! let out = project(&cloud, &Pose::identity(), &Pose::identity(), &k,
//!                   &ProjectionConfig::default(), &background);
//! assert_eq!(out.visible_points(), 1);
//! assert_eq!(out.weighted_density, 4.0); // closer than 25 m → close weight
//! ```

use image::{Rgb, RgbImage};
use lidarsteer_types::ProjectionConfig;
use tracing::trace;

use crate::camera::CameraIntrinsics;
use crate::colormap::intensity_color;
use crate::pointcloud::PointCloudFrame;
use crate::transform::{Pose, Vec3};

// ────────────────────────────────────────────────────────────────────────────
// Output types
// ────────────────────────────────────────────────────────────────────────────

/// A LiDAR point that landed inside the image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectedPoint {
    /// Horizontal pixel coordinate, `0 < u < width`.
    pub u: f32,
    /// Vertical pixel coordinate, `0 < v < height`.
    pub v: f32,
    /// Distance along the optical axis, `> 0`.
    pub depth: f32,
    /// Intensity colour (RGB).
    pub color: [u8; 3],
}

/// Result of projecting one sweep into one camera.
#[derive(Debug, Clone)]
pub struct Projection {
    /// Camera image with the projected points painted on; same dimensions
    /// as the input image.
    pub image: RgbImage,
    /// Surviving points, in sweep order.
    pub points: Vec<ProjectedPoint>,
    /// Σ weight(depth) over `points`.
    pub weighted_density: f32,
}

impl Projection {
    pub fn visible_points(&self) -> usize {
        self.points.len()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Projection
// ────────────────────────────────────────────────────────────────────────────

/// Obstacle weight of a point at `depth` metres.
pub fn point_weight(depth: f32, config: &ProjectionConfig) -> f32 {
    if depth < config.close_distance_threshold {
        config.close_weight_multiplier
    } else {
        1.0
    }
}

/// Project `cloud` into the camera and score it.
///
/// Bounds come from `intrinsics` (the camera's configured size); painting is
/// additionally clipped to `background`'s dimensions.
pub fn project(
    cloud: &PointCloudFrame,
    lidar_pose: &Pose,
    camera_pose: &Pose,
    intrinsics: &CameraIntrinsics,
    config: &ProjectionConfig,
    background: &RgbImage,
) -> Projection {
    let points = project_points(cloud, lidar_pose, camera_pose, intrinsics);
    let weighted_density = points.iter().map(|p| point_weight(p.depth, config)).sum();

    let mut image = background.clone();
    paint_points(&mut image, &points, config.dot_extent);

    trace!(
        input = cloud.len(),
        visible = points.len(),
        weighted_density,
        "projected sweep"
    );

    Projection {
        image,
        points,
        weighted_density,
    }
}

/// Steps 1–4: transform, re-axis, project and filter.
pub fn project_points(
    cloud: &PointCloudFrame,
    lidar_pose: &Pose,
    camera_pose: &Pose,
    intrinsics: &CameraIntrinsics,
) -> Vec<ProjectedPoint> {
    // LiDAR-local → world → camera-local in a single matrix.
    let lidar_to_camera = camera_pose.inverse_matrix().mul(&lidar_pose.matrix());
    let width = intrinsics.width() as f32;
    let height = intrinsics.height() as f32;

    cloud
        .iter()
        .filter_map(|p| {
            let s = lidar_to_camera.transform_point(Vec3::new(p.x, p.y, p.z));
            // (forward, right, up) → (right, down, forward)
            let (u_h, v_h, w) = intrinsics.apply(s.y, -s.z, s.x);
            let u = u_h / w;
            let v = v_h / w;
            let visible = u > 0.0 && u < width && v > 0.0 && v < height && w > 0.0;
            visible.then(|| ProjectedPoint {
                u,
                v,
                depth: w,
                color: intensity_color(p.intensity),
            })
        })
        .collect()
}

/// Step 6: paint a filled square per point, clipped to the image.
fn paint_points(image: &mut RgbImage, points: &[ProjectedPoint], dot_extent: u32) {
    let (img_w, img_h) = (image.width() as i64, image.height() as i64);
    let r = dot_extent as i64;
    for p in points {
        let (u, v) = (p.u as i64, p.v as i64);
        let (u_min, u_max) = ((u - r).max(0), (u + r + 1).min(img_w));
        let (v_min, v_max) = ((v - r).max(0), (v + r + 1).min(img_h));
        for y in v_min..v_max {
            for x in u_min..u_max {
                image.put_pixel(x as u32, y as u32, Rgb(p.color));
            }
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pointcloud::LidarPoint;
    use crate::transform::Rotation;

    const W: u32 = 80;
    const H: u32 = 60;

    fn setup() -> (CameraIntrinsics, ProjectionConfig, RgbImage) {
        (
            CameraIntrinsics::from_fov(W, H, 90.0),
            ProjectionConfig {
                close_distance_threshold: 25.0,
                close_weight_multiplier: 4.0,
                dot_extent: 2,
            },
            RgbImage::from_pixel(W, H, Rgb([10, 20, 30])),
        )
    }

    fn run(cloud: &PointCloudFrame) -> Projection {
        let (k, cfg, bg) = setup();
        project(cloud, &Pose::identity(), &Pose::identity(), &k, &cfg, &bg)
    }

    #[test]
    fn point_on_axis_lands_at_image_centre() {
        let cloud = PointCloudFrame::new(vec![LidarPoint::new(10.0, 0.0, 0.0, 1.0)]);
        let out = run(&cloud);
        assert_eq!(out.visible_points(), 1);
        let p = out.points[0];
        assert!((p.u - 40.0).abs() < 1e-3);
        assert!((p.v - 30.0).abs() < 1e-3);
        assert!((p.depth - 10.0).abs() < 1e-4);
    }

    #[test]
    fn right_and_up_map_to_image_right_and_top() {
        let cloud = PointCloudFrame::new(vec![
            LidarPoint::new(10.0, 2.0, 0.0, 1.0),
            LidarPoint::new(10.0, 0.0, 2.0, 1.0),
        ]);
        let out = run(&cloud);
        assert_eq!(out.visible_points(), 2);
        assert!(out.points[0].u > 40.0);
        assert!(out.points[1].v < 30.0);
    }

    #[test]
    fn points_outside_frustum_are_dropped() {
        let cloud = PointCloudFrame::new(vec![
            LidarPoint::new(-10.0, 0.0, 0.0, 1.0), // behind
            LidarPoint::new(1.0, 50.0, 0.0, 1.0),  // far right
            LidarPoint::new(1.0, 0.0, -50.0, 1.0), // far below
            LidarPoint::new(0.0, 0.0, 0.0, 1.0),   // zero depth
            LidarPoint::new(8.0, 1.0, 1.0, 1.0),   // visible
        ]);
        let out = run(&cloud);
        assert_eq!(out.visible_points(), 1);
        for p in &out.points {
            assert!(p.u > 0.0 && p.u < W as f32);
            assert!(p.v > 0.0 && p.v < H as f32);
            assert!(p.depth > 0.0);
        }
    }

    #[test]
    fn every_retained_point_is_in_bounds() {
        // Deterministic scatter around the sensor, including points behind
        // and beside the camera.
        let cloud: PointCloudFrame = (0..400)
            .map(|i| {
                let a = i as f32 * 0.37;
                LidarPoint::new(20.0 * a.cos(), 20.0 * a.sin(), (i % 7) as f32 - 3.0, 0.5)
            })
            .collect();
        let out = run(&cloud);
        assert!(out.visible_points() > 0);
        assert!(out.visible_points() < cloud.len());
        for p in &out.points {
            assert!(p.u > 0.0 && p.u < W as f32, "u={}", p.u);
            assert!(p.v > 0.0 && p.v < H as f32, "v={}", p.v);
            assert!(p.depth > 0.0);
        }
    }

    #[test]
    fn empty_cloud_leaves_background_untouched() {
        let (_, _, bg) = setup();
        let out = run(&PointCloudFrame::default());
        assert_eq!(out.visible_points(), 0);
        assert_eq!(out.weighted_density, 0.0);
        assert_eq!(out.image, bg);
    }

    #[test]
    fn close_point_adds_close_weight_minus_one() {
        let far = PointCloudFrame::new(vec![
            LidarPoint::new(40.0, 0.0, 0.0, 1.0),
            LidarPoint::new(30.0, 1.0, 0.0, 1.0),
        ]);
        let near = PointCloudFrame::new(vec![
            LidarPoint::new(40.0, 0.0, 0.0, 1.0),
            LidarPoint::new(10.0, 1.0, 0.0, 1.0),
        ]);
        let d_far = run(&far).weighted_density;
        let d_near = run(&near).weighted_density;
        assert_eq!(d_far, 2.0);
        assert!(d_near >= d_far);
        assert!((d_near - d_far - (4.0 - 1.0)).abs() < 1e-6);
    }

    #[test]
    fn threshold_depth_counts_as_far() {
        let cfg = ProjectionConfig::default();
        assert_eq!(point_weight(25.0, &cfg), 1.0);
        assert_eq!(point_weight(24.99, &cfg), 4.0);
    }

    #[test]
    fn dot_is_square_and_clipped() {
        // Point near the top-left corner: u≈2.5, v≈1.x → dot clipped at 0.
        let (k, cfg, bg) = setup();
        let f = k.focal_length();
        let depth = 10.0;
        let u_target = 2.5;
        let v_target = 1.5;
        let y = (u_target - 40.0) * depth / f;
        let z = -(v_target - 30.0) * depth / f;
        let cloud = PointCloudFrame::new(vec![LidarPoint::new(depth, y, z, 1.0)]);
        let out = project(&cloud, &Pose::identity(), &Pose::identity(), &k, &cfg, &bg);
        assert_eq!(out.visible_points(), 1);

        let color = Rgb(out.points[0].color);
        let painted: Vec<(u32, u32)> = out
            .image
            .enumerate_pixels()
            .filter(|(_, _, px)| **px == color)
            .map(|(x, y, _)| (x, y))
            .collect();
        // u ∈ [0, 5), v ∈ [0, 4) after clipping.
        assert_eq!(painted.len(), 5 * 4);
        assert!(painted.iter().all(|&(x, y)| x < 5 && y < 4));
        assert_eq!(out.image.dimensions(), (W, H));
    }

    #[test]
    fn later_points_overwrite_earlier_ones() {
        let cloud = PointCloudFrame::new(vec![
            LidarPoint::new(10.0, 0.0, 0.0, 1.0), // t = 0 → purple
            LidarPoint::new(10.0, 0.0, 0.0, 0.0), // t = 1 → yellow
        ]);
        let out = run(&cloud);
        assert_eq!(*out.image.get_pixel(40, 30), Rgb(out.points[1].color));
        assert_ne!(out.points[0].color, out.points[1].color);
    }

    #[test]
    fn poses_move_points_between_frames() {
        // LiDAR 2 m above the camera, camera turned 90° right: a point 10 m to
        // the LiDAR's right and 2 m down is straight ahead of the camera.
        let (k, cfg, bg) = setup();
        let lidar = Pose::new(Vec3::new(0.0, 0.0, 2.0), Rotation::identity());
        let camera = Pose::new(Vec3::zero(), Rotation::from_yaw(90.0));
        let cloud = PointCloudFrame::new(vec![LidarPoint::new(0.0, 10.0, -2.0, 1.0)]);
        let out = project(&cloud, &lidar, &camera, &k, &cfg, &bg);
        assert_eq!(out.visible_points(), 1);
        assert!((out.points[0].u - 40.0).abs() < 1e-2);
        assert!((out.points[0].v - 30.0).abs() < 1e-2);
        assert!((out.points[0].depth - 10.0).abs() < 1e-3);
    }

    #[test]
    fn projection_is_deterministic() {
        let cloud: PointCloudFrame = (0..50)
            .map(|i| LidarPoint::new(5.0 + i as f32, (i % 5) as f32 - 2.0, 0.5, 0.9))
            .collect();
        let a = run(&cloud);
        let b = run(&cloud);
        assert_eq!(a.points, b.points);
        assert_eq!(a.image, b.image);
        assert_eq!(a.weighted_density, b.weighted_density);
    }
}
