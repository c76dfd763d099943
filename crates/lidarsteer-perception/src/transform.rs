//! Rigid-body transforms between sensor, vehicle, world and camera frames.
//!
//! Frames follow the simulator convention: X forward, Y right, Z up
//! (left-handed), rotations given as pitch/yaw/roll in degrees. A [`Pose`]
//! stores its homogeneous 4×4 matrix; the inverse is the closed-form rigid
//! inverse, never a general matrix inversion.
//!
//! # Example
//!
//! ```rust
//! use lidarsteer_perception::transform::{Pose, Rotation, Vec3};
//!
//! // Vehicle 10 m along world X, turned 90° to the right.
//! let vehicle = Pose::new(Vec3::new(10.0, 0.0, 0.0), Rotation::new(0.0, 90.0, 0.0));
//! // Camera mounted 2.5 m ahead of the vehicle origin.
//! let mount = Pose::new(Vec3::new(2.5, 0.0, 0.0), Rotation::identity());
//!
//! let camera = vehicle.compose(&mount);
//! let at = camera.location();
//! assert!((at.x - 10.0).abs() < 1e-4);
//! assert!((at.y - 2.5).abs() < 1e-4);
//! ```

// ────────────────────────────────────────────────────────────────────────────
// Primitive types
// ────────────────────────────────────────────────────────────────────────────

/// A 3-D vector or point.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// The zero vector.
    pub fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    pub fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }

    pub fn norm(self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

/// Euler rotation in degrees, applied roll → pitch → yaw.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rotation {
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
}

impl Rotation {
    pub fn new(pitch: f32, yaw: f32, roll: f32) -> Self {
        Self { pitch, yaw, roll }
    }

    /// No rotation.
    pub fn identity() -> Self {
        Self::default()
    }

    /// Heading-only rotation.
    pub fn from_yaw(yaw: f32) -> Self {
        Self::new(0.0, yaw, 0.0)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Mat4
// ────────────────────────────────────────────────────────────────────────────

/// Row-major homogeneous 4×4 matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat4(pub [[f32; 4]; 4]);

impl Mat4 {
    pub fn identity() -> Self {
        Self([
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// Matrix product `self · rhs`.
    pub fn mul(&self, rhs: &Self) -> Self {
        let a = &self.0;
        let b = &rhs.0;
        let mut out = [[0.0f32; 4]; 4];
        for (i, row) in out.iter_mut().enumerate() {
            for (j, cell) in row.iter_mut().enumerate() {
                *cell = (0..4).map(|k| a[i][k] * b[k][j]).sum();
            }
        }
        Self(out)
    }

    /// Apply to the homogeneous point `[p, 1]` and drop the last row.
    ///
    /// Only valid for affine matrices (bottom row `0 0 0 1`), which is all
    /// this module ever builds.
    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        let m = &self.0;
        Vec3::new(
            m[0][0] * p.x + m[0][1] * p.y + m[0][2] * p.z + m[0][3],
            m[1][0] * p.x + m[1][1] * p.y + m[1][2] * p.z + m[1][3],
            m[2][0] * p.x + m[2][1] * p.y + m[2][2] * p.z + m[2][3],
        )
    }

    /// Inverse of a rigid transform: `[Rᵀ | -Rᵀt]`.
    pub fn rigid_inverse(&self) -> Self {
        let m = &self.0;
        let mut out = Mat4::identity().0;
        for i in 0..3 {
            for j in 0..3 {
                out[i][j] = m[j][i];
            }
        }
        for i in 0..3 {
            out[i][3] = -(out[i][0] * m[0][3] + out[i][1] * m[1][3] + out[i][2] * m[2][3]);
        }
        Self(out)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Pose
// ────────────────────────────────────────────────────────────────────────────

/// A rigid placement of a frame (sensor, vehicle) in its parent frame.
///
/// To map a point expressed in this frame into the parent frame use
/// [`Pose::matrix`]; the reverse direction is [`Pose::inverse_matrix`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    matrix: Mat4,
}

impl Pose {
    /// Build a pose from a location and rotation.
    pub fn new(location: Vec3, rotation: Rotation) -> Self {
        let (sp, cp) = rotation.pitch.to_radians().sin_cos();
        let (sy, cy) = rotation.yaw.to_radians().sin_cos();
        let (sr, cr) = rotation.roll.to_radians().sin_cos();
        Self {
            matrix: Mat4([
                [cp * cy, cy * sp * sr - sy * cr, -cy * sp * cr - sy * sr, location.x],
                [cp * sy, sy * sp * sr + cy * cr, -sy * sp * cr + cy * sr, location.y],
                [sp, -cp * sr, cp * cr, location.z],
                [0.0, 0.0, 0.0, 1.0],
            ]),
        }
    }

    /// The identity pose (coincident with the parent frame).
    pub fn identity() -> Self {
        Self {
            matrix: Mat4::identity(),
        }
    }

    /// Local → parent matrix.
    pub fn matrix(&self) -> Mat4 {
        self.matrix
    }

    /// Parent → local matrix.
    pub fn inverse_matrix(&self) -> Mat4 {
        self.matrix.rigid_inverse()
    }

    /// Compose two poses: `self` is the parent, `child` is expressed in it.
    ///
    /// If `self` = T_world_vehicle and `child` = T_vehicle_sensor, the result
    /// is T_world_sensor.
    pub fn compose(&self, child: &Pose) -> Pose {
        Pose {
            matrix: self.matrix.mul(&child.matrix),
        }
    }

    /// Origin of this frame in the parent frame.
    pub fn location(&self) -> Vec3 {
        let m = &self.matrix.0;
        Vec3::new(m[0][3], m[1][3], m[2][3])
    }

    /// Heading in degrees, recovered from the rotation matrix.
    pub fn yaw(&self) -> f32 {
        let m = &self.matrix.0;
        m[1][0].atan2(m[0][0]).to_degrees()
    }

    /// Map a point from this frame into the parent frame.
    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        self.matrix.transform_point(p)
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
