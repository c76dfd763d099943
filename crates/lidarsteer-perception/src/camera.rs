//! Pinhole camera intrinsics.

/// 3×3 intrinsic matrix `K` of an ideal pinhole camera.
///
/// Square pixels (`fx == fy`), principal point at the image centre.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraIntrinsics {
    k: [[f32; 3]; 3],
    width: u32,
    height: u32,
}

impl CameraIntrinsics {
    /// Derive `K` from the horizontal field of view (degrees) and image size.
    ///
    /// `f = width / (2 · tan(fov / 2))`.
    pub fn from_fov(width: u32, height: u32, fov_deg: f32) -> Self {
        let focal = width as f32 / (2.0 * (fov_deg.to_radians() / 2.0).tan());
        Self {
            k: [
                [focal, 0.0, width as f32 / 2.0],
                [0.0, focal, height as f32 / 2.0],
                [0.0, 0.0, 1.0],
            ],
            width,
            height,
        }
    }

    pub fn matrix(&self) -> [[f32; 3]; 3] {
        self.k
    }

    pub fn focal_length(&self) -> f32 {
        self.k[0][0]
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// `K · [x, y, z]ᵀ` for a point already in camera axes (right, down,
    /// forward). Returns the un-normalised `(u', v', w)`.
    pub fn apply(&self, x: f32, y: f32, z: f32) -> (f32, f32, f32) {
        let k = &self.k;
        (
            k[0][0] * x + k[0][1] * y + k[0][2] * z,
            k[1][0] * x + k[1][1] * y + k[1][2] * z,
            k[2][0] * x + k[2][1] * y + k[2][2] * z,
        )
    }
}
