//! LiDAR point cloud frames.

/// One LiDAR return in the sensor's local frame (X forward, Y right, Z up).
///
/// `intensity` is in `[0, 1]`, as delivered by the sensor.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LidarPoint {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub intensity: f32,
}

impl LidarPoint {
    pub fn new(x: f32, y: f32, z: f32, intensity: f32) -> Self {
        Self { x, y, z, intensity }
    }
}

/// One LiDAR sweep. May be empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointCloudFrame {
    pub points: Vec<LidarPoint>,
}

impl PointCloudFrame {
    pub fn new(points: Vec<LidarPoint>) -> Self {
        Self { points }
    }

    /// Parse contiguous `(x, y, z, intensity)` float quadruples.
    ///
    /// A trailing partial quadruple is ignored.
    pub fn from_floats(raw: &[f32]) -> Self {
        Self {
            points: raw
                .chunks_exact(4)
                .map(|c| LidarPoint::new(c[0], c[1], c[2], c[3]))
                .collect(),
        }
    }

    /// Parse a little-endian `f32` byte buffer (16 bytes per point).
    pub fn from_le_bytes(raw: &[u8]) -> Self {
        let floats: Vec<f32> = raw
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        Self::from_floats(&floats)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LidarPoint> {
        self.points.iter()
    }
}

impl FromIterator<LidarPoint> for PointCloudFrame {
    fn from_iter<I: IntoIterator<Item = LidarPoint>>(iter: I) -> Self {
        Self {
            points: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_floats_groups_quadruples() {
        let frame = PointCloudFrame::from_floats(&[1.0, 2.0, 3.0, 0.5, 4.0, 5.0, 6.0, 1.0, 9.0]);
        assert_eq!(frame.len(), 2);
        assert_eq!(frame.points[1], LidarPoint::new(4.0, 5.0, 6.0, 1.0));
    }

    #[test]
    fn from_le_bytes_decodes_points() {
        let mut raw = Vec::new();
        for v in [10.0f32, -1.0, 0.25, 0.9] {
            raw.extend_from_slice(&v.to_le_bytes());
        }
        let frame = PointCloudFrame::from_le_bytes(&raw);
        assert_eq!(frame.points, vec![LidarPoint::new(10.0, -1.0, 0.25, 0.9)]);
    }

    #[test]
    fn empty_buffer_is_empty_frame() {
        assert!(PointCloudFrame::from_floats(&[]).is_empty());
    }
}
