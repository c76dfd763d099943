//! JPEG dumps of the projected images.
//!
//! Layout of one run:
//!
//! ```text
//! <base_dir>/<YYYY-mm-dd_HH-MM-SS>/lidar_projection/
//!     front/frame_000000.jpg
//!     left/frame_000000.jpg
//!     right/frame_000000.jpg
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use image::RgbImage;
//! use lidarsteer_runtime::debug_images::ProjectionWriter;
//! use lidarsteer_types::Direction;
//!
//! let writer = ProjectionWriter::create("output", &Direction::ALL).unwrap();
//! let path = writer.write(Direction::Front, 42, &RgbImage::new(800, 600)).unwrap();
//! assert!(path.ends_with("front/frame_000042.jpg"));
//! ```

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use image::RgbImage;
use image::codecs::jpeg::JpegEncoder;
use lidarsteer_types::{Direction, DriveError};
use tracing::{debug, info};

const JPEG_QUALITY: u8 = 90;
const PROJECTION_DIR: &str = "lidar_projection";

/// Writes one JPEG per camera direction per captured tick.
#[derive(Debug, Clone)]
pub struct ProjectionWriter {
    root: PathBuf,
}

impl ProjectionWriter {
    /// Create a fresh timestamped run directory under `base_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`DriveError::ImageWrite`] if a directory cannot be created.
    pub fn create(base_dir: impl AsRef<Path>, directions: &[Direction]) -> Result<Self, DriveError> {
        let stamp = chrono::Local::now().format("%Y-%m-%d_%H-%M-%S").to_string();
        Self::at(base_dir.as_ref().join(stamp), directions)
    }

    /// Use `run_dir` as the run directory (no timestamp is appended).
    ///
    /// # Errors
    ///
    /// Returns [`DriveError::ImageWrite`] if a directory cannot be created.
    pub fn at(run_dir: impl AsRef<Path>, directions: &[Direction]) -> Result<Self, DriveError> {
        let root = run_dir.as_ref().join(PROJECTION_DIR);
        for direction in directions {
            let dir = root.join(direction.as_str());
            fs::create_dir_all(&dir).map_err(|e| image_write_error(&dir, e))?;
        }
        info!(root = %root.display(), "writing projection images");
        Ok(Self { root })
    }

    /// The `lidar_projection` directory of this run.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn frame_path(&self, direction: Direction, frame: u64) -> PathBuf {
        self.root
            .join(direction.as_str())
            .join(format!("frame_{frame:06}.jpg"))
    }

    /// Encode `image` as JPEG at [`frame_path`][Self::frame_path].
    ///
    /// # Errors
    ///
    /// Returns [`DriveError::ImageWrite`] on any I/O or encoding failure.
    pub fn write(&self, direction: Direction, frame: u64, image: &RgbImage) -> Result<PathBuf, DriveError> {
        let path = self.frame_path(direction, frame);
        let file = File::create(&path).map_err(|e| image_write_error(&path, e))?;
        let encoder = JpegEncoder::new_with_quality(BufWriter::new(file), JPEG_QUALITY);
        image
            .write_with_encoder(encoder)
            .map_err(|e| image_write_error(&path, e))?;
        debug!(path = %path.display(), "projection image written");
        Ok(path)
    }
}

fn image_write_error(path: &Path, err: impl std::fmt::Display) -> DriveError {
    DriveError::ImageWrite {
        path: path.display().to_string(),
        details: err.to_string(),
    }
}
