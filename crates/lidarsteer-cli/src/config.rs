//! Configuration vault – reads/writes `lidarsteer.toml`.
//!
//! Every section is optional in the file; missing fields take the defaults
//! from [`lidarsteer_types::config`]. `LIDARSTEER_*` environment variables
//! are applied on top by [`load`].

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use lidarsteer_runtime::DriveLoopConfig;
use lidarsteer_types::{
    CameraConfig, ControlMode, DriveError, LidarConfig, OutputConfig, PlannerConfig,
    ProjectionConfig, PursuitConfig, SimulationConfig, SteeringConfig, VehicleConfig,
};
use serde::{Deserialize, Serialize};

/// Default config file, relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "lidarsteer.toml";

/// Obstacle course for the headless simulator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneConfig {
    #[serde(default = "default_pillars")]
    pub pillars: usize,
    /// Metres between consecutive pillars along the spawn heading.
    #[serde(default = "default_spacing")]
    pub spacing: f32,
    /// Alternating lateral offset of the pillars, metres.
    #[serde(default = "default_offset")]
    pub offset: f32,
}

fn default_pillars() -> usize {
    6
}
fn default_spacing() -> f32 {
    15.0
}
fn default_offset() -> f32 {
    2.5
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            pillars: default_pillars(),
            spacing: default_spacing(),
            offset: default_offset(),
        }
    }
}

/// Everything one run needs, as stored in `lidarsteer.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub mode: ControlMode,
    #[serde(default = "default_sensor_timeout_secs")]
    pub sensor_timeout_secs: f32,
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub lidar: LidarConfig,
    #[serde(default)]
    pub projection: ProjectionConfig,
    #[serde(default)]
    pub steering: SteeringConfig,
    #[serde(default)]
    pub planner: PlannerConfig,
    #[serde(default)]
    pub pursuit: PursuitConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub vehicle: VehicleConfig,
    #[serde(default)]
    pub scene: SceneConfig,
}

fn default_sensor_timeout_secs() -> f32 {
    20.0
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: ControlMode::default(),
            sensor_timeout_secs: default_sensor_timeout_secs(),
            simulation: SimulationConfig::default(),
            camera: CameraConfig::default(),
            lidar: LidarConfig::default(),
            projection: ProjectionConfig::default(),
            steering: SteeringConfig::default(),
            planner: PlannerConfig::default(),
            pursuit: PursuitConfig::default(),
            output: OutputConfig::default(),
            vehicle: VehicleConfig::default(),
            scene: SceneConfig::default(),
        }
    }
}

impl Config {
    /// Reject settings the drive loop cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`DriveError::Config`] naming the first offending field.
    pub fn validate(&self) -> Result<(), DriveError> {
        if self.simulation.fps == 0 {
            return Err(DriveError::Config("simulation.fps must be positive".into()));
        }
        if self.camera.width == 0 || self.camera.height == 0 {
            return Err(DriveError::Config(format!(
                "camera resolution {}x{} has a zero dimension",
                self.camera.width, self.camera.height
            )));
        }
        if !(self.camera.fov > 0.0 && self.camera.fov < 180.0) {
            return Err(DriveError::Config(format!(
                "camera.fov {} is outside (0, 180)",
                self.camera.fov
            )));
        }
        if !(self.sensor_timeout_secs.is_finite() && self.sensor_timeout_secs > 0.0) {
            return Err(DriveError::Config(format!(
                "sensor_timeout_secs {} must be a positive number",
                self.sensor_timeout_secs
            )));
        }
        Ok(())
    }

    /// The subset of settings the drive loop consumes.
    pub fn drive_loop_config(&self) -> DriveLoopConfig {
        DriveLoopConfig {
            mode: self.mode,
            simulation: self.simulation.clone(),
            camera: self.camera.clone(),
            projection: self.projection.clone(),
            steering: self.steering.clone(),
            planner: self.planner.clone(),
            pursuit: self.pursuit.clone(),
            sensor_timeout: Duration::from_secs_f32(self.sensor_timeout_secs),
        }
    }
}

/// Load `path` and apply environment overrides. Returns `None` if the file
/// does not exist.
pub fn load(path: &Path) -> Result<Option<Config>, DriveError> {
    let mut cfg = load_from(path)?;
    if let Some(cfg) = cfg.as_mut() {
        apply_env_overrides(cfg);
    }
    Ok(cfg)
}

/// Parse the config at `path` without environment overrides.
pub(crate) fn load_from(path: &Path) -> Result<Option<Config>, DriveError> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path).map_err(|e| {
        DriveError::Config(format!("failed to read config at {}: {e}", path.display()))
    })?;
    let cfg = toml::from_str(&raw)
        .map_err(|e| DriveError::Config(format!("failed to parse {}: {e}", path.display())))?;
    Ok(Some(cfg))
}

/// Apply `LIDARSTEER_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `LIDARSTEER_MODE` | `mode` (`reactive` / `waypoint`) |
/// | `LIDARSTEER_FPS` | `simulation.fps` |
/// | `LIDARSTEER_DURATION` | `simulation.simulation_duration` |
/// | `LIDARSTEER_OUTPUT_DIR` | `output.base_dir` |
/// | `LIDARSTEER_SAVE_IMAGES` | `output.save_images` |
///
/// Values that do not parse are ignored.
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Ok(v) = std::env::var("LIDARSTEER_MODE")
        && let Ok(mode) = v.parse::<ControlMode>()
    {
        cfg.mode = mode;
    }
    if let Ok(v) = std::env::var("LIDARSTEER_FPS")
        && let Ok(fps) = v.trim().parse::<u32>()
    {
        cfg.simulation.fps = fps;
    }
    if let Ok(v) = std::env::var("LIDARSTEER_DURATION")
        && let Ok(secs) = v.trim().parse::<f64>()
    {
        cfg.simulation.simulation_duration = secs;
    }
    if let Ok(v) = std::env::var("LIDARSTEER_OUTPUT_DIR") {
        cfg.output.base_dir = v;
    }
    if let Ok(v) = std::env::var("LIDARSTEER_SAVE_IMAGES")
        && let Ok(save) = v.trim().parse::<bool>()
    {
        cfg.output.save_images = save;
    }
}

/// Save the config to `path`, creating parent directories if necessary.
pub fn save_to(cfg: &Config, path: &Path) -> Result<(), DriveError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| {
            DriveError::Config(format!("failed to create {}: {e}", parent.display()))
        })?;
    }
    let raw = toml::to_string_pretty(cfg)
        .map_err(|e| DriveError::Config(format!("failed to serialize config: {e}")))?;
    fs::write(path, raw).map_err(|e| {
        DriveError::Config(format!("failed to write config at {}: {e}", path.display()))
    })
}

/// `--config` if given, else [`DEFAULT_CONFIG_FILE`].
pub fn config_path(explicit: Option<&Path>) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}
