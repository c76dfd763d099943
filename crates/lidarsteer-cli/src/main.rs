//! `lidarsteer` – run the LiDAR-projection obstacle-avoidance controller.
//!
//! This binary:
//!
//! 1. Loads `lidarsteer.toml` (or `--config <path>`), applies `LIDARSTEER_*`
//!    overrides and command-line flags, and validates the result.
//! 2. Spawns the ego vehicle in the headless simulator with a slalom of
//!    pillars ahead of it.
//! 3. Runs the drive loop for the configured duration, writing projection
//!    JPEGs if enabled.
//! 4. Intercepts **Ctrl-C** to stop the loop, brake, and print the summary.

mod config;

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use colored::Colorize;
use lidarsteer_hal::sim::{SimScene, SimWorld};
use lidarsteer_hal::SensorLayout;
use lidarsteer_perception::{Pose, Rotation, Vec3};
use lidarsteer_runtime::{init_tracing, DriveLoop, ProjectionWriter, RunSummary};
use lidarsteer_types::{ControlMode, DriveError};
use tracing::{info, warn};

use crate::config::Config;

fn main() -> ExitCode {
    let args = Args::parse();

    // Hold the guard until exit so pending spans are flushed.
    let _telemetry = init_tracing("lidarsteer");

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {e}", "error".red().bold());
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), DriveError> {
    let path = config::config_path(args.config.as_deref());

    if args.init {
        config::save_to(&Config::default(), &path)?;
        println!(
            "  {} Default config written to {}",
            "✓".green().bold(),
            path.display().to_string().bold()
        );
        return Ok(());
    }

    let mut cfg = match config::load(&path)? {
        Some(cfg) => {
            info!(path = %path.display(), "config loaded");
            cfg
        }
        None => {
            info!(path = %path.display(), "no config file; using defaults");
            let mut cfg = Config::default();
            config::apply_env_overrides(&mut cfg);
            cfg
        }
    };
    args.apply(&mut cfg);
    cfg.validate()?;

    // With --json, stdout carries the summary document and nothing else.
    if !args.json {
        print_banner(&cfg);
    }

    // ── Shared shutdown flag ──────────────────────────────────────────────
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_clone = Arc::clone(&shutdown);
    if let Err(e) = ctrlc::set_handler(move || {
        eprintln!();
        eprintln!("{}", "⚠  Ctrl-C received – stopping after this tick …".yellow().bold());
        shutdown_clone.store(true, Ordering::SeqCst);
    }) {
        warn!(error = %e, "failed to install Ctrl-C handler; the run can only end by timeout");
    }

    // ── World ─────────────────────────────────────────────────────────────
    let spawn = Pose::new(
        Vec3::new(cfg.vehicle.spawn_x, cfg.vehicle.spawn_y, 0.0),
        Rotation::from_yaw(cfg.vehicle.spawn_yaw),
    );
    let scene = SimScene::slalom(&spawn, cfg.scene.pillars, cfg.scene.spacing, cfg.scene.offset);
    let layout = SensorLayout::standard();
    let directions: Vec<_> = layout.directions().collect();
    let (world, rig) = SimWorld::builder()
        .simulation(&cfg.simulation)
        .vehicle(&cfg.vehicle)
        .lidar(&cfg.lidar)
        .camera(&cfg.camera)
        .layout(layout)
        .scene(scene)
        .build();

    let mut drive = DriveLoop::new(world, rig, cfg.drive_loop_config());
    if cfg.output.save_images {
        let writer = ProjectionWriter::create(&cfg.output.base_dir, &directions)?;
        info!(root = %writer.root().display(), "writing projection images");
        if !args.json {
            println!(
                "  Projection images → {}",
                writer.root().display().to_string().dimmed()
            );
        }
        drive = drive.with_image_writer(writer);
    }
    if !args.json {
        println!();
    }

    let summary = drive.run(&shutdown)?;
    let mut stdout = std::io::stdout().lock();
    if let Err(e) = write_summary(&mut stdout, &summary, args.json) {
        warn!(error = %e, "failed to write run summary");
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Arguments
// ─────────────────────────────────────────────────────────────────────────────

/// LiDAR-to-camera projection obstacle avoidance in a headless simulator.
#[derive(Parser, Debug)]
#[command(name = "lidarsteer", version, about, long_about = None)]
struct Args {
    /// Config file (default: lidarsteer.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Control path: reactive | waypoint
    #[arg(short, long, value_parser = clap::value_parser!(ControlMode))]
    mode: Option<ControlMode>,

    /// Simulated seconds to drive
    #[arg(short, long, value_name = "SECS")]
    duration: Option<f64>,

    /// Do not write projection JPEGs
    #[arg(long)]
    no_images: bool,

    /// Print the run summary as JSON on stdout
    #[arg(long)]
    json: bool,

    /// Write a default config file and exit
    #[arg(long)]
    init: bool,
}

impl Args {
    /// Command-line flags win over the file and the environment.
    fn apply(&self, cfg: &mut Config) {
        if let Some(mode) = self.mode {
            cfg.mode = mode;
        }
        if let Some(secs) = self.duration {
            cfg.simulation.simulation_duration = secs;
        }
        if self.no_images {
            cfg.output.save_images = false;
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Output
// ─────────────────────────────────────────────────────────────────────────────

fn print_banner(cfg: &Config) {
    println!();
    println!(
        "  {} {}",
        "lidarsteer".bold().cyan(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!("  LiDAR-to-camera projection obstacle avoidance");
    println!();
    println!("  Mode      {}", cfg.mode.to_string().bold());
    println!(
        "  Duration  {}s at {} fps ({} ticks)",
        cfg.simulation.simulation_duration,
        cfg.simulation.fps,
        cfg.simulation.total_ticks()
    );
    println!(
        "  Cameras   {}x{} @ {}°",
        cfg.camera.width, cfg.camera.height, cfg.camera.fov
    );
}

/// Writes the end-of-run summary, either as pretty JSON or as a short table.
///
/// With `json` set the output is exactly one JSON document; logs never share
/// this stream.
fn write_summary(out: &mut impl Write, summary: &RunSummary, json: bool) -> io::Result<()> {
    if json {
        serde_json::to_writer_pretty(&mut *out, summary)?;
        return writeln!(out);
    }
    let status = if summary.interrupted {
        "interrupted".yellow().bold()
    } else {
        "complete".green().bold()
    };
    writeln!(out)?;
    writeln!(out, "  Run {} {}", summary.run_id.to_string().dimmed(), status)?;
    writeln!(out, "    Ticks          {}", summary.ticks)?;
    writeln!(out, "    Distance       {:.1} m", summary.distance)?;
    writeln!(out, "    Final speed    {:.1} m/s", summary.final_speed)?;
    writeln!(out, "    Max |steer|    {:.2}", summary.max_abs_steer)?;
    writeln!(out, "    Braking ticks  {}", summary.braking_ticks)?;
    writeln!(out, "    Images         {}", summary.images_written)?;
    writeln!(out)
}
