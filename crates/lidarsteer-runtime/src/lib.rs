//! `lidarsteer-runtime` – the drive loop
//!
//! Wires the simulator boundary (`lidarsteer-hal`) to perception and
//! control and runs them in lock-step with the simulation clock.
//!
//! # Modules
//!
//! - [`drive_loop`] – [`DriveLoop`][drive_loop::DriveLoop]: one
//!   sense → project → decide → act cycle per tick, producing a
//!   [`TickReport`][drive_loop::TickReport] per tick and a
//!   [`RunSummary`][drive_loop::RunSummary] per run.
//! - [`clock`] – [`SimClock`][clock::SimClock]: fixed-step tick counter and
//!   capture schedule.
//! - [`debug_images`] – [`ProjectionWriter`][debug_images::ProjectionWriter]:
//!   timestamped JPEG dumps of the projected camera images.
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing]:
//!   initialises the global `tracing` subscriber with an optional OTLP span
//!   exporter. Logs go to stderr. Set `OTEL_EXPORTER_OTLP_ENDPOINT` to enable
//!   live trace export.

pub mod clock;
pub mod debug_images;
pub mod drive_loop;
pub mod telemetry;

pub use clock::SimClock;
pub use debug_images::ProjectionWriter;
pub use drive_loop::{Decision, DriveLoop, DriveLoopConfig, RunSummary, TickReport};
pub use telemetry::{init_tracing, log_layer, LogFormat, TracerProviderGuard};
