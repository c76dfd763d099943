//! Fixed-step simulation clock.
//!
//! Counts ticks up to [`SimulationConfig::total_ticks`] and decides which
//! ticks are capture ticks for debug image output.

use lidarsteer_types::SimulationConfig;

#[derive(Debug, Clone)]
pub struct SimClock {
    tick: u64,
    total_ticks: u64,
    capture_every: u64,
    dt: f32,
}

impl SimClock {
    pub fn new(config: &SimulationConfig) -> Self {
        Self {
            tick: 0,
            total_ticks: config.total_ticks(),
            capture_every: config.capture_interval_ticks(),
            dt: config.fixed_delta_seconds(),
        }
    }

    /// Ticks completed so far.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn total_ticks(&self) -> u64 {
        self.total_ticks
    }

    /// Simulated seconds elapsed.
    pub fn elapsed(&self) -> f32 {
        self.tick as f32 * self.dt
    }

    pub fn is_finished(&self) -> bool {
        self.tick >= self.total_ticks
    }

    /// Count one tick and return its zero-based index, or `None` once the
    /// run is over.
    pub fn advance(&mut self) -> Option<u64> {
        if self.is_finished() {
            return None;
        }
        let index = self.tick;
        self.tick += 1;
        Some(index)
    }

    /// `true` on every `capture_interval_ticks`-th tick, starting at 0.
    pub fn should_capture(&self, tick: u64) -> bool {
        tick % self.capture_every == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(fps: u32, duration: f64, capture: f64) -> SimulationConfig {
        SimulationConfig {
            fps,
            simulation_duration: duration,
            capture_interval: capture,
        }
    }

    #[test]
    fn runs_exactly_total_ticks() {
        let mut clock = SimClock::new(&config(20, 1.0, 0.5));
        let ticks: Vec<u64> = std::iter::from_fn(|| clock.advance()).collect();
        assert_eq!(ticks.len(), 20);
        assert_eq!(ticks.first(), Some(&0));
        assert_eq!(ticks.last(), Some(&19));
        assert!(clock.is_finished());
        assert!((clock.elapsed() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn captures_on_interval() {
        let clock = SimClock::new(&config(20, 30.0, 0.5));
        let captured: Vec<u64> = (0..30).filter(|t| clock.should_capture(*t)).collect();
        assert_eq!(captured, vec![0, 10, 20]);
    }

    #[test]
    fn short_interval_captures_every_tick() {
        let clock = SimClock::new(&config(10, 1.0, 0.01));
        assert!((0..10).all(|t| clock.should_capture(t)));
    }

    #[test]
    fn zero_duration_never_ticks() {
        let mut clock = SimClock::new(&config(20, 0.0, 0.5));
        assert_eq!(clock.total_ticks(), 0);
        assert_eq!(clock.advance(), None);
    }
}
