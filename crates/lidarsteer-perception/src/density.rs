//! Density aggregation across the three camera directions.

use lidarsteer_types::{Direction, DirectionalDensity};

/// Package the three per-camera densities.
pub fn aggregate(front: f32, left: f32, right: f32) -> DirectionalDensity {
    DirectionalDensity::new(front, left, right)
}

/// Aggregate from whatever directions were observed this tick.
///
/// Directions absent from `observed` stay at `0.0`, i.e. "no obstacle":
/// with a reduced camera set the control laws will favour the unobserved
/// side. A direction listed twice keeps its last value.
pub fn aggregate_observed<I>(observed: I) -> DirectionalDensity
where
    I: IntoIterator<Item = (Direction, f32)>,
{
    let mut densities = DirectionalDensity::default();
    for (direction, density) in observed {
        densities.set(direction, density);
    }
    densities
}
