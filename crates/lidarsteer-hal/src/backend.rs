//! [`SimulationBackend`] – the synchronous simulator seen from the drive loop.
//!
//! A backend owns the world and the ego vehicle. On every
//! [`tick`][SimulationBackend::tick] it advances exactly one fixed step and
//! publishes that frame's sensor data into the [`SensorFeeds`][crate::rig::SensorFeeds]
//! it was built with. The rest of the stack only talks to this trait, so a
//! real simulator client and the headless [`SimWorld`][crate::sim::SimWorld]
//! are interchangeable.

use lidarsteer_perception::Pose;
use lidarsteer_types::{ControlCommand, DriveError};

pub trait SimulationBackend {
    /// Stable identifier of the ego vehicle, used in logs and errors.
    fn vehicle_id(&self) -> &str;

    /// Advance the world by one fixed step and return the new frame number.
    ///
    /// # Errors
    ///
    /// Returns [`DriveError::Backend`] if the world cannot be stepped.
    fn tick(&mut self) -> Result<u64, DriveError>;

    /// Queue `control` for the ego vehicle; it takes effect on the next tick.
    ///
    /// # Errors
    ///
    /// Returns [`DriveError::Actuation`] if the vehicle rejects the command.
    fn apply_control(&mut self, control: &ControlCommand) -> Result<(), DriveError>;

    /// Current ego speed, m/s.
    fn vehicle_speed(&self) -> f32;

    /// Current ego pose in the world frame.
    fn vehicle_pose(&self) -> Pose;
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal in-process backend used only for tests.
    struct MockBackend {
        frame: u64,
        last: Option<ControlCommand>,
    }

    impl SimulationBackend for MockBackend {
        fn vehicle_id(&self) -> &str {
            "mock"
        }

        fn tick(&mut self) -> Result<u64, DriveError> {
            self.frame += 1;
            Ok(self.frame)
        }

        fn apply_control(&mut self, control: &ControlCommand) -> Result<(), DriveError> {
            if control.steer.is_nan() {
                return Err(DriveError::Actuation {
                    vehicle: self.vehicle_id().to_string(),
                    details: "NaN steer".to_string(),
                });
            }
            self.last = Some(*control);
            Ok(())
        }

        fn vehicle_speed(&self) -> f32 {
            0.0
        }

        fn vehicle_pose(&self) -> Pose {
            Pose::identity()
        }
    }

    #[test]
    fn mock_backend_ticks_and_records_control() {
        let mut backend = MockBackend {
            frame: 0,
            last: None,
        };
        assert_eq!(backend.tick().unwrap(), 1);
        assert_eq!(backend.tick().unwrap(), 2);

        let cmd = ControlCommand::clamped(0.5, 0.1, 0.0);
        backend.apply_control(&cmd).unwrap();
        assert_eq!(backend.last, Some(cmd));

        let bad = ControlCommand {
            throttle: 0.0,
            steer: f32::NAN,
            brake: 0.0,
        };
        assert!(matches!(
            backend.apply_control(&bad),
            Err(DriveError::Actuation { .. })
        ));
    }
}
