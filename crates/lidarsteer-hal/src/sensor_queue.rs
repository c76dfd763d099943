//! Tick-aligned sensor queues.
//!
//! Sensor callbacks may fire on any thread; each sensor pushes into its own
//! [`SensorFeed`], and the drive loop pulls exactly one item per tick from
//! the matching [`SensorQueue`] with [`SensorQueue::recv_frame`]. Items from
//! earlier frames are discarded; a frame that does not arrive within the
//! bounded wait is a [`DriveError::SensorTimeout`].
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use lidarsteer_hal::camera::Stamped;
//! use lidarsteer_hal::sensor_queue::SensorQueue;
//!
//! struct Tick(u64);
//! impl Stamped for Tick {
//!     fn frame(&self) -> u64 { self.0 }
//! }
//!
//! let (queue, feed) = SensorQueue::new("lidar");
//! feed.publish(Tick(1)).unwrap();
//! feed.publish(Tick(2)).unwrap();
//!
//! // Frame 1 is stale by the time tick 2 is consumed.
//! let item = queue.recv_frame(2, Duration::from_millis(10)).unwrap();
//! assert_eq!(item.0, 2);
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};

use lidarsteer_types::DriveError;
use tracing::debug;

use crate::camera::Stamped;

/// Producer half of a sensor queue. Cheap to clone into callbacks.
#[derive(Debug)]
pub struct SensorFeed<T> {
    sensor: Arc<str>,
    tx: Sender<T>,
}

impl<T> Clone for SensorFeed<T> {
    fn clone(&self) -> Self {
        Self {
            sensor: Arc::clone(&self.sensor),
            tx: self.tx.clone(),
        }
    }
}

impl<T> SensorFeed<T> {
    /// Hand one item to the consumer.
    ///
    /// # Errors
    ///
    /// Returns [`DriveError::SensorDisconnected`] once the queue has been
    /// dropped.
    pub fn publish(&self, item: T) -> Result<(), DriveError> {
        self.tx
            .send(item)
            .map_err(|_| DriveError::SensorDisconnected(self.sensor.to_string()))
    }

    pub fn sensor(&self) -> &str {
        &self.sensor
    }
}

/// Consumer half of a sensor queue.
#[derive(Debug)]
pub struct SensorQueue<T> {
    sensor: Arc<str>,
    rx: Receiver<T>,
}

impl<T: Stamped> SensorQueue<T> {
    /// Create a queue for `sensor` and its producer handle.
    pub fn new(sensor: impl Into<String>) -> (Self, SensorFeed<T>) {
        let sensor: Arc<str> = Arc::from(sensor.into());
        let (tx, rx) = crossbeam_channel::unbounded();
        (
            Self {
                sensor: Arc::clone(&sensor),
                rx,
            },
            SensorFeed { sensor, tx },
        )
    }

    pub fn sensor(&self) -> &str {
        &self.sensor
    }

    /// Block until the item for `frame` arrives, at most `timeout`.
    ///
    /// # Errors
    ///
    /// - [`DriveError::SensorTimeout`] if `frame` did not arrive in time.
    /// - [`DriveError::SensorOutOfSync`] if a later frame arrived first.
    /// - [`DriveError::SensorDisconnected`] if every feed was dropped.
    pub fn recv_frame(&self, frame: u64, timeout: Duration) -> Result<T, DriveError> {
        // One deadline for the whole call, however many stale frames arrive.
        let deadline = Instant::now() + timeout;
        loop {
            match self.rx.recv_deadline(deadline) {
                Ok(item) if item.frame() < frame => {
                    debug!(sensor = %self.sensor, stale = item.frame(), frame, "dropping stale sensor frame");
                }
                Ok(item) if item.frame() == frame => return Ok(item),
                Ok(item) => {
                    return Err(DriveError::SensorOutOfSync {
                        sensor: self.sensor.to_string(),
                        expected: frame,
                        got: item.frame(),
                    });
                }
                Err(RecvTimeoutError::Timeout) => {
                    return Err(DriveError::SensorTimeout {
                        sensor: self.sensor.to_string(),
                        frame,
                        waited_ms: timeout.as_millis() as u64,
                    });
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(DriveError::SensorDisconnected(self.sensor.to_string()));
                }
            }
        }
    }

    /// Discard everything currently buffered. Returns the number dropped.
    pub fn drain(&self) -> usize {
        self.rx.try_iter().count()
    }
}
