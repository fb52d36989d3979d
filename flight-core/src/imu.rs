//! Inertial sensing capability consumed by the estimation tasks.
//!
//! The IMU and its fusion filter live outside the core. Implementations must
//! hand the control loop an already-synchronized snapshot without blocking;
//! any interrupt or DMA coordination happens behind this trait.

use crate::clock::Micros;
use crate::state::Axes;

/// Time-stamped orientation source.
pub trait Imu {
    /// Returns the Euler angle triple (roll, pitch, yaw) in radians, or
    /// `None` when no fresh reading is available at `now`.
    fn orientation(&mut self, now: Micros) -> Option<Axes>;

    /// Returns body angular rates in rad/s, or `None` when unavailable.
    fn gyro_rates(&mut self, now: Micros) -> Option<Axes> {
        let _ = now;
        None
    }
}

impl<T> Imu for &mut T
where
    T: Imu + ?Sized,
{
    fn orientation(&mut self, now: Micros) -> Option<Axes> {
        (**self).orientation(now)
    }

    fn gyro_rates(&mut self, now: Micros) -> Option<Axes> {
        (**self).gyro_rates(now)
    }
}

/// IMU that reports fixed readings until told otherwise.
///
/// Handy for bench bring-up with the sensor unplugged and for host tests.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct StaticImu {
    orientation: Option<Axes>,
    rates: Option<Axes>,
}

impl StaticImu {
    /// Creates an IMU with no reading available.
    #[must_use]
    pub const fn unavailable() -> Self {
        Self {
            orientation: None,
            rates: None,
        }
    }

    /// Creates an IMU that always reports `orientation`.
    #[must_use]
    pub const fn with_orientation(orientation: Axes) -> Self {
        Self {
            orientation: Some(orientation),
            rates: None,
        }
    }

    /// Sets (or clears) the reported orientation.
    pub fn set_orientation(&mut self, orientation: Option<Axes>) {
        self.orientation = orientation;
    }

    /// Sets (or clears) the reported gyro rates.
    pub fn set_rates(&mut self, rates: Option<Axes>) {
        self.rates = rates;
    }
}

impl Imu for StaticImu {
    fn orientation(&mut self, _: Micros) -> Option<Axes> {
        self.orientation
    }

    fn gyro_rates(&mut self, _: Micros) -> Option<Axes> {
        self.rates
    }
}
