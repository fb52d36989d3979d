//! Digital-protocol (DShot) actuator with a startup guard.
//!
//! Frame construction and bus timing belong to the [`DshotDriver`]; this type
//! only adds the per-instance readiness latch in front of it.

use super::{Esc, ReadinessLatch};
use crate::clock::Micros;

/// Hardware driver that encodes and transmits DShot frames.
pub trait DshotDriver {
    /// Sends one normalized command per motor.
    fn write(&mut self, motor_values: &[f32]);
}

impl<T> DshotDriver for &mut T
where
    T: DshotDriver + ?Sized,
{
    fn write(&mut self, motor_values: &[f32]) {
        (**self).write(motor_values);
    }
}

pub struct DshotEsc<D> {
    driver: D,
    latch: ReadinessLatch,
}

impl<D> DshotEsc<D>
where
    D: DshotDriver,
{
    /// Wraps `driver` with the default startup interval.
    pub const fn new(driver: D) -> Self {
        Self::with_latch(driver, ReadinessLatch::new())
    }

    pub const fn with_latch(driver: D, latch: ReadinessLatch) -> Self {
        Self { driver, latch }
    }

    pub fn latch(&self) -> &ReadinessLatch {
        &self.latch
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }
}

impl<D> Esc for DshotEsc<D>
where
    D: DshotDriver,
{
    fn write(&mut self, motor_values: &[f32]) {
        self.driver.write(motor_values);
    }

    fn is_ready(&mut self, now: Micros) -> bool {
        self.latch.poll(now)
    }
}
