//! Electronic speed controller capability and its startup gate.
//!
//! An [`Esc`] accepts one normalized command per motor and reports whether
//! its mandatory post-power-up interval has elapsed. The actuator never
//! clamps or rejects a write; substituting a safe command while it is not
//! ready is the writer's job (see [`OutputStage`](crate::mixer::OutputStage)).

use crate::clock::Micros;

pub mod dshot;

pub use dshot::{DshotDriver, DshotEsc};

/// Time an ESC needs after power-up before it reliably decodes frames.
pub const STARTUP_USEC: Micros = 5_000_000;

/// Capability set `{write, is_ready}` shared by every actuator variant.
pub trait Esc {
    /// Transmits one command per motor. Fire-and-forget: a dropped frame is
    /// corrected by the next tick.
    fn write(&mut self, motor_values: &[f32]);

    /// Returns `true` once the startup interval has elapsed. The transition
    /// latches permanently.
    fn is_ready(&mut self, now: Micros) -> bool;
}

impl<T> Esc for &mut T
where
    T: Esc + ?Sized,
{
    fn write(&mut self, motor_values: &[f32]) {
        (**self).write(motor_values);
    }

    fn is_ready(&mut self, now: Micros) -> bool {
        (**self).is_ready(now)
    }
}

/// Two-state readiness machine.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Readiness {
    NotReady,
    Ready,
}

/// One-shot startup latch owned by a single actuator instance.
///
/// The reference start is the first timestamp the latch is polled with. Once
/// more than `startup_us` has passed since then the latch flips to
/// [`Readiness::Ready`] and stays there without consulting the clock again.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ReadinessLatch {
    startup_us: Micros,
    started_at: Option<Micros>,
    state: Readiness,
}

impl ReadinessLatch {
    /// Creates a latch using [`STARTUP_USEC`].
    #[must_use]
    pub const fn new() -> Self {
        Self::with_startup(STARTUP_USEC)
    }

    #[must_use]
    pub const fn with_startup(startup_us: Micros) -> Self {
        Self {
            startup_us,
            started_at: None,
            state: Readiness::NotReady,
        }
    }

    /// Advances the latch with an observed timestamp and reports readiness.
    pub fn poll(&mut self, now: Micros) -> bool {
        if self.state == Readiness::Ready {
            return true;
        }

        let started_at = *self.started_at.get_or_insert(now);
        if now.saturating_sub(started_at) > self.startup_us {
            self.state = Readiness::Ready;
        }

        self.state == Readiness::Ready
    }

    pub const fn state(&self) -> Readiness {
        self.state
    }

    /// First timestamp observed, if the latch has been polled.
    pub const fn started_at(&self) -> Option<Micros> {
        self.started_at
    }

    pub const fn startup_us(&self) -> Micros {
        self.startup_us
    }
}

impl Default for ReadinessLatch {
    fn default() -> Self {
        Self::new()
    }
}
