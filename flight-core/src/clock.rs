//! Monotonic microsecond time source consumed by the control loop.

/// Microseconds since an arbitrary, fixed epoch.
pub type Micros = u64;

/// One second expressed in [`Micros`].
pub const MICROS_PER_SECOND: Micros = 1_000_000;

/// Monotonic clock sampled once per control-loop tick.
pub trait MonotonicClock {
    /// Returns the current time in microseconds.
    fn now_micros(&self) -> Micros;
}

impl<C> MonotonicClock for &C
where
    C: MonotonicClock + ?Sized,
{
    fn now_micros(&self) -> Micros {
        (**self).now_micros()
    }
}

/// Synthetic clock advanced explicitly by its owner.
///
/// Used by the emulator and tests to step the loop through simulated time
/// without touching a hardware timer.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct ManualClock {
    now: Micros,
}

impl ManualClock {
    /// Creates a clock reading `start`.
    #[must_use]
    pub const fn starting_at(start: Micros) -> Self {
        Self { now: start }
    }

    /// Moves the clock forward, saturating at [`Micros::MAX`].
    pub fn advance(&mut self, by: Micros) {
        self.now = self.now.saturating_add(by);
    }

    /// Jumps the clock to `now`. Callers are expected to keep it monotonic.
    pub fn set(&mut self, now: Micros) {
        self.now = now;
    }
}

impl MonotonicClock for ManualClock {
    fn now_micros(&self) -> Micros {
        self.now
    }
}

/// Converts a rate in Hz into a period in microseconds.
///
/// Returns `None` for a zero rate.
#[must_use]
pub const fn period_from_hz(rate_hz: u32) -> Option<Micros> {
    if rate_hz == 0 {
        None
    } else {
        Some(MICROS_PER_SECOND / rate_hz as Micros)
    }
}
