//! Controller configuration and the static task declaration.

use crate::clock::Micros;
use crate::esc::STARTUP_USEC;
use crate::scheduler::CatchUpPolicy;
use crate::tasks::{ATTITUDE_TASK_HZ, AttitudeTask, FlightTask, RATES_TASK_HZ, RatesTask};

/// Number of entries returned by [`default_tasks`].
pub const DEFAULT_TASK_COUNT: usize = 2;

/// Tunables fixed at controller start.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControllerConfig {
    pub attitude_hz: u32,
    pub rates_hz: u32,
    pub esc_startup_us: Micros,
    pub catch_up: CatchUpPolicy,
}

impl ControllerConfig {
    pub const DEFAULT: Self = Self {
        attitude_hz: ATTITUDE_TASK_HZ,
        rates_hz: RATES_TASK_HZ,
        esc_startup_us: STARTUP_USEC,
        catch_up: CatchUpPolicy::ResetToNow,
    };

    #[must_use]
    pub const fn with_attitude_hz(mut self, rate_hz: u32) -> Self {
        self.attitude_hz = rate_hz;
        self
    }

    #[must_use]
    pub const fn with_rates_hz(mut self, rate_hz: u32) -> Self {
        self.rates_hz = rate_hz;
        self
    }

    #[must_use]
    pub const fn with_esc_startup(mut self, startup_us: Micros) -> Self {
        self.esc_startup_us = startup_us;
        self
    }

    #[must_use]
    pub const fn with_catch_up(mut self, policy: CatchUpPolicy) -> Self {
        self.catch_up = policy;
        self
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Built-in task list in priority order: gyro rates first, then attitude.
#[must_use]
pub const fn default_tasks(config: &ControllerConfig) -> [FlightTask; DEFAULT_TASK_COUNT] {
    [
        FlightTask::Rates(RatesTask::with_rate(config.rates_hz)),
        FlightTask::Attitude(AttitudeTask::with_rate(config.attitude_hz)),
    ]
}
