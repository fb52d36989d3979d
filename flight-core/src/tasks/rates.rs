//! Gyro rate hand-off into `dphi`, `dtheta` and `dpsi`.

use super::{Task, TaskKind, TaskStatus};
use crate::clock::Micros;
use crate::imu::Imu;
use crate::state::VehicleState;

/// Default rate for the gyro rate task.
pub const RATES_TASK_HZ: u32 = 500;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct RatesTask {
    rate_hz: u32,
}

impl RatesTask {
    #[must_use]
    pub const fn new() -> Self {
        Self::with_rate(RATES_TASK_HZ)
    }

    #[must_use]
    pub const fn with_rate(rate_hz: u32) -> Self {
        Self { rate_hz }
    }
}

impl Default for RatesTask {
    fn default() -> Self {
        Self::new()
    }
}

impl Task for RatesTask {
    fn kind(&self) -> TaskKind {
        TaskKind::Rates
    }

    fn rate_hz(&self) -> u32 {
        self.rate_hz
    }

    fn run<I>(&mut self, imu: &mut I, vstate: &mut VehicleState, now: Micros) -> TaskStatus
    where
        I: Imu + ?Sized,
    {
        let Some(rates) = imu.gyro_rates(now) else {
            return TaskStatus::Held;
        };
        vstate.set_rates(rates);
        TaskStatus::Updated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imu::StaticImu;
    use crate::state::Axes;

    #[test]
    fn leaves_angles_alone() {
        let mut task = RatesTask::new();
        let mut imu = StaticImu::with_orientation(Axes::new(9.0, 9.0, 9.0));
        imu.set_rates(Some(Axes::new(0.5, 0.25, -0.125)));
        let mut state = VehicleState::new();

        assert_eq!(task.run(&mut imu, &mut state, 0), TaskStatus::Updated);
        assert_eq!(state.rates(), Axes::new(0.5, 0.25, -0.125));
        assert_eq!(state.angles(), Axes::ZERO);
    }

    #[test]
    fn imu_without_gyro_holds() {
        let mut task = RatesTask::new();
        let mut imu = StaticImu::unavailable();
        let mut state = VehicleState::new();
        state.dpsi = 0.75;

        assert_eq!(task.run(&mut imu, &mut state, 0), TaskStatus::Held);
        assert_eq!(state.dpsi, 0.75);
    }
}
