//! Attitude estimation hand-off.
//!
//! Copies the IMU's orientation estimate into `phi`, `theta` and `psi`
//! verbatim. Filtering belongs to the IMU collaborator, not this task.

use super::{Task, TaskKind, TaskStatus};
use crate::clock::Micros;
use crate::imu::Imu;
use crate::state::VehicleState;

/// Reference rate for the attitude task.
pub const ATTITUDE_TASK_HZ: u32 = 100;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct AttitudeTask {
    rate_hz: u32,
}

impl AttitudeTask {
    /// Creates the task at [`ATTITUDE_TASK_HZ`].
    #[must_use]
    pub const fn new() -> Self {
        Self::with_rate(ATTITUDE_TASK_HZ)
    }

    #[must_use]
    pub const fn with_rate(rate_hz: u32) -> Self {
        Self { rate_hz }
    }
}

impl Default for AttitudeTask {
    fn default() -> Self {
        Self::new()
    }
}

impl Task for AttitudeTask {
    fn kind(&self) -> TaskKind {
        TaskKind::Attitude
    }

    fn rate_hz(&self) -> u32 {
        self.rate_hz
    }

    fn run<I>(&mut self, imu: &mut I, vstate: &mut VehicleState, now: Micros) -> TaskStatus
    where
        I: Imu + ?Sized,
    {
        match imu.orientation(now) {
            Some(angles) => {
                vstate.set_angles(angles);
                TaskStatus::Updated
            }
            None => TaskStatus::Held,
        }
    }
}
