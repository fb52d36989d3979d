//! Periodic units of work driven by the [`Scheduler`](crate::scheduler::Scheduler).
//!
//! A task declares a rate and a `run` step that reads the [`Imu`] and writes
//! its own slice of [`VehicleState`]. The closed set of tasks the controller
//! ships with is [`FlightTask`]; hosts can drive any other [`Task`]
//! implementation through the same scheduler.

use core::fmt;

use crate::clock::Micros;
use crate::imu::Imu;
use crate::state::VehicleState;

pub mod attitude;
pub mod rates;

pub use attitude::{ATTITUDE_TASK_HZ, AttitudeTask};
pub use rates::{RATES_TASK_HZ, RatesTask};

/// Identity tag for a task.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TaskKind {
    Attitude,
    Rates,
    /// Host-defined task outside the built-in set.
    Custom(u8),
}

impl TaskKind {
    const CUSTOM_BASE: u16 = 0x0100;

    /// Compact index used by telemetry encodings. Built-in tasks sit below
    /// `0x100`; custom tags map one-to-one onto `0x100..=0x1ff`.
    #[must_use]
    pub const fn code(self) -> u16 {
        match self {
            TaskKind::Attitude => 0,
            TaskKind::Rates => 1,
            TaskKind::Custom(tag) => Self::CUSTOM_BASE + tag as u16,
        }
    }

    /// Inverse of [`TaskKind::code`].
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn from_code(code: u16) -> Option<Self> {
        match code {
            0 => Some(TaskKind::Attitude),
            1 => Some(TaskKind::Rates),
            value if value >= Self::CUSTOM_BASE && value - Self::CUSTOM_BASE <= 0xff => {
                Some(TaskKind::Custom((value - Self::CUSTOM_BASE) as u8))
            }
            _ => None,
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskKind::Attitude => f.write_str("attitude"),
            TaskKind::Rates => f.write_str("rates"),
            TaskKind::Custom(tag) => write!(f, "custom({tag})"),
        }
    }
}

/// What a task did to [`VehicleState`] on one invocation.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TaskStatus {
    /// Fresh data was written.
    Updated,
    /// No reading was available; the previous values were held.
    Held,
}

/// Capability set `{run}` shared by every periodic task.
pub trait Task {
    /// Identity tag used for reporting.
    fn kind(&self) -> TaskKind;

    /// Desired execution rate in Hz. Must be non-zero.
    fn rate_hz(&self) -> u32;

    /// Executes one bounded, non-blocking step.
    fn run<I>(&mut self, imu: &mut I, vstate: &mut VehicleState, now: Micros) -> TaskStatus
    where
        I: Imu + ?Sized;
}

/// Built-in tasks, dispatched statically.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum FlightTask {
    Attitude(AttitudeTask),
    Rates(RatesTask),
}

impl Task for FlightTask {
    fn kind(&self) -> TaskKind {
        match self {
            FlightTask::Attitude(task) => task.kind(),
            FlightTask::Rates(task) => task.kind(),
        }
    }

    fn rate_hz(&self) -> u32 {
        match self {
            FlightTask::Attitude(task) => task.rate_hz(),
            FlightTask::Rates(task) => task.rate_hz(),
        }
    }

    fn run<I>(&mut self, imu: &mut I, vstate: &mut VehicleState, now: Micros) -> TaskStatus
    where
        I: Imu + ?Sized,
    {
        match self {
            FlightTask::Attitude(task) => task.run(imu, vstate, now),
            FlightTask::Rates(task) => task.run(imu, vstate, now),
        }
    }
}

impl From<AttitudeTask> for FlightTask {
    fn from(task: AttitudeTask) -> Self {
        FlightTask::Attitude(task)
    }
}

impl From<RatesTask> for FlightTask {
    fn from(task: RatesTask) -> Self {
        FlightTask::Rates(task)
    }
}
