//! Failures that abort controller startup before the loop begins.
//!
//! Nothing in the per-tick path returns an error: sensor gaps, an unready
//! actuator and scheduling overruns are all reported as state instead.

use core::fmt;

use crate::tasks::TaskKind;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SetupError {
    /// A task declared a rate of 0 Hz.
    ZeroRate(TaskKind),
    /// The fixed-capacity task list has no free slot.
    TaskListFull { capacity: usize },
    /// The controller was started without any tasks.
    NoTasks,
}

impl fmt::Display for SetupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetupError::ZeroRate(kind) => write!(f, "task `{kind}` declares a zero rate"),
            SetupError::TaskListFull { capacity } => {
                write!(f, "task list is full ({capacity} slots)")
            }
            SetupError::NoTasks => f.write_str("no tasks registered"),
        }
    }
}

impl core::error::Error for SetupError {}
