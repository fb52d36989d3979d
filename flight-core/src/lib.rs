#![no_std]

// Shared flight-control core for the rotorcraft controller.
//
// Everything here runs on a single execution context without the Rust standard
// library or a heap, so the same scheduling and state-propagation logic backs
// both the MCU firmware and the host-side emulator.

pub mod clock;
pub mod config;
pub mod controller;
pub mod error;
pub mod esc;
pub mod imu;
pub mod mixer;
pub mod scheduler;
pub mod state;
pub mod tasks;
pub mod telemetry;

pub use clock::{ManualClock, Micros, MonotonicClock};
pub use config::{ControllerConfig, default_tasks};
pub use controller::FlightController;
pub use error::SetupError;
pub use esc::{Esc, ReadinessLatch};
pub use imu::Imu;
pub use scheduler::{CatchUpPolicy, Scheduler};
pub use state::{Axes, Demands, VehicleState};
pub use tasks::{FlightTask, Task, TaskKind, TaskStatus};
