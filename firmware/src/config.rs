#![cfg_attr(not(target_os = "none"), allow(dead_code))]

//! Board-level constants for the flight firmware.

use flight_core::{ControllerConfig, Micros};

/// Controller configuration flashed into the board.
pub const CONTROLLER: ControllerConfig = ControllerConfig::DEFAULT;

/// Interval between loop polls. Must stay well below the fastest task period.
pub const LOOP_POLL_US: u64 = 250;

/// IMU samples older than this are treated as a sensor gap.
pub const IMU_MAX_AGE_US: Micros = 20_000;

/// Pilot commands older than this count as a lost link.
pub const PILOT_MAX_AGE_US: Micros = 100_000;

/// Number of polls between telemetry flushes.
pub const TELEMETRY_FLUSH_EVERY: u32 = 400;
