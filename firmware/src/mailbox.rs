//! Latest-value mailboxes between producers and the control loop.
//!
//! Sensor fusion and the pilot link run outside the loop (interrupts, DMA
//! completions, other executor tasks). Each publishes its newest value into a
//! mailbox; the loop copies it out under a short lock and never waits.

#![cfg_attr(not(target_os = "none"), allow(dead_code))]

use core::cell::Cell;

use embassy_sync::blocking_mutex::Mutex;
use flight_core::{Axes, Demands, Esc, FlightController, Imu, Micros, MonotonicClock};

#[cfg(not(target_os = "none"))]
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
#[cfg(target_os = "none")]
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

#[cfg(target_os = "none")]
type MailboxMutex = CriticalSectionRawMutex;
#[cfg(not(target_os = "none"))]
type MailboxMutex = NoopRawMutex;

/// Holds the most recent value published by a producer.
pub struct Mailbox<T: Copy> {
    slot: Mutex<MailboxMutex, Cell<Option<T>>>,
}

impl<T: Copy> Mailbox<T> {
    pub const fn new() -> Self {
        Self {
            slot: Mutex::new(Cell::new(None)),
        }
    }

    /// Replaces the stored value.
    pub fn publish(&self, value: T) {
        self.slot.lock(|cell| cell.set(Some(value)));
    }

    /// Copies out the stored value without consuming it.
    pub fn latest(&self) -> Option<T> {
        self.slot.lock(Cell::get)
    }

    /// Removes and returns the stored value.
    pub fn take(&self) -> Option<T> {
        self.slot.lock(Cell::take)
    }
}

impl<T: Copy> Default for Mailbox<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// One fused IMU sample.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ImuSnapshot {
    pub timestamp_us: Micros,
    pub orientation: Axes,
    pub rates: Option<Axes>,
}

/// Pilot intent: stick demands, the arm switch and the kill switch.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PilotCommand {
    pub timestamp_us: Micros,
    pub demands: Demands,
    pub armed: bool,
    pub kill: bool,
}

/// Pilot link state seen by one [`apply_pilot`] call.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PilotLink {
    /// Nothing has been received yet; the controller is left untouched.
    Silent,
    /// The last command is older than the allowed age; demands idled and disarmed.
    Stale,
    /// A fresh command was applied.
    Live,
    /// The kill switch is set; the controller is disarmed and the loop must stop.
    Kill,
}

/// [`Imu`] view over a snapshot mailbox that rejects stale samples.
pub struct MailboxImu<'a> {
    mailbox: &'a Mailbox<ImuSnapshot>,
    max_age_us: Micros,
}

impl<'a> MailboxImu<'a> {
    pub const fn new(mailbox: &'a Mailbox<ImuSnapshot>, max_age_us: Micros) -> Self {
        Self {
            mailbox,
            max_age_us,
        }
    }

    fn fresh(&self, now: Micros) -> Option<ImuSnapshot> {
        self.mailbox
            .latest()
            .filter(|snapshot| now.saturating_sub(snapshot.timestamp_us) <= self.max_age_us)
    }
}

impl Imu for MailboxImu<'_> {
    fn orientation(&mut self, now: Micros) -> Option<Axes> {
        self.fresh(now).map(|snapshot| snapshot.orientation)
    }

    fn gyro_rates(&mut self, now: Micros) -> Option<Axes> {
        self.fresh(now).and_then(|snapshot| snapshot.rates)
    }
}

/// Copies the latest pilot command into the controller.
///
/// A command older than `max_age_us` counts as a lost link: demands drop to
/// idle and the vehicle disarms until a fresh command arrives.
pub fn apply_pilot<C, I, E>(
    controller: &mut FlightController<C, I, E>,
    mailbox: &Mailbox<PilotCommand>,
    max_age_us: Micros,
) -> PilotLink
where
    C: MonotonicClock,
    I: Imu,
    E: Esc,
{
    let Some(command) = mailbox.latest() else {
        return PilotLink::Silent;
    };

    let now = controller.clock().now_micros();
    if command.kill {
        controller.set_demands(Demands::IDLE);
        controller.disarm();
        return PilotLink::Kill;
    }
    if now.saturating_sub(command.timestamp_us) > max_age_us {
        controller.set_demands(Demands::IDLE);
        controller.disarm();
        return PilotLink::Stale;
    }

    controller.set_demands(command.demands);
    if command.armed {
        controller.arm();
    } else {
        controller.disarm();
    }
    PilotLink::Live
}
