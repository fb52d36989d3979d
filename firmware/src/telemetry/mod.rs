//! Mirrors the controller's telemetry ring to defmt or the host console.
//!
//! The control loop only ever writes into the in-memory ring. Between ticks
//! the runtime hands the ring to a [`LogCursor`], which emits every record it
//! has not logged yet and notes how many were overwritten before it caught up.

#![cfg_attr(not(target_os = "none"), allow(dead_code))]

use flight_core::SetupError;
use flight_core::telemetry::{EventId, LoopRecord, TelemetryRecorder};

/// Tracks the next telemetry record that still needs logging.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LogCursor {
    next_id: EventId,
}

/// Outcome of a [`LogCursor::flush`] pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FlushSummary {
    pub emitted: usize,
    /// Records overwritten in the ring before they could be logged.
    pub missed: u32,
}

impl LogCursor {
    pub const fn new() -> Self {
        Self { next_id: 0 }
    }

    /// Id of the next record the cursor expects.
    pub const fn next_id(&self) -> EventId {
        self.next_id
    }

    fn is_new(&self, id: EventId) -> bool {
        id.wrapping_sub(self.next_id) < EventId::MAX / 2
    }

    /// Passes each unlogged record to `sink` in chronological order.
    pub fn drain<const CAPACITY: usize>(
        &mut self,
        recorder: &TelemetryRecorder<CAPACITY>,
        mut sink: impl FnMut(&LoopRecord),
    ) -> FlushSummary {
        let mut summary = FlushSummary::default();

        for record in recorder.oldest_first() {
            if !self.is_new(record.id) {
                continue;
            }
            if summary.emitted == 0 {
                summary.missed = record.id.wrapping_sub(self.next_id);
            }
            sink(record);
            summary.emitted += 1;
            self.next_id = record.id.wrapping_add(1);
        }

        summary
    }

    /// Logs every unlogged record.
    pub fn flush<const CAPACITY: usize>(
        &mut self,
        recorder: &TelemetryRecorder<CAPACITY>,
    ) -> FlushSummary {
        let summary = self.drain(recorder, emit_record);
        if summary.missed > 0 {
            emit_missed(summary.missed);
        }
        summary
    }
}

#[cfg(target_os = "none")]
fn emit_record(record: &LoopRecord) {
    match record.lateness_us {
        Some(late) => defmt::info!(
            "telemetry:loop #{} {} t={}us late={}us",
            record.id,
            record.event,
            record.timestamp_us,
            late
        ),
        None => defmt::info!(
            "telemetry:loop #{} {} t={}us",
            record.id,
            record.event,
            record.timestamp_us
        ),
    }
}

#[cfg(not(target_os = "none"))]
fn emit_record(record: &LoopRecord) {
    match record.lateness_us {
        Some(late) => println!(
            "telemetry:loop #{} {} t={}us late={}us",
            record.id, record.event, record.timestamp_us, late
        ),
        None => println!(
            "telemetry:loop #{} {} t={}us",
            record.id, record.event, record.timestamp_us
        ),
    }
}

#[cfg(target_os = "none")]
fn emit_missed(count: u32) {
    defmt::warn!("telemetry:loop {} records overwritten before logging", count);
}

#[cfg(not(target_os = "none"))]
fn emit_missed(count: u32) {
    println!("telemetry:loop {count} records overwritten before logging");
}

/// Reports a controller that could not be assembled.
#[cfg(target_os = "none")]
pub fn log_setup_failed(error: SetupError) {
    defmt::error!("controller: setup failed: {}", error);
}

#[cfg(not(target_os = "none"))]
pub fn log_setup_failed(error: SetupError) {
    println!("controller: setup failed: {error}");
}
