//! Loop telemetry ring shared by firmware and host targets.
//!
//! The control loop records only notable events (sensor holds, overruns,
//! actuator readiness, arming changes, shutdown) into a fixed-capacity ring
//! so the hot path never allocates. Event kinds map to compact numeric codes
//! for transport over diagnostics links.

use core::fmt;

use heapless::HistoryBuf;

use crate::clock::Micros;
use crate::scheduler::TaskFire;
use crate::tasks::{TaskKind, TaskStatus};

/// Identifier assigned to each telemetry record.
pub type EventId = u32;

/// Total number of telemetry entries retained in memory.
pub const TELEMETRY_RING_CAPACITY: usize = 64;

/// Discriminated loop events.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LoopEventKind {
    SensorHold(TaskKind),
    Overrun(TaskKind),
    EscReady,
    Armed,
    Disarmed,
    Shutdown,
    Custom(u16),
}

impl fmt::Display for LoopEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoopEventKind::SensorHold(kind) => write!(f, "sensor-hold {kind}"),
            LoopEventKind::Overrun(kind) => write!(f, "overrun {kind}"),
            LoopEventKind::EscReady => f.write_str("esc-ready"),
            LoopEventKind::Armed => f.write_str("armed"),
            LoopEventKind::Disarmed => f.write_str("disarmed"),
            LoopEventKind::Shutdown => f.write_str("shutdown"),
            LoopEventKind::Custom(code) => write!(f, "custom({code})"),
        }
    }
}

impl LoopEventKind {
    const ESC_READY_CODE: u16 = 0x0001;
    const ARMED_CODE: u16 = 0x0002;
    const DISARMED_CODE: u16 = 0x0003;
    const SHUTDOWN_CODE: u16 = 0x0004;
    const TASK_SPAN: u16 = 0x0200;
    const SENSOR_HOLD_BASE: u16 = 0x0100;
    const OVERRUN_BASE: u16 = Self::SENSOR_HOLD_BASE + Self::TASK_SPAN;

    /// Encodes the event into a compact transport-friendly discriminant.
    #[must_use]
    pub const fn to_raw(self) -> u16 {
        match self {
            LoopEventKind::SensorHold(kind) => Self::SENSOR_HOLD_BASE + kind.code(),
            LoopEventKind::Overrun(kind) => Self::OVERRUN_BASE + kind.code(),
            LoopEventKind::EscReady => Self::ESC_READY_CODE,
            LoopEventKind::Armed => Self::ARMED_CODE,
            LoopEventKind::Disarmed => Self::DISARMED_CODE,
            LoopEventKind::Shutdown => Self::SHUTDOWN_CODE,
            LoopEventKind::Custom(code) => code,
        }
    }

    /// Decodes a raw discriminant, falling back to [`LoopEventKind::Custom`].
    #[must_use]
    pub fn from_raw(code: u16) -> Self {
        match code {
            Self::ESC_READY_CODE => LoopEventKind::EscReady,
            Self::ARMED_CODE => LoopEventKind::Armed,
            Self::DISARMED_CODE => LoopEventKind::Disarmed,
            Self::SHUTDOWN_CODE => LoopEventKind::Shutdown,
            value if (Self::SENSOR_HOLD_BASE..Self::OVERRUN_BASE).contains(&value) => {
                task_from_offset(value - Self::SENSOR_HOLD_BASE)
                    .map_or(LoopEventKind::Custom(value), LoopEventKind::SensorHold)
            }
            value if (Self::OVERRUN_BASE..Self::OVERRUN_BASE + Self::TASK_SPAN).contains(&value) => {
                task_from_offset(value - Self::OVERRUN_BASE)
                    .map_or(LoopEventKind::Custom(value), LoopEventKind::Overrun)
            }
            other => LoopEventKind::Custom(other),
        }
    }
}

fn task_from_offset(offset: u16) -> Option<TaskKind> {
    TaskKind::from_code(offset)
}

/// Telemetry record stored in the ring buffer.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LoopRecord {
    pub id: EventId,
    pub timestamp_us: Micros,
    pub event: LoopEventKind,
    /// Delay past the ideal deadline for task events.
    pub lateness_us: Option<Micros>,
}

/// Records loop events into a fixed-size ring buffer.
pub struct TelemetryRecorder<const CAPACITY: usize = TELEMETRY_RING_CAPACITY> {
    ring: HistoryBuf<LoopRecord, CAPACITY>,
    next_event_id: EventId,
}

impl<const CAPACITY: usize> TelemetryRecorder<CAPACITY> {
    /// Creates a new telemetry recorder with an empty history.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ring: HistoryBuf::new(),
            next_event_id: 0,
        }
    }

    /// Returns an iterator over the recorded telemetry in chronological order.
    pub fn oldest_first(&self) -> impl Iterator<Item = &LoopRecord> + '_ {
        self.ring.oldest_ordered()
    }

    /// Returns the most recent telemetry record, if available.
    pub fn latest(&self) -> Option<&LoopRecord> {
        self.ring.recent()
    }

    /// Returns the number of records currently stored.
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    /// Returns `true` when no telemetry records are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Records an arbitrary loop event.
    pub fn record(
        &mut self,
        event: LoopEventKind,
        timestamp_us: Micros,
        lateness_us: Option<Micros>,
    ) -> EventId {
        let id = self.next_event_id;
        self.next_event_id = self.next_event_id.wrapping_add(1);

        self.ring.write(LoopRecord {
            id,
            timestamp_us,
            event,
            lateness_us,
        });

        id
    }

    /// Records whatever is notable about a task invocation: an overrun, a
    /// held sensor reading, both, or nothing.
    pub fn record_task_fire(&mut self, fire: &TaskFire, timestamp_us: Micros) {
        if fire.overrun {
            self.record(
                LoopEventKind::Overrun(fire.kind),
                timestamp_us,
                Some(fire.lateness_us),
            );
        }
        if fire.status == TaskStatus::Held {
            self.record(
                LoopEventKind::SensorHold(fire.kind),
                timestamp_us,
                Some(fire.lateness_us),
            );
        }
    }
}

impl<const CAPACITY: usize> Default for TelemetryRecorder<CAPACITY> {
    fn default() -> Self {
        Self::new()
    }
}
