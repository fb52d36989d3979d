use std::ops::Range;

use flight_core::esc::{DshotDriver, DshotEsc};
use flight_core::mixer::{OutputGate, QUAD_MOTORS};
use flight_core::scheduler::TaskStats;
use flight_core::telemetry::LoopRecord;
use flight_core::{
    Axes, ControllerConfig, Demands, FlightController, Imu, ManualClock, Micros, MonotonicClock,
    ReadinessLatch, SetupError, TaskKind,
};

const MICROS_PER_SECOND: Micros = 1_000_000;

/// Parameters for one emulated flight.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SimulationOptions {
    pub duration_us: Micros,
    pub loop_us: Micros,
    /// Stall every n-th poll by `stall_us`.
    pub stall_every: Option<u32>,
    pub stall_us: Micros,
    /// Time at which the pilot arms and raises throttle.
    pub arm_at_us: Micros,
    pub dropout: Option<Range<Micros>>,
    pub config: ControllerConfig,
}

impl Default for SimulationOptions {
    fn default() -> Self {
        Self {
            duration_us: 8 * MICROS_PER_SECOND,
            loop_us: 100,
            stall_every: None,
            stall_us: 12_000,
            arm_at_us: 6 * MICROS_PER_SECOND,
            dropout: Some(2_000_000..2_050_000),
            config: ControllerConfig::DEFAULT,
        }
    }
}

/// IMU following a slow oscillation, with an optional dropout window.
#[derive(Clone, Debug, Default)]
pub struct SimulatedImu {
    dropout: Option<Range<Micros>>,
    orientation_reads: u64,
}

impl SimulatedImu {
    pub fn new(dropout: Option<Range<Micros>>) -> Self {
        Self {
            dropout,
            orientation_reads: 0,
        }
    }

    pub fn orientation_reads(&self) -> u64 {
        self.orientation_reads
    }

    fn available(&self, now: Micros) -> bool {
        self.dropout
            .as_ref()
            .is_none_or(|window| !window.contains(&now))
    }

    #[allow(clippy::cast_precision_loss)]
    fn seconds(now: Micros) -> f32 {
        now as f32 / MICROS_PER_SECOND as f32
    }
}

impl Imu for SimulatedImu {
    fn orientation(&mut self, now: Micros) -> Option<Axes> {
        self.orientation_reads += 1;
        if !self.available(now) {
            return None;
        }
        let t = Self::seconds(now);
        Some(Axes::new(
            0.20 * (1.5 * t).sin(),
            0.10 * (0.8 * t).cos(),
            (0.3 * t) % core::f32::consts::TAU,
        ))
    }

    fn gyro_rates(&mut self, now: Micros) -> Option<Axes> {
        if !self.available(now) {
            return None;
        }
        let t = Self::seconds(now);
        Some(Axes::new(
            0.30 * (1.5 * t).cos(),
            -0.08 * (0.8 * t).sin(),
            0.3,
        ))
    }
}

/// Counts what reached the motor outputs.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RecordingDriver {
    pub writes: u64,
    pub zero_writes: u64,
    pub peak: [f32; QUAD_MOTORS],
    pub last: [f32; QUAD_MOTORS],
}

impl DshotDriver for RecordingDriver {
    fn write(&mut self, values: &[f32]) {
        self.writes += 1;
        if values.iter().all(|value| *value == 0.0) {
            self.zero_writes += 1;
        }
        for ((last, peak), value) in self.last.iter_mut().zip(&mut self.peak).zip(values) {
            *last = *value;
            *peak = peak.max(*value);
        }
    }
}

pub type SimController = FlightController<ManualClock, SimulatedImu, DshotEsc<RecordingDriver>>;

/// Per-task statistics captured at the end of a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TaskSummary {
    pub kind: TaskKind,
    pub period_us: Micros,
    pub stats: TaskStats,
}

/// Everything the emulator prints after a run.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationReport {
    pub elapsed_us: Micros,
    pub polls: u64,
    pub stalls: u64,
    pub tasks: Vec<TaskSummary>,
    pub imu_orientation_reads: u64,
    pub gated_not_ready: u64,
    pub gated_disarmed: u64,
    pub live_ticks: u64,
    pub actuator: RecordingDriver,
    pub final_attitude: Axes,
    pub telemetry: Vec<LoopRecord>,
}

pub struct Simulation {
    options: SimulationOptions,
    controller: SimController,
}

impl Simulation {
    pub fn new(options: SimulationOptions) -> Result<Self, SetupError> {
        let esc = DshotEsc::with_latch(
            RecordingDriver::default(),
            ReadinessLatch::with_startup(options.config.esc_startup_us),
        );
        let controller = FlightController::with_config(
            ManualClock::starting_at(0),
            SimulatedImu::new(options.dropout.clone()),
            esc,
            &options.config,
        )?;

        Ok(Self {
            options,
            controller,
        })
    }

    /// Polls the controller until the configured duration has elapsed.
    pub fn run(mut self) -> SimulationReport {
        let mut polls = 0_u64;
        let mut stalls = 0_u64;
        let mut gated_not_ready = 0_u64;
        let mut gated_disarmed = 0_u64;
        let mut live_ticks = 0_u64;

        while self.controller.clock().now_micros() < self.options.duration_us {
            let now = self.controller.clock().now_micros();
            if now >= self.options.arm_at_us && !self.controller.is_armed() {
                self.controller.set_demands(Demands::new(0.5, 0.05, -0.02, 0.0));
                self.controller.arm();
            }

            let report = self.controller.poll();
            match report.output.gate {
                OutputGate::NotReady => gated_not_ready += 1,
                OutputGate::Disarmed => gated_disarmed += 1,
                OutputGate::Live => live_ticks += 1,
            }
            polls += 1;

            let mut advance = self.options.loop_us;
            if let Some(every) = self.options.stall_every
                && every > 0
                && polls % u64::from(every) == 0
            {
                advance = advance.saturating_add(self.options.stall_us);
                stalls += 1;
            }
            self.controller.clock_mut().advance(advance);
        }

        self.controller.shutdown();

        let tasks = self
            .controller
            .scheduler()
            .slots()
            .iter()
            .map(|slot| TaskSummary {
                kind: slot.kind(),
                period_us: slot.period_us(),
                stats: *slot.stats(),
            })
            .collect();

        SimulationReport {
            elapsed_us: self.controller.clock().now_micros(),
            polls,
            stalls,
            tasks,
            imu_orientation_reads: self.controller.imu().orientation_reads(),
            gated_not_ready,
            gated_disarmed,
            live_ticks,
            actuator: self.controller.esc().driver().clone(),
            final_attitude: self.controller.vehicle_state().angles(),
            telemetry: self.controller.telemetry().oldest_first().copied().collect(),
        }
    }
}
