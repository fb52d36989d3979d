//! Flight controller facade tying the loop together.
//!
//! One [`FlightController::step`] is one tick: sample the clock, run every
//! due task in priority order, then push a guarded motor command through the
//! output stage. The controller is the single owner of [`VehicleState`], so
//! tasks never run concurrently and no locking is involved.

use crate::clock::{Micros, MonotonicClock};
use crate::config::{ControllerConfig, default_tasks};
use crate::error::SetupError;
use crate::esc::Esc;
use crate::imu::Imu;
use crate::mixer::{Mixer, OutputStage, OutputUpdate, QUAD_MOTORS};
use crate::scheduler::{MAX_TASKS, Scheduler, TickReport};
use crate::state::{Demands, VehicleState};
use crate::tasks::{FlightTask, Task};
use crate::telemetry::{LoopEventKind, TelemetryRecorder};

/// What happened during one tick.
#[derive(Clone, Debug)]
pub struct StepReport<const N: usize> {
    pub now: Micros,
    pub fired: TickReport<N>,
    pub output: OutputUpdate,
}

pub struct FlightController<C, I, E, T = FlightTask, const N: usize = MAX_TASKS, const M: usize = QUAD_MOTORS>
{
    clock: C,
    imu: I,
    esc: E,
    scheduler: Scheduler<T, N>,
    output: OutputStage<M>,
    vstate: VehicleState,
    demands: Demands,
    armed: bool,
    telemetry: TelemetryRecorder,
}

impl<C, I, E> FlightController<C, I, E>
where
    C: MonotonicClock,
    I: Imu,
    E: Esc,
{
    /// Builds the stock quad-X controller with the built-in task list.
    pub fn with_config(
        clock: C,
        imu: I,
        esc: E,
        config: &ControllerConfig,
    ) -> Result<Self, SetupError> {
        let scheduler = Scheduler::from_tasks(default_tasks(config), config.catch_up)?;
        Self::new(clock, imu, esc, scheduler, Mixer::QUAD_X)
    }
}

impl<C, I, E, T, const N: usize, const M: usize> FlightController<C, I, E, T, N, M>
where
    C: MonotonicClock,
    I: Imu,
    E: Esc,
    T: Task,
{
    /// Assembles a controller from an already populated scheduler.
    pub fn new(
        clock: C,
        imu: I,
        esc: E,
        scheduler: Scheduler<T, N>,
        mixer: Mixer<M>,
    ) -> Result<Self, SetupError> {
        if scheduler.is_empty() {
            return Err(SetupError::NoTasks);
        }

        Ok(Self {
            clock,
            imu,
            esc,
            scheduler,
            output: OutputStage::new(mixer),
            vstate: VehicleState::new(),
            demands: Demands::IDLE,
            armed: false,
            telemetry: TelemetryRecorder::new(),
        })
    }

    /// Samples the clock and runs one tick.
    pub fn poll(&mut self) -> StepReport<N> {
        let now = self.clock.now_micros();
        self.step(now)
    }

    /// Runs one tick at `now`.
    pub fn step(&mut self, now: Micros) -> StepReport<N> {
        let fired = self.scheduler.tick(&mut self.imu, &mut self.vstate, now);
        for fire in fired.iter() {
            self.telemetry.record_task_fire(fire, now);
        }

        let output = self
            .output
            .update(&mut self.esc, &self.demands, self.armed, now);
        if output.became_ready {
            self.telemetry.record(LoopEventKind::EscReady, now, None);
        }

        StepReport { now, fired, output }
    }

    /// Allows mixed demands to reach the motors once the ESC is ready.
    pub fn arm(&mut self) {
        if !self.armed {
            self.armed = true;
            let now = self.clock.now_micros();
            self.telemetry.record(LoopEventKind::Armed, now, None);
        }
    }

    /// Forces zero output on subsequent ticks.
    pub fn disarm(&mut self) {
        if self.armed {
            self.armed = false;
            let now = self.clock.now_micros();
            self.telemetry.record(LoopEventKind::Disarmed, now, None);
        }
    }

    /// Commands zero on every motor and disarms. Call before leaving the loop.
    pub fn shutdown(&mut self) {
        self.armed = false;
        self.output.stop(&mut self.esc);
        let now = self.clock.now_micros();
        self.telemetry.record(LoopEventKind::Shutdown, now, None);
    }

    pub fn set_demands(&mut self, demands: Demands) {
        self.demands = demands;
    }

    pub const fn demands(&self) -> &Demands {
        &self.demands
    }

    pub const fn is_armed(&self) -> bool {
        self.armed
    }

    pub const fn vehicle_state(&self) -> &VehicleState {
        &self.vstate
    }

    /// Commands sent on the most recent tick.
    pub const fn last_output(&self) -> &[f32; M] {
        self.output.last_output()
    }

    pub const fn scheduler(&self) -> &Scheduler<T, N> {
        &self.scheduler
    }

    pub const fn telemetry(&self) -> &TelemetryRecorder {
        &self.telemetry
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    pub fn imu(&self) -> &I {
        &self.imu
    }

    pub fn imu_mut(&mut self) -> &mut I {
        &mut self.imu
    }

    pub fn esc(&self) -> &E {
        &self.esc
    }
}
