//! Fixed-rate cooperative scheduler for the control loop.
//!
//! The scheduler owns a statically sized, priority-ordered list of tasks.
//! Every tick it walks the list front to back and runs each task whose period
//! has elapsed, to completion, before looking at the next one. A task runs at
//! most once per tick no matter how far behind it is; missed periods are
//! dropped rather than replayed. Nothing here allocates or fails once the
//! task list is built.

use heapless::Vec;

use crate::clock::{Micros, period_from_hz};
use crate::error::SetupError;
use crate::imu::Imu;
use crate::state::VehicleState;
use crate::tasks::{Task, TaskKind, TaskStatus};

/// Default capacity of the task list.
pub const MAX_TASKS: usize = 8;

/// How a task's last-run timestamp advances after it fires.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CatchUpPolicy {
    /// `last_run = now`. Overruns turn into permanent phase drift.
    #[default]
    ResetToNow,
    /// `last_run` advances by exactly one period, keeping the task on its
    /// original phase. If that still leaves it a full period or more behind,
    /// it snaps to `now` so missed periods are never replayed.
    AccumulateDeadline,
}

/// Runtime counters kept per task.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TaskStats {
    /// Number of times the task has run.
    pub runs: u64,
    /// Runs that reported [`TaskStatus::Held`].
    pub held: u64,
    /// Runs that started at least one full period after their deadline.
    pub overruns: u32,
    /// Worst observed delay past the ideal deadline.
    pub max_lateness_us: Micros,
}

/// A registered task plus its timing bookkeeping.
#[derive(Clone, Debug)]
pub struct TaskSlot<T> {
    task: T,
    period_us: Micros,
    last_run: Option<Micros>,
    stats: TaskStats,
}

impl<T> TaskSlot<T>
where
    T: Task,
{
    fn new(task: T) -> Result<Self, SetupError> {
        let period_us = period_from_hz(task.rate_hz()).ok_or(SetupError::ZeroRate(task.kind()))?;
        Ok(Self {
            task,
            period_us,
            last_run: None,
            stats: TaskStats::default(),
        })
    }

    pub fn task(&self) -> &T {
        &self.task
    }

    pub fn kind(&self) -> TaskKind {
        self.task.kind()
    }

    /// Period derived once from the task rate at registration.
    pub const fn period_us(&self) -> Micros {
        self.period_us
    }

    /// Timestamp the next deadline is measured from, or `None` before the
    /// first run.
    pub const fn last_run(&self) -> Option<Micros> {
        self.last_run
    }

    pub const fn stats(&self) -> &TaskStats {
        &self.stats
    }

    /// Returns `true` when the task should run at `now`.
    ///
    /// A task that has never run is always due. A clock reading earlier than
    /// the last run never makes a task due.
    pub fn is_due(&self, now: Micros) -> bool {
        match self.last_run {
            None => true,
            Some(last) => now.saturating_sub(last) >= self.period_us,
        }
    }

    /// Delay past the ideal deadline at `now`; zero before the first run.
    pub fn lateness(&self, now: Micros) -> Micros {
        match self.last_run {
            None => 0,
            Some(last) => now.saturating_sub(last).saturating_sub(self.period_us),
        }
    }

    fn advance(&mut self, now: Micros, policy: CatchUpPolicy) {
        let next = match (policy, self.last_run) {
            (CatchUpPolicy::AccumulateDeadline, Some(last)) => {
                let ideal = last.saturating_add(self.period_us);
                if now.saturating_sub(ideal) >= self.period_us {
                    now
                } else {
                    ideal
                }
            }
            _ => now,
        };
        self.last_run = Some(next);
    }

    fn record(&mut self, status: TaskStatus, lateness_us: Micros) -> bool {
        let overrun = lateness_us >= self.period_us;
        self.stats.runs = self.stats.runs.saturating_add(1);
        if status == TaskStatus::Held {
            self.stats.held = self.stats.held.saturating_add(1);
        }
        if overrun {
            self.stats.overruns = self.stats.overruns.saturating_add(1);
        }
        self.stats.max_lateness_us = self.stats.max_lateness_us.max(lateness_us);
        overrun
    }
}

/// One task invocation performed during a tick.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TaskFire {
    /// Position in the priority order.
    pub slot: usize,
    pub kind: TaskKind,
    pub status: TaskStatus,
    pub lateness_us: Micros,
    /// `true` when at least one whole period was missed.
    pub overrun: bool,
}

/// Tasks that fired during one tick, in execution order.
pub type TickReport<const N: usize> = Vec<TaskFire, N>;

/// Priority-ordered cooperative scheduler.
pub struct Scheduler<T, const N: usize = MAX_TASKS> {
    slots: Vec<TaskSlot<T>, N>,
    policy: CatchUpPolicy,
}

impl<T, const N: usize> Scheduler<T, N>
where
    T: Task,
{
    /// Creates an empty scheduler using [`CatchUpPolicy::ResetToNow`].
    #[must_use]
    pub const fn new() -> Self {
        Self::with_policy(CatchUpPolicy::ResetToNow)
    }

    #[must_use]
    pub const fn with_policy(policy: CatchUpPolicy) -> Self {
        Self {
            slots: Vec::new(),
            policy,
        }
    }

    /// Builds a scheduler from tasks listed in priority order, highest first.
    pub fn from_tasks<I>(tasks: I, policy: CatchUpPolicy) -> Result<Self, SetupError>
    where
        I: IntoIterator<Item = T>,
    {
        let mut scheduler = Self::with_policy(policy);
        for task in tasks {
            scheduler.register(task)?;
        }

        if scheduler.is_empty() {
            return Err(SetupError::NoTasks);
        }

        Ok(scheduler)
    }

    /// Appends a task at the lowest priority and returns its slot index.
    pub fn register(&mut self, task: T) -> Result<usize, SetupError> {
        let slot = TaskSlot::new(task)?;
        self.slots
            .push(slot)
            .map_err(|_| SetupError::TaskListFull { capacity: N })?;
        Ok(self.slots.len() - 1)
    }

    pub const fn policy(&self) -> CatchUpPolicy {
        self.policy
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Registered tasks in priority order.
    pub fn slots(&self) -> &[TaskSlot<T>] {
        &self.slots
    }

    pub fn slot(&self, index: usize) -> Option<&TaskSlot<T>> {
        self.slots.get(index)
    }

    /// Looks up the first slot whose task reports `kind`.
    pub fn find(&self, kind: TaskKind) -> Option<&TaskSlot<T>> {
        self.slots.iter().find(|slot| slot.kind() == kind)
    }

    /// Runs every due task once, in priority order.
    pub fn tick<I>(&mut self, imu: &mut I, vstate: &mut VehicleState, now: Micros) -> TickReport<N>
    where
        I: Imu + ?Sized,
    {
        let mut report = TickReport::new();
        let policy = self.policy;

        for (index, slot) in self.slots.iter_mut().enumerate() {
            if !slot.is_due(now) {
                continue;
            }

            let lateness_us = slot.lateness(now);
            let status = slot.task.run(&mut *imu, vstate, now);
            slot.advance(now, policy);
            let overrun = slot.record(status, lateness_us);

            // Report capacity equals slot capacity.
            let _ = report.push(TaskFire {
                slot: index,
                kind: slot.kind(),
                status,
                lateness_us,
                overrun,
            });
        }

        report
    }
}

impl<T, const N: usize> Default for Scheduler<T, N>
where
    T: Task,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imu::StaticImu;
    use crate::state::Axes;
    use crate::tasks::{AttitudeTask, FlightTask, RatesTask};

    #[derive(Copy, Clone, Debug)]
    struct Counter {
        kind: TaskKind,
        rate_hz: u32,
        runs: u32,
    }

    impl Counter {
        fn new(tag: u8, rate_hz: u32) -> Self {
            Self {
                kind: TaskKind::Custom(tag),
                rate_hz,
                runs: 0,
            }
        }
    }

    impl Task for Counter {
        fn kind(&self) -> TaskKind {
            self.kind
        }

        fn rate_hz(&self) -> u32 {
            self.rate_hz
        }

        fn run<I>(&mut self, _: &mut I, _: &mut VehicleState, _: Micros) -> TaskStatus
        where
            I: Imu + ?Sized,
        {
            self.runs += 1;
            TaskStatus::Updated
        }
    }

    fn runs_of(scheduler: &Scheduler<Counter, 4>, index: usize) -> u32 {
        scheduler.slot(index).expect("slot exists").task().runs
    }

    #[test]
    fn zero_rate_is_rejected_at_registration() {
        let mut scheduler = Scheduler::<Counter, 4>::new();
        assert_eq!(
            scheduler.register(Counter::new(3, 0)),
            Err(SetupError::ZeroRate(TaskKind::Custom(3)))
        );
        assert!(scheduler.is_empty());
    }

    #[test]
    fn full_task_list_is_rejected() {
        let mut scheduler = Scheduler::<Counter, 1>::new();
        assert_eq!(scheduler.register(Counter::new(0, 10)), Ok(0));
        assert_eq!(
            scheduler.register(Counter::new(1, 10)),
            Err(SetupError::TaskListFull { capacity: 1 })
        );
    }

    #[test]
    fn empty_task_list_is_rejected() {
        let result = Scheduler::<Counter, 4>::from_tasks([], CatchUpPolicy::ResetToNow);
        assert!(matches!(result, Err(SetupError::NoTasks)));
    }

    #[test]
    fn never_run_task_fires_on_first_tick() {
        let mut scheduler = Scheduler::<Counter, 4>::new();
        scheduler.register(Counter::new(0, 1)).unwrap();
        let mut imu = StaticImu::unavailable();
        let mut state = VehicleState::new();

        let report = scheduler.tick(&mut imu, &mut state, 42);

        assert_eq!(report.len(), 1);
        assert_eq!(report[0].lateness_us, 0);
        assert_eq!(scheduler.slot(0).unwrap().last_run(), Some(42));
    }

    #[test]
    fn task_fires_only_once_period_has_elapsed() {
        let mut scheduler = Scheduler::<Counter, 4>::new();
        scheduler.register(Counter::new(0, 100)).unwrap();
        let mut imu = StaticImu::unavailable();
        let mut state = VehicleState::new();

        scheduler.tick(&mut imu, &mut state, 0);
        assert!(scheduler.tick(&mut imu, &mut state, 9_999).is_empty());
        assert_eq!(scheduler.tick(&mut imu, &mut state, 10_000).len(), 1);
        assert_eq!(runs_of(&scheduler, 0), 2);
    }

    #[test]
    fn stalled_loop_runs_task_once_and_drifts() {
        let mut scheduler = Scheduler::<Counter, 4>::new();
        scheduler.register(Counter::new(0, 100)).unwrap();
        let mut imu = StaticImu::unavailable();
        let mut state = VehicleState::new();

        scheduler.tick(&mut imu, &mut state, 0);
        let report = scheduler.tick(&mut imu, &mut state, 55_000);

        assert_eq!(report.len(), 1);
        assert_eq!(report[0].lateness_us, 45_000);
        assert!(report[0].overrun);
        assert_eq!(scheduler.slot(0).unwrap().last_run(), Some(55_000));
        assert!(scheduler.tick(&mut imu, &mut state, 60_000).is_empty());
        assert_eq!(scheduler.slot(0).unwrap().stats().overruns, 1);
    }

    #[test]
    fn accumulate_deadline_keeps_phase_without_replay() {
        let mut scheduler = Scheduler::<Counter, 4>::with_policy(CatchUpPolicy::AccumulateDeadline);
        scheduler.register(Counter::new(0, 100)).unwrap();
        let mut imu = StaticImu::unavailable();
        let mut state = VehicleState::new();

        scheduler.tick(&mut imu, &mut state, 0);
        scheduler.tick(&mut imu, &mut state, 12_000);
        assert_eq!(scheduler.slot(0).unwrap().last_run(), Some(10_000));

        // Several periods behind: one run, then resume from now.
        let report = scheduler.tick(&mut imu, &mut state, 75_000);
        assert_eq!(report.len(), 1);
        assert_eq!(scheduler.slot(0).unwrap().last_run(), Some(75_000));
    }

    #[test]
    fn accumulate_deadline_holds_rate_under_coarse_ticks() {
        let mut reset = Scheduler::<Counter, 4>::new();
        let mut accumulate =
            Scheduler::<Counter, 4>::with_policy(CatchUpPolicy::AccumulateDeadline);
        reset.register(Counter::new(0, 100)).unwrap();
        accumulate.register(Counter::new(0, 100)).unwrap();
        let mut imu = StaticImu::unavailable();
        let mut state = VehicleState::new();

        let mut now = 0;
        while now < 1_000_000 {
            reset.tick(&mut imu, &mut state, now);
            accumulate.tick(&mut imu, &mut state, now);
            now += 3_000;
        }

        assert_eq!(runs_of(&reset, 0), 84);
        assert!(runs_of(&accumulate, 0).abs_diff(100) <= 1);
    }

    #[test]
    fn clock_going_backwards_does_not_fire() {
        let mut scheduler = Scheduler::<Counter, 4>::new();
        scheduler.register(Counter::new(0, 1_000)).unwrap();
        let mut imu = StaticImu::unavailable();
        let mut state = VehicleState::new();

        scheduler.tick(&mut imu, &mut state, 50_000);
        assert!(scheduler.tick(&mut imu, &mut state, 10_000).is_empty());
    }

    #[test]
    fn held_runs_are_counted() {
        let mut scheduler = Scheduler::<FlightTask, 4>::from_tasks(
            [RatesTask::new().into(), AttitudeTask::new().into()],
            CatchUpPolicy::ResetToNow,
        )
        .unwrap();
        let mut imu = StaticImu::with_orientation(Axes::new(0.1, 0.2, 0.3));
        let mut state = VehicleState::new();

        let report = scheduler.tick(&mut imu, &mut state, 0);

        assert_eq!(report[0].kind, TaskKind::Rates);
        assert_eq!(report[0].status, TaskStatus::Held);
        assert_eq!(report[1].kind, TaskKind::Attitude);
        assert_eq!(report[1].status, TaskStatus::Updated);
        assert_eq!(scheduler.find(TaskKind::Rates).unwrap().stats().held, 1);
        assert_eq!(scheduler.find(TaskKind::Attitude).unwrap().stats().held, 0);
    }
}
