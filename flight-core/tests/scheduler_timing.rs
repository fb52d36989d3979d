use std::cell::RefCell;
use std::rc::Rc;

use flight_core::imu::StaticImu;
use flight_core::scheduler::{CatchUpPolicy, Scheduler};
use flight_core::{Imu, Micros, Task, TaskKind, TaskStatus, VehicleState};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Mark {
    Begin(TaskKind),
    End(TaskKind),
}

struct LoggingTask {
    kind: TaskKind,
    rate_hz: u32,
    log: Rc<RefCell<Vec<(Micros, Mark)>>>,
}

impl LoggingTask {
    fn new(tag: u8, rate_hz: u32, log: &Rc<RefCell<Vec<(Micros, Mark)>>>) -> Self {
        Self {
            kind: TaskKind::Custom(tag),
            rate_hz,
            log: Rc::clone(log),
        }
    }
}

impl Task for LoggingTask {
    fn kind(&self) -> TaskKind {
        self.kind
    }

    fn rate_hz(&self) -> u32 {
        self.rate_hz
    }

    fn run<I>(&mut self, _: &mut I, vstate: &mut VehicleState, now: Micros) -> TaskStatus
    where
        I: Imu + ?Sized,
    {
        self.log.borrow_mut().push((now, Mark::Begin(self.kind)));
        vstate.z += 1.0;
        self.log.borrow_mut().push((now, Mark::End(self.kind)));
        TaskStatus::Updated
    }
}

fn count(log: &[(Micros, Mark)], kind: TaskKind) -> usize {
    log.iter()
        .filter(|(_, mark)| *mark == Mark::End(kind))
        .count()
}

#[test]
fn two_rates_ticked_every_millisecond_for_one_second() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let fast = TaskKind::Custom(0);
    let slow = TaskKind::Custom(1);
    let mut scheduler = Scheduler::<LoggingTask, 4>::from_tasks(
        [LoggingTask::new(0, 100, &log), LoggingTask::new(1, 10, &log)],
        CatchUpPolicy::ResetToNow,
    )
    .expect("scheduler setup");
    let mut imu = StaticImu::unavailable();
    let mut state = VehicleState::new();

    for tick in 0..1_000u64 {
        scheduler.tick(&mut imu, &mut state, tick * 1_000);
    }

    let log = log.borrow();
    assert_eq!(count(&log, fast), 100);
    assert_eq!(count(&log, slow), 10);
    assert_eq!(state.z, 110.0);

    // Whenever both fire in the same tick, the fast task completes first.
    for (now, _) in log.iter().filter(|(_, mark)| *mark == Mark::Begin(slow)) {
        let same_tick: Vec<Mark> = log
            .iter()
            .filter(|(at, _)| at == now)
            .map(|(_, mark)| *mark)
            .collect();
        assert_eq!(
            same_tick,
            vec![
                Mark::Begin(fast),
                Mark::End(fast),
                Mark::Begin(slow),
                Mark::End(slow)
            ],
            "unexpected ordering at t={now}us"
        );
    }
}

#[test]
fn invocation_counts_stay_within_one_of_rate_times_duration() {
    let rates = [1u32, 3, 7, 50, 100, 250, 500];
    let tick_us: Micros = 500;
    let duration_us: Micros = 3_000_000;

    for rate in rates {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut scheduler = Scheduler::<LoggingTask, 1>::new();
        scheduler
            .register(LoggingTask::new(0, rate, &log))
            .expect("register");
        let mut imu = StaticImu::unavailable();
        let mut state = VehicleState::new();

        let mut now = 0;
        while now < duration_us {
            scheduler.tick(&mut imu, &mut state, now);
            now += tick_us;
        }

        let expected = u64::from(rate) * duration_us / 1_000_000;
        let actual = scheduler.slot(0).expect("slot").stats().runs;
        assert!(
            actual.abs_diff(expected) <= 1,
            "rate {rate} Hz fired {actual} times, expected about {expected}"
        );
    }
}

#[test]
fn stalled_tick_runs_every_due_task_once() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut scheduler = Scheduler::<LoggingTask, 4>::from_tasks(
        [LoggingTask::new(0, 1_000, &log), LoggingTask::new(1, 100, &log)],
        CatchUpPolicy::ResetToNow,
    )
    .expect("scheduler setup");
    let mut imu = StaticImu::unavailable();
    let mut state = VehicleState::new();

    scheduler.tick(&mut imu, &mut state, 0);
    let report = scheduler.tick(&mut imu, &mut state, 250_000);

    assert_eq!(report.len(), 2);
    assert!(report.iter().all(|fire| fire.overrun));
    assert_eq!(log.borrow().len(), 8);
}
