use flight_core::esc::{DshotDriver, DshotEsc, ReadinessLatch};
use flight_core::mixer::{Mixer, OutputGate, QUAD_MOTORS};
use flight_core::scheduler::{CatchUpPolicy, Scheduler};
use flight_core::telemetry::LoopEventKind;
use flight_core::{
    Axes, ControllerConfig, Demands, FlightController, FlightTask, Imu, ManualClock, Micros,
    MonotonicClock, SetupError, TaskKind,
};

#[derive(Default)]
struct ScriptedImu {
    orientation: Option<Axes>,
    rates: Option<Axes>,
    queries: usize,
}

impl Imu for ScriptedImu {
    fn orientation(&mut self, _: Micros) -> Option<Axes> {
        self.queries += 1;
        self.orientation
    }

    fn gyro_rates(&mut self, _: Micros) -> Option<Axes> {
        self.rates
    }
}

#[derive(Default)]
struct MotorLog {
    frames: Vec<[f32; QUAD_MOTORS]>,
}

impl DshotDriver for MotorLog {
    fn write(&mut self, motor_values: &[f32]) {
        let mut frame = [0.0; QUAD_MOTORS];
        frame.copy_from_slice(motor_values);
        self.frames.push(frame);
    }
}

type TestController = FlightController<ManualClock, ScriptedImu, DshotEsc<MotorLog>>;

fn build(startup_us: Micros) -> TestController {
    let esc = DshotEsc::with_latch(MotorLog::default(), ReadinessLatch::with_startup(startup_us));
    let imu = ScriptedImu {
        orientation: Some(Axes::new(0.1, 0.2, 0.3)),
        rates: Some(Axes::new(0.01, 0.02, 0.03)),
        queries: 0,
    };
    FlightController::with_config(ManualClock::default(), imu, esc, &ControllerConfig::DEFAULT)
        .expect("controller setup")
}

fn run_for(controller: &mut TestController, duration_us: Micros, tick_us: Micros) {
    let end = controller.clock().now_micros() + duration_us;
    while controller.clock().now_micros() < end {
        controller.poll();
        controller.clock_mut().advance(tick_us);
    }
}

#[test]
fn first_tick_propagates_imu_into_vehicle_state() {
    let mut controller = build(1_000);

    let report = controller.poll();

    assert_eq!(report.fired.len(), 2);
    assert_eq!(report.fired[0].kind, TaskKind::Rates);
    assert_eq!(report.fired[1].kind, TaskKind::Attitude);
    let state = controller.vehicle_state();
    assert_eq!(state.angles(), Axes::new(0.1, 0.2, 0.3));
    assert_eq!(state.rates(), Axes::new(0.01, 0.02, 0.03));
}

#[test]
fn task_rates_hold_over_a_simulated_second() {
    let mut controller = build(1_000);
    run_for(&mut controller, 1_000_000, 1_000);

    let scheduler = controller.scheduler();
    let attitude = scheduler.find(TaskKind::Attitude).expect("attitude task");
    let rates = scheduler.find(TaskKind::Rates).expect("rates task");
    assert_eq!(attitude.stats().runs, 100);
    assert_eq!(rates.stats().runs, 500);
    assert_eq!(controller.imu().queries, 100);
}

#[test]
fn motors_stay_at_zero_until_esc_ready_and_armed() {
    let mut controller = build(5_000_000);
    controller.set_demands(Demands::new(0.4, 0.0, 0.0, 0.0));
    controller.arm();

    run_for(&mut controller, 5_000_001, 10_000);
    assert!(
        controller
            .esc()
            .driver()
            .frames
            .iter()
            .all(|frame| *frame == [0.0; QUAD_MOTORS])
    );

    controller.clock_mut().advance(10_000);
    let report = controller.poll();
    assert_eq!(report.output.gate, OutputGate::Live);
    assert_eq!(controller.last_output(), &[0.4; QUAD_MOTORS]);

    let ready_events = controller
        .telemetry()
        .oldest_first()
        .filter(|record| record.event == LoopEventKind::EscReady)
        .count();
    assert_eq!(ready_events, 1);
}

#[test]
fn disarm_and_shutdown_command_zero() {
    let mut controller = build(0);
    controller.set_demands(Demands::new(0.6, 0.0, 0.0, 0.0));
    controller.poll();
    controller.clock_mut().advance(1);
    controller.arm();
    assert_eq!(controller.poll().output.gate, OutputGate::Live);

    controller.disarm();
    controller.clock_mut().advance(1);
    assert_eq!(controller.poll().output.gate, OutputGate::Disarmed);
    assert_eq!(controller.last_output(), &[0.0; QUAD_MOTORS]);

    controller.arm();
    controller.shutdown();
    assert!(!controller.is_armed());
    let last_frame = controller.esc().driver().frames.last().copied();
    assert_eq!(last_frame, Some([0.0; QUAD_MOTORS]));
    assert_eq!(
        controller.telemetry().latest().map(|record| record.event),
        Some(LoopEventKind::Shutdown)
    );
}

#[test]
fn sensor_gap_holds_state_and_is_recorded() {
    let mut controller = build(1_000);
    controller.poll();

    controller.imu_mut().orientation = None;
    controller.clock_mut().advance(10_000);
    controller.poll();

    assert_eq!(controller.vehicle_state().angles(), Axes::new(0.1, 0.2, 0.3));
    assert!(
        controller
            .telemetry()
            .oldest_first()
            .any(|record| record.event == LoopEventKind::SensorHold(TaskKind::Attitude))
    );
}

#[test]
fn controller_requires_tasks() {
    let esc = DshotEsc::new(MotorLog::default());
    let scheduler = Scheduler::<FlightTask, 4>::with_policy(CatchUpPolicy::ResetToNow);
    let result = FlightController::new(
        ManualClock::default(),
        ScriptedImu::default(),
        esc,
        scheduler,
        Mixer::QUAD_X,
    );

    assert!(matches!(result, Err(SetupError::NoTasks)));
}

#[test]
fn zero_rate_config_aborts_setup() {
    let esc = DshotEsc::new(MotorLog::default());
    let config = ControllerConfig::DEFAULT.with_attitude_hz(0);
    let result = FlightController::with_config(
        ManualClock::default(),
        ScriptedImu::default(),
        esc,
        &config,
    );

    assert!(matches!(
        result,
        Err(SetupError::ZeroRate(TaskKind::Attitude))
    ));
}

#[test]
fn controller_runs_over_borrowed_collaborators() {
    let clock = ManualClock::starting_at(0);
    let mut imu = ScriptedImu {
        orientation: Some(Axes::new(0.4, 0.5, 0.6)),
        ..ScriptedImu::default()
    };
    let mut log = MotorLog::default();
    let mut esc = DshotEsc::with_latch(&mut log, ReadinessLatch::with_startup(0));

    {
        let mut controller =
            FlightController::with_config(&clock, &mut imu, &mut esc, &ControllerConfig::DEFAULT)
                .expect("controller setup");
        controller.set_demands(Demands::new(0.3, 0.0, 0.0, 0.0));
        controller.arm();

        assert_eq!(controller.step(0).output.gate, OutputGate::NotReady);
        assert_eq!(controller.step(1).output.gate, OutputGate::Live);
        assert_eq!(controller.vehicle_state().angles(), Axes::new(0.4, 0.5, 0.6));
    }

    assert_eq!(imu.queries, 1);
    drop(esc);
    assert_eq!(log.frames, vec![[0.0; QUAD_MOTORS], [0.3; QUAD_MOTORS]]);
}
