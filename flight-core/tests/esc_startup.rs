use flight_core::esc::{DshotDriver, DshotEsc, Readiness, ReadinessLatch, STARTUP_USEC};
use flight_core::Esc;

#[derive(Default)]
struct FrameLog {
    frames: Vec<Vec<f32>>,
}

impl DshotDriver for FrameLog {
    fn write(&mut self, motor_values: &[f32]) {
        self.frames.push(motor_values.to_vec());
    }
}

#[test]
fn readiness_follows_startup_interval() {
    let mut esc = DshotEsc::new(FrameLog::default());

    assert!(!esc.is_ready(0));
    assert!(!esc.is_ready(STARTUP_USEC));
    assert!(esc.is_ready(5_000_001));
}

#[test]
fn readiness_is_a_one_shot_latch() {
    let mut esc = DshotEsc::new(FrameLog::default());
    esc.is_ready(0);
    assert!(esc.is_ready(5_000_001));

    for earlier in [0, 1, 4_999_999, 5_000_000] {
        assert!(esc.is_ready(earlier), "latch reset at t={earlier}us");
    }
}

#[test]
fn reference_start_is_first_observed_timestamp() {
    let mut esc = DshotEsc::new(FrameLog::default());

    assert!(!esc.is_ready(2_000_000));
    assert!(!esc.is_ready(7_000_000));
    assert!(esc.is_ready(7_000_001));
}

#[test]
fn writing_before_ready_neither_fails_nor_changes_state() {
    let mut esc = DshotEsc::new(FrameLog::default());
    assert!(!esc.is_ready(0));

    esc.write(&[0.0, 0.0, 0.0, 0.0]);
    esc.write(&[0.2, 0.2, 0.2, 0.2]);

    assert_eq!(esc.latch().state(), Readiness::NotReady);
    assert_eq!(esc.driver().frames.len(), 2);
    assert_eq!(esc.driver().frames[1], vec![0.2; 4]);
    assert!(!esc.is_ready(1_000));
}

#[test]
fn each_actuator_owns_its_latch() {
    let mut front = DshotEsc::new(FrameLog::default());
    let mut rear = DshotEsc::with_latch(FrameLog::default(), ReadinessLatch::with_startup(1_000));

    assert!(!front.is_ready(0));
    assert!(!rear.is_ready(0));
    assert!(rear.is_ready(1_001));
    assert!(!front.is_ready(1_001));

    let mut late = DshotEsc::new(FrameLog::default());
    assert!(front.is_ready(5_000_001));
    assert!(!late.is_ready(5_000_001));
}
