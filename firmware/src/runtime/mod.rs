use cortex_m::interrupt;
use cortex_m::register::primask;
use critical_section::{self, RawRestoreState};
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_stm32 as hal;
use embassy_stm32::gpio::{Level, Output, Speed};
use embassy_time::Instant;
use flight_core::esc::DshotEsc;
use flight_core::mixer::QUAD_MOTORS;
use flight_core::{FlightController, Micros, MonotonicClock, ReadinessLatch};
use portable_atomic::{AtomicBool, Ordering};

use crate::config;
use crate::dshot::Dshot300Bank;
use crate::mailbox::{ImuSnapshot, Mailbox, MailboxImu, PilotCommand};
use crate::telemetry;

mod control_task;

critical_section::set_impl!(InterruptCriticalSection);

struct InterruptCriticalSection;

unsafe impl critical_section::Impl for InterruptCriticalSection {
    unsafe fn acquire() -> RawRestoreState {
        let primask = primask::read();
        interrupt::disable();
        primask.is_active()
    }

    unsafe fn release(restore_state: RawRestoreState) {
        if restore_state {
            unsafe {
                interrupt::enable();
            }
        }
    }
}

/// Latest fused attitude, published by the sensor driver.
pub static IMU_MAILBOX: Mailbox<ImuSnapshot> = Mailbox::new();
/// Latest pilot demands and arm switch, published by the radio link.
pub static PILOT_MAILBOX: Mailbox<PilotCommand> = Mailbox::new();
/// Set to end the control loop; the loop zeroes the motors on its way out.
static SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// Ends the control loop after its current poll.
pub fn request_shutdown() {
    SHUTDOWN.store(true, Ordering::Release);
}

pub(super) fn shutdown_requested() -> bool {
    SHUTDOWN.load(Ordering::Acquire)
}

/// Monotonic microseconds from the embassy time driver (TIM1).
pub struct EmbassyClock;

impl MonotonicClock for EmbassyClock {
    fn now_micros(&self) -> Micros {
        Instant::now().as_micros()
    }
}

pub type Controller = FlightController<
    EmbassyClock,
    MailboxImu<'static>,
    DshotEsc<Dshot300Bank<QUAD_MOTORS>>,
>;

#[embassy_executor::main]
pub async fn main(spawner: Spawner) {
    let hal::Peripherals {
        PA8,
        PA9,
        PA10,
        PA11,
        ..
    } = hal::init(hal::Config::default());

    // Motor order follows the mixer: rear-right, front-right, rear-left, front-left.
    let bank = Dshot300Bank::new([
        Output::new(PA8, Level::Low, Speed::VeryHigh),
        Output::new(PA9, Level::Low, Speed::VeryHigh),
        Output::new(PA10, Level::Low, Speed::VeryHigh),
        Output::new(PA11, Level::Low, Speed::VeryHigh),
    ]);
    let esc = DshotEsc::with_latch(
        bank,
        ReadinessLatch::with_startup(config::CONTROLLER.esc_startup_us),
    );
    let imu = MailboxImu::new(&IMU_MAILBOX, config::IMU_MAX_AGE_US);

    let controller =
        match FlightController::with_config(EmbassyClock, imu, esc, &config::CONTROLLER) {
            Ok(controller) => controller,
            Err(error) => {
                telemetry::log_setup_failed(error);
                defmt::panic!("controller setup failed");
            }
        };

    defmt::info!(
        "controller: attitude={}Hz rates={}Hz esc_startup={}us",
        config::CONTROLLER.attitude_hz,
        config::CONTROLLER.rates_hz,
        config::CONTROLLER.esc_startup_us
    );

    spawner
        .spawn(control_task::run(controller))
        .expect("failed to spawn control task");

    core::future::pending::<()>().await;
}
