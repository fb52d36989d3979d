use embassy_time::{Duration, Ticker};

use super::{Controller, PILOT_MAILBOX, request_shutdown, shutdown_requested};
use crate::config::{LOOP_POLL_US, PILOT_MAX_AGE_US, TELEMETRY_FLUSH_EVERY};
use crate::mailbox::{PilotLink, apply_pilot};
use crate::telemetry::LogCursor;

/// Polls the controller until shutdown is requested or the pilot kills it,
/// then zeroes the motors.
///
/// Each poll runs to completion; the ticker await between polls is the only
/// point where other executor tasks get the CPU.
#[embassy_executor::task]
pub async fn run(mut controller: Controller) {
    let mut ticker = Ticker::every(Duration::from_micros(LOOP_POLL_US));
    let mut cursor = LogCursor::new();
    let mut polls: u32 = 0;

    while !shutdown_requested() {
        if apply_pilot(&mut controller, &PILOT_MAILBOX, PILOT_MAX_AGE_US) == PilotLink::Kill {
            defmt::warn!("controller: kill switch");
            request_shutdown();
            continue;
        }
        controller.poll();

        polls = polls.wrapping_add(1);
        if polls % TELEMETRY_FLUSH_EVERY == 0 {
            cursor.flush(controller.telemetry());
        }

        ticker.next().await;
    }

    controller.shutdown();
    cursor.flush(controller.telemetry());
    defmt::info!("controller: loop stopped");
}
