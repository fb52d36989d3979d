//! Terminal rendering for a finished simulation.

use std::io::{self, Write};

use crossterm::style::Stylize;
use flight_core::telemetry::{LoopEventKind, LoopRecord};

use crate::sim::{SimulationReport, TaskSummary};

/// Records shown at the tail of the telemetry listing.
const TELEMETRY_TAIL: usize = 12;

pub fn render<W: Write>(writer: &mut W, report: &SimulationReport) -> io::Result<()> {
    writeln!(writer, "{}", "Scheduler".bold())?;
    writeln!(
        writer,
        "  polls={} stalls={} elapsed={}us",
        report.polls, report.stalls, report.elapsed_us
    )?;
    for task in &report.tasks {
        writeln!(writer, "{}", describe_task(task))?;
    }
    writeln!(
        writer,
        "  imu orientation reads={}",
        report.imu_orientation_reads
    )?;

    writeln!(writer, "{}", "Actuator".bold())?;
    writeln!(
        writer,
        "  ticks not-ready={} disarmed={} live={}",
        report.gated_not_ready, report.gated_disarmed, report.live_ticks
    )?;
    writeln!(
        writer,
        "  writes={} zero={} peak={} last={}",
        report.actuator.writes,
        report.actuator.zero_writes,
        format_motors(&report.actuator.peak),
        format_motors(&report.actuator.last)
    )?;

    let attitude = report.final_attitude;
    writeln!(
        writer,
        "  attitude phi={:.3} theta={:.3} psi={:.3}",
        attitude.x, attitude.y, attitude.z
    )?;

    writeln!(
        writer,
        "{} ({} retained)",
        "Telemetry".bold(),
        report.telemetry.len()
    )?;
    let skip = report.telemetry.len().saturating_sub(TELEMETRY_TAIL);
    if skip > 0 {
        writeln!(writer, "  {}", format!("... {skip} earlier records").dark_grey())?;
    }
    for record in report.telemetry.iter().skip(skip) {
        writeln!(writer, "  {}", describe_record(record))?;
    }

    Ok(())
}

fn describe_task(task: &TaskSummary) -> String {
    let stats = &task.stats;
    let line = format!(
        "  {:<9} period={}us runs={} held={} overruns={} max-late={}us",
        task.kind.to_string(),
        task.period_us,
        stats.runs,
        stats.held,
        stats.overruns,
        stats.max_lateness_us
    );
    if stats.overruns > 0 {
        line.yellow().to_string()
    } else {
        line.green().to_string()
    }
}

fn describe_record(record: &LoopRecord) -> String {
    let head = format!("#{:<4} t={:>9}us", record.id, record.timestamp_us);
    let body = match record.lateness_us {
        Some(late) => format!("{} late={late}us", record.event),
        None => record.event.to_string(),
    };

    let styled = match record.event {
        LoopEventKind::Overrun(_) => body.red(),
        LoopEventKind::SensorHold(_) => body.yellow(),
        LoopEventKind::EscReady | LoopEventKind::Armed => body.green(),
        LoopEventKind::Disarmed | LoopEventKind::Shutdown | LoopEventKind::Custom(_) => body.cyan(),
    };
    format!("{} {styled}", head.dark_grey())
}

fn format_motors(values: &[f32]) -> String {
    let parts: Vec<String> = values.iter().map(|value| format!("{value:.2}")).collect();
    format!("[{}]", parts.join(" "))
}
