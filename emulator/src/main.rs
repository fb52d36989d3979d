mod report;
mod sim;

use std::env;
use std::io::{self, Write};
use std::process;

use flight_core::Micros;
use sim::{Simulation, SimulationOptions};

const USAGE: &str = "Usage: flight-emulator [--seconds <n>] [--loop-us <n>] [--stall-every <n>] [--stall-us <n>]";

fn main() -> io::Result<()> {
    let options = parse_options(env::args().skip(1)).unwrap_or_else(|err| {
        eprintln!("{err}");
        eprintln!("{USAGE}");
        process::exit(2);
    });

    let simulation = Simulation::new(options.clone()).unwrap_or_else(|err| {
        eprintln!("controller setup failed: {err}");
        process::exit(1);
    });

    let stdout = io::stdout();
    let mut writer = stdout.lock();
    writeln!(
        writer,
        "Flight loop emulator: {:.3}s at {}us per poll",
        seconds(options.duration_us),
        options.loop_us
    )?;

    let summary = simulation.run();
    report::render(&mut writer, &summary)?;
    writer.flush()
}

#[allow(clippy::cast_precision_loss)]
fn seconds(micros: Micros) -> f64 {
    micros as f64 / 1_000_000.0
}

fn parse_options<I>(args: I) -> Result<SimulationOptions, String>
where
    I: IntoIterator<Item = String>,
{
    let mut options = SimulationOptions::default();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        let (flag, inline) = match arg.split_once('=') {
            Some((flag, value)) => (flag.to_string(), Some(value.to_string())),
            None => (arg, None),
        };

        let mut value = || {
            inline
                .clone()
                .or_else(|| args.next())
                .ok_or_else(|| format!("Expected value after {flag}"))
        };

        match flag.as_str() {
            "--seconds" => {
                let secs: u64 = parse_number(&flag, &value()?)?;
                options.duration_us = secs
                    .checked_mul(1_000_000)
                    .ok_or_else(|| format!("{flag} is too large"))?;
            }
            "--loop-us" => {
                options.loop_us = parse_number(&flag, &value()?)?;
                if options.loop_us == 0 {
                    return Err("--loop-us must be greater than zero".to_string());
                }
            }
            "--stall-every" => {
                let every: u32 = parse_number(&flag, &value()?)?;
                options.stall_every = (every > 0).then_some(every);
            }
            "--stall-us" => options.stall_us = parse_number(&flag, &value()?)?,
            other => return Err(format!("Unknown argument `{other}`")),
        }
    }

    Ok(options)
}

fn parse_number<T: std::str::FromStr>(flag: &str, raw: &str) -> Result<T, String> {
    raw.parse()
        .map_err(|_| format!("Invalid value `{raw}` for {flag}"))
}
