use std::io;
use std::process::ExitCode;

use anyhow::Context;
use log::{error, info};
use rppal::gpio::Gpio;

use dht22_port::hal::{DataPin, SpinDelay};
use dht22_port::{Dht22, ReadScheduler, SystemClock, port};

/// Default data line, BCM numbering.
const DEFAULT_DATA_PIN: u8 = 4;

type Scheduler = ReadScheduler<Dht22<DataPin, SpinDelay>, SystemClock>;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    info!("initializing dht22-port");

    let mut scheduler = match init() {
        Ok(scheduler) => scheduler,
        Err(err) => {
            error!("initialization error: {err:#}");
            return ExitCode::from(1);
        }
    };
    info!("initialized");

    let mut stdin = io::stdin().lock();
    let mut stdout = io::stdout().lock();
    match port::run(&mut scheduler, &mut stdin, &mut stdout) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("abnormal exit: {err}");
            ExitCode::from(1)
        }
    }
}

fn init() -> anyhow::Result<Scheduler> {
    let pin = data_pin_from_args()?;
    let gpio = Gpio::new().context("opening the GPIO controller")?;
    let data = DataPin::new(&gpio, pin).with_context(|| format!("claiming BCM pin {pin}"))?;
    Ok(ReadScheduler::new(
        Dht22::new(data, SpinDelay),
        SystemClock::new(),
    ))
}

/// The only command-line argument is an optional data pin number.
fn data_pin_from_args() -> anyhow::Result<u8> {
    match std::env::args().nth(1) {
        Some(arg) => arg
            .parse()
            .with_context(|| format!("invalid data pin {arg:?}")),
        None => Ok(DEFAULT_DATA_PIN),
    }
}
