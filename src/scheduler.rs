//! Retry scheduling around the edge decoder.
//!
//! The sensor cannot be polled back to back; the scheduler owns the
//! timestamp of the most recent attempt and spaces attempts out, retrying
//! failed decodes until a caller-supplied deadline expires.

use core::fmt;
use std::thread;
use std::time::{Duration, Instant};

use log::debug;

use crate::proto::Response;
use crate::reading::RawSample;

/// Minimum spacing between the start of consecutive decode attempts.
///
/// The original declared this constant in microseconds but compared it
/// against a millisecond clock, so the enforced floor is 2000 ms. The
/// literal numeric behavior is what the peer has been calibrated against
/// and is kept as is.
const MIN_ATTEMPT_SPACING: u64 = 2_000;

/// One decode attempt against the sensor, yielding unvalidated raw bits.
pub trait Sensor {
    type Error: fmt::Debug;

    fn attempt_read(&mut self) -> Result<RawSample, Self::Error>;
}

/// Monotonic time source the scheduler sleeps and measures against.
pub trait Clock {
    fn now_ms(&self) -> u64;
    fn sleep_ms(&self, ms: u64);
}

/// Wall clock backed by [`Instant`], counting from its construction.
pub struct SystemClock {
    epoch: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        SystemClock {
            epoch: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    fn sleep_ms(&self, ms: u64) {
        thread::sleep(Duration::from_millis(ms));
    }
}

/// Drives decode attempts until one validates or the deadline passes.
pub struct ReadScheduler<S, C> {
    sensor: S,
    clock: C,
    last_attempt_ms: Option<u64>,
}

impl<S, C> ReadScheduler<S, C>
where
    S: Sensor,
    C: Clock,
{
    pub fn new(sensor: S, clock: C) -> Self {
        ReadScheduler {
            sensor,
            clock,
            last_attempt_ms: None,
        }
    }

    /// Reads the sensor, retrying until a checksum-verified reading is
    /// obtained or `timeout_ms` has elapsed.
    ///
    /// At least one attempt is made even for a zero timeout. The timestamp
    /// of every attempt is recorded, success or failure, so the spacing
    /// floor holds across commands.
    pub fn read(&mut self, timeout_ms: u64) -> Response {
        let deadline = self.clock.now_ms().saturating_add(timeout_ms);
        loop {
            self.wait_until_ready();

            let attempt = self.sensor.attempt_read();
            self.last_attempt_ms = Some(self.clock.now_ms());

            match attempt {
                Ok(sample) => match sample.verify() {
                    Some(reading) => return Response::Ok(reading),
                    None => debug!("decode attempt failed: checksum mismatch"),
                },
                Err(err) => debug!("decode attempt failed: {err:?}"),
            }

            if self.clock.now_ms() >= deadline {
                return Response::Timeout;
            }
        }
    }

    /// Sleeps out the remainder of the spacing floor since the last attempt.
    /// A scheduler that has never attempted a read proceeds immediately.
    fn wait_until_ready(&self) {
        let Some(last) = self.last_attempt_ms else {
            return;
        };
        let elapsed = self.clock.now_ms().saturating_sub(last);
        if elapsed < MIN_ATTEMPT_SPACING {
            self.clock.sleep_ms(MIN_ATTEMPT_SPACING - elapsed);
        }
    }
}

impl<S, C> crate::port::ReadHandler for ReadScheduler<S, C>
where
    S: Sensor,
    C: Clock,
{
    fn handle_read(&mut self, timeout_ms: u64) -> Response {
        self.read(timeout_ms)
    }
}
