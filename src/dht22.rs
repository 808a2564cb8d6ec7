use core::fmt;

use embedded_hal::{
    delay::DelayNs,
    digital::{InputPin, OutputPin},
};

use crate::error::DhtError;
use crate::reading::RawSample;

/// Maximum number of line transitions observed during one attempt.
const MAX_DATA_EDGES: usize = 85;

/// Per-edge poll cap in microseconds. Hitting it ends edge observation.
const MAX_EDGE_US: u16 = 255;

/// Handshake transitions discarded before bit decoding starts.
const PREAMBLE_EDGES: usize = 4;

/// Default pulse-width split between a `0` and a `1` bit, in microseconds.
///
/// The datasheet puts the split nearer 26-30 us vs 70 us; 16 us is the value
/// the protocol has been running with and has not been revalidated on
/// hardware. Tunable via [`Dht22::with_pulse_threshold`].
pub const DEFAULT_PULSE_THRESHOLD_US: u16 = 16;

/// Edge decoder for the DHT22 temperature and humidity sensor.
///
/// Drives the data line through the wake handshake, then busy-polls it at
/// 1 us resolution to time each transition. Every falling edge after the
/// handshake preamble carries one bit, encoded in the width of the preceding
/// high pulse.
pub struct Dht22<PIN, D> {
    pin: PIN,
    delay: D,
    pulse_threshold_us: u16,
}

impl<PIN, DELAY, E> Dht22<PIN, DELAY>
where
    PIN: InputPin<Error = E> + OutputPin<Error = E>,
    DELAY: DelayNs,
{
    /// Creates a new decoder.
    ///
    /// # Arguments
    ///
    /// * `pin` - The GPIO pin connected to the DHT22 data line. Must support
    ///   both input and output; driving it high releases the line to the
    ///   sensor.
    /// * `delay` - A delay provider implementing the `DelayNs` trait. The
    ///   1 us polling cadence depends on it not overshooting badly.
    pub fn new(pin: PIN, delay: DELAY) -> Self {
        Dht22 {
            pin,
            delay,
            pulse_threshold_us: DEFAULT_PULSE_THRESHOLD_US,
        }
    }

    /// Overrides the pulse-width threshold that separates a `0` bit from a
    /// `1` bit.
    pub fn with_pulse_threshold(mut self, threshold_us: u16) -> Self {
        self.pulse_threshold_us = threshold_us;
        self
    }

    /// Performs one decode attempt against the sensor.
    ///
    /// Returns the 40 raw bits as an unvalidated [`RawSample`]; checksum
    /// verification is the caller's concern. An attempt where the sensor
    /// stops signalling before 40 bits are in fails with
    /// [`DhtError::InsufficientData`].
    pub fn attempt_read(&mut self) -> Result<RawSample, DhtError<E>> {
        self.wake()?;

        let mut sample = RawSample::new();
        // The released line idles high until the sensor pulls it low.
        let mut level = true;

        for edge in 0..MAX_DATA_EDGES {
            let (width_us, capped) = self.wait_for_edge(level)?;
            level = self.pin.is_high()?;
            if capped {
                break;
            }
            // The handshake preamble carries no data; after it, only
            // falling edges do.
            if edge >= PREAMBLE_EDGES && !level {
                sample.push_bit(width_us > self.pulse_threshold_us);
            }
        }

        if sample.is_complete() {
            Ok(sample)
        } else {
            Err(DhtError::InsufficientData {
                bits: sample.bit_count(),
            })
        }
    }

    /// Wakes the sensor: hold the line low for 18 ms, high for 40 us, then
    /// leave it to the sensor.
    fn wake(&mut self) -> Result<(), DhtError<E>> {
        self.pin.set_low()?;
        self.delay.delay_ms(18);
        self.pin.set_high()?;
        self.delay.delay_us(40);
        Ok(())
    }

    /// Busy-polls at 1 us resolution until the line leaves `level`.
    ///
    /// Returns the elapsed microseconds and whether the poll cap was hit
    /// before any transition.
    fn wait_for_edge(&mut self, level: bool) -> Result<(u16, bool), DhtError<E>> {
        let mut width_us = 0;
        while self.pin.is_high()? == level {
            self.delay.delay_us(1);
            width_us += 1;
            if width_us == MAX_EDGE_US {
                return Ok((width_us, true));
            }
        }
        Ok((width_us, false))
    }
}

impl<PIN, DELAY, E> crate::scheduler::Sensor for Dht22<PIN, DELAY>
where
    PIN: InputPin<Error = E> + OutputPin<Error = E>,
    DELAY: DelayNs,
    E: fmt::Debug,
{
    type Error = DhtError<E>;

    fn attempt_read(&mut self) -> Result<RawSample, DhtError<E>> {
        Dht22::attempt_read(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reading::Reading;
    use embedded_hal_mock::eh1::delay::CheckedDelay;
    use embedded_hal_mock::eh1::delay::NoopDelay;
    use embedded_hal_mock::eh1::delay::Transaction as DelayTx;
    use embedded_hal_mock::eh1::digital::{
        Mock as PinMock, State as PinState, Transaction as PinTx,
    };

    /// One transition: `width_us` polls at the old level, the poll that sees
    /// the new level, and the re-read that records it.
    fn edge(txs: &mut Vec<PinTx>, width_us: u16, from: PinState, to: PinState) {
        for _ in 0..width_us {
            txs.push(PinTx::get(from));
        }
        txs.push(PinTx::get(to));
        txs.push(PinTx::get(to));
    }

    /// Poll-cap hit on an idle-high line: 255 equal polls plus the re-read.
    fn idle_high_cap(txs: &mut Vec<PinTx>) {
        for _ in 0..256 {
            txs.push(PinTx::get(PinState::High));
        }
    }

    fn wake_sequence() -> Vec<PinTx> {
        vec![PinTx::set(PinState::Low), PinTx::set(PinState::High)]
    }

    /// Four discarded handshake transitions, ending with the line high so
    /// the first data edge is a falling one.
    fn preamble(txs: &mut Vec<PinTx>) {
        edge(txs, 1, PinState::High, PinState::Low);
        edge(txs, 80, PinState::Low, PinState::High);
        edge(txs, 80, PinState::High, PinState::Low);
        edge(txs, 50, PinState::Low, PinState::High);
    }

    /// A falling edge timing the data pulse, then the inter-bit low.
    fn bit(txs: &mut Vec<PinTx>, one: bool) {
        edge(txs, if one { 70 } else { 5 }, PinState::High, PinState::Low);
        edge(txs, 50, PinState::Low, PinState::High);
    }

    /// Full transmission of the five bytes, ending on the idle line where
    /// the final edge wait runs into the poll cap.
    fn sensor_stream(bytes: [u8; 5]) -> Vec<PinTx> {
        let mut txs = wake_sequence();
        preamble(&mut txs);
        for byte in bytes {
            for i in 0..8 {
                bit(&mut txs, byte & (1 << (7 - i)) != 0);
            }
        }
        idle_high_cap(&mut txs);
        txs
    }

    #[test]
    fn wake_holds_line_low_then_releases() {
        let mut txs = wake_sequence();
        idle_high_cap(&mut txs);
        let mut pin = PinMock::new(&txs);

        let mut delay_txs = vec![DelayTx::delay_ms(18), DelayTx::delay_us(40)];
        delay_txs.extend(std::iter::repeat_n(DelayTx::delay_us(1), 255));
        let mut delay = CheckedDelay::new(&delay_txs);

        let mut dht = Dht22::new(pin.clone(), &mut delay);
        assert_eq!(
            dht.attempt_read().unwrap_err(),
            DhtError::InsufficientData { bits: 0 }
        );

        pin.done();
        delay.done();
    }

    #[test]
    fn decodes_forty_bits_from_falling_edges() {
        let bytes = [0x02, 0x26, 0x00, 0xE7, 0x0F];
        let mut pin = PinMock::new(&sensor_stream(bytes));

        let mut dht = Dht22::new(pin.clone(), NoopDelay);
        let sample = dht.attempt_read().unwrap();
        assert_eq!(sample, RawSample::from_bytes(bytes));
        assert_eq!(
            sample.verify(),
            Some(Reading {
                humidity: 550,
                temperature: 231,
            })
        );

        pin.done();
    }

    #[test]
    fn truncated_transmission_reports_bit_count() {
        let mut txs = wake_sequence();
        preamble(&mut txs);
        for _ in 0..10 {
            bit(&mut txs, true);
        }
        idle_high_cap(&mut txs);
        let mut pin = PinMock::new(&txs);

        let mut dht = Dht22::new(pin.clone(), NoopDelay);
        assert_eq!(
            dht.attempt_read().unwrap_err(),
            DhtError::InsufficientData { bits: 10 }
        );

        pin.done();
    }

    #[test]
    fn pulse_threshold_is_tunable() {
        let bytes = [0xFF; 5];
        let mut pin = PinMock::new(&sensor_stream(bytes));

        // With the split above the 70 us pulses, every bit reads as 0.
        let mut dht = Dht22::new(pin.clone(), NoopDelay).with_pulse_threshold(100);
        let sample = dht.attempt_read().unwrap();
        assert_eq!(sample, RawSample::from_bytes([0x00; 5]));

        pin.done();
    }
}
