//! Raspberry Pi bindings for the decoder's GPIO and timing seams.

use std::convert::Infallible;
use std::time::{Duration, Instant};

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, InputPin, OutputPin};
use rppal::gpio::{Gpio, IoPin, Mode};

/// The sensor data line.
///
/// The single-wire protocol alternates between the host driving the line and
/// the sensor signalling on it; writes put the pin in output mode and reads
/// put it back in input mode, mirroring how the wake handshake hands the
/// line over.
pub struct DataPin {
    pin: IoPin,
}

impl DataPin {
    /// Claims the given pin (BCM numbering).
    pub fn new(gpio: &Gpio, bcm_pin: u8) -> rppal::gpio::Result<Self> {
        let pin = gpio.get(bcm_pin)?.into_io(Mode::Input);
        Ok(DataPin { pin })
    }

    fn ensure_mode(&mut self, mode: Mode) {
        if self.pin.mode() != mode {
            self.pin.set_mode(mode);
        }
    }
}

impl ErrorType for DataPin {
    type Error = Infallible;
}

impl OutputPin for DataPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.ensure_mode(Mode::Output);
        self.pin.set_low();
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.ensure_mode(Mode::Output);
        self.pin.set_high();
        Ok(())
    }
}

impl InputPin for DataPin {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        self.ensure_mode(Mode::Input);
        Ok(self.pin.is_high())
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        Ok(!self.is_high()?)
    }
}

/// Busy-wait delay provider.
///
/// `thread::sleep` cannot hold the 1 us cadence the edge decoder polls at,
/// so delays spin on [`Instant`] instead.
pub struct SpinDelay;

impl DelayNs for SpinDelay {
    fn delay_ns(&mut self, ns: u32) {
        let target = Duration::from_nanos(ns as u64);
        let start = Instant::now();
        while start.elapsed() < target {
            std::hint::spin_loop();
        }
    }
}
