//! Raw sample accumulation and conversion to a validated reading.

/// Number of data bits in one DHT22 transmission.
pub const DATA_BITS: u8 = 40;

/// The five raw bytes of one transmission, built bit by bit during a decode
/// attempt: `[humidity_high, humidity_low, temp_high, temp_low, checksum]`.
///
/// Bits past the 40th are ignored, so the accumulator can never select an
/// out-of-range byte no matter how many falling edges the decoder feeds it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RawSample {
    bytes: [u8; 5],
    bits: u8,
}

impl RawSample {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one bit, most significant first within each byte.
    pub fn push_bit(&mut self, high: bool) {
        if self.bits >= DATA_BITS {
            return;
        }
        let byte = &mut self.bytes[(self.bits / 8) as usize];
        *byte <<= 1;
        if high {
            *byte |= 1;
        }
        self.bits += 1;
    }

    /// Number of bits accumulated so far.
    pub fn bit_count(&self) -> u8 {
        self.bits
    }

    /// True once all 40 bits have been accumulated.
    pub fn is_complete(&self) -> bool {
        self.bits == DATA_BITS
    }

    /// Checksum-verifies the sample and converts it into a [`Reading`].
    ///
    /// The checksum byte must equal the truncated sum of the four data bytes.
    /// Returns `None` on mismatch or if the sample is incomplete.
    pub fn verify(&self) -> Option<Reading> {
        if !self.is_complete() {
            return None;
        }
        let [hum_hi, hum_lo, temp_hi, temp_lo, checksum] = self.bytes;
        let sum = hum_hi
            .wrapping_add(hum_lo)
            .wrapping_add(temp_hi)
            .wrapping_add(temp_lo);
        if sum != checksum {
            return None;
        }

        let humidity = u16::from_be_bytes([hum_hi, hum_lo]);
        // Temperature is sign-magnitude: the high bit of the third byte is
        // the sign, the remaining 15 bits the magnitude in tenths.
        let magnitude = u16::from_be_bytes([temp_hi & 0x7F, temp_lo]) as i16;
        let temperature = if temp_hi & 0x80 != 0 {
            -magnitude
        } else {
            magnitude
        };

        Some(Reading {
            humidity,
            temperature,
        })
    }

    #[cfg(test)]
    pub(crate) fn from_bytes(bytes: [u8; 5]) -> Self {
        Self {
            bytes,
            bits: DATA_BITS,
        }
    }
}

/// A checksum-verified measurement.
///
/// Both fields are in tenths, matching what the sensor transmits and what the
/// wire protocol carries: `humidity` in tenths of a percent relative
/// humidity, `temperature` in tenths of a degree Celsius.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reading {
    pub humidity: u16,
    pub temperature: i16,
}

impl Reading {
    /// Relative humidity in percent.
    pub fn relative_humidity(&self) -> f32 {
        self.humidity as f32 / 10.0
    }

    /// Temperature in degrees Celsius.
    pub fn temperature_celsius(&self) -> f32 {
        self.temperature as f32 / 10.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(bytes: [u8; 5]) -> RawSample {
        let mut raw = RawSample::new();
        for byte in bytes {
            for i in 0..8 {
                raw.push_bit(byte & (1 << (7 - i)) != 0);
            }
        }
        raw
    }

    #[test]
    fn accumulates_bits_msb_first() {
        let raw = sample([0x02, 0x26, 0x00, 0xE7, 0x0F]);
        assert!(raw.is_complete());
        assert_eq!(raw, RawSample::from_bytes([0x02, 0x26, 0x00, 0xE7, 0x0F]));
    }

    #[test]
    fn push_bit_saturates_at_forty_bits() {
        let mut raw = sample([0xFF; 5]);
        raw.push_bit(true);
        raw.push_bit(false);
        assert_eq!(raw.bit_count(), DATA_BITS);
        assert_eq!(raw, RawSample::from_bytes([0xFF; 5]));
    }

    #[test]
    fn verify_accepts_matching_checksum() {
        // 55.0% RH, 23.1 deg C
        let raw = sample([0x02, 0x26, 0x00, 0xE7, 0x0F]);
        assert_eq!(
            raw.verify(),
            Some(Reading {
                humidity: 550,
                temperature: 231,
            })
        );
    }

    #[test]
    fn verify_checksum_wraps() {
        let prefix = [0xF0, 0xF0, 0x70, 0xF0];
        let sum = prefix.iter().fold(0u8, |s, b| s.wrapping_add(*b));
        assert!(
            sample([prefix[0], prefix[1], prefix[2], prefix[3], sum])
                .verify()
                .is_some()
        );
    }

    #[test]
    fn verify_rejects_every_other_checksum_byte() {
        let prefix = [0x01, 0x90, 0x00, 0xF6];
        let good = prefix.iter().fold(0u8, |s, b| s.wrapping_add(*b));
        for byte in 0..=255u8 {
            let raw = sample([prefix[0], prefix[1], prefix[2], prefix[3], byte]);
            assert_eq!(raw.verify().is_some(), byte == good);
        }
    }

    #[test]
    fn verify_rejects_incomplete_sample() {
        let mut raw = RawSample::new();
        for _ in 0..39 {
            raw.push_bit(false);
        }
        assert!(raw.verify().is_none());
    }

    #[test]
    fn negative_temperature_is_sign_magnitude() {
        // -1.0 deg C: sign bit set, magnitude 10
        let raw = sample([0x01, 0x90, 0x80, 0x0A, 0x1B]);
        let reading = raw.verify().unwrap();
        assert_eq!(reading.temperature, -10);
        assert_eq!(reading.temperature_celsius(), -1.0);
    }

    #[test]
    fn positive_temperature_masks_sign_bit() {
        for (temp_hi, temp_lo, expected) in [(0x00, 0xF6, 246), (0x7F, 0xFF, 0x7FFF)] {
            let sum = 0x01u8
                .wrapping_add(0x90)
                .wrapping_add(temp_hi)
                .wrapping_add(temp_lo);
            let raw = sample([0x01, 0x90, temp_hi, temp_lo, sum]);
            assert_eq!(raw.verify().unwrap().temperature, expected);
        }
    }

    #[test]
    fn float_accessors_scale_by_ten() {
        let reading = Reading {
            humidity: 550,
            temperature: 231,
        };
        assert_eq!(reading.relative_humidity(), 55.0);
        assert_eq!(reading.temperature_celsius(), 23.1);
    }
}
