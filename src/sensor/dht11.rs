//! DHT11 temperature / humidity sensor on a single open-drain data line.
//!
//! ```text
//! host   ‾‾‾\____ ≥18 ms ____/‾‾‾
//! sensor                          \__80µs__/‾‾80µs‾‾\
//! bit                             \__50µs__/‾‾26µs‾‾\   = 0
//!                                 \__50µs__/‾‾‾‾70µs‾‾‾‾\ = 1
//! ```
//!
//! 40 bits, MSB first: humidity int, humidity frac, temperature int,
//! temperature frac (bit 7 = sign), checksum.
//!
//! Timing is measured by polling the line in 1 µs steps, so the whole
//! read blocks the calling task for about 25 ms.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::config::{DHT11_BIT_THRESHOLD_US, DHT11_EDGE_TIMEOUT_US, DHT11_START_LOW_MS};
use crate::error::ReadError;
use crate::reading::EnvironmentReading;
use crate::sensor::PolledSource;

pub struct Dht11<P, D> {
    pin: P,
    delay: D,
}

impl<P, D> Dht11<P, D>
where
    P: InputPin + OutputPin,
    D: DelayNs,
{
    /// `pin` must be open-drain with a pull-up; driving it high releases
    /// the line.
    pub fn new(pin: P, delay: D) -> Self {
        Self { pin, delay }
    }

    pub fn release(self) -> (P, D) {
        (self.pin, self.delay)
    }

    fn read_frame(&mut self) -> Result<[u8; 5], ReadError> {
        self.pin.set_low().map_err(|_| ReadError::Bus)?;
        self.delay.delay_ms(DHT11_START_LOW_MS);
        self.pin.set_high().map_err(|_| ReadError::Bus)?;

        // Pull-up, then the sensor's 80 µs low / 80 µs high response.
        self.wait_while(true)?;
        self.wait_while(false)?;
        self.wait_while(true)?;

        let mut frame = [0u8; 5];
        for bit in 0..40 {
            self.wait_while(false)?;
            let high_us = self.wait_while(true)?;
            if high_us > DHT11_BIT_THRESHOLD_US {
                frame[bit / 8] |= 0x80 >> (bit % 8);
            }
        }
        Ok(frame)
    }

    /// Wait for the line to leave `high`; returns how long it stayed (µs).
    fn wait_while(&mut self, high: bool) -> Result<u32, ReadError> {
        let mut elapsed = 0;
        while self.pin.is_high().map_err(|_| ReadError::Bus)? == high {
            if elapsed >= DHT11_EDGE_TIMEOUT_US {
                return Err(ReadError::Timeout);
            }
            self.delay.delay_us(1);
            elapsed += 1;
        }
        Ok(elapsed)
    }
}

impl<P, D> PolledSource for Dht11<P, D>
where
    P: InputPin + OutputPin,
    D: DelayNs,
{
    type Reading = EnvironmentReading;

    fn read(&mut self) -> Result<EnvironmentReading, ReadError> {
        let frame = self.read_frame()?;
        decode_frame(frame)
    }
}

/// Validate the checksum and convert a raw 5-byte frame.
pub fn decode_frame(frame: [u8; 5]) -> Result<EnvironmentReading, ReadError> {
    let [rh_int, rh_frac, t_int, t_frac, checksum] = frame;
    let sum = rh_int
        .wrapping_add(rh_frac)
        .wrapping_add(t_int)
        .wrapping_add(t_frac);
    if sum != checksum {
        return Err(ReadError::Checksum {
            expected: checksum,
            actual: sum,
        });
    }

    let humidity_pct = f32::from(rh_int) + f32::from(rh_frac) / 10.0;
    let mut temperature_c = f32::from(t_int) + f32::from(t_frac & 0x7F) / 10.0;
    if t_frac & 0x80 != 0 {
        temperature_c = -temperature_c;
    }
    Ok(EnvironmentReading {
        temperature_c,
        humidity_pct,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;
    use core::convert::Infallible;
    use embedded_hal::digital::ErrorType;
    use heapless::Vec;

    /// Microsecond clock shared by the fake line and the fake delay.
    struct FakeDelay<'a>(&'a Cell<u32>);

    impl DelayNs for FakeDelay<'_> {
        fn delay_ns(&mut self, ns: u32) {
            self.0.set(self.0.get() + ns.div_ceil(1000));
        }
    }

    /// Replays a waveform of `(level, duration_us)` segments starting at
    /// the moment the host releases the line. Idles high afterwards.
    struct ScriptedLine<'a> {
        clock: &'a Cell<u32>,
        released_at: Option<u32>,
        waveform: Vec<(bool, u32), 96>,
    }

    impl ErrorType for ScriptedLine<'_> {
        type Error = Infallible;
    }

    impl OutputPin for ScriptedLine<'_> {
        fn set_low(&mut self) -> Result<(), Infallible> {
            self.released_at = None;
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Infallible> {
            self.released_at = Some(self.clock.get());
            Ok(())
        }
    }

    impl InputPin for ScriptedLine<'_> {
        fn is_high(&mut self) -> Result<bool, Infallible> {
            let Some(start) = self.released_at else {
                return Ok(false);
            };
            let mut t = self.clock.get() - start;
            for &(level, duration) in &self.waveform {
                if t < duration {
                    return Ok(level);
                }
                t -= duration;
            }
            Ok(true)
        }

        fn is_low(&mut self) -> Result<bool, Infallible> {
            self.is_high().map(|h| !h)
        }
    }

    fn waveform_for(frame: [u8; 5]) -> Vec<(bool, u32), 96> {
        let mut w = Vec::new();
        w.push((true, 30)).unwrap();
        w.push((false, 80)).unwrap();
        w.push((true, 80)).unwrap();
        for bit in 0..40 {
            let one = frame[bit / 8] & (0x80 >> (bit % 8)) != 0;
            w.push((false, 50)).unwrap();
            w.push((true, if one { 70 } else { 26 })).unwrap();
        }
        w.push((false, 50)).unwrap();
        w
    }

    fn read_with(waveform: Vec<(bool, u32), 96>) -> Result<EnvironmentReading, ReadError> {
        let clock = Cell::new(0);
        let line = ScriptedLine {
            clock: &clock,
            released_at: None,
            waveform,
        };
        let mut sensor = Dht11::new(line, FakeDelay(&clock));
        sensor.read()
    }

    #[test]
    fn reads_a_full_frame() {
        let reading = read_with(waveform_for([41, 0, 23, 5, 69])).unwrap();
        assert_eq!(reading.humidity_pct, 41.0);
        assert_eq!(reading.temperature_c, 23.5);
    }

    #[test]
    fn corrupted_frame_fails_checksum() {
        assert_eq!(
            read_with(waveform_for([41, 0, 23, 5, 70])),
            Err(ReadError::Checksum {
                expected: 70,
                actual: 69
            })
        );
    }

    #[test]
    fn silent_sensor_times_out() {
        let mut w = Vec::new();
        w.push((true, 500)).unwrap();
        assert_eq!(read_with(w), Err(ReadError::Timeout));
    }

    #[test]
    fn truncated_frame_times_out() {
        let mut w = waveform_for([41, 0, 23, 5, 69]);
        w.truncate(20);
        // Line stuck low after the cut.
        w.push((false, 10_000)).unwrap();
        assert_eq!(read_with(w), Err(ReadError::Timeout));
    }

    #[test]
    fn sign_bit_negates_temperature() {
        let reading = decode_frame([50, 0, 2, 0x85, 50 + 2 + 0x85]).unwrap();
        assert_eq!(reading.temperature_c, -2.5);
        assert_eq!(reading.humidity_pct, 50.0);
    }
}
