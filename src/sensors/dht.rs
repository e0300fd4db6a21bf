//! DHT11 / DHT22 single-wire temperature + humidity sensor.
//!
//! ## Protocol
//!
//! The host pulls the line low (≥18 ms for DHT11, ≥1 ms for DHT22) and
//! releases it. The sensor answers with ~80 µs low + ~80 µs high, then sends
//! 40 bits MSB first. Each bit is ~50 µs low followed by a high pulse whose
//! width encodes the value: ~26 µs = 0, ~70 µs = 1.
//!
//! ```text
//! byte 0   byte 1   byte 2   byte 3   byte 4
//! RH hi    RH lo    T hi     T lo     checksum = (b0+b1+b2+b3) & 0xFF
//! ```
//!
//! The line is open-drain with an external pull-up, so "release" is
//! `set_high()` on the same pin that is later sampled.
//!
//! Pulse widths are measured by polling with 1 µs delays; the threshold
//! sits between the two nominal widths so loop overhead only shortens the
//! count.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use super::{Measurement, ZoneSensor};
use crate::error::SensorError;

/// Response/bit edge timeout.
const EDGE_TIMEOUT_US: u32 = 100;
/// High pulses longer than this are a `1`.
const ONE_THRESHOLD_US: u32 = 40;

/// Sensor variant. Both share the wire protocol, not the frame layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DhtModel {
    Dht11,
    Dht22,
}

impl DhtModel {
    fn start_low_ms(self) -> u32 {
        match self {
            Self::Dht11 => 18,
            Self::Dht22 => 2,
        }
    }
}

/// Decode a 5-byte frame into a measurement, checking the checksum.
pub fn decode(model: DhtModel, frame: [u8; 5]) -> Result<Measurement, SensorError> {
    let sum = frame[0]
        .wrapping_add(frame[1])
        .wrapping_add(frame[2])
        .wrapping_add(frame[3]);
    if sum != frame[4] {
        return Err(SensorError::Checksum);
    }

    let m = match model {
        DhtModel::Dht11 => {
            let humidity = f32::from(frame[0]) + f32::from(frame[1]) / 10.0;
            let magnitude = f32::from(frame[2]) + f32::from(frame[3] & 0x7F) / 10.0;
            let temperature = if frame[3] & 0x80 != 0 { -magnitude } else { magnitude };
            Measurement::new(temperature, humidity)
        }
        DhtModel::Dht22 => {
            let humidity = f32::from(u16::from_be_bytes([frame[0], frame[1]])) / 10.0;
            let raw = u16::from_be_bytes([frame[2] & 0x7F, frame[3]]);
            let magnitude = f32::from(raw) / 10.0;
            let temperature = if frame[2] & 0x80 != 0 { -magnitude } else { magnitude };
            Measurement::new(temperature, humidity)
        }
    };

    if !(0.0..=100.0).contains(&m.humidity_pct) || !(-40.0..=80.0).contains(&m.temperature_c) {
        return Err(SensorError::OutOfRange);
    }
    Ok(m)
}

/// Bit-banged DHT reader over an open-drain pin.
pub struct Dht<P, D> {
    pin: P,
    delay: D,
    model: DhtModel,
}

impl<P, D> Dht<P, D>
where
    P: InputPin + OutputPin,
    D: DelayNs,
{
    /// Takes ownership of the pin and leaves the line released (idle high).
    pub fn new(mut pin: P, delay: D, model: DhtModel) -> Self {
        let _ = pin.set_high();
        Self { pin, delay, model }
    }

    pub fn model(&self) -> DhtModel {
        self.model
    }

    /// Run one full transaction and decode the frame.
    pub fn read_frame(&mut self) -> Result<[u8; 5], SensorError> {
        self.pin.set_low().map_err(|_| SensorError::Bus)?;
        self.delay.delay_ms(self.model.start_low_ms());
        self.pin.set_high().map_err(|_| SensorError::Bus)?;

        // Sensor response: low, high, then the first bit's low phase.
        self.wait_for(false).map_err(|_| SensorError::NoResponse)?;
        self.wait_for(true).map_err(|_| SensorError::NoResponse)?;
        self.wait_for(false).map_err(|_| SensorError::NoResponse)?;

        let mut frame = [0u8; 5];
        for byte in &mut frame {
            for _ in 0..8 {
                self.wait_for(true)?;
                let high_us = self.wait_for(false)?;
                *byte = (*byte << 1) | u8::from(high_us > ONE_THRESHOLD_US);
            }
        }
        Ok(frame)
    }

    /// Poll until the line reaches `high`, returning the elapsed µs.
    fn wait_for(&mut self, high: bool) -> Result<u32, SensorError> {
        let mut elapsed = 0;
        loop {
            let level = self.pin.is_high().map_err(|_| SensorError::Bus)?;
            if level == high {
                return Ok(elapsed);
            }
            if elapsed >= EDGE_TIMEOUT_US {
                return Err(SensorError::Timeout);
            }
            self.delay.delay_us(1);
            elapsed += 1;
        }
    }
}

impl<P, D> ZoneSensor for Dht<P, D>
where
    P: InputPin + OutputPin,
    D: DelayNs,
{
    fn read(&mut self) -> Result<Measurement, SensorError> {
        let frame = self.read_frame()?;
        decode(self.model, frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_checksum(b: [u8; 4]) -> [u8; 5] {
        let sum = b.iter().fold(0u8, |acc, x| acc.wrapping_add(*x));
        [b[0], b[1], b[2], b[3], sum]
    }

    #[test]
    fn dht11_frame() {
        let m = decode(DhtModel::Dht11, with_checksum([40, 0, 18, 5])).unwrap();
        assert_eq!(m.humidity_centi(), 4000);
        assert_eq!(m.temperature_centi(), 1850);
    }

    #[test]
    fn dht22_frame() {
        // 60.0 % RH, 21.5 °C
        let m = decode(DhtModel::Dht22, with_checksum([0x02, 0x58, 0x00, 0xD7])).unwrap();
        assert_eq!(m.humidity_centi(), 6000);
        assert_eq!(m.temperature_centi(), 2150);
    }

    #[test]
    fn dht22_negative_temperature() {
        // -10.1 °C
        let m = decode(DhtModel::Dht22, with_checksum([0x01, 0x90, 0x80, 0x65])).unwrap();
        assert_eq!(m.temperature_centi(), -1010);
    }

    #[test]
    fn bad_checksum_rejected() {
        let mut frame = with_checksum([40, 0, 18, 5]);
        frame[4] ^= 0x01;
        assert_eq!(decode(DhtModel::Dht11, frame), Err(SensorError::Checksum));
    }

    #[test]
    fn implausible_humidity_rejected() {
        let frame = with_checksum([0x07, 0xD0, 0x00, 0xD7]); // 200.0 %
        assert_eq!(decode(DhtModel::Dht22, frame), Err(SensorError::OutOfRange));
    }
}
