//! Water-section NTC thermistor (10 kOhm @ 25 C, B = 3950).
//!
//! Wired in a voltage divider with a fixed 10 kOhm resistor and read
//! through a 12-bit ADC channel. The simplified Beta equation converts
//! resistance to temperature.
//!
//! The ADC itself is behind [`AdcChannel`] so the same conversion runs on
//! the ESP32 oneshot driver and on host tests with injected raw values.

use super::{Measurement, ZoneSensor};
use crate::error::SensorError;

const R25: f32 = 10_000.0;
const BETA: f32 = 3950.0;
const T25_K: f32 = 298.15;
const R_DIVIDER: f32 = 10_000.0;
const ADC_MAX: f32 = 4095.0;
const V_REF: f32 = 3.3;
/// Divider voltages this close to either rail mean an open or shorted probe.
const RAIL_MARGIN_V: f32 = 0.01;

/// One raw ADC sample source.
pub trait AdcChannel {
    fn read_raw(&mut self) -> Result<u16, SensorError>;
}

impl<F> AdcChannel for F
where
    F: FnMut() -> Result<u16, SensorError>,
{
    fn read_raw(&mut self) -> Result<u16, SensorError> {
        self()
    }
}

/// Convert a raw 12-bit divider reading to degrees Celsius.
///
/// Returns `OutOfRange` for readings at the rails, which a working probe
/// never produces.
pub fn adc_to_celsius(raw: u16) -> Result<f32, SensorError> {
    let voltage = (f32::from(raw) / ADC_MAX) * V_REF;
    if voltage <= RAIL_MARGIN_V || voltage >= (V_REF - RAIL_MARGIN_V) {
        return Err(SensorError::OutOfRange);
    }
    let r_ntc = R_DIVIDER * voltage / (V_REF - voltage);
    let inv_t = (1.0 / T25_K) + (1.0 / BETA) * (r_ntc / R25).ln();
    if inv_t <= 0.0 {
        return Err(SensorError::OutOfRange);
    }
    Ok((1.0 / inv_t) - 273.15)
}

/// Temperature-only sensor for the water zone. Humidity is always 0.
pub struct WaterThermistor<A> {
    adc: A,
}

impl<A: AdcChannel> WaterThermistor<A> {
    pub fn new(adc: A) -> Self {
        Self { adc }
    }
}

impl<A: AdcChannel> ZoneSensor for WaterThermistor<A> {
    fn read(&mut self) -> Result<Measurement, SensorError> {
        let raw = self.adc.read_raw()?;
        let celsius = adc_to_celsius(raw)?;
        Ok(Measurement::new(celsius, 0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn midscale_is_room_temperature() {
        // Equal divider halves → R_ntc = R25 → 25 °C.
        let c = adc_to_celsius(2048).unwrap();
        assert!((c - 25.0).abs() < 0.1, "got {c}");
    }

    #[test]
    fn higher_voltage_is_colder() {
        // NTC on the high side of the divider: more resistance, more voltage.
        let warm = adc_to_celsius(1500).unwrap();
        let cold = adc_to_celsius(2600).unwrap();
        assert!(cold < warm);
    }

    #[test]
    fn rails_are_rejected() {
        assert_eq!(adc_to_celsius(0), Err(SensorError::OutOfRange));
        assert_eq!(adc_to_celsius(4095), Err(SensorError::OutOfRange));
    }

    #[test]
    fn adc_error_propagates() {
        let mut t = WaterThermistor::new(|| -> Result<u16, SensorError> { Err(SensorError::AdcReadFailed) });
        assert_eq!(t.read(), Err(SensorError::AdcReadFailed));
    }

    #[test]
    fn reading_has_no_humidity() {
        let mut t = WaterThermistor::new(|| -> Result<u16, SensorError> { Ok(2048) });
        let m = t.read().unwrap();
        assert_eq!(m.humidity_pct, 0.0);
    }
}
