//! System configuration parameters
//!
//! All tunable parameters for the terrarium controller.
//! Persisted as a postcard blob in NVS; missing or corrupt blobs fall back
//! to [`SystemConfig::default()`].

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;
use crate::sensors::CrossZoneEstimate;

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Function button ---
    /// Pin number reported in button events for the function button
    pub function_button_pin: u8,
    /// Hold time before a factory reset fires (milliseconds)
    pub factory_reset_hold_ms: u32,
    /// Button scan period (milliseconds)
    pub button_scan_interval_ms: u32,
    /// Level must be stable this long before an edge is reported (milliseconds)
    pub button_debounce_ms: u32,

    // --- Sensors ---
    /// Zone poll interval (milliseconds)
    pub sensor_poll_interval_ms: u32,
    /// Hot-zone estimate used while the hot sensor has never answered
    pub cross_zone_estimate: CrossZoneEstimate,

    // --- Feeder ---
    /// Time the feeder stays active before retracting (milliseconds)
    pub feeder_retract_ms: u32,
    /// Servo pulse width while active (microseconds, 50 Hz frame)
    pub feeder_pulse_us: u16,

    // --- Status LED ---
    /// Blink timings while a BLE connection is open
    pub led_ble_on_ms: u32,
    pub led_ble_off_ms: u32,
    /// Heartbeat blink timings while not provisioned
    pub led_idle_on_ms: u32,
    pub led_idle_off_ms: u32,
    /// Accept On/Off writes on endpoint 1
    pub remote_status_led: bool,

    // --- Diagnostics ---
    /// Log a diagnostics report every N dispatched events (0 = never)
    pub diagnostics_interval_events: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Function button (BOOT button on the devkit)
            function_button_pin: 0,
            factory_reset_hold_ms: 6000,
            button_scan_interval_ms: 10,
            button_debounce_ms: 50,

            // Sensors
            sensor_poll_interval_ms: 2000,
            cross_zone_estimate: CrossZoneEstimate::REFERENCE,

            // Feeder
            feeder_retract_ms: 1500,
            feeder_pulse_us: 1500,

            // Status LED
            led_ble_on_ms: 100,
            led_ble_off_ms: 100,
            led_idle_on_ms: 50,
            led_idle_off_ms: 950,
            remote_status_led: false,

            // Diagnostics
            diagnostics_interval_events: 500,
        }
    }
}

impl SystemConfig {
    /// Range-check every field. Invalid values are rejected, never clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1000..=60_000).contains(&self.factory_reset_hold_ms) {
            return Err(ConfigError::ValidationFailed(
                "factory_reset_hold_ms must be 1000–60000",
            ));
        }
        if !(5..=100).contains(&self.button_scan_interval_ms) {
            return Err(ConfigError::ValidationFailed(
                "button_scan_interval_ms must be 5–100",
            ));
        }
        if self.button_debounce_ms < self.button_scan_interval_ms || self.button_debounce_ms > 500 {
            return Err(ConfigError::ValidationFailed(
                "button_debounce_ms must be scan interval–500",
            ));
        }
        // DHT22 needs ~2 s between conversions.
        if !(2000..=3_600_000).contains(&self.sensor_poll_interval_ms) {
            return Err(ConfigError::ValidationFailed(
                "sensor_poll_interval_ms must be 2000–3600000",
            ));
        }
        let est = &self.cross_zone_estimate;
        if !(-20.0..=20.0).contains(&est.temperature_offset_c)
            || !(-50.0..=50.0).contains(&est.humidity_offset_pct)
        {
            return Err(ConfigError::ValidationFailed(
                "cross_zone_estimate offsets must be within ±20 °C / ±50 %",
            ));
        }
        if !(100..=60_000).contains(&self.feeder_retract_ms) {
            return Err(ConfigError::ValidationFailed(
                "feeder_retract_ms must be 100–60000",
            ));
        }
        if !(500..=2500).contains(&self.feeder_pulse_us) {
            return Err(ConfigError::ValidationFailed(
                "feeder_pulse_us must be 500–2500",
            ));
        }
        for ms in [
            self.led_ble_on_ms,
            self.led_ble_off_ms,
            self.led_idle_on_ms,
            self.led_idle_off_ms,
        ] {
            if !(10..=10_000).contains(&ms) {
                return Err(ConfigError::ValidationFailed(
                    "status LED phases must be 10–10000 ms",
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(SystemConfig::default().validate(), Ok(()));
    }

    #[test]
    fn reference_timings() {
        let c = SystemConfig::default();
        assert_eq!(c.factory_reset_hold_ms, 6000);
        assert_eq!(c.sensor_poll_interval_ms, 2000);
        assert_eq!((c.led_ble_on_ms, c.led_ble_off_ms), (100, 100));
        assert_eq!((c.led_idle_on_ms, c.led_idle_off_ms), (50, 950));
        assert!(!c.remote_status_led);
    }

    #[test]
    fn out_of_range_rejected_not_clamped() {
        let mut c = SystemConfig::default();
        c.sensor_poll_interval_ms = 500;
        assert!(matches!(c.validate(), Err(ConfigError::ValidationFailed(_))));
        assert_eq!(c.sensor_poll_interval_ms, 500);

        let mut c = SystemConfig::default();
        c.feeder_pulse_us = 3000;
        assert!(c.validate().is_err());

        let mut c = SystemConfig::default();
        c.button_debounce_ms = 5;
        assert!(c.validate().is_err());

        let mut c = SystemConfig::default();
        c.led_idle_off_ms = 0;
        assert!(c.validate().is_err());
    }

    #[test]
    fn postcard_roundtrip() {
        let mut c = SystemConfig::default();
        c.remote_status_led = true;
        c.feeder_retract_ms = 2500;
        let bytes = postcard::to_allocvec(&c).unwrap();
        let c2: SystemConfig = postcard::from_bytes(&bytes).unwrap();
        assert_eq!(c, c2);
    }
}
