//! Sensing zones, the per-zone reading cache, and the fallback policy.
//!
//! Each poll of a zone follows the same protocol:
//!
//! 1. Fetch from the zone's sensor.
//! 2. On failure, keep publishing the last good reading for that zone, or
//!    the zero state if there never was one.
//! 3. On success, overwrite the zone's cached reading.
//! 4. Hot zone only: if the hot cache is still empty but the cold cache is
//!    not, publish a [`CrossZoneEstimate`] derived from the cold reading.
//!    The estimate is never written back into the hot cache.
//!
//! Readings are kept at full precision and converted to fixed point
//! (hundredths, truncated) only when published; see [`to_centi`].

pub mod dht;
pub mod temperature;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::SensorError;

/// A physical sensing location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Zone {
    /// Basking spot under the heat lamp (DHT22).
    Hot,
    /// Cool end of the enclosure (DHT11).
    Cold,
    /// Water section (NTC thermistor, temperature only).
    Water,
}

impl Zone {
    /// Poll order within one sensor-timer tick.
    pub const ALL: [Zone; 3] = [Zone::Hot, Zone::Cold, Zone::Water];

    pub fn name(self) -> &'static str {
        match self {
            Self::Hot => "hot",
            Self::Cold => "cold",
            Self::Water => "water",
        }
    }

    /// Whether this zone exposes a humidity attribute.
    pub fn has_humidity(self) -> bool {
        !matches!(self, Self::Water)
    }
}

/// One temperature/humidity sample at full precision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub temperature_c: f32,
    pub humidity_pct: f32,
}

impl Measurement {
    /// The uninitialised / failure state.
    pub const ZERO: Measurement = Measurement {
        temperature_c: 0.0,
        humidity_pct: 0.0,
    };

    pub const fn new(temperature_c: f32, humidity_pct: f32) -> Self {
        Self {
            temperature_c,
            humidity_pct,
        }
    }

    /// Temperature in 0.01 °C, as published.
    pub fn temperature_centi(&self) -> i16 {
        to_centi(self.temperature_c)
    }

    /// Relative humidity in 0.01 %, as published.
    pub fn humidity_centi(&self) -> i16 {
        to_centi(self.humidity_pct)
    }
}

/// Slack added to the scaled magnitude before truncating. Covers the
/// representation error of in-range `f32` readings (tenths from the DHT
/// decoder come out as e.g. 2.0999999).
const CENTI_SNAP: f64 = 1e-3;

/// `value × 100`, truncated toward zero after snapping to the nearest
/// hundredth within [`CENTI_SNAP`]. Saturates at the `i16` range; NaN
/// publishes as 0.
pub fn to_centi(value: f32) -> i16 {
    if value.is_nan() {
        return 0;
    }
    let scaled = f64::from(value) * 100.0;
    (scaled + scaled.signum() * CENTI_SNAP).trunc() as i16
}

/// A driver that can produce a [`Measurement`] for one zone.
pub trait ZoneSensor {
    fn read(&mut self) -> Result<Measurement, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Cross-zone estimate
// ───────────────────────────────────────────────────────────────

/// Degraded-mode estimate of the hot zone from the cold zone.
///
/// This is a fixed offset, not a measurement. It only applies while the hot
/// zone has never produced a reading of its own.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CrossZoneEstimate {
    pub temperature_offset_c: f32,
    pub humidity_offset_pct: f32,
}

impl CrossZoneEstimate {
    /// +2 °C, +11 % relative humidity.
    pub const REFERENCE: CrossZoneEstimate = CrossZoneEstimate {
        temperature_offset_c: 2.0,
        humidity_offset_pct: 11.0,
    };

    pub fn estimate_hot(&self, cold: Measurement) -> Measurement {
        Measurement {
            temperature_c: cold.temperature_c + self.temperature_offset_c,
            humidity_pct: cold.humidity_pct + self.humidity_offset_pct,
        }
    }
}

impl Default for CrossZoneEstimate {
    fn default() -> Self {
        Self::REFERENCE
    }
}

// ───────────────────────────────────────────────────────────────
// Reading cache
// ───────────────────────────────────────────────────────────────

/// Where a published reading came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadingSource {
    /// Fetched on this poll.
    Fresh,
    /// Fetch failed; last good reading for the zone.
    Cached,
    /// Fetch failed, nothing cached; derived from the cold zone.
    Estimated,
    /// Fetch failed and no fallback exists; zero state.
    Unavailable,
}

/// The reading a zone poll settled on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolved {
    pub reading: Measurement,
    pub source: ReadingSource,
}

/// Last good reading per zone.
#[derive(Debug, Clone)]
pub struct SensorCaches {
    hot: Option<Measurement>,
    cold: Option<Measurement>,
    water: Option<Measurement>,
    policy: CrossZoneEstimate,
}

impl SensorCaches {
    pub fn new(policy: CrossZoneEstimate) -> Self {
        Self {
            hot: None,
            cold: None,
            water: None,
            policy,
        }
    }

    /// The last successful reading for `zone`, if any.
    pub fn cached(&self, zone: Zone) -> Option<Measurement> {
        match zone {
            Zone::Hot => self.hot,
            Zone::Cold => self.cold,
            Zone::Water => self.water,
        }
    }

    fn slot_mut(&mut self, zone: Zone) -> &mut Option<Measurement> {
        match zone {
            Zone::Hot => &mut self.hot,
            Zone::Cold => &mut self.cold,
            Zone::Water => &mut self.water,
        }
    }

    /// Fold one fetch result into the cache and pick the reading to publish.
    pub fn resolve(
        &mut self,
        zone: Zone,
        fetched: Result<Measurement, SensorError>,
    ) -> Resolved {
        let slot = self.slot_mut(zone);
        let resolved = match fetched {
            Ok(reading) => {
                *slot = Some(reading);
                Resolved {
                    reading,
                    source: ReadingSource::Fresh,
                }
            }
            Err(e) => match *slot {
                Some(reading) => {
                    warn!("sensor: {} fetch failed ({}), using cached reading", zone.name(), e);
                    Resolved {
                        reading,
                        source: ReadingSource::Cached,
                    }
                }
                None => {
                    warn!("sensor: {} fetch failed ({}), no cached reading", zone.name(), e);
                    Resolved {
                        reading: Measurement::ZERO,
                        source: ReadingSource::Unavailable,
                    }
                }
            },
        };

        if zone == Zone::Hot && self.hot.is_none() {
            if let Some(cold) = self.cold {
                let reading = self.policy.estimate_hot(cold);
                debug!(
                    "sensor: hot zone estimated from cold ({:.2}C/{:.2}%)",
                    reading.temperature_c, reading.humidity_pct
                );
                return Resolved {
                    reading,
                    source: ReadingSource::Estimated,
                };
            }
        }

        resolved
    }
}

impl Default for SensorCaches {
    fn default() -> Self {
        Self::new(CrossZoneEstimate::REFERENCE)
    }
}
