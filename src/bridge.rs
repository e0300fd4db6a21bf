//! Remote-attribute bridge between the smart-home fabric and the event queue.
//!
//! ## Endpoint map
//!
//! | Endpoint | Cluster                 | Meaning                        |
//! |----------|-------------------------|--------------------------------|
//! | 1        | On/Off                  | status indicator (opt-in)      |
//! | 2        | On/Off                  | hot lamp                       |
//! | 3        | On/Off                  | UVB lamp                       |
//! | 4        | On/Off                  | water heater                   |
//! | 5        | On/Off                  | filter pump                    |
//! | 6        | On/Off                  | feeder                         |
//! | 7 / 8    | Temperature / Humidity  | hot zone                       |
//! | 9 / 10   | Temperature / Humidity  | cold zone                      |
//! | 11       | Temperature             | water                          |
//!
//! Inbound, a write to a managed endpoint's On/Off attribute becomes exactly
//! one Activate or Deactivate event. Everything else is ignored. Outbound
//! publishing goes through [`AttributePort`](crate::app::ports::AttributePort).

use heapless::Vec;
use log::{debug, info};

use crate::app::ports::OnOffStore;
use crate::app::state::Actuator;
use crate::events::{Event, EventQueue};
use crate::sensors::{Measurement, Zone};

pub type EndpointId = u16;
pub type ClusterId = u32;
pub type AttributeId = u32;

pub mod endpoint {
    use super::EndpointId;

    pub const STATUS_LED: EndpointId = 1;
    pub const HOT_LAMP: EndpointId = 2;
    pub const UVB_LAMP: EndpointId = 3;
    pub const HEATER: EndpointId = 4;
    pub const FILTER: EndpointId = 5;
    pub const FEEDER: EndpointId = 6;
    pub const HOT_TEMPERATURE: EndpointId = 7;
    pub const HOT_HUMIDITY: EndpointId = 8;
    pub const COLD_TEMPERATURE: EndpointId = 9;
    pub const COLD_HUMIDITY: EndpointId = 10;
    pub const WATER_TEMPERATURE: EndpointId = 11;
}

pub mod cluster {
    use super::ClusterId;

    pub const ON_OFF: ClusterId = 0x0006;
    pub const TEMPERATURE_MEASUREMENT: ClusterId = 0x0402;
    pub const RELATIVE_HUMIDITY: ClusterId = 0x0405;
}

/// On/Off cluster: OnOff attribute.
pub const ATTR_ON_OFF: AttributeId = 0x0000;
/// Measurement clusters: MeasuredValue attribute.
pub const ATTR_MEASURED_VALUE: AttributeId = 0x0000;

/// Fully-qualified attribute address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributePath {
    pub endpoint: EndpointId,
    pub cluster: ClusterId,
    pub attribute: AttributeId,
}

impl AttributePath {
    pub const fn on_off(endpoint: EndpointId) -> Self {
        Self {
            endpoint,
            cluster: cluster::ON_OFF,
            attribute: ATTR_ON_OFF,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    TemperatureMeasured,
    HumidityMeasured,
    OnOffState,
}

/// A typed attribute value as published.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribute {
    /// 0.01 °C.
    Temperature(i16),
    /// 0.01 % RH.
    Humidity(i16),
    OnOff(bool),
}

impl Attribute {
    pub fn kind(&self) -> AttributeKind {
        match self {
            Self::Temperature(_) => AttributeKind::TemperatureMeasured,
            Self::Humidity(_) => AttributeKind::HumidityMeasured,
            Self::OnOff(_) => AttributeKind::OnOffState,
        }
    }

    /// Where this attribute lives on `endpoint`.
    pub fn path(&self, endpoint: EndpointId) -> AttributePath {
        let (cluster, attribute) = match self {
            Self::Temperature(_) => (cluster::TEMPERATURE_MEASUREMENT, ATTR_MEASURED_VALUE),
            Self::Humidity(_) => (cluster::RELATIVE_HUMIDITY, ATTR_MEASURED_VALUE),
            Self::OnOff(_) => (cluster::ON_OFF, ATTR_ON_OFF),
        };
        AttributePath {
            endpoint,
            cluster,
            attribute,
        }
    }
}

/// Result of an inbound write or cluster init.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Not a managed endpoint/cluster/attribute; nothing posted.
    Ignored,
    /// One event posted.
    Posted,
    /// Recognised, but the queue was full.
    Dropped,
}

// ── Mapping ───────────────────────────────────────────────────

pub fn endpoint_for_actuator(actuator: Actuator) -> EndpointId {
    match actuator {
        Actuator::StatusLed => endpoint::STATUS_LED,
        Actuator::HotLamp => endpoint::HOT_LAMP,
        Actuator::UvbLamp => endpoint::UVB_LAMP,
        Actuator::Heater => endpoint::HEATER,
        Actuator::Filter => endpoint::FILTER,
        Actuator::Feeder => endpoint::FEEDER,
    }
}

/// Actuator behind a managed On/Off endpoint. Endpoint 1 only counts when
/// remote status-LED control is enabled.
pub fn actuator_for_endpoint(endpoint: EndpointId, status_led_remote: bool) -> Option<Actuator> {
    match endpoint {
        endpoint::STATUS_LED if status_led_remote => Some(Actuator::StatusLed),
        endpoint::HOT_LAMP => Some(Actuator::HotLamp),
        endpoint::UVB_LAMP => Some(Actuator::UvbLamp),
        endpoint::HEATER => Some(Actuator::Heater),
        endpoint::FILTER => Some(Actuator::Filter),
        endpoint::FEEDER => Some(Actuator::Feeder),
        _ => None,
    }
}

/// The event an inbound write maps to, if any. Only the first value byte
/// is significant: non-zero activates.
pub fn map_write(path: AttributePath, value: &[u8], status_led_remote: bool) -> Option<Event> {
    if path.cluster != cluster::ON_OFF || path.attribute != ATTR_ON_OFF {
        return None;
    }
    let actuator = actuator_for_endpoint(path.endpoint, status_led_remote)?;
    let first = *value.first()?;
    Some(Event::actuate(actuator, first != 0))
}

/// Attributes a zone publishes for one reading.
pub fn zone_attributes(zone: Zone, reading: Measurement) -> Vec<(EndpointId, Attribute), 2> {
    let mut out = Vec::new();
    let (temperature_ep, humidity_ep) = match zone {
        Zone::Hot => (endpoint::HOT_TEMPERATURE, Some(endpoint::HOT_HUMIDITY)),
        Zone::Cold => (endpoint::COLD_TEMPERATURE, Some(endpoint::COLD_HUMIDITY)),
        Zone::Water => (endpoint::WATER_TEMPERATURE, None),
    };
    // Two slots, at most two pushes.
    let _ = out.push((temperature_ep, Attribute::Temperature(reading.temperature_centi())));
    if let Some(ep) = humidity_ep {
        let _ = out.push((ep, Attribute::Humidity(reading.humidity_centi())));
    }
    out
}

// ── Bridge ────────────────────────────────────────────────────

/// Inbound side of the bridge: turns protocol callbacks into events.
pub struct AttributeBridge<'q> {
    queue: &'q EventQueue,
    status_led_remote: bool,
}

impl<'q> AttributeBridge<'q> {
    pub fn new(queue: &'q EventQueue, status_led_remote: bool) -> Self {
        Self {
            queue,
            status_led_remote,
        }
    }

    /// Managed On/Off endpoints, in cluster-init order.
    pub fn managed_endpoints(&self) -> impl Iterator<Item = EndpointId> + '_ {
        Actuator::ALL
            .into_iter()
            .map(endpoint_for_actuator)
            .filter(|ep| actuator_for_endpoint(*ep, self.status_led_remote).is_some())
    }

    /// Protocol callback: an attribute was written remotely.
    pub fn on_attribute_write(&self, path: AttributePath, value: &[u8]) -> WriteOutcome {
        match map_write(path, value, self.status_led_remote) {
            Some(event) => {
                debug!(
                    "bridge: ep{} cluster 0x{:04x} → {:?}",
                    path.endpoint,
                    path.cluster,
                    event.kind()
                );
                self.post(event)
            }
            None => WriteOutcome::Ignored,
        }
    }

    /// Startup: replay the persisted On/Off for `endpoint` (absent = off).
    pub fn on_cluster_init(&self, endpoint: EndpointId, store: &impl OnOffStore) -> WriteOutcome {
        let Some(actuator) = actuator_for_endpoint(endpoint, self.status_led_remote) else {
            return WriteOutcome::Ignored;
        };
        let on = store.persisted_on_off(endpoint).unwrap_or(false);
        info!("bridge: cluster init ep{} ({}) on={}", endpoint, actuator.name(), on);
        self.post(Event::actuate(actuator, on))
    }

    fn post(&self, event: Event) -> WriteOutcome {
        match self.queue.post(event) {
            Ok(()) => WriteOutcome::Posted,
            Err(_) => WriteOutcome::Dropped,
        }
    }
}
