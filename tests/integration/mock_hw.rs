//! Mock adapters for integration tests.
//!
//! Record every port call so tests can assert on the full command history
//! without touching real GPIO/PWM registers or a protocol stack.

use std::collections::{HashMap, VecDeque};

use terrarium::app::controller::Controller;
use terrarium::app::ports::{ActuatorPort, AttributePort, DevicePort, OnOffStore, SensorPort};
use terrarium::app::state::Actuator;
use terrarium::bridge::{Attribute, EndpointId};
use terrarium::config::SystemConfig;
use terrarium::dispatcher::Dispatcher;
use terrarium::error::SensorError;
use terrarium::events::EventQueue;
use terrarium::sensors::{Measurement, Zone};
use terrarium::timers::SoftTimers;

// ── MockHardware ──────────────────────────────────────────────

/// Actuator outputs plus scripted sensor results. An unscripted fetch
/// fails with `NoResponse`.
#[derive(Default)]
pub struct MockHardware {
    pub outputs: Vec<(Actuator, bool)>,
    scripted: HashMap<Zone, VecDeque<Result<Measurement, SensorError>>>,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(&mut self, zone: Zone, result: Result<Measurement, SensorError>) {
        self.scripted.entry(zone).or_default().push_back(result);
    }

    /// Every level driven onto `actuator`, oldest first.
    pub fn levels(&self, actuator: Actuator) -> Vec<bool> {
        self.outputs
            .iter()
            .filter(|(a, _)| *a == actuator)
            .map(|(_, on)| *on)
            .collect()
    }

    pub fn level(&self, actuator: Actuator) -> Option<bool> {
        self.levels(actuator).last().copied()
    }
}

impl ActuatorPort for MockHardware {
    fn set_output(&mut self, actuator: Actuator, active: bool) {
        self.outputs.push((actuator, active));
    }
}

impl SensorPort for MockHardware {
    fn fetch(&mut self, zone: Zone) -> Result<Measurement, SensorError> {
        self.scripted
            .get_mut(&zone)
            .and_then(VecDeque::pop_front)
            .unwrap_or(Err(SensorError::NoResponse))
    }
}

// ── MockRemote ────────────────────────────────────────────────

#[derive(Default)]
pub struct MockRemote {
    pub published: Vec<(EndpointId, Attribute)>,
}

#[allow(dead_code)]
impl MockRemote {
    /// Attributes published on `endpoint`, oldest first.
    pub fn on(&self, endpoint: EndpointId) -> Vec<Attribute> {
        self.published
            .iter()
            .filter(|(ep, _)| *ep == endpoint)
            .map(|(_, a)| *a)
            .collect()
    }
}

impl AttributePort for MockRemote {
    fn publish(&mut self, endpoint: EndpointId, attribute: Attribute) {
        self.published.push((endpoint, attribute));
    }
}

// ── MockDevice ────────────────────────────────────────────────

#[derive(Default)]
pub struct MockDevice {
    pub factory_resets: u32,
}

impl DevicePort for MockDevice {
    fn schedule_factory_reset(&mut self) {
        self.factory_resets += 1;
    }
}

// ── MockOnOffStore ────────────────────────────────────────────

#[derive(Default)]
pub struct MockOnOffStore(pub HashMap<EndpointId, bool>);

impl OnOffStore for MockOnOffStore {
    fn persisted_on_off(&self, endpoint: EndpointId) -> Option<bool> {
        self.0.get(&endpoint).copied()
    }
}

// ── Rig ───────────────────────────────────────────────────────

pub type TestDispatcher<'q, 't> =
    Dispatcher<'q, &'t SoftTimers<'q>, MockHardware, MockRemote, MockDevice>;

/// Controller + dispatcher over mocks, not yet started.
pub fn rig<'q, 't>(
    queue: &'q EventQueue,
    timers: &'t SoftTimers<'q>,
    config: SystemConfig,
) -> TestDispatcher<'q, 't> {
    let controller = Controller::new(config, timers);
    Dispatcher::new(
        queue,
        controller,
        MockHardware::new(),
        MockRemote::default(),
        MockDevice::default(),
    )
}
