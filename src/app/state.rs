//! State owned by the controller context.
//!
//! Everything in here is mutated only from the dispatcher, through
//! `&mut Controller`. Producers never see these types mutably.

/// One physical output driven by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Actuator {
    HotLamp,
    UvbLamp,
    Heater,
    Filter,
    Feeder,
    StatusLed,
}

impl Actuator {
    /// Every actuator, in a fixed order.
    pub const ALL: [Actuator; 6] = [
        Actuator::HotLamp,
        Actuator::UvbLamp,
        Actuator::Heater,
        Actuator::Filter,
        Actuator::Feeder,
        Actuator::StatusLed,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::HotLamp => "hot-lamp",
            Self::UvbLamp => "uvb-lamp",
            Self::Heater => "heater",
            Self::Filter => "filter",
            Self::Feeder => "feeder",
            Self::StatusLed => "status-led",
        }
    }
}

/// Last commanded level of every output. `true` = active.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActuatorState {
    pub hot_lamp: bool,
    pub uvb_lamp: bool,
    pub heater: bool,
    pub filter: bool,
    pub feeder: bool,
    pub status_led: bool,
}

impl ActuatorState {
    pub fn get(&self, actuator: Actuator) -> bool {
        match actuator {
            Actuator::HotLamp => self.hot_lamp,
            Actuator::UvbLamp => self.uvb_lamp,
            Actuator::Heater => self.heater,
            Actuator::Filter => self.filter,
            Actuator::Feeder => self.feeder,
            Actuator::StatusLed => self.status_led,
        }
    }

    /// Set one field. Returns `true` if the value changed.
    pub(crate) fn set(&mut self, actuator: Actuator, active: bool) -> bool {
        let slot = match actuator {
            Actuator::HotLamp => &mut self.hot_lamp,
            Actuator::UvbLamp => &mut self.uvb_lamp,
            Actuator::Heater => &mut self.heater,
            Actuator::Filter => &mut self.filter,
            Actuator::Feeder => &mut self.feeder,
            Actuator::StatusLed => &mut self.status_led,
        };
        let changed = *slot != active;
        *slot = active;
        changed
    }
}

/// What a long press of the function button will do when its timer expires.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FunctionState {
    #[default]
    NoneSelected,
    FactoryResetArmed,
}
