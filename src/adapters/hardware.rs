//! Hardware adapter — bridges real peripherals to domain port traits.
//!
//! Owns the relay switches, the feeder servo, the status LED and the three
//! zone sensors, exposing them through [`ActuatorPort`] and [`SensorPort`].
//! Drivers are generic over `embedded-hal` traits, so the same adapter runs
//! against ESP-IDF pins on the device and recording fakes on the host.
//!
//! Output errors are logged here and never reach the controller.

use embedded_hal::digital::OutputPin;
use embedded_hal::pwm::SetDutyCycle;
use log::warn;

use crate::app::ports::{ActuatorPort, SensorPort};
use crate::app::state::Actuator;
use crate::drivers::servo::FeederServo;
use crate::drivers::switch::Switch;
use crate::error::SensorError;
use crate::sensors::{Measurement, Zone, ZoneSensor};

/// The four relay channels.
pub struct Relays<R> {
    pub hot_lamp: Switch<R>,
    pub uvb_lamp: Switch<R>,
    pub heater: Switch<R>,
    pub filter: Switch<R>,
}

/// One sensor per zone.
pub struct ZoneSensors<H, C, W> {
    pub hot: H,
    pub cold: C,
    pub water: W,
}

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter<R, S, L, H, C, W> {
    relays: Relays<R>,
    feeder: FeederServo<S>,
    status_led: Switch<L>,
    sensors: ZoneSensors<H, C, W>,
}

impl<R, S, L, H, C, W> HardwareAdapter<R, S, L, H, C, W>
where
    R: OutputPin,
    S: SetDutyCycle,
    L: OutputPin,
    H: ZoneSensor,
    C: ZoneSensor,
    W: ZoneSensor,
{
    pub fn new(
        relays: Relays<R>,
        feeder: FeederServo<S>,
        status_led: Switch<L>,
        sensors: ZoneSensors<H, C, W>,
    ) -> Self {
        Self {
            relays,
            feeder,
            status_led,
            sensors,
        }
    }

    /// Current driven level of `actuator`, as the drivers last set it.
    pub fn is_active(&self, actuator: Actuator) -> bool {
        match actuator {
            Actuator::HotLamp => self.relays.hot_lamp.is_active(),
            Actuator::UvbLamp => self.relays.uvb_lamp.is_active(),
            Actuator::Heater => self.relays.heater.is_active(),
            Actuator::Filter => self.relays.filter.is_active(),
            Actuator::Feeder => self.feeder.is_active(),
            Actuator::StatusLed => self.status_led.is_active(),
        }
    }
}

// ── ActuatorPort implementation ───────────────────────────────

impl<R, S, L, H, C, W> ActuatorPort for HardwareAdapter<R, S, L, H, C, W>
where
    R: OutputPin,
    S: SetDutyCycle,
    L: OutputPin,
{
    fn set_output(&mut self, actuator: Actuator, active: bool) {
        let failed = match actuator {
            Actuator::HotLamp => self.relays.hot_lamp.set(active).is_err(),
            Actuator::UvbLamp => self.relays.uvb_lamp.set(active).is_err(),
            Actuator::Heater => self.relays.heater.set(active).is_err(),
            Actuator::Filter => self.relays.filter.set(active).is_err(),
            Actuator::Feeder => self.feeder.set(active).is_err(),
            Actuator::StatusLed => self.status_led.set(active).is_err(),
        };
        if failed {
            warn!(
                "hw: failed to drive {} {}",
                actuator.name(),
                if active { "on" } else { "off" }
            );
        }
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl<R, S, L, H, C, W> SensorPort for HardwareAdapter<R, S, L, H, C, W>
where
    H: ZoneSensor,
    C: ZoneSensor,
    W: ZoneSensor,
{
    fn fetch(&mut self, zone: Zone) -> Result<Measurement, SensorError> {
        match zone {
            Zone::Hot => self.sensors.hot.read(),
            Zone::Cold => self.sensors.cold.read(),
            Zone::Water => self.sensors.water.read(),
        }
    }
}
