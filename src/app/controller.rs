//! Controller — the hexagonal core.
//!
//! [`Controller`] owns every piece of mutable application state: actuator
//! levels, the function-button state, the per-zone reading caches, the
//! status LED widget and the last known connectivity. It is reachable only
//! through `&mut` from the dispatcher, so handlers never race each other.
//!
//! ```text
//!  SensorPort ──▶ ┌────────────────────────┐ ──▶ AttributePort
//!                 │       Controller        │
//! ActuatorPort ◀──│ actuators · sensors ·   │ ──▶ DevicePort
//!    TimerPort ◀──│ function · status LED   │
//!                 └────────────────────────┘
//! ```
//!
//! Every handler runs to completion and never reports failure: output
//! errors are logged by the adapters, sensor errors are absorbed by the
//! fallback policy, timer errors cost one missed expiry.

use log::{debug, info, warn};

use crate::bridge::{Attribute, endpoint_for_actuator, zone_attributes};
use crate::config::SystemConfig;
use crate::diagnostics::SensorStats;
use crate::drivers::status_led::{LedPattern, LedWidget};
use crate::events::{ButtonAction, ConnectivityStatus, Event, Handler, LedId};
use crate::sensors::{SensorCaches, Zone};
use crate::timers::TimerId;

use super::ports::{ActuatorPort, AttributePort, DevicePort, SensorPort, TimerPort};
use super::state::{Actuator, ActuatorState, FunctionState};
use super::status::connectivity_pattern;

// ───────────────────────────────────────────────────────────────
// Controller
// ───────────────────────────────────────────────────────────────

pub struct Controller<T> {
    config: SystemConfig,
    timers: T,
    actuators: ActuatorState,
    function: FunctionState,
    caches: SensorCaches,
    connectivity: ConnectivityStatus,
    led: LedWidget,
    /// Remote StatusLedOn/Off override; cleared by the next connectivity change.
    led_override: Option<bool>,
    sensor_stats: SensorStats,
}

impl<T: TimerPort> Controller<T> {
    /// Construct the controller. Does **not** arm any timer; call
    /// [`start`](Self::start) next.
    pub fn new(config: SystemConfig, timers: T) -> Self {
        let caches = SensorCaches::new(config.cross_zone_estimate);
        Self {
            config,
            timers,
            actuators: ActuatorState::default(),
            function: FunctionState::NoneSelected,
            caches,
            connectivity: ConnectivityStatus::default(),
            led: LedWidget::new(),
            led_override: None,
            sensor_stats: SensorStats::default(),
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Start periodic sensor polling and show the initial status indication.
    pub fn start(&mut self, hw: &mut impl ActuatorPort) {
        self.start_timer(TimerId::SensorPoll, self.config.sensor_poll_interval_ms);
        self.refresh_indication(hw);
        info!(
            "controller: started (poll every {}ms)",
            self.config.sensor_poll_interval_ms
        );
    }

    // ── Dispatch ──────────────────────────────────────────────

    /// Run `handler` for `event` to completion.
    ///
    /// The `hw` parameter satisfies **both** [`SensorPort`] and
    /// [`ActuatorPort`], which avoids a double mutable borrow while keeping
    /// the port boundary explicit.
    pub fn handle(
        &mut self,
        handler: Handler,
        event: &Event,
        hw: &mut (impl ActuatorPort + SensorPort),
        remote: &mut impl AttributePort,
        device: &mut impl DevicePort,
    ) {
        match handler {
            Handler::Function => self.on_button(event, hw),
            Handler::FunctionTimer => self.on_function_timer(event, hw, device),
            Handler::LedState => self.on_led_state(event, hw),
            Handler::Activate(actuator) => self.set_actuator(actuator, true, hw, remote),
            Handler::Deactivate(actuator) => self.set_actuator(actuator, false, hw, remote),
            Handler::SensorMeasure(zone) => self.measure(zone, hw, remote),
            Handler::Connectivity => self.on_connectivity(event, hw),
        }
    }

    // ── Function button / factory reset ───────────────────────

    fn on_button(&mut self, event: &Event, hw: &mut impl ActuatorPort) {
        let Some(button) = event.button_payload() else {
            return;
        };
        if button.pin != self.config.function_button_pin {
            debug!("controller: ignoring button on pin {}", button.pin);
            return;
        }

        match button.action {
            ButtonAction::Pushed => {
                self.start_timer(TimerId::Function, self.config.factory_reset_hold_ms);
                self.function = FunctionState::FactoryResetArmed;
                info!(
                    "controller: hold {}ms for factory reset",
                    self.config.factory_reset_hold_ms
                );
            }
            ButtonAction::Released => {
                if self.function == FunctionState::FactoryResetArmed {
                    self.timers.cancel(TimerId::Function);
                    self.function = FunctionState::NoneSelected;
                    self.refresh_indication(hw);
                    info!("controller: factory reset cancelled");
                }
            }
        }
    }

    fn on_function_timer(
        &mut self,
        event: &Event,
        hw: &mut impl ActuatorPort,
        device: &mut impl DevicePort,
    ) {
        match event.timer_context() {
            Some(ctx) if ctx.timer == TimerId::Function => {}
            other => {
                debug!("controller: unexpected timer context {:?}", other);
                return;
            }
        }
        if self.function != FunctionState::FactoryResetArmed {
            // Stale expiry after a cancel.
            return;
        }

        self.function = FunctionState::NoneSelected;
        warn!("controller: factory reset triggered");
        self.show(LedPattern::Solid, hw);
        device.schedule_factory_reset();
    }

    // ── Status LED ────────────────────────────────────────────

    fn on_led_state(&mut self, event: &Event, hw: &mut impl ActuatorPort) {
        if event.led() != Some(LedId::Status) {
            return;
        }
        if let Some((lit, next_ms)) = self.led.advance() {
            hw.set_output(Actuator::StatusLed, lit);
            self.start_timer(TimerId::StatusLed, next_ms);
        }
    }

    fn on_connectivity(&mut self, event: &Event, hw: &mut impl ActuatorPort) {
        let Some(status) = event.connectivity() else {
            return;
        };
        debug!("controller: connectivity {:?}", status);
        self.connectivity = status;
        self.led_override = None;
        self.refresh_indication(hw);
    }

    /// Pattern the status LED should show right now.
    fn indication(&self) -> LedPattern {
        match self.led_override {
            Some(true) => LedPattern::Solid,
            Some(false) => LedPattern::Off,
            None => connectivity_pattern(&self.connectivity, &self.config),
        }
    }

    fn refresh_indication(&mut self, hw: &mut impl ActuatorPort) {
        self.show(self.indication(), hw);
    }

    fn show(&mut self, pattern: LedPattern, hw: &mut impl ActuatorPort) {
        if self.led.pattern() == pattern {
            return;
        }
        self.timers.cancel(TimerId::StatusLed);
        let lit = self.led.set_pattern(pattern);
        hw.set_output(Actuator::StatusLed, lit);
        if let Some(ms) = self.led.phase_ms() {
            self.start_timer(TimerId::StatusLed, ms);
        }
    }

    // ── Actuators ─────────────────────────────────────────────

    fn set_actuator(
        &mut self,
        actuator: Actuator,
        active: bool,
        hw: &mut impl ActuatorPort,
        remote: &mut impl AttributePort,
    ) {
        match actuator {
            Actuator::StatusLed => {
                self.led_override = Some(active);
                self.refresh_indication(hw);
            }
            Actuator::Feeder => {
                hw.set_output(actuator, active);
                if active {
                    self.start_timer(TimerId::FeederRetract, self.config.feeder_retract_ms);
                } else {
                    self.timers.cancel(TimerId::FeederRetract);
                }
            }
            _ => hw.set_output(actuator, active),
        }

        if self.actuators.set(actuator, active) {
            info!(
                "controller: {} {}",
                actuator.name(),
                if active { "on" } else { "off" }
            );
            if actuator != Actuator::StatusLed || self.config.remote_status_led {
                remote.publish(endpoint_for_actuator(actuator), Attribute::OnOff(active));
            }
        }
    }

    // ── Sensors ───────────────────────────────────────────────

    fn measure(&mut self, zone: Zone, hw: &mut impl SensorPort, remote: &mut impl AttributePort) {
        let resolved = self.caches.resolve(zone, hw.fetch(zone));
        self.sensor_stats.record(resolved.source);
        debug!(
            "sensor: {} {:.2}C {:.2}% ({:?})",
            zone.name(),
            resolved.reading.temperature_c,
            resolved.reading.humidity_pct,
            resolved.source
        );
        for (endpoint, attribute) in zone_attributes(zone, resolved.reading) {
            remote.publish(endpoint, attribute);
        }
    }

    // ── Helpers ───────────────────────────────────────────────

    fn start_timer(&self, timer: TimerId, period_ms: u32) {
        if let Err(e) = self.timers.start(timer, period_ms) {
            warn!("controller: {} timer not armed: {}", timer.name(), e);
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    pub fn actuators(&self) -> &ActuatorState {
        &self.actuators
    }

    pub fn function_state(&self) -> FunctionState {
        self.function
    }

    pub fn caches(&self) -> &SensorCaches {
        &self.caches
    }

    pub fn led_pattern(&self) -> LedPattern {
        self.led.pattern()
    }

    pub fn sensor_stats(&self) -> SensorStats {
        self.sensor_stats
    }

    pub fn timers(&self) -> &T {
        &self.timers
    }
}
