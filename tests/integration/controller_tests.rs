//! End-to-end controller scenarios: events go through the queue and the
//! dispatcher, time is advanced on `SoftTimers`, effects are read back
//! from the mock adapters.

use terrarium::app::state::{Actuator, FunctionState};
use terrarium::bridge::{Attribute, endpoint};
use terrarium::config::SystemConfig;
use terrarium::drivers::status_led::LedPattern;
use terrarium::events::{ButtonAction, ConnectivityStatus, Event, EventQueue};
use terrarium::sensors::{Measurement, Zone};
use terrarium::timers::{SoftTimers, TimerId};

use crate::mock_hw::rig;

// ── Actuators ─────────────────────────────────────────────────

#[test]
fn activate_is_idempotent() {
    let q = EventQueue::new();
    let timers = SoftTimers::new(&q);
    let mut d = rig(&q, &timers, SystemConfig::default());

    q.post(Event::UvbLampOn).unwrap();
    q.post(Event::UvbLampOn).unwrap();
    assert_eq!(d.drain(), 2);

    assert_eq!(d.hw().levels(Actuator::UvbLamp), vec![true, true]);
    assert_eq!(d.remote().on(endpoint::UVB_LAMP), vec![Attribute::OnOff(true)]);
    assert!(d.controller().actuators().uvb_lamp);

    q.post(Event::UvbLampOff).unwrap();
    d.drain();
    assert_eq!(
        d.remote().on(endpoint::UVB_LAMP),
        vec![Attribute::OnOff(true), Attribute::OnOff(false)]
    );
}

#[test]
fn feeder_retracts_after_last_activation() {
    let q = EventQueue::new();
    let timers = SoftTimers::new(&q);
    let mut d = rig(&q, &timers, SystemConfig::default());

    q.post(Event::FeederOn).unwrap();
    d.drain();
    assert_eq!(timers.deadline(TimerId::FeederRetract), Some(1500));

    timers.advance_to(1000);
    assert!(q.is_empty());
    q.post(Event::FeederOn).unwrap();
    d.drain();
    assert_eq!(timers.deadline(TimerId::FeederRetract), Some(2500));

    assert_eq!(timers.advance_to(2499), 0);
    assert_eq!(timers.advance_to(2500), 1);
    assert_eq!(d.drain(), 1);

    assert_eq!(d.hw().levels(Actuator::Feeder), vec![true, true, false]);
    assert_eq!(
        d.remote().on(endpoint::FEEDER),
        vec![Attribute::OnOff(true), Attribute::OnOff(false)]
    );
    assert!(!timers.is_armed(TimerId::FeederRetract));
}

#[test]
fn feeder_off_cancels_retract() {
    let q = EventQueue::new();
    let timers = SoftTimers::new(&q);
    let mut d = rig(&q, &timers, SystemConfig::default());

    q.post(Event::FeederOn).unwrap();
    q.post(Event::FeederOff).unwrap();
    d.drain();

    assert!(!timers.is_armed(TimerId::FeederRetract));
    assert_eq!(timers.advance_to(10_000), 0);
}

// ── Sensors ───────────────────────────────────────────────────

#[test]
fn failed_fetch_republishes_cached_reading() {
    let q = EventQueue::new();
    let timers = SoftTimers::new(&q);
    let mut d = rig(&q, &timers, SystemConfig::default());
    d.hw_mut().script(Zone::Cold, Ok(Measurement::new(21.5, 60.0)));

    q.post(Event::ColdSensorPoll).unwrap();
    q.post(Event::ColdSensorPoll).unwrap();
    d.drain();

    let expected = vec![Attribute::Temperature(2150), Attribute::Temperature(2150)];
    assert_eq!(d.remote().on(endpoint::COLD_TEMPERATURE), expected);
    assert_eq!(
        d.remote().on(endpoint::COLD_HUMIDITY),
        vec![Attribute::Humidity(6000), Attribute::Humidity(6000)]
    );

    let stats = d.controller().sensor_stats();
    assert_eq!(stats.fresh, 1);
    assert_eq!(stats.cached, 1);
}

#[test]
fn hot_zone_estimated_from_cold_until_first_reading() {
    let q = EventQueue::new();
    let timers = SoftTimers::new(&q);
    let mut d = rig(&q, &timers, SystemConfig::default());
    d.hw_mut().script(Zone::Cold, Ok(Measurement::new(18.0, 40.0)));

    q.post(Event::ColdSensorPoll).unwrap();
    q.post(Event::HotSensorPoll).unwrap();
    d.drain();

    assert_eq!(d.remote().on(endpoint::HOT_TEMPERATURE), vec![Attribute::Temperature(2000)]);
    assert_eq!(d.remote().on(endpoint::HOT_HUMIDITY), vec![Attribute::Humidity(5100)]);
    assert_eq!(d.controller().caches().cached(Zone::Hot), None);
    assert_eq!(d.controller().sensor_stats().estimated, 1);

    // A real hot reading takes over and is cached from then on.
    d.hw_mut().script(Zone::Hot, Ok(Measurement::new(31.0, 35.0)));
    q.post(Event::HotSensorPoll).unwrap();
    q.post(Event::HotSensorPoll).unwrap();
    d.drain();
    assert_eq!(
        d.remote().on(endpoint::HOT_TEMPERATURE),
        vec![
            Attribute::Temperature(2000),
            Attribute::Temperature(3100),
            Attribute::Temperature(3100),
        ]
    );
    assert_eq!(
        d.controller().caches().cached(Zone::Hot),
        Some(Measurement::new(31.0, 35.0))
    );
}

#[test]
fn water_zone_publishes_temperature_only() {
    let q = EventQueue::new();
    let timers = SoftTimers::new(&q);
    let mut d = rig(&q, &timers, SystemConfig::default());
    d.hw_mut().script(Zone::Water, Ok(Measurement::new(24.5, 0.0)));

    q.post(Event::WaterSensorPoll).unwrap();
    d.drain();

    assert_eq!(
        d.remote().published,
        vec![(endpoint::WATER_TEMPERATURE, Attribute::Temperature(2450))]
    );
}

#[test]
fn no_reading_ever_publishes_zero_state() {
    let q = EventQueue::new();
    let timers = SoftTimers::new(&q);
    let mut d = rig(&q, &timers, SystemConfig::default());

    q.post_all(&[Event::HotSensorPoll, Event::ColdSensorPoll, Event::WaterSensorPoll])
        .unwrap();
    d.drain();

    assert_eq!(
        d.remote().published,
        vec![
            (endpoint::HOT_TEMPERATURE, Attribute::Temperature(0)),
            (endpoint::HOT_HUMIDITY, Attribute::Humidity(0)),
            (endpoint::COLD_TEMPERATURE, Attribute::Temperature(0)),
            (endpoint::COLD_HUMIDITY, Attribute::Humidity(0)),
            (endpoint::WATER_TEMPERATURE, Attribute::Temperature(0)),
        ]
    );
    assert_eq!(d.controller().sensor_stats().unavailable, 3);
}

#[test]
fn poll_timer_drives_all_three_zones() {
    let q = EventQueue::new();
    let timers = SoftTimers::new(&q);
    let mut d = rig(&q, &timers, SystemConfig::default());
    d.hw_mut().script(Zone::Hot, Ok(Measurement::new(30.0, 50.0)));
    d.hw_mut().script(Zone::Cold, Ok(Measurement::new(22.0, 55.0)));
    d.hw_mut().script(Zone::Water, Ok(Measurement::new(25.0, 0.0)));
    d.start();

    // Let the heartbeat run up to the first poll.
    while timers.now_ms() < 2000 {
        timers.advance_to((timers.now_ms() + 50).min(2000));
        d.drain();
    }

    let endpoints: Vec<_> = d.remote().published.iter().map(|(ep, _)| *ep).collect();
    assert_eq!(endpoints, vec![7, 8, 9, 10, 11]);
    assert_eq!(timers.deadline(TimerId::SensorPoll), Some(4000));
}

// ── Function button ───────────────────────────────────────────

#[test]
fn short_press_does_not_reset() {
    let q = EventQueue::new();
    let timers = SoftTimers::new(&q);
    let mut d = rig(&q, &timers, SystemConfig::default());

    q.post(Event::button(0, ButtonAction::Pushed)).unwrap();
    d.drain();
    timers.advance_to(3000);
    q.post(Event::button(0, ButtonAction::Released)).unwrap();
    d.drain();

    assert_eq!(timers.advance_to(10_000), 0);
    assert_eq!(d.drain(), 0);
    assert_eq!(d.device().factory_resets, 0);
    assert_eq!(d.controller().function_state(), FunctionState::NoneSelected);
}

#[test]
fn long_press_schedules_factory_reset() {
    let q = EventQueue::new();
    let timers = SoftTimers::new(&q);
    let mut d = rig(&q, &timers, SystemConfig::default());

    q.post(Event::button(0, ButtonAction::Pushed)).unwrap();
    d.drain();
    assert_eq!(timers.advance_to(5999), 0);
    assert_eq!(timers.advance_to(6000), 1);
    d.drain();

    assert_eq!(d.device().factory_resets, 1);
    assert_eq!(d.controller().function_state(), FunctionState::NoneSelected);
    assert_eq!(d.controller().led_pattern(), LedPattern::Solid);
    assert_eq!(d.hw().level(Actuator::StatusLed), Some(true));

    // Releasing afterwards changes nothing.
    q.post(Event::button(0, ButtonAction::Released)).unwrap();
    d.drain();
    assert_eq!(d.device().factory_resets, 1);
}

#[test]
fn button_on_other_pin_is_ignored() {
    let q = EventQueue::new();
    let timers = SoftTimers::new(&q);
    let mut d = rig(&q, &timers, SystemConfig::default());

    q.post(Event::button(3, ButtonAction::Pushed)).unwrap();
    d.drain();

    assert!(!timers.is_armed(TimerId::Function));
    assert_eq!(timers.advance_to(60_000), 0);
    assert_eq!(d.device().factory_resets, 0);
}

// ── Status LED ────────────────────────────────────────────────

#[test]
fn status_led_follows_connectivity() {
    let q = EventQueue::new();
    let timers = SoftTimers::new(&q);
    let mut d = rig(&q, &timers, SystemConfig::default());
    d.start();

    let heartbeat = LedPattern::Blink { on_ms: 50, off_ms: 950 };
    assert_eq!(d.controller().led_pattern(), heartbeat);
    assert_eq!(d.hw().level(Actuator::StatusLed), Some(true));

    // On phase ends at 50 ms; off phase runs to 1000 ms.
    assert_eq!(timers.advance_to(50), 1);
    d.drain();
    assert_eq!(d.hw().level(Actuator::StatusLed), Some(false));
    assert_eq!(timers.deadline(TimerId::StatusLed), Some(1000));

    q.post(Event::ConnectivityChanged(ConnectivityStatus {
        provisioned: false,
        enabled: false,
        ble_connections: 1,
    }))
    .unwrap();
    d.drain();
    assert_eq!(d.controller().led_pattern(), LedPattern::Blink { on_ms: 100, off_ms: 100 });
    assert_eq!(d.hw().level(Actuator::StatusLed), Some(true));
    assert_eq!(timers.deadline(TimerId::StatusLed), Some(150));

    q.post(Event::ConnectivityChanged(ConnectivityStatus {
        provisioned: true,
        enabled: true,
        ble_connections: 0,
    }))
    .unwrap();
    d.drain();
    assert_eq!(d.controller().led_pattern(), LedPattern::Solid);
    assert!(!timers.is_armed(TimerId::StatusLed));
}

#[test]
fn remote_status_led_publishes_when_enabled() {
    let q = EventQueue::new();
    let timers = SoftTimers::new(&q);
    let config = SystemConfig {
        remote_status_led: true,
        ..SystemConfig::default()
    };
    let mut d = rig(&q, &timers, config);
    d.start();

    q.post(Event::StatusLedOff).unwrap();
    d.drain();
    assert_eq!(d.controller().led_pattern(), LedPattern::Off);
    assert_eq!(d.hw().level(Actuator::StatusLed), Some(false));
    assert!(!timers.is_armed(TimerId::StatusLed));

    q.post(Event::StatusLedOn).unwrap();
    d.drain();
    assert_eq!(d.controller().led_pattern(), LedPattern::Solid);
    assert_eq!(d.remote().on(endpoint::STATUS_LED), vec![Attribute::OnOff(true)]);

    // A connectivity change hands the LED back to the indication.
    q.post(Event::ConnectivityChanged(ConnectivityStatus::default()))
        .unwrap();
    d.drain();
    assert_eq!(d.controller().led_pattern(), LedPattern::Blink { on_ms: 50, off_ms: 950 });
}

#[test]
fn status_led_is_not_published_by_default() {
    let q = EventQueue::new();
    let timers = SoftTimers::new(&q);
    let mut d = rig(&q, &timers, SystemConfig::default());

    q.post(Event::StatusLedOn).unwrap();
    d.drain();

    assert!(d.remote().on(endpoint::STATUS_LED).is_empty());
}
