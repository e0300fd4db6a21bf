//! Terrarium controller — Main Entry Point
//!
//! Hexagonal architecture with a single event queue and one dispatcher.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter    LogAttributeSink   NvsAdapter   HwTimers   │
//! │  (Sensor+Actuator)  (AttributePort)    (Config,     (TimerPort)│
//! │                                         OnOff, Device)         │
//! │  bridge_ffi (protocol stack → APP_QUEUE)                       │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              Controller (pure logic)                   │    │
//! │  │  actuators · sensor fallback · function button · LED   │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  Dispatcher (sole consumer of APP_QUEUE)                       │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

// ── Imports ───────────────────────────────────────────────────
use core::sync::atomic::Ordering;

use anyhow::{Result, anyhow};
use esp_idf_hal::delay::Ets;
use esp_idf_hal::gpio::{AnyIOPin, AnyOutputPin, InputOutput, Output, PinDriver, Pull};
use log::{info, warn};

use terrarium::adapters::bridge_ffi::STATUS_LED_REMOTE;
use terrarium::adapters::hardware::{HardwareAdapter, Relays, ZoneSensors};
use terrarium::adapters::log_sink::LogAttributeSink;
use terrarium::adapters::nvs::NvsAdapter;
use terrarium::app::controller::Controller;
use terrarium::app::ports::ConfigPort;
use terrarium::bridge::{AttributeBridge, WriteOutcome};
use terrarium::config::SystemConfig;
use terrarium::dispatcher::Dispatcher;
use terrarium::drivers::hw_init;
use terrarium::drivers::hw_timer::{self, HwTimers};
use terrarium::drivers::servo::FeederServo;
use terrarium::drivers::switch::{Polarity, Switch};
use terrarium::error::Error;
use terrarium::events::APP_QUEUE;
use terrarium::pins;
use terrarium::sensors::dht::{Dht, DhtModel};
use terrarium::sensors::temperature::WaterThermistor;

type OutPin = PinDriver<'static, AnyOutputPin, Output>;
type DhtPin = PinDriver<'static, AnyIOPin, InputOutput>;

fn output(gpio: i32, polarity: Polarity) -> Result<Switch<OutPin>> {
    // SAFETY: every GPIO number comes from `pins` and is claimed exactly once.
    let pin = unsafe { PinDriver::output(AnyOutputPin::new(gpio)) }?;
    Ok(Switch::new(pin, polarity)?)
}

fn dht(gpio: i32, model: DhtModel) -> Result<Dht<DhtPin, Ets>> {
    // SAFETY: see `output`.
    let mut pin = unsafe { PinDriver::input_output_od(AnyIOPin::new(gpio)) }?;
    pin.set_pull(Pull::Up)?;
    Ok(Dht::new(pin, Ets, model))
}

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Terrarium v{}                       ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Load config from NVS (or defaults) ─────────────────
    let nvs = match NvsAdapter::new() {
        Ok(n) => n,
        Err(e) => {
            warn!("NVS init failed ({}), running with defaults and no persistence", e);
            NvsAdapter::default()
        }
    };
    let config = match nvs.load() {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!("NVS config load failed ({}), using defaults", e);
            SystemConfig::default()
        }
    };
    STATUS_LED_REMOTE.store(config.remote_status_led, Ordering::Relaxed);

    // ── 3. Outputs, all inactive, then level shifters on ──────
    hw_init::init_level_shifters()?;
    let relay_polarity = if pins::RELAY_ACTIVE_LOW {
        Polarity::ActiveLow
    } else {
        Polarity::ActiveHigh
    };
    let relays = Relays {
        hot_lamp: output(pins::HOT_LAMP_RELAY_GPIO, relay_polarity)?,
        uvb_lamp: output(pins::UVB_LAMP_RELAY_GPIO, relay_polarity)?,
        heater: output(pins::HEATER_RELAY_GPIO, relay_polarity)?,
        filter: output(pins::FILTER_RELAY_GPIO, relay_polarity)?,
    };
    let feeder = FeederServo::new(hw_init::init_servo_pwm()?, config.feeder_pulse_us)
        .map_err(|e| anyhow!("feeder servo: {:?}", e))?;
    let status_led = output(pins::STATUS_LED_GPIO, Polarity::ActiveHigh)?;
    hw_init::enable_level_shifters();

    // ── 4. Zone sensors ───────────────────────────────────────
    let sensors = ZoneSensors {
        hot: dht(pins::HOT_DHT22_GPIO, DhtModel::Dht22)?,
        cold: dht(pins::COLD_DHT11_GPIO, DhtModel::Dht11)?,
        water: WaterThermistor::new(hw_init::init_water_adc()?),
    };

    let hw = HardwareAdapter::new(relays, feeder, status_led, sensors);

    // ── 5. Timers and function button ─────────────────────────
    let timers = HwTimers::new().map_err(Error::from)?;
    hw_init::init_function_button()?;
    hw_timer::start_button_scan(
        pins::FUNCTION_BUTTON_GPIO,
        config.function_button_pin,
        config.button_scan_interval_ms,
        config.button_debounce_ms,
    )
    .map_err(Error::from)?;

    // ── 6. Cluster init: replay persisted On/Off ──────────────
    let bridge = AttributeBridge::new(&APP_QUEUE, config.remote_status_led);
    for endpoint in bridge.managed_endpoints() {
        if bridge.on_cluster_init(endpoint, &nvs) == WriteOutcome::Dropped {
            warn!("cluster init for ep{} dropped", endpoint);
        }
    }

    // ── 7. Controller + dispatcher ────────────────────────────
    let controller = Controller::new(config, timers);
    let reporter = (LogAttributeSink::new(), nvs.clone());
    let mut dispatcher = Dispatcher::new(&APP_QUEUE, controller, hw, reporter, nvs);
    dispatcher.start();

    info!("System ready. Entering event loop.");
    dispatcher.run()
}
