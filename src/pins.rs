//! GPIO / peripheral pin assignments for the terrarium controller board.
//!
//! Single source of truth. Every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Relay board (4 channels, opto-isolated, active LOW)
// ---------------------------------------------------------------------------

/// Relay 1: hot-spot basking lamp.
pub const HOT_LAMP_RELAY_GPIO: i32 = 4;
/// Relay 2: UVB fluorescent tube.
pub const UVB_LAMP_RELAY_GPIO: i32 = 5;
/// Relay 3: heat mat / ceramic heater.
pub const HEATER_RELAY_GPIO: i32 = 6;
/// Relay 4: water filter pump.
pub const FILTER_RELAY_GPIO: i32 = 7;

/// The relay inputs pull the coil on a LOW level.
pub const RELAY_ACTIVE_LOW: bool = true;

// ---------------------------------------------------------------------------
// Level shifters (3.3 V → 5 V for relays and servo)
// ---------------------------------------------------------------------------

/// Output-enable lines, driven HIGH once every output is configured.
pub const LEVEL_SHIFTER_GPIOS: [i32; 3] = [10, 11, 12];

// ---------------------------------------------------------------------------
// Feeder servo (LEDC PWM)
// ---------------------------------------------------------------------------

pub const FEEDER_SERVO_GPIO: i32 = 15;
/// Standard hobby-servo frame rate.
pub const SERVO_PWM_FREQ_HZ: u32 = 50;
/// LEDC duty resolution for the servo channel (bits).
pub const SERVO_PWM_RESOLUTION_BITS: u32 = 14;

// ---------------------------------------------------------------------------
// Zone sensors
// ---------------------------------------------------------------------------

/// DHT22 single-wire data line, hot-spot zone. External 10 kΩ pull-up.
pub const HOT_DHT22_GPIO: i32 = 18;
/// DHT11 single-wire data line, cold zone.
pub const COLD_DHT11_GPIO: i32 = 19;
/// NTC thermistor in the water bowl, voltage divider to ADC1.
pub const WATER_NTC_ADC_GPIO: i32 = 2;
/// ADC1 channel behind [`WATER_NTC_ADC_GPIO`] on the ESP32-S3.
pub const WATER_NTC_ADC1_CHANNEL: u32 = 1;

// ---------------------------------------------------------------------------
// Status LED (discrete, active HIGH)
// ---------------------------------------------------------------------------

pub const STATUS_LED_GPIO: i32 = 8;

// ---------------------------------------------------------------------------
// Function button (BOOT strap, active-low with internal pull-up)
// ---------------------------------------------------------------------------

pub const FUNCTION_BUTTON_GPIO: i32 = 9;
