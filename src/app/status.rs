//! Status indication derived from connectivity.
//!
//! | Connectivity                      | Pattern                  |
//! |-----------------------------------|--------------------------|
//! | provisioned and enabled           | solid on                 |
//! | BLE connection open               | even blink (100/100 ms)  |
//! | otherwise                         | heartbeat (50/950 ms)    |

use crate::config::SystemConfig;
use crate::drivers::status_led::LedPattern;
use crate::events::ConnectivityStatus;

pub fn connectivity_pattern(status: &ConnectivityStatus, config: &SystemConfig) -> LedPattern {
    if status.provisioned && status.enabled {
        LedPattern::Solid
    } else if status.ble_connections > 0 {
        LedPattern::Blink {
            on_ms: config.led_ble_on_ms,
            off_ms: config.led_ble_off_ms,
        }
    } else {
        LedPattern::Blink {
            on_ms: config.led_idle_on_ms,
            off_ms: config.led_idle_off_ms,
        }
    }
}
