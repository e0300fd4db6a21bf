//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements         | Connects to                   |
//! |----------------|--------------------|-------------------------------|
//! | `hardware`     | ActuatorPort       | relays, servo PWM, status LED |
//! |                | SensorPort         | DHT22, DHT11, NTC (ADC)       |
//! | `log_sink`     | AttributePort      | Serial log output             |
//! | `nvs`          | ConfigPort         | NVS / in-memory store         |
//! |                | OnOffStore         |                               |
//! |                | AttributePort      | On/Off persistence            |
//! |                | DevicePort         | factory reset (erase+restart) |
//! | `bridge_ffi`   | (inbound)          | protocol stack callbacks      |

pub mod bridge_ffi;
pub mod hardware;
pub mod log_sink;
pub mod nvs;
