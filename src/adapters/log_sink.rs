//! Log-based attribute sink adapter.
//!
//! Implements [`AttributePort`] by writing every outbound attribute report
//! to the ESP-IDF logger (UART / USB-CDC in production). The protocol
//! stack's reporting adapter implements the same trait.

use log::info;

use crate::app::ports::AttributePort;
use crate::bridge::{Attribute, EndpointId};

/// Adapter that logs every published attribute to the serial console.
#[derive(Debug, Default)]
pub struct LogAttributeSink {
    published: u32,
}

impl LogAttributeSink {
    pub fn new() -> Self {
        Self { published: 0 }
    }

    /// Reports written since boot.
    pub fn published(&self) -> u32 {
        self.published
    }
}

impl AttributePort for LogAttributeSink {
    fn publish(&mut self, endpoint: EndpointId, attribute: Attribute) {
        self.published = self.published.wrapping_add(1);
        match attribute {
            Attribute::Temperature(centi) => {
                info!(
                    "ATTR | ep{} temperature={:.2}\u{00b0}C",
                    endpoint,
                    f32::from(centi) / 100.0
                );
            }
            Attribute::Humidity(centi) => {
                info!(
                    "ATTR | ep{} humidity={:.2}%",
                    endpoint,
                    f32::from(centi) / 100.0
                );
            }
            Attribute::OnOff(on) => {
                info!("ATTR | ep{} on_off={}", endpoint, if on { "ON" } else { "OFF" });
            }
        }
    }
}
