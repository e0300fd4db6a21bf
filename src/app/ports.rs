//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Controller (domain)
//! ```
//!
//! Driven adapters (relays, servo, zone sensors, timers, the protocol
//! stack, storage) implement these traits. The
//! [`Controller`](super::controller::Controller) consumes them via
//! generics, so the domain core never touches hardware directly.
//!
//! None of the per-event ports report failure to the controller except
//! [`SensorPort`], whose errors the fallback policy absorbs. Adapters log
//! their own I/O errors.

use crate::app::state::Actuator;
use crate::bridge::{Attribute, EndpointId};
use crate::config::SystemConfig;
use crate::error::{SensorError, TimerError};
use crate::sensors::{Measurement, Zone};
use crate::timers::TimerId;

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the domain calls this to drive outputs.
pub trait ActuatorPort {
    /// Drive `actuator` to its logical active (`true`) or inactive level.
    /// Electrical polarity is the adapter's concern.
    fn set_output(&mut self, actuator: Actuator, active: bool);
}

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: one fetch per zone poll.
pub trait SensorPort {
    fn fetch(&mut self, zone: Zone) -> Result<Measurement, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Timer port
// ───────────────────────────────────────────────────────────────

/// Arms and cancels the logical timers.
///
/// Methods take `&self`: timer expiry runs in another context and the
/// implementations synchronise internally.
pub trait TimerPort {
    /// Arm `timer` to expire after `period_ms` (every `period_ms` for
    /// periodic timers). Restarting a pending timer replaces its deadline.
    fn start(&self, timer: TimerId, period_ms: u32) -> Result<(), TimerError>;

    /// Disarm `timer`. Cancelling an idle timer is a no-op.
    fn cancel(&self, timer: TimerId);
}

impl<T: TimerPort + ?Sized> TimerPort for &T {
    fn start(&self, timer: TimerId, period_ms: u32) -> Result<(), TimerError> {
        (**self).start(timer, period_ms)
    }

    fn cancel(&self, timer: TimerId) {
        (**self).cancel(timer);
    }
}

// ───────────────────────────────────────────────────────────────
// Remote ports (driven adapter: domain → protocol stack)
// ───────────────────────────────────────────────────────────────

/// Outbound attribute reports to the home-automation fabric.
pub trait AttributePort {
    fn publish(&mut self, endpoint: EndpointId, attribute: Attribute);
}

/// Fan-out: every report goes to both sinks, first `A` then `B`.
impl<A: AttributePort, B: AttributePort> AttributePort for (A, B) {
    fn publish(&mut self, endpoint: EndpointId, attribute: Attribute) {
        self.0.publish(endpoint, attribute);
        self.1.publish(endpoint, attribute);
    }
}

/// Device-level actions owned by the platform.
pub trait DevicePort {
    /// Wipe persisted state and restart. May return before the reset
    /// happens.
    fn schedule_factory_reset(&mut self);
}

/// Read side of the persisted On/Off attribute values, used once per
/// managed endpoint at cluster init.
pub trait OnOffStore {
    /// `None` when nothing has been persisted for `endpoint`.
    fn persisted_on_off(&self, endpoint: EndpointId) -> Option<bool>;
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists system configuration.
///
/// Implementations MUST validate config values before persisting.
/// Invalid ranges are rejected with [`ConfigError::ValidationFailed`],
/// not silently clamped.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    /// Returns [`SystemConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<SystemConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

/// Errors from the raw key-value storage behind the adapters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Requested key does not exist.
    NotFound,
    /// Generic I/O error.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl From<ConfigError> for crate::error::Error {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::Corrupted => Self::Config("stored config corrupted"),
            ConfigError::ValidationFailed(msg) => Self::Config(msg),
            ConfigError::IoError => Self::Config("storage I/O error"),
        }
    }
}
