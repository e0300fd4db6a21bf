//! Unified error types for the terrarium firmware.
//!
//! A single `Error` enum that every subsystem can convert into, keeping the
//! binary's start-up error handling uniform. All variants are `Copy` so they
//! can be passed around the dispatcher context without allocation.
//!
//! None of these are fatal once the dispatcher is running: producers log
//! and continue on [`QueueFull`], sensor handlers fall back on
//! [`SensorError`], and timer failures only cost a missed expiry.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The event queue was full and the event was dropped.
    Queue(QueueFull),
    /// A zone sensor could not be read or returned implausible data.
    Sensor(SensorError),
    /// A platform timer could not be created, started or stopped.
    Timer(TimerError),
    /// Peripheral initialisation failed.
    Init(&'static str),
    /// Configuration is invalid or could not be loaded.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Queue(e) => write!(f, "queue: {e}"),
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Timer(e) => write!(f, "timer: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Queue errors
// ---------------------------------------------------------------------------

/// Returned by `EventQueue::post` when every slot is taken.
/// The event that could not be posted has already been dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueFull;

impl fmt::Display for QueueFull {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "event queue full, event dropped")
    }
}

impl From<QueueFull> for Error {
    fn from(e: QueueFull) -> Self {
        Self::Queue(e)
    }
}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// The sensor did not answer the start signal in time.
    NoResponse,
    /// A data bit did not arrive in time.
    Timeout,
    /// The received frame failed its checksum.
    Checksum,
    /// The pin driver reported an I/O error.
    Bus,
    /// ADC read returned an error.
    AdcReadFailed,
    /// Reading is outside the physically plausible range.
    OutOfRange,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoResponse => write!(f, "no response"),
            Self::Timeout => write!(f, "bit timeout"),
            Self::Checksum => write!(f, "checksum mismatch"),
            Self::Bus => write!(f, "pin I/O error"),
            Self::AdcReadFailed => write!(f, "ADC read failed"),
            Self::OutOfRange => write!(f, "reading out of range"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Timer errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerError {
    /// The platform refused to create the timer (carries the raw code).
    CreateFailed(i32),
    /// The platform refused to start the timer (carries the raw code).
    StartFailed(i32),
}

impl fmt::Display for TimerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CreateFailed(rc) => write!(f, "create failed (rc={rc})"),
            Self::StartFailed(rc) => write!(f, "start failed (rc={rc})"),
        }
    }
}

impl From<TimerError> for Error {
    fn from(e: TimerError) -> Self {
        Self::Timer(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
