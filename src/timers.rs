//! Logical timers and the host software timer set.
//!
//! | Timer          | Mode       | Expiry posts                                   |
//! |----------------|------------|------------------------------------------------|
//! | Function       | one-shot   | `TimerExpired{Function}`                       |
//! | SensorPoll     | periodic   | `HotSensorPoll, ColdSensorPoll, WaterSensorPoll` |
//! | FeederRetract  | monostable | `FeederOff`                                    |
//! | StatusLed      | one-shot   | `LedStateChanged{Status}`                      |
//!
//! Each logical timer owns its own slot; no two share one. Expiry callbacks
//! only enqueue events. A cancel that races a fire either wins or the fire
//! has already queued its events, so at most one stale expiry reaches the
//! dispatcher.
//!
//! On the device the slots are `esp_timer`s (see `drivers::hw_timer`). On
//! the host [`SoftTimers`] runs them off a manually advanced clock.

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicU64, Ordering};

#[cfg(not(target_os = "espidf"))]
use log::{debug, warn};

#[cfg(not(target_os = "espidf"))]
use crate::app::ports::TimerPort;
#[cfg(not(target_os = "espidf"))]
use crate::error::TimerError;
#[cfg(not(target_os = "espidf"))]
use crate::events::EventQueue;
use crate::events::{Event, LedId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerMode {
    /// Fires once; restarting while pending replaces the deadline.
    OneShot,
    /// Fires every period until cancelled.
    Periodic,
    /// Fires once after a fixed duration; each start resets the deadline.
    Monostable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerId {
    /// Long-press (factory reset) timer.
    Function,
    /// Drives the three zone polls.
    SensorPoll,
    /// Returns the feeder to rest.
    FeederRetract,
    /// Status LED blink phase.
    StatusLed,
}

const SENSOR_POLL_EVENTS: [Event; 3] = [
    Event::HotSensorPoll,
    Event::ColdSensorPoll,
    Event::WaterSensorPoll,
];
const FUNCTION_EVENTS: [Event; 1] = [Event::timer_expired(TimerId::Function)];
const FEEDER_RETRACT_EVENTS: [Event; 1] = [Event::FeederOff];
const STATUS_LED_EVENTS: [Event; 1] = [Event::LedStateChanged(LedId::Status)];

impl TimerId {
    pub const COUNT: usize = 4;
    pub const ALL: [TimerId; Self::COUNT] = [
        TimerId::Function,
        TimerId::SensorPoll,
        TimerId::FeederRetract,
        TimerId::StatusLed,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn mode(self) -> TimerMode {
        match self {
            Self::Function | Self::StatusLed => TimerMode::OneShot,
            Self::SensorPoll => TimerMode::Periodic,
            Self::FeederRetract => TimerMode::Monostable,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Function => "function",
            Self::SensorPoll => "sensor",
            Self::FeederRetract => "feeder",
            Self::StatusLed => "status-led",
        }
    }

    /// Events posted (atomically, in order) when this timer fires.
    pub fn expiry_events(self) -> &'static [Event] {
        match self {
            Self::Function => &FUNCTION_EVENTS,
            Self::SensorPoll => &SENSOR_POLL_EVENTS,
            Self::FeederRetract => &FEEDER_RETRACT_EVENTS,
            Self::StatusLed => &STATUS_LED_EVENTS,
        }
    }
}

// ───────────────────────────────────────────────────────────────
// SoftTimers (host)
// ───────────────────────────────────────────────────────────────
//
// Host only: Xtensa has no 64-bit atomics.

#[cfg(not(target_os = "espidf"))]
const DISARMED: u64 = u64::MAX;

#[cfg(not(target_os = "espidf"))]
/// Timer set driven by a manual millisecond clock.
///
/// Deadlines are atomics so `start`/`cancel` take `&self`, like the
/// platform timer API, and a fire only happens if its compare-exchange on
/// the deadline succeeds.
pub struct SoftTimers<'q> {
    queue: &'q EventQueue,
    now_ms: AtomicU64,
    deadlines: [AtomicU64; TimerId::COUNT],
    periods: [AtomicU64; TimerId::COUNT],
}

#[cfg(not(target_os = "espidf"))]
impl<'q> SoftTimers<'q> {
    pub fn new(queue: &'q EventQueue) -> Self {
        Self {
            queue,
            now_ms: AtomicU64::new(0),
            deadlines: [const { AtomicU64::new(DISARMED) }; TimerId::COUNT],
            periods: [const { AtomicU64::new(0) }; TimerId::COUNT],
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms.load(Ordering::Acquire)
    }

    pub fn is_armed(&self, timer: TimerId) -> bool {
        self.deadline(timer).is_some()
    }

    /// Absolute expiry time, if armed.
    pub fn deadline(&self, timer: TimerId) -> Option<u64> {
        match self.deadlines[timer.index()].load(Ordering::Acquire) {
            DISARMED => None,
            d => Some(d),
        }
    }

    pub fn advance_by(&self, ms: u64) -> usize {
        self.advance_to(self.now_ms().saturating_add(ms))
    }

    /// Move the clock to `now`, firing every deadline on the way in
    /// deadline order. Returns how many expiries fired.
    pub fn advance_to(&self, now: u64) -> usize {
        let mut fired = 0;
        while let Some((timer, deadline)) = self.next_due(now) {
            self.now_ms.store(deadline, Ordering::Release);
            let slot = &self.deadlines[timer.index()];
            let next = match timer.mode() {
                TimerMode::Periodic => {
                    deadline.saturating_add(self.periods[timer.index()].load(Ordering::Acquire).max(1))
                }
                TimerMode::OneShot | TimerMode::Monostable => DISARMED,
            };
            if slot
                .compare_exchange(deadline, next, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
            {
                // Re-armed or cancelled concurrently.
                continue;
            }
            fired += 1;
            debug!("timer: {} fired at {}ms", timer.name(), deadline);
            if self.queue.post_all(timer.expiry_events()).is_err() {
                warn!("timer: {} expiry dropped", timer.name());
            }
        }
        if now > self.now_ms() {
            self.now_ms.store(now, Ordering::Release);
        }
        fired
    }

    fn next_due(&self, now: u64) -> Option<(TimerId, u64)> {
        TimerId::ALL
            .iter()
            .filter_map(|t| self.deadline(*t).map(|d| (*t, d)))
            .filter(|(_, d)| *d <= now)
            .min_by_key(|(_, d)| *d)
    }
}

#[cfg(not(target_os = "espidf"))]
impl TimerPort for SoftTimers<'_> {
    fn start(&self, timer: TimerId, period_ms: u32) -> Result<(), TimerError> {
        let i = timer.index();
        self.periods[i].store(u64::from(period_ms), Ordering::Release);
        self.deadlines[i].store(self.now_ms() + u64::from(period_ms), Ordering::Release);
        Ok(())
    }

    fn cancel(&self, timer: TimerId) {
        self.deadlines[timer.index()].store(DISARMED, Ordering::Release);
    }
}
