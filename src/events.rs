//! Event model and the application event queue.
//!
//! Events are produced by:
//! - the function-button scan (debounced edges)
//! - timer expiries (function, sensor poll, feeder retract, status LED)
//! - the remote-attribute bridge (attribute writes, cluster init)
//! - the protocol stack (connectivity changes)
//!
//! Events are consumed by the dispatcher, which runs one handler at a time
//! against the controller.
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ Button scan │────▶│              │     │              │
//! │ Timers      │────▶│  EventQueue  │────▶│  Dispatcher  │
//! │ Bridge      │────▶│  (10 slots)  │     │  (consumer)  │
//! │ Connectivity│────▶│              │     │              │
//! └─────────────┘     └──────────────┘     └──────────────┘
//! ```
//!
//! The queue is the only synchronisation point between producers and the
//! dispatcher: a critical-section mutex around a fixed-capacity deque and a
//! waker registration. `post` never blocks; a full queue drops the event.

use core::cell::RefCell;
use core::future::poll_fn;
use core::sync::atomic::{AtomicU32, Ordering};
use core::task::Poll;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::waitqueue::WakerRegistration;
use heapless::Deque;
use log::warn;

use crate::app::state::Actuator;
use crate::error::QueueFull;
use crate::sensors::Zone;
use crate::timers::TimerId;

/// Maximum number of pending events.
pub const EVENT_QUEUE_CAP: usize = 10;

// ───────────────────────────────────────────────────────────────
// Payloads
// ───────────────────────────────────────────────────────────────

/// Edge reported by the button scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonAction {
    Pushed,
    Released,
}

impl ButtonAction {
    pub fn kind(self) -> EventKind {
        match self {
            Self::Pushed => EventKind::ButtonPushed,
            Self::Released => EventKind::ButtonReleased,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonPayload {
    pub pin: u8,
    pub action: ButtonAction,
}

/// Which timer produced a `TimerExpired` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerContext {
    pub timer: TimerId,
}

/// LED widgets that can request a state update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedId {
    Status,
}

/// Network state as reported by the protocol stack.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectivityStatus {
    pub provisioned: bool,
    pub enabled: bool,
    pub ble_connections: u8,
}

// ───────────────────────────────────────────────────────────────
// Event
// ───────────────────────────────────────────────────────────────

/// Discriminant of an [`Event`], for logging and kind checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    None,
    Button,
    ButtonPushed,
    ButtonReleased,
    TimerExpired,
    LedStateChanged,
    HotLampOn,
    HotLampOff,
    UvbLampOn,
    UvbLampOff,
    HeaterOn,
    HeaterOff,
    FilterOn,
    FilterOff,
    FeederOn,
    FeederOff,
    StatusLedOn,
    StatusLedOff,
    HotSensorPoll,
    ColdSensorPoll,
    WaterSensorPoll,
    ConnectivityChanged,
}

/// One unit of work for the dispatcher. Each variant carries exactly the
/// payload its kind needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Placeholder with no handler; dispatching it only bumps a counter.
    None,
    Button(ButtonPayload),
    TimerExpired(TimerContext),
    LedStateChanged(LedId),
    HotLampOn,
    HotLampOff,
    UvbLampOn,
    UvbLampOff,
    HeaterOn,
    HeaterOff,
    FilterOn,
    FilterOff,
    FeederOn,
    FeederOff,
    StatusLedOn,
    StatusLedOff,
    HotSensorPoll,
    ColdSensorPoll,
    WaterSensorPoll,
    ConnectivityChanged(ConnectivityStatus),
}

/// What the dispatcher runs for an event. Derived from the kind, never
/// stored alongside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handler {
    /// Function-button push/release.
    Function,
    /// Function (long-press) timer expiry.
    FunctionTimer,
    /// Status LED blink phase change.
    LedState,
    Activate(Actuator),
    Deactivate(Actuator),
    SensorMeasure(Zone),
    Connectivity,
}

impl Event {
    pub const fn button(pin: u8, action: ButtonAction) -> Self {
        Self::Button(ButtonPayload { pin, action })
    }

    pub const fn timer_expired(timer: TimerId) -> Self {
        Self::TimerExpired(TimerContext { timer })
    }

    /// The Activate (`active`) or Deactivate event for an actuator.
    pub const fn actuate(actuator: Actuator, active: bool) -> Self {
        match (actuator, active) {
            (Actuator::HotLamp, true) => Self::HotLampOn,
            (Actuator::HotLamp, false) => Self::HotLampOff,
            (Actuator::UvbLamp, true) => Self::UvbLampOn,
            (Actuator::UvbLamp, false) => Self::UvbLampOff,
            (Actuator::Heater, true) => Self::HeaterOn,
            (Actuator::Heater, false) => Self::HeaterOff,
            (Actuator::Filter, true) => Self::FilterOn,
            (Actuator::Filter, false) => Self::FilterOff,
            (Actuator::Feeder, true) => Self::FeederOn,
            (Actuator::Feeder, false) => Self::FeederOff,
            (Actuator::StatusLed, true) => Self::StatusLedOn,
            (Actuator::StatusLed, false) => Self::StatusLedOff,
        }
    }

    pub const fn sensor_poll(zone: Zone) -> Self {
        match zone {
            Zone::Hot => Self::HotSensorPoll,
            Zone::Cold => Self::ColdSensorPoll,
            Zone::Water => Self::WaterSensorPoll,
        }
    }

    pub fn kind(&self) -> EventKind {
        match self {
            Self::None => EventKind::None,
            Self::Button(_) => EventKind::Button,
            Self::TimerExpired(_) => EventKind::TimerExpired,
            Self::LedStateChanged(_) => EventKind::LedStateChanged,
            Self::HotLampOn => EventKind::HotLampOn,
            Self::HotLampOff => EventKind::HotLampOff,
            Self::UvbLampOn => EventKind::UvbLampOn,
            Self::UvbLampOff => EventKind::UvbLampOff,
            Self::HeaterOn => EventKind::HeaterOn,
            Self::HeaterOff => EventKind::HeaterOff,
            Self::FilterOn => EventKind::FilterOn,
            Self::FilterOff => EventKind::FilterOff,
            Self::FeederOn => EventKind::FeederOn,
            Self::FeederOff => EventKind::FeederOff,
            Self::StatusLedOn => EventKind::StatusLedOn,
            Self::StatusLedOff => EventKind::StatusLedOff,
            Self::HotSensorPoll => EventKind::HotSensorPoll,
            Self::ColdSensorPoll => EventKind::ColdSensorPoll,
            Self::WaterSensorPoll => EventKind::WaterSensorPoll,
            Self::ConnectivityChanged(_) => EventKind::ConnectivityChanged,
        }
    }

    pub fn handler(&self) -> Option<Handler> {
        match self {
            Self::None => None,
            Self::Button(_) => Some(Handler::Function),
            Self::TimerExpired(_) => Some(Handler::FunctionTimer),
            Self::LedStateChanged(_) => Some(Handler::LedState),
            Self::ConnectivityChanged(_) => Some(Handler::Connectivity),
            Self::HotSensorPoll | Self::ColdSensorPoll | Self::WaterSensorPoll => {
                self.zone().map(Handler::SensorMeasure)
            }
            _ => self.actuator_command().map(|(actuator, active)| {
                if active {
                    Handler::Activate(actuator)
                } else {
                    Handler::Deactivate(actuator)
                }
            }),
        }
    }

    // ── Kind-checked payload accessors ────────────────────────

    pub fn button_payload(&self) -> Option<ButtonPayload> {
        match self {
            Self::Button(p) => Some(*p),
            _ => None,
        }
    }

    pub fn timer_context(&self) -> Option<TimerContext> {
        match self {
            Self::TimerExpired(c) => Some(*c),
            _ => None,
        }
    }

    pub fn led(&self) -> Option<LedId> {
        match self {
            Self::LedStateChanged(id) => Some(*id),
            _ => None,
        }
    }

    pub fn connectivity(&self) -> Option<ConnectivityStatus> {
        match self {
            Self::ConnectivityChanged(s) => Some(*s),
            _ => None,
        }
    }

    /// Zone polled by a sensor-poll event.
    pub fn zone(&self) -> Option<Zone> {
        match self {
            Self::HotSensorPoll => Some(Zone::Hot),
            Self::ColdSensorPoll => Some(Zone::Cold),
            Self::WaterSensorPoll => Some(Zone::Water),
            _ => None,
        }
    }

    /// `(actuator, active)` for Activate/Deactivate events.
    pub fn actuator_command(&self) -> Option<(Actuator, bool)> {
        let cmd = match self {
            Self::HotLampOn => (Actuator::HotLamp, true),
            Self::HotLampOff => (Actuator::HotLamp, false),
            Self::UvbLampOn => (Actuator::UvbLamp, true),
            Self::UvbLampOff => (Actuator::UvbLamp, false),
            Self::HeaterOn => (Actuator::Heater, true),
            Self::HeaterOff => (Actuator::Heater, false),
            Self::FilterOn => (Actuator::Filter, true),
            Self::FilterOff => (Actuator::Filter, false),
            Self::FeederOn => (Actuator::Feeder, true),
            Self::FeederOff => (Actuator::Feeder, false),
            Self::StatusLedOn => (Actuator::StatusLed, true),
            Self::StatusLedOff => (Actuator::StatusLed, false),
            _ => return None,
        };
        Some(cmd)
    }
}

// ───────────────────────────────────────────────────────────────
// Queue
// ───────────────────────────────────────────────────────────────

struct QueueState {
    events: Deque<Event, EVENT_QUEUE_CAP>,
    waker: WakerRegistration,
}

/// Bounded multi-producer / single-consumer FIFO of [`Event`]s.
///
/// All constructors are `const` so the queue can live in a `static` that
/// timer callbacks and C entry points post into.
pub struct EventQueue {
    state: Mutex<CriticalSectionRawMutex, RefCell<QueueState>>,
    posted: AtomicU32,
    dropped: AtomicU32,
}

/// The firmware's single application queue.
pub static APP_QUEUE: EventQueue = EventQueue::new();

impl EventQueue {
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(RefCell::new(QueueState {
                events: Deque::new(),
                waker: WakerRegistration::new(),
            })),
            posted: AtomicU32::new(0),
            dropped: AtomicU32::new(0),
        }
    }

    /// Enqueue one event without blocking.
    ///
    /// On a full queue the event is dropped, counted and logged, and the
    /// queue contents are left unchanged.
    pub fn post(&self, event: Event) -> Result<(), QueueFull> {
        self.post_all(core::slice::from_ref(&event))
    }

    /// Enqueue a batch contiguously, or none of it.
    pub fn post_all(&self, events: &[Event]) -> Result<(), QueueFull> {
        let accepted = self.state.lock(|cell| {
            let mut s = cell.borrow_mut();
            if EVENT_QUEUE_CAP - s.events.len() < events.len() {
                return false;
            }
            for e in events {
                // Capacity checked above.
                let _ = s.events.push_back(*e);
            }
            s.waker.wake();
            true
        });

        if accepted {
            self.posted.fetch_add(events.len() as u32, Ordering::Relaxed);
            Ok(())
        } else {
            let total = self
                .dropped
                .fetch_add(events.len() as u32, Ordering::Relaxed)
                + events.len() as u32;
            if let Some(first) = events.first() {
                warn!(
                    "queue: full, dropped {} event(s) starting with {:?} (total dropped {})",
                    events.len(),
                    first.kind(),
                    total
                );
            }
            Err(QueueFull)
        }
    }

    /// Dequeue the oldest event, if any.
    pub fn try_take(&self) -> Option<Event> {
        self.state.lock(|cell| cell.borrow_mut().events.pop_front())
    }

    /// Resolve with the oldest event once one is available.
    pub async fn take(&self) -> Event {
        poll_fn(|cx| {
            self.state.lock(|cell| {
                let mut s = cell.borrow_mut();
                match s.events.pop_front() {
                    Some(e) => Poll::Ready(e),
                    None => {
                        s.waker.register(cx.waker());
                        Poll::Pending
                    }
                }
            })
        })
        .await
    }

    /// Park the calling context until an event is available.
    pub fn take_blocking(&self) -> Event {
        futures_lite::future::block_on(self.take())
    }

    pub fn len(&self) -> usize {
        self.state.lock(|cell| cell.borrow().events.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub const fn capacity(&self) -> usize {
        EVENT_QUEUE_CAP
    }

    /// Events accepted since boot.
    pub fn posted(&self) -> u32 {
        self.posted.load(Ordering::Relaxed)
    }

    /// Events dropped on a full queue since boot.
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifo_order() {
        let q = EventQueue::new();
        q.post(Event::HeaterOn).unwrap();
        q.post(Event::FilterOff).unwrap();
        q.post(Event::HotSensorPoll).unwrap();
        assert_eq!(q.try_take(), Some(Event::HeaterOn));
        assert_eq!(q.try_take(), Some(Event::FilterOff));
        assert_eq!(q.try_take(), Some(Event::HotSensorPoll));
        assert_eq!(q.try_take(), None);
    }

    #[test]
    fn full_queue_drops_and_keeps_contents() {
        let q = EventQueue::new();
        for _ in 0..EVENT_QUEUE_CAP {
            q.post(Event::HeaterOn).unwrap();
        }
        assert_eq!(q.post(Event::HeaterOff), Err(QueueFull));
        assert_eq!(q.len(), EVENT_QUEUE_CAP);
        assert_eq!(q.dropped(), 1);
        for _ in 0..EVENT_QUEUE_CAP {
            assert_eq!(q.try_take(), Some(Event::HeaterOn));
        }
    }

    #[test]
    fn batch_is_all_or_nothing() {
        let q = EventQueue::new();
        for _ in 0..EVENT_QUEUE_CAP - 2 {
            q.post(Event::None).unwrap();
        }
        let batch = [Event::HotSensorPoll, Event::ColdSensorPoll, Event::WaterSensorPoll];
        assert_eq!(q.post_all(&batch), Err(QueueFull));
        assert_eq!(q.len(), EVENT_QUEUE_CAP - 2);
        assert_eq!(q.dropped(), 3);
    }

    #[test]
    fn blocking_take_returns_pending_event() {
        let q = EventQueue::new();
        q.post(Event::FeederOff).unwrap();
        assert_eq!(q.take_blocking(), Event::FeederOff);
        assert!(q.is_empty());
    }

    #[test]
    fn take_wakes_on_post_from_another_thread() {
        static Q: EventQueue = EventQueue::new();
        let producer = std::thread::spawn(|| {
            std::thread::sleep(std::time::Duration::from_millis(20));
            Q.post(Event::UvbLampOn).unwrap();
        });
        assert_eq!(Q.take_blocking(), Event::UvbLampOn);
        producer.join().unwrap();
    }

    #[test]
    fn every_kind_but_none_has_a_handler() {
        let events = [
            Event::button(0, ButtonAction::Pushed),
            Event::timer_expired(TimerId::Function),
            Event::LedStateChanged(LedId::Status),
            Event::ConnectivityChanged(ConnectivityStatus::default()),
            Event::HotSensorPoll,
            Event::StatusLedOff,
        ];
        assert!(events.iter().all(|e| e.handler().is_some()));
        assert_eq!(Event::None.handler(), None);
        for a in Actuator::ALL {
            assert_eq!(Event::actuate(a, true).handler(), Some(Handler::Activate(a)));
            assert_eq!(Event::actuate(a, false).handler(), Some(Handler::Deactivate(a)));
        }
        for z in Zone::ALL {
            assert_eq!(Event::sensor_poll(z).handler(), Some(Handler::SensorMeasure(z)));
        }
    }

    #[test]
    fn accessors_are_kind_checked() {
        let e = Event::button(4, ButtonAction::Released);
        assert_eq!(
            e.button_payload(),
            Some(ButtonPayload { pin: 4, action: ButtonAction::Released })
        );
        assert_eq!(e.timer_context(), None);
        assert_eq!(e.led(), None);
        assert_eq!(Event::HeaterOn.button_payload(), None);
        assert_eq!(Event::HeaterOn.actuator_command(), Some((Actuator::Heater, true)));
        assert_eq!(Event::HeaterOn.zone(), None);
        assert_eq!(ButtonAction::Pushed.kind(), EventKind::ButtonPushed);
    }
}
