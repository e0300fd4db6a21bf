//! Timer expiries as seen by the queue and the dispatcher.

use terrarium::app::ports::TimerPort;
use terrarium::config::SystemConfig;
use terrarium::events::{EVENT_QUEUE_CAP, Event, EventQueue};
use terrarium::timers::{SoftTimers, TimerId};

use crate::mock_hw::rig;

#[test]
fn sensor_poll_posts_three_events_every_period() {
    let q = EventQueue::new();
    let timers = SoftTimers::new(&q);
    timers.start(TimerId::SensorPoll, 2000).unwrap();

    for tick in 1..=3u64 {
        assert_eq!(timers.advance_to(tick * 2000), 1);
        assert_eq!(q.try_take(), Some(Event::HotSensorPoll));
        assert_eq!(q.try_take(), Some(Event::ColdSensorPoll));
        assert_eq!(q.try_take(), Some(Event::WaterSensorPoll));
        assert!(q.is_empty());
    }
}

#[test]
fn cancelled_timer_never_fires() {
    let q = EventQueue::new();
    let timers = SoftTimers::new(&q);
    timers.start(TimerId::SensorPoll, 2000).unwrap();
    timers.advance_to(1999);
    timers.cancel(TimerId::SensorPoll);

    assert_eq!(timers.advance_to(100_000), 0);
    assert!(q.is_empty());
}

#[test]
fn feeder_restart_moves_deadline() {
    let q = EventQueue::new();
    let timers = SoftTimers::new(&q);
    timers.start(TimerId::FeederRetract, 1500).unwrap();
    timers.advance_to(1400);
    timers.start(TimerId::FeederRetract, 1500).unwrap();

    assert_eq!(timers.advance_to(2899), 0);
    assert_eq!(timers.advance_to(2900), 1);
    assert_eq!(q.try_take(), Some(Event::FeederOff));
}

#[test]
fn expiry_batch_on_full_queue_is_dropped_whole() {
    let q = EventQueue::new();
    let timers = SoftTimers::new(&q);
    for _ in 0..EVENT_QUEUE_CAP - 2 {
        q.post(Event::HeaterOn).unwrap();
    }
    timers.start(TimerId::SensorPoll, 2000).unwrap();

    assert_eq!(timers.advance_to(2000), 1);

    assert_eq!(q.len(), EVENT_QUEUE_CAP - 2);
    assert_eq!(q.dropped(), 3);
    let drained: Vec<_> = core::iter::from_fn(|| q.try_take()).collect();
    assert!(drained.iter().all(|e| *e == Event::HeaterOn));

    // The next period lands once there is room again.
    assert_eq!(timers.advance_to(4000), 1);
    assert_eq!(q.len(), 3);
}

#[test]
fn dropped_expiries_show_in_report() {
    let q = EventQueue::new();
    let timers = SoftTimers::new(&q);
    let mut d = rig(&q, &timers, SystemConfig::default());
    d.start();

    // Let the clock run without dispatching: the heartbeat stays parked on
    // its one queued update while sensor polls pile up.
    timers.advance_to(10_000);
    let report = d.report();
    assert_eq!(report.queue_depth as usize, 1 + 3 * 3);
    assert_eq!(report.dropped_queue_full, 3 * 2);

    d.drain();
    let report = d.report();
    assert_eq!(report.queue_depth, 0);
    assert_eq!(report.dispatch.dispatched, 10);
}
