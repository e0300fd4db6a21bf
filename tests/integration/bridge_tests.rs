//! Inbound bridge: remote attribute writes and cluster init become events
//! on a caller-owned queue.

use terrarium::app::state::Actuator;
use terrarium::bridge::{
    ATTR_MEASURED_VALUE, ATTR_ON_OFF, AttributeBridge, AttributePath, WriteOutcome, cluster,
    endpoint,
};
use terrarium::events::{EVENT_QUEUE_CAP, Event, EventQueue, Handler};

use crate::mock_hw::MockOnOffStore;

fn drain(q: &EventQueue) -> Vec<Event> {
    core::iter::from_fn(|| q.try_take()).collect()
}

#[test]
fn heater_write_posts_single_activate() {
    let q = EventQueue::new();
    let bridge = AttributeBridge::new(&q, false);

    let outcome = bridge.on_attribute_write(AttributePath::on_off(endpoint::HEATER), &[1]);

    assert_eq!(outcome, WriteOutcome::Posted);
    let events = drain(&q);
    assert_eq!(events, vec![Event::HeaterOn]);
    assert_eq!(events[0].handler(), Some(Handler::Activate(Actuator::Heater)));
}

#[test]
fn any_nonzero_first_byte_activates() {
    let q = EventQueue::new();
    let bridge = AttributeBridge::new(&q, false);

    bridge.on_attribute_write(AttributePath::on_off(endpoint::FILTER), &[0x7f, 0]);
    bridge.on_attribute_write(AttributePath::on_off(endpoint::FILTER), &[0, 1]);

    assert_eq!(drain(&q), vec![Event::FilterOn, Event::FilterOff]);
}

#[test]
fn status_led_endpoint_needs_remote_control() {
    let q = EventQueue::new();

    let local = AttributeBridge::new(&q, false);
    let outcome = local.on_attribute_write(AttributePath::on_off(endpoint::STATUS_LED), &[1]);
    assert_eq!(outcome, WriteOutcome::Ignored);
    assert!(q.is_empty());

    let remote = AttributeBridge::new(&q, true);
    let outcome = remote.on_attribute_write(AttributePath::on_off(endpoint::STATUS_LED), &[1]);
    assert_eq!(outcome, WriteOutcome::Posted);
    assert_eq!(drain(&q), vec![Event::StatusLedOn]);
}

#[test]
fn unmanaged_writes_are_ignored() {
    let q = EventQueue::new();
    let bridge = AttributeBridge::new(&q, true);

    let wrong_cluster = AttributePath {
        endpoint: endpoint::HEATER,
        cluster: cluster::TEMPERATURE_MEASUREMENT,
        attribute: ATTR_MEASURED_VALUE,
    };
    let wrong_attribute = AttributePath {
        attribute: ATTR_ON_OFF + 1,
        ..AttributePath::on_off(endpoint::HEATER)
    };
    let sensor_endpoint = AttributePath::on_off(endpoint::HOT_TEMPERATURE);

    for path in [wrong_cluster, wrong_attribute, sensor_endpoint] {
        assert_eq!(bridge.on_attribute_write(path, &[1]), WriteOutcome::Ignored);
    }
    assert_eq!(
        bridge.on_attribute_write(AttributePath::on_off(endpoint::HEATER), &[]),
        WriteOutcome::Ignored
    );
    assert!(q.is_empty());
}

#[test]
fn cluster_init_replays_persisted_values_in_order() {
    let q = EventQueue::new();
    let bridge = AttributeBridge::new(&q, false);
    let mut store = MockOnOffStore::default();
    store.0.insert(endpoint::UVB_LAMP, true);
    store.0.insert(endpoint::FILTER, true);
    store.0.insert(endpoint::FEEDER, false);

    let endpoints: Vec<_> = bridge.managed_endpoints().collect();
    assert_eq!(
        endpoints,
        vec![
            endpoint::HOT_LAMP,
            endpoint::UVB_LAMP,
            endpoint::HEATER,
            endpoint::FILTER,
            endpoint::FEEDER,
        ]
    );
    for ep in endpoints {
        assert_eq!(bridge.on_cluster_init(ep, &store), WriteOutcome::Posted);
    }

    assert_eq!(
        drain(&q),
        vec![
            Event::HotLampOff,
            Event::UvbLampOn,
            Event::HeaterOff,
            Event::FilterOn,
            Event::FeederOff,
        ]
    );
}

#[test]
fn cluster_init_covers_status_led_when_remote() {
    let q = EventQueue::new();
    let bridge = AttributeBridge::new(&q, true);
    let mut store = MockOnOffStore::default();
    store.0.insert(endpoint::STATUS_LED, true);

    assert_eq!(bridge.managed_endpoints().count(), 6);
    assert_eq!(bridge.on_cluster_init(endpoint::STATUS_LED, &store), WriteOutcome::Posted);
    assert_eq!(
        bridge.on_cluster_init(endpoint::WATER_TEMPERATURE, &store),
        WriteOutcome::Ignored
    );
    assert_eq!(drain(&q), vec![Event::StatusLedOn]);
}

#[test]
fn full_queue_drops_write_without_touching_contents() {
    let q = EventQueue::new();
    for _ in 0..EVENT_QUEUE_CAP {
        q.post(Event::ColdSensorPoll).unwrap();
    }
    let bridge = AttributeBridge::new(&q, false);

    let outcome = bridge.on_attribute_write(AttributePath::on_off(endpoint::HEATER), &[1]);

    assert_eq!(outcome, WriteOutcome::Dropped);
    assert_eq!(q.dropped(), 1);
    assert_eq!(drain(&q), vec![Event::ColdSensorPoll; EVENT_QUEUE_CAP]);
}
