//! Fuzz target: `AttributeBridge::on_attribute_write`
//!
//! Feeds arbitrary `(endpoint, cluster, attribute, value)` writes into the
//! inbound bridge against a private queue.
//!
//! Invariants checked:
//! - No panics under any byte sequence
//! - Each write posts at most one event
//! - A posted event is an On/Off command for the written endpoint
//!
//! cargo fuzz run fuzz_attribute_write

#![no_main]

use critical_section as _;
use libfuzzer_sys::fuzz_target;
use terrarium::bridge::{
    AttributeBridge, AttributePath, WriteOutcome, actuator_for_endpoint, endpoint_for_actuator,
};
use terrarium::events::EventQueue;

fuzz_target!(|data: &[u8]| {
    if data.len() < 11 {
        return;
    }
    let (head, value) = data.split_at(11);
    let path = AttributePath {
        endpoint: u16::from_le_bytes([head[0], head[1]]),
        cluster: u32::from_le_bytes([head[2], head[3], head[4], head[5]]),
        attribute: u32::from_le_bytes([head[6], head[7], head[8], head[9]]),
    };
    let remote = head[10] & 1 != 0;

    let q = EventQueue::new();
    let bridge = AttributeBridge::new(&q, remote);
    let outcome = bridge.on_attribute_write(path, value);

    match outcome {
        WriteOutcome::Posted => {
            assert_eq!(q.len(), 1);
            let event = q.try_take().unwrap();
            let (actuator, active) = event.actuator_command().expect("On/Off command");
            assert_eq!(endpoint_for_actuator(actuator), path.endpoint);
            assert_eq!(actuator_for_endpoint(path.endpoint, remote), Some(actuator));
            assert_eq!(active, value[0] != 0);
        }
        WriteOutcome::Ignored => assert!(q.is_empty()),
        WriteOutcome::Dropped => panic!("empty queue reported full"),
    }
});
