//! Fuzz target: `sensors::dht::decode`
//!
//! Invariants checked:
//! - No panics for any 5-byte frame on either model
//! - Accepted frames always carry a valid checksum
//! - Accepted readings stay within the sensor's rated range
//!
//! cargo fuzz run fuzz_dht_frame

#![no_main]

use libfuzzer_sys::fuzz_target;
use terrarium::sensors::dht::{DhtModel, decode};

fuzz_target!(|data: &[u8]| {
    let Some((&selector, rest)) = data.split_first() else {
        return;
    };
    let Ok(frame) = <[u8; 5]>::try_from(rest) else {
        return;
    };
    let model = if selector & 1 == 0 { DhtModel::Dht11 } else { DhtModel::Dht22 };

    if let Ok(m) = decode(model, frame) {
        let sum = frame[..4].iter().fold(0u8, |acc, b| acc.wrapping_add(*b));
        assert_eq!(sum, frame[4]);
        assert!((0.0..=100.0).contains(&m.humidity_pct));
        assert!((-40.0..=80.0).contains(&m.temperature_c));
    }
});
