//! C-ABI entry points for the home-automation protocol stack.
//!
//! The stack runs in its own task and calls these from there. Each entry
//! point only translates its arguments and posts into [`APP_QUEUE`]; no
//! controller state is touched outside the dispatcher.
//!
//! | Symbol                             | Posts                               |
//! |------------------------------------|-------------------------------------|
//! | `terrarium_attribute_changed`      | `<Actuator>On/Off` (or nothing)     |
//! | `terrarium_cluster_init`           | `<Actuator>On/Off` from persistence |
//! | `terrarium_connectivity_changed`   | `ConnectivityChanged`               |

use core::sync::atomic::{AtomicBool, Ordering};

use log::debug;

use crate::app::ports::OnOffStore;
use crate::bridge::{AttributeBridge, AttributeId, AttributePath, ClusterId, EndpointId, WriteOutcome};
use crate::events::{APP_QUEUE, ConnectivityStatus, Event};

/// Mirrors `SystemConfig::remote_status_led`; set once at start-up.
pub static STATUS_LED_REMOTE: AtomicBool = AtomicBool::new(false);

fn bridge() -> AttributeBridge<'static> {
    AttributeBridge::new(&APP_QUEUE, STATUS_LED_REMOTE.load(Ordering::Relaxed))
}

/// Persisted value handed over by the stack for one endpoint.
struct Persisted(Option<bool>);

impl OnOffStore for Persisted {
    fn persisted_on_off(&self, _endpoint: EndpointId) -> Option<bool> {
        self.0
    }
}

fn outcome_code(outcome: WriteOutcome) -> i32 {
    match outcome {
        WriteOutcome::Ignored => 0,
        WriteOutcome::Posted => 1,
        WriteOutcome::Dropped => -1,
    }
}

/// An attribute was written remotely.
///
/// Returns 1 if an event was posted, 0 if the write was ignored, -1 if the
/// queue was full.
///
/// # Safety
///
/// `value` must be null or point to `size` readable bytes for the duration
/// of the call.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn terrarium_attribute_changed(
    endpoint: EndpointId,
    cluster: ClusterId,
    attribute: AttributeId,
    value: *const u8,
    size: usize,
) -> i32 {
    let bytes: &[u8] = if value.is_null() || size == 0 {
        &[]
    } else {
        // SAFETY: caller guarantees `value` points to `size` readable bytes.
        unsafe { core::slice::from_raw_parts(value, size) }
    };
    let path = AttributePath {
        endpoint,
        cluster,
        attribute,
    };
    outcome_code(bridge().on_attribute_write(path, bytes))
}

/// Cluster init for one managed On/Off endpoint. `persisted` is 1 (on),
/// 0 (off) or negative when nothing was persisted.
#[unsafe(no_mangle)]
pub extern "C" fn terrarium_cluster_init(endpoint: EndpointId, persisted: i8) -> i32 {
    let store = Persisted(if persisted < 0 { None } else { Some(persisted != 0) });
    outcome_code(bridge().on_cluster_init(endpoint, &store))
}

/// Connectivity report from the stack.
#[unsafe(no_mangle)]
pub extern "C" fn terrarium_connectivity_changed(
    provisioned: bool,
    enabled: bool,
    ble_connections: u8,
) -> i32 {
    let status = ConnectivityStatus {
        provisioned,
        enabled,
        ble_connections,
    };
    debug!("bridge: connectivity {:?}", status);
    match APP_QUEUE.post(Event::ConnectivityChanged(status)) {
        Ok(()) => 1,
        Err(_) => -1,
    }
}
