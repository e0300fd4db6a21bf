//! Runtime diagnostics.
//!
//! Counters are kept where the events happen: the queue counts posts and
//! full-queue drops, the dispatcher counts dispatches and handler-less
//! drops, the controller counts sensor outcomes. A [`DiagnosticsReport`]
//! snapshots all of them; the dispatcher logs one every
//! `diagnostics_interval_events` dispatched events.

use log::info;
use serde::{Deserialize, Serialize};

use crate::events::EventQueue;
use crate::sensors::ReadingSource;

/// Sensor pipeline outcomes since boot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorStats {
    pub fresh: u32,
    pub fetch_failures: u32,
    pub cached: u32,
    pub estimated: u32,
    pub unavailable: u32,
}

impl SensorStats {
    pub fn record(&mut self, source: ReadingSource) {
        match source {
            ReadingSource::Fresh => self.fresh += 1,
            ReadingSource::Cached => {
                self.fetch_failures += 1;
                self.cached += 1;
            }
            ReadingSource::Estimated => {
                self.fetch_failures += 1;
                self.estimated += 1;
            }
            ReadingSource::Unavailable => {
                self.fetch_failures += 1;
                self.unavailable += 1;
            }
        }
    }
}

/// Dispatcher-side counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchStats {
    pub dispatched: u32,
    pub dropped_no_handler: u32,
}

/// Point-in-time snapshot of every counter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticsReport {
    pub events_posted: u32,
    pub dropped_queue_full: u32,
    pub queue_depth: u8,
    pub dispatch: DispatchStats,
    pub sensors: SensorStats,
}

impl DiagnosticsReport {
    pub fn collect(queue: &EventQueue, dispatch: DispatchStats, sensors: SensorStats) -> Self {
        Self {
            events_posted: queue.posted(),
            dropped_queue_full: queue.dropped(),
            queue_depth: queue.len() as u8,
            dispatch,
            sensors,
        }
    }

    pub fn log(&self) {
        info!(
            "DIAG | posted={} dropped(full)={} dropped(no handler)={} dispatched={} depth={} | \
             sensor fresh={} failed={} cached={} estimated={} unavailable={}",
            self.events_posted,
            self.dropped_queue_full,
            self.dispatch.dropped_no_handler,
            self.dispatch.dispatched,
            self.queue_depth,
            self.sensors.fresh,
            self.sensors.fetch_failures,
            self.sensors.cached,
            self.sensors.estimated,
            self.sensors.unavailable,
        );
    }
}
