//! Dispatcher — the single consumer of the event queue.
//!
//! Takes one event at a time, looks up its [`Handler`](crate::events::Handler)
//! and runs it to completion against the [`Controller`]. Events without a
//! handler are dropped and counted. Nothing here propagates errors: the
//! loop in [`Dispatcher::run`] never exits.

use log::{debug, info};

use crate::app::controller::Controller;
use crate::app::ports::{ActuatorPort, AttributePort, DevicePort, SensorPort, TimerPort};
use crate::diagnostics::{DiagnosticsReport, DispatchStats};
use crate::events::{Event, EventQueue};

pub struct Dispatcher<'q, T, H, R, D> {
    queue: &'q EventQueue,
    controller: Controller<T>,
    hw: H,
    remote: R,
    device: D,
    stats: DispatchStats,
    report_every: u32,
}

impl<'q, T, H, R, D> Dispatcher<'q, T, H, R, D>
where
    T: TimerPort,
    H: ActuatorPort + SensorPort,
    R: AttributePort,
    D: DevicePort,
{
    pub fn new(queue: &'q EventQueue, controller: Controller<T>, hw: H, remote: R, device: D) -> Self {
        let report_every = controller.config().diagnostics_interval_events;
        Self {
            queue,
            controller,
            hw,
            remote,
            device,
            stats: DispatchStats::default(),
            report_every,
        }
    }

    /// Start the controller (sensor polling, initial indication).
    pub fn start(&mut self) {
        self.controller.start(&mut self.hw);
    }

    /// Route one event to its handler.
    pub fn dispatch(&mut self, event: Event) {
        let Some(handler) = event.handler() else {
            self.stats.dropped_no_handler += 1;
            debug!(
                "dispatch: no handler for {:?} (dropped {})",
                event.kind(),
                self.stats.dropped_no_handler
            );
            return;
        };

        self.controller.handle(
            handler,
            &event,
            &mut self.hw,
            &mut self.remote,
            &mut self.device,
        );
        self.stats.dispatched += 1;

        if self.report_every > 0 && self.stats.dispatched % self.report_every == 0 {
            self.report().log();
        }
    }

    /// Dispatch everything currently queued without blocking. Events posted
    /// by handlers during the drain are dispatched too.
    pub fn drain(&mut self) -> usize {
        let mut n = 0;
        while let Some(event) = self.queue.try_take() {
            self.dispatch(event);
            n += 1;
        }
        n
    }

    /// Dispatch forever.
    pub fn run(mut self) -> ! {
        info!("dispatch: entering event loop");
        loop {
            let event = self.queue.take_blocking();
            self.dispatch(event);
        }
    }

    pub fn report(&self) -> DiagnosticsReport {
        DiagnosticsReport::collect(self.queue, self.stats, self.controller.sensor_stats())
    }

    pub fn stats(&self) -> DispatchStats {
        self.stats
    }

    pub fn controller(&self) -> &Controller<T> {
        &self.controller
    }

    pub fn hw(&self) -> &H {
        &self.hw
    }

    pub fn hw_mut(&mut self) -> &mut H {
        &mut self.hw
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    pub fn remote_mut(&mut self) -> &mut R {
        &mut self.remote
    }

    pub fn device(&self) -> &D {
        &self.device
    }
}
