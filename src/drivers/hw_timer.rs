//! Logical timers on ESP-IDF's esp_timer API.
//!
//! One esp_timer per [`TimerId`], plus a periodic button-scan timer.
//! Callbacks execute in the esp_timer task (not ISR) and only post into
//! [`APP_QUEUE`]; the callback argument is the timer's index so no
//! per-timer state is shared with the callback.

use core::cell::RefCell;
use core::ffi::c_void;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use esp_idf_svc::sys::*;
use log::{error, info, warn};

use crate::app::ports::TimerPort;
use crate::drivers::button::Debouncer;
use crate::error::TimerError;
use crate::events::{APP_QUEUE, Event};
use crate::timers::{TimerId, TimerMode};

// ── Expiry callbacks ──────────────────────────────────────────

unsafe extern "C" fn logical_timer_cb(arg: *mut c_void) {
    if let Some(timer) = TimerId::from_index(arg as usize) {
        // Drops are counted and logged by the queue.
        let _ = APP_QUEUE.post_all(timer.expiry_events());
    }
}

fn create(
    name: &'static [u8],
    callback: unsafe extern "C" fn(*mut c_void),
    arg: usize,
) -> Result<esp_timer_handle_t, TimerError> {
    let args = esp_timer_create_args_t {
        callback: Some(callback),
        arg: arg as *mut c_void,
        dispatch_method: esp_timer_dispatch_t_ESP_TIMER_TASK,
        name: name.as_ptr().cast(),
        skip_unhandled_events: true,
    };
    let mut handle: esp_timer_handle_t = core::ptr::null_mut();
    // SAFETY: `args` and `name` outlive the call; `handle` is a valid out
    // pointer. esp_timer copies what it keeps.
    let ret = unsafe { esp_timer_create(&args, &mut handle) };
    if ret != ESP_OK {
        return Err(TimerError::CreateFailed(ret));
    }
    Ok(handle)
}

fn timer_name(timer: TimerId) -> &'static [u8] {
    match timer {
        TimerId::Function => b"function\0",
        TimerId::SensorPoll => b"sensor\0",
        TimerId::FeederRetract => b"feeder\0",
        TimerId::StatusLed => b"status_led\0",
    }
}

// ── HwTimers ──────────────────────────────────────────────────

/// The logical timer set on esp_timer. Lives in the dispatcher task.
pub struct HwTimers {
    handles: [esp_timer_handle_t; TimerId::COUNT],
}

impl HwTimers {
    pub fn new() -> Result<Self, TimerError> {
        let mut handles = [core::ptr::null_mut(); TimerId::COUNT];
        for timer in TimerId::ALL {
            handles[timer.index()] = create(timer_name(timer), logical_timer_cb, timer.index())?;
        }
        info!("hw_timer: {} logical timers created", TimerId::COUNT);
        Ok(Self { handles })
    }

    fn handle(&self, timer: TimerId) -> esp_timer_handle_t {
        self.handles[timer.index()]
    }
}

impl TimerPort for HwTimers {
    fn start(&self, timer: TimerId, period_ms: u32) -> Result<(), TimerError> {
        let h = self.handle(timer);
        let period_us = u64::from(period_ms) * 1000;
        // SAFETY: `h` was returned by esp_timer_create and is never deleted
        // while `self` is alive. Stopping an idle timer only returns
        // ESP_ERR_INVALID_STATE.
        let ret = unsafe {
            esp_timer_stop(h);
            match timer.mode() {
                TimerMode::Periodic => esp_timer_start_periodic(h, period_us),
                TimerMode::OneShot | TimerMode::Monostable => esp_timer_start_once(h, period_us),
            }
        };
        if ret != ESP_OK {
            error!("hw_timer: {} start failed (rc={})", timer.name(), ret);
            return Err(TimerError::StartFailed(ret));
        }
        Ok(())
    }

    fn cancel(&self, timer: TimerId) {
        // SAFETY: see `start`.
        let ret = unsafe { esp_timer_stop(self.handle(timer)) };
        if ret != ESP_OK && ret != ESP_ERR_INVALID_STATE {
            warn!("hw_timer: {} stop failed (rc={})", timer.name(), ret);
        }
    }
}

impl Drop for HwTimers {
    fn drop(&mut self) {
        for h in self.handles {
            // SAFETY: handles are valid and no longer used after this.
            unsafe {
                esp_timer_stop(h);
                esp_timer_delete(h);
            }
        }
    }
}

// ── Function-button scan ──────────────────────────────────────

struct ButtonScan {
    gpio: i32,
    event_pin: u8,
    debouncer: Debouncer,
}

static BUTTON_SCAN: Mutex<CriticalSectionRawMutex, RefCell<Option<ButtonScan>>> =
    Mutex::new(RefCell::new(None));

unsafe extern "C" fn button_scan_cb(_arg: *mut c_void) {
    // SAFETY: plain reads of the system clock and a configured input pin.
    let now_ms = unsafe { esp_timer_get_time() / 1000 } as u32;
    let edge = BUTTON_SCAN.lock(|cell| {
        let mut scan = cell.borrow_mut();
        let scan = scan.as_mut()?;
        // Active-low with pull-up.
        let pressed = unsafe { gpio_get_level(scan.gpio) } == 0;
        scan.debouncer
            .sample(pressed, now_ms)
            .map(|action| Event::button(scan.event_pin, action))
    });
    if let Some(event) = edge {
        let _ = APP_QUEUE.post(event);
    }
}

/// Start sampling the function button every `scan_ms`. The pin must
/// already be configured as an input with pull-up. The scan timer runs
/// for the life of the firmware.
pub fn start_button_scan(
    gpio: i32,
    event_pin: u8,
    scan_ms: u32,
    debounce_ms: u32,
) -> Result<(), TimerError> {
    BUTTON_SCAN.lock(|cell| {
        *cell.borrow_mut() = Some(ButtonScan {
            gpio,
            event_pin,
            debouncer: Debouncer::new(debounce_ms),
        });
    });
    let h = create(b"button\0", button_scan_cb, 0)?;
    // SAFETY: freshly created handle.
    let ret = unsafe { esp_timer_start_periodic(h, u64::from(scan_ms) * 1000) };
    if ret != ESP_OK {
        return Err(TimerError::StartFailed(ret));
    }
    info!("hw_timer: button scan on GPIO{} every {}ms", gpio, scan_ms);
    Ok(())
}
