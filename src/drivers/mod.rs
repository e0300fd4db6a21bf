//! Output drivers, the function-button debouncer, peripheral bring-up and
//! platform timers.

pub mod button;
#[cfg(target_os = "espidf")]
pub mod hw_init;
#[cfg(target_os = "espidf")]
pub mod hw_timer;
pub mod servo;
pub mod status_led;
pub mod switch;
