//! Digital on/off outputs: relay channels and the status LED.
//!
//! The relay board is active-low (pulling the input low energises the
//! coil); the LED is active-high. [`Switch`] hides the polarity so callers
//! only deal in logical active/inactive.

use embedded_hal::digital::OutputPin;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    ActiveHigh,
    ActiveLow,
}

pub struct Switch<P> {
    pin: P,
    polarity: Polarity,
    active: bool,
}

impl<P: OutputPin> Switch<P> {
    /// Take the pin and drive it to the inactive level.
    pub fn new(pin: P, polarity: Polarity) -> Result<Self, P::Error> {
        let mut switch = Self {
            pin,
            polarity,
            active: false,
        };
        switch.set(false)?;
        Ok(switch)
    }

    pub fn set(&mut self, active: bool) -> Result<(), P::Error> {
        let high = match self.polarity {
            Polarity::ActiveHigh => active,
            Polarity::ActiveLow => !active,
        };
        if high {
            self.pin.set_high()?;
        } else {
            self.pin.set_low()?;
        }
        self.active = active;
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}
