//! Feeder servo on a 50 Hz PWM channel.
//!
//! Active: the configured pulse width (e.g. 1500 µs) every 20 ms frame.
//! Inactive: no pulse at all, so the servo is unpowered at rest.

use embedded_hal::pwm::SetDutyCycle;

/// One servo frame at 50 Hz.
pub const FRAME_US: u16 = 20_000;

pub struct FeederServo<P> {
    pwm: P,
    pulse_us: u16,
    active: bool,
}

impl<P: SetDutyCycle> FeederServo<P> {
    pub fn new(mut pwm: P, pulse_us: u16) -> Result<Self, P::Error> {
        pwm.set_duty_cycle_fully_off()?;
        Ok(Self {
            pwm,
            pulse_us: pulse_us.min(FRAME_US),
            active: false,
        })
    }

    pub fn set(&mut self, active: bool) -> Result<(), P::Error> {
        if active {
            self.pwm.set_duty_cycle_fraction(self.pulse_us, FRAME_US)?;
        } else {
            self.pwm.set_duty_cycle_fully_off()?;
        }
        self.active = active;
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}
