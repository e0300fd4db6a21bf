//! Status LED widget: pattern plus current blink phase.
//!
//! The widget is pure state. The controller drives the physical output
//! through `ActuatorPort` and arms the status-LED timer with whatever
//! [`LedWidget::phase_ms`] returns; the timer's expiry comes back as
//! `LedStateChanged{Status}` and calls [`LedWidget::advance`].
//!
//! ## Patterns
//!
//! | Pattern            | Output                              |
//! |--------------------|-------------------------------------|
//! | `Off`              | low                                 |
//! | `Solid`            | high                                |
//! | `Blink{on, off}`   | high for `on` ms, low for `off` ms  |

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedPattern {
    Off,
    Solid,
    Blink { on_ms: u32, off_ms: u32 },
}

#[derive(Debug, Clone)]
pub struct LedWidget {
    pattern: LedPattern,
    lit: bool,
}

impl LedWidget {
    pub fn new() -> Self {
        Self {
            pattern: LedPattern::Off,
            lit: false,
        }
    }

    pub fn pattern(&self) -> LedPattern {
        self.pattern
    }

    pub fn is_lit(&self) -> bool {
        self.lit
    }

    /// Switch pattern. Blinks start in their on phase. Returns the new
    /// output level.
    pub fn set_pattern(&mut self, pattern: LedPattern) -> bool {
        self.pattern = pattern;
        self.lit = !matches!(pattern, LedPattern::Off);
        self.lit
    }

    /// Duration of the current blink phase, `None` when not blinking.
    pub fn phase_ms(&self) -> Option<u32> {
        match self.pattern {
            LedPattern::Blink { on_ms, off_ms } => Some(if self.lit { on_ms } else { off_ms }),
            LedPattern::Off | LedPattern::Solid => None,
        }
    }

    /// Move to the next blink phase: `(level, phase duration)`. `None`
    /// when the widget is not blinking (a stale update).
    pub fn advance(&mut self) -> Option<(bool, u32)> {
        if !matches!(self.pattern, LedPattern::Blink { .. }) {
            return None;
        }
        self.lit = !self.lit;
        self.phase_ms().map(|ms| (self.lit, ms))
    }
}

impl Default for LedWidget {
    fn default() -> Self {
        Self::new()
    }
}
