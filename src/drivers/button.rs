//! Polled, debounced function-button driver.
//!
//! ## Hardware
//!
//! Active-low momentary switch with a pull-up. A periodic scan timer
//! samples the level and feeds it to [`Debouncer::sample`]; only a level
//! that stays put for the debounce window becomes an edge.
//!
//! ```text
//! raw     ‾‾‾\_/‾\____________________/‾\_/‾‾‾‾‾‾‾‾‾
//! stable  ‾‾‾‾‾‾‾‾‾‾‾\___________________________/‾‾‾
//!                    ^ Pushed                    ^ Released
//! ```

use crate::events::ButtonAction;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DebounceState {
    Stable,
    /// Raw level differs from the stable one since `since_ms`.
    Settling { since_ms: u32 },
}

pub struct Debouncer {
    debounce_ms: u32,
    pressed: bool,
    state: DebounceState,
}

impl Debouncer {
    pub const fn new(debounce_ms: u32) -> Self {
        Self {
            debounce_ms,
            pressed: false,
            state: DebounceState::Stable,
        }
    }

    /// Debounced level.
    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    /// Feed one raw sample. `now_ms` is a wrapping millisecond clock.
    /// Returns the edge once the new level has held for the window.
    pub fn sample(&mut self, raw_pressed: bool, now_ms: u32) -> Option<ButtonAction> {
        if raw_pressed == self.pressed {
            self.state = DebounceState::Stable;
            return None;
        }
        match self.state {
            DebounceState::Stable => {
                self.state = DebounceState::Settling { since_ms: now_ms };
                None
            }
            DebounceState::Settling { since_ms } => {
                if now_ms.wrapping_sub(since_ms) < self.debounce_ms {
                    return None;
                }
                self.pressed = raw_pressed;
                self.state = DebounceState::Stable;
                Some(if raw_pressed {
                    ButtonAction::Pushed
                } else {
                    ButtonAction::Released
                })
            }
        }
    }
}
