//! Held-key emulation for continuous-movement games.
//!
//! Most terminals only report presses plus OS auto-repeat, and the first
//! repeat arrives only after the desktop's repeat delay (500 ms on GNOME,
//! 660 ms on X11). In that mode a press marks a control as held for
//! `REPEAT_HOLD`, which outlasts the delay, and every repeat refreshes it.
//! Terminals with keyboard enhancement report releases, so there a control
//! stays held until its release arrives.

use std::time::Duration;

pub const REPEAT_HOLD: Duration = Duration::from_millis(700);

/// How the terminal reports key state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum KeyReporting {
    /// Release events arrive.
    Releases,
    /// Presses and auto-repeat only.
    #[default]
    PressOnly,
}

impl KeyReporting {
    /// How long a press counts as held without a refresh; `None` holds until release.
    pub fn hold_window(self) -> Option<Duration> {
        match self {
            KeyReporting::Releases => None,
            KeyReporting::PressOnly => Some(REPEAT_HOLD),
        }
    }
}

#[derive(Clone, Debug)]
pub struct HeldKeys<K> {
    held: Vec<(K, Option<Duration>)>,
    window: Option<Duration>,
}

impl<K: Copy + PartialEq> Default for HeldKeys<K> {
    fn default() -> Self {
        Self::new(KeyReporting::default())
    }
}

impl<K: Copy + PartialEq> HeldKeys<K> {
    pub fn new(reporting: KeyReporting) -> Self {
        Self {
            held: Vec::new(),
            window: reporting.hold_window(),
        }
    }

    pub fn press(&mut self, key: K) {
        let window = self.window;
        match self.held.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = window,
            None => self.held.push((key, window)),
        }
    }

    pub fn release(&mut self, key: K) {
        self.held.retain(|(k, _)| *k != key);
    }

    pub fn is_held(&self, key: K) -> bool {
        self.held.iter().any(|(k, _)| *k == key)
    }

    pub fn advance(&mut self, dt: Duration) {
        for (_, left) in &mut self.held {
            if let Some(left) = left {
                *left = left.saturating_sub(dt);
            }
        }
        self.held.retain(|(_, left)| !left.is_some_and(|l| l.is_zero()));
    }

    pub fn clear(&mut self) {
        self.held.clear();
    }
}
