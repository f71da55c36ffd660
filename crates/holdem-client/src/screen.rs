//! Screen state machine.
//!
//! Decides which of the three views is visible. Transitions are
//! one-directional within a game lifecycle — Lobby → Waiting → InGame —
//! with [`reset`](ScreenController::reset) as the only way back. A trigger
//! the current state does not define is logged and ignored, never a crash.

use tracing::warn;

/// Exactly one screen is active at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Lobby,
    Waiting,
    InGame,
}

/// Lifecycle events that may move the screen forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenTrigger {
    /// A create/join was acknowledged.
    SessionEstablished,
    /// A round started.
    RoundStarted,
}

pub struct ScreenController {
    current: Screen,
}

impl ScreenController {
    pub fn new() -> Self {
        Self {
            current: Screen::Lobby,
        }
    }

    pub fn current(&self) -> Screen {
        self.current
    }

    /// Apply a lifecycle trigger. Returns `true` if the screen changed.
    pub fn apply(&mut self, trigger: ScreenTrigger) -> bool {
        let next = match (self.current, trigger) {
            (Screen::Lobby, ScreenTrigger::SessionEstablished) => Screen::Waiting,
            (Screen::Waiting, ScreenTrigger::RoundStarted) => Screen::InGame,
            // Join acknowledgments repeat as players arrive; later rounds
            // start while already in game. Both are defined self-loops.
            (Screen::Waiting, ScreenTrigger::SessionEstablished)
            | (Screen::InGame, ScreenTrigger::RoundStarted) => self.current,
            (state, trigger) => {
                warn!(?state, ?trigger, "ignoring screen trigger undefined for state");
                self.current
            }
        };
        let changed = next != self.current;
        self.current = next;
        changed
    }

    /// Full reset back to the lobby — the only backward edge.
    pub fn reset(&mut self) -> bool {
        let changed = self.current != Screen::Lobby;
        self.current = Screen::Lobby;
        changed
    }
}

impl Default for ScreenController {
    fn default() -> Self {
        Self::new()
    }
}
