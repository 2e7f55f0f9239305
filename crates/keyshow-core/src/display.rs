//! Display debounce state.
//!
//! Every key event starts a new [`DisplaySession`] tagged with a fresh
//! [`Generation`]. A hide timer carries the generation it was scheduled for;
//! when it fires, [`DebounceState::expire`] only clears the overlay if that
//! generation is still current. Older timers are stale and change nothing.
//!
//! This type holds no lock and knows nothing about timers or threads. The
//! application's display coordinator owns one behind a mutex and drives it.

use std::time::{Duration, Instant};

/// Monotonically increasing session counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(pub u64);

/// One shown key press and the instant at which it should disappear.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplaySession {
    pub generation: Generation,
    pub expires_at: Instant,
}

/// Observable phase of the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayPhase {
    /// Nothing shown.
    Idle,
    /// Text shown; no hide scheduled yet.
    Showing(Generation),
    /// Text shown; a hide for this generation is due at `deadline`.
    PendingHide { generation: Generation, deadline: Instant },
}

/// Generation counter plus the current session.
#[derive(Debug, Default)]
pub struct DebounceState {
    counter: u64,
    session: Option<DisplaySession>,
    hide_scheduled: bool,
}

impl DebounceState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new session, superseding any previous one.
    ///
    /// The returned session's generation is the only one for which
    /// [`expire`](Self::expire) will report a clear from now on.
    pub fn begin(&mut self, now: Instant, duration: Duration) -> DisplaySession {
        self.counter += 1;
        let session = DisplaySession {
            generation: Generation(self.counter),
            expires_at: now + duration,
        };
        self.session = Some(session);
        self.hide_scheduled = false;
        session
    }

    /// Records that the hide for `generation` has been handed to a timer.
    pub fn mark_hide_scheduled(&mut self, generation: Generation) {
        if self.is_current(generation) {
            self.hide_scheduled = true;
        }
    }

    /// Consumes the session if `generation` is current.
    ///
    /// Returns `true` when the caller must clear the overlay; `false` means
    /// the timer was stale and nothing changed.
    pub fn expire(&mut self, generation: Generation) -> bool {
        if !self.is_current(generation) {
            return false;
        }
        self.session = None;
        self.hide_scheduled = false;
        true
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        self.session.is_some_and(|s| s.generation == generation)
    }

    /// The most recently issued generation, whether or not it already expired.
    pub fn latest_generation(&self) -> Generation {
        Generation(self.counter)
    }

    pub fn phase(&self) -> DisplayPhase {
        match self.session {
            None => DisplayPhase::Idle,
            Some(s) if self.hide_scheduled => DisplayPhase::PendingHide {
                generation: s.generation,
                deadline: s.expires_at,
            },
            Some(s) => DisplayPhase::Showing(s.generation),
        }
    }
}
