//! DisplayCoordinator: decides when the overlay shows and when it clears.
//!
//! Each [`KeyEvent`] starts a new generation, shows its text, and schedules a
//! hide tagged with that generation. When a hide fires it clears the overlay
//! only if its generation is still current; a hide that was superseded by a
//! newer key press does nothing. Pending hides are never aborted; the
//! generation check is the only cancellation.
//!
//! A burst of key presses arriving faster than the display duration therefore
//! produces one `show` per press and exactly one `clear`, one duration after
//! the last press.
//!
//! # Locking
//!
//! The [`DebounceState`] sits behind a `std::sync::Mutex` scoped to the
//! coordinator. The lock is held only for the generation bump or compare and
//! the non-blocking enqueue onto the overlay context, so a `Show` can never be
//! overtaken by a `Clear` that was decided before it.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use keyshow_core::{DebounceState, DisplayPhase, Generation, KeyEvent};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info, trace};

use super::overlay_context::OverlayHandle;

/// Supplies the display duration. Read once per key event, so a settings
/// change applies from the next key press on.
pub trait DisplayDurationSource: Send + Sync {
    fn display_duration(&self) -> Duration;
}

impl DisplayDurationSource for Duration {
    fn display_duration(&self) -> Duration {
        *self
    }
}

/// Drives the overlay from a stream of key events.
#[derive(Clone)]
pub struct DisplayCoordinator {
    state: Arc<Mutex<DebounceState>>,
    overlay: OverlayHandle,
    durations: Arc<dyn DisplayDurationSource>,
}

impl DisplayCoordinator {
    pub fn new(overlay: OverlayHandle, durations: Arc<dyn DisplayDurationSource>) -> Self {
        Self {
            state: Arc::new(Mutex::new(DebounceState::new())),
            overlay,
            durations,
        }
    }

    /// Shows `event` and schedules its hide. Must be called from within a
    /// Tokio runtime because the hide timer is spawned onto it.
    ///
    /// Returns the generation assigned to this event.
    pub fn handle_key_event(&self, event: &KeyEvent) -> Generation {
        let duration = self.durations.display_duration();
        let text = event.display_text();
        let now = tokio::time::Instant::now().into_std();

        let generation = {
            let mut state = self.lock_state();
            let session = state.begin(now, duration);
            self.overlay.show(text);
            state.mark_hide_scheduled(session.generation);
            session.generation
        };

        debug!(generation = generation.0, ?duration, key = event.name(), "showing key");
        self.schedule_hide(generation, duration);
        generation
    }

    /// Handles a hide timer firing for `generation`.
    ///
    /// Returns `true` if the overlay was cleared, `false` if the timer was stale.
    pub fn hide_elapsed(&self, generation: Generation) -> bool {
        let mut state = self.lock_state();
        if state.expire(generation) {
            self.overlay.clear();
            true
        } else {
            trace!(generation = generation.0, "stale hide timer ignored");
            false
        }
    }

    pub fn phase(&self) -> DisplayPhase {
        self.lock_state().phase()
    }

    /// Consumes key events until the listener closes the channel.
    pub async fn run(self, mut events: UnboundedReceiver<KeyEvent>) {
        info!("display coordinator running");
        while let Some(event) = events.recv().await {
            self.handle_key_event(&event);
        }
        info!("key event stream closed; display coordinator stopping");
    }

    fn schedule_hide(&self, generation: Generation, duration: Duration) {
        let coordinator = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            coordinator.hide_elapsed(generation);
        });
    }

    fn lock_state(&self) -> MutexGuard<'_, DebounceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
