//! Per-transition processing shared by every keyboard listener.
//!
//! [`TransitionProcessor::process`] runs synchronously inside the capture
//! callback:
//!
//! | transition      | action                                                   |
//! |-----------------|----------------------------------------------------------|
//! | modifier down   | ignore if already held (auto-repeat), else hold and emit |
//! | modifier up     | release; never emits                                     |
//! | other key down  | emit                                                     |
//! | other key up    | nothing                                                  |
//!
//! "Emit" reads the live modifier mask from [`KeyboardState`], translates the
//! code, and sends a [`KeyEvent`] without blocking. Errors and panics are
//! contained and turn into "emit nothing". The disposition is always
//! [`HookDisposition::PassThrough`].

use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Mutex, MutexGuard, PoisonError};

use keyshow_core::keymap::vk;
use keyshow_core::{translate, KeyEvent, Transition};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, trace};

use super::{HookDisposition, KeyStateError, KeyboardState};

/// Modifier codes currently held, by exact code (left and right are distinct).
#[derive(Debug, Default)]
struct ModifierHoldSet {
    held: Mutex<HashSet<u32>>,
}

impl ModifierHoldSet {
    /// Returns `true` if `code` was not already held.
    fn press(&self, code: u32) -> bool {
        self.lock().insert(code)
    }

    fn release(&self, code: u32) {
        self.lock().remove(&code);
    }

    fn contains(&self, code: u32) -> bool {
        self.lock().contains(&code)
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<u32>> {
        self.held.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Classifies raw transitions and emits key events to one subscriber.
///
/// A processor lives for exactly one start/stop cycle of its listener.
pub struct TransitionProcessor<S> {
    keyboard: S,
    modifiers_held: ModifierHoldSet,
    events: UnboundedSender<KeyEvent>,
}

impl<S: KeyboardState> TransitionProcessor<S> {
    pub fn new(keyboard: S, events: UnboundedSender<KeyEvent>) -> Self {
        Self {
            keyboard,
            modifiers_held: ModifierHoldSet::default(),
            events,
        }
    }

    /// Processes one raw transition. Never panics and never fails.
    pub fn process(&self, code: u32, transition: Transition) -> HookDisposition {
        match panic::catch_unwind(AssertUnwindSafe(|| self.dispatch(code, transition))) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => trace!("dropped VK {code} {transition:?}: {e}"),
            Err(_) => debug!("panic while processing VK {code} {transition:?}; transition dropped"),
        }
        HookDisposition::PassThrough
    }

    /// Whether the exact modifier `code` is currently tracked as held.
    pub fn is_held(&self, code: u32) -> bool {
        self.modifiers_held.contains(code)
    }

    pub fn keyboard(&self) -> &S {
        &self.keyboard
    }

    fn dispatch(&self, code: u32, transition: Transition) -> Result<(), KeyStateError> {
        match (transition, vk::is_modifier(code)) {
            (Transition::Down, true) => {
                if !self.modifiers_held.press(code) {
                    return Ok(());
                }
                self.emit(code)
            }
            (Transition::Up, true) => {
                self.modifiers_held.release(code);
                Ok(())
            }
            (Transition::Down, false) => self.emit(code),
            (Transition::Up, false) => Ok(()),
        }
    }

    fn emit(&self, code: u32) -> Result<(), KeyStateError> {
        let modifiers = self.keyboard.live_modifiers()?;
        let name = translate(code, modifiers, &self.keyboard);
        // The subscriber may already be gone during shutdown.
        let _ = self.events.send(KeyEvent::new(name, modifiers));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keyshow_core::{LayoutError, LayoutResolver, Modifier, Modifiers};
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::sync::mpsc::{self, UnboundedReceiver};

    #[derive(Default)]
    struct StubKeyboard {
        modifiers: Modifiers,
        fail_query: AtomicBool,
        panic_in_layout: AtomicBool,
    }

    impl LayoutResolver for StubKeyboard {
        fn resolve(&self, code: u32, _: Modifiers) -> Result<Option<String>, LayoutError> {
            if self.panic_in_layout.load(Ordering::SeqCst) {
                panic!("layout table corrupted");
            }
            Ok((code == vk::VK_OEM_1).then(|| "ö".to_string()))
        }
    }

    impl KeyboardState for StubKeyboard {
        fn live_modifiers(&self) -> Result<Modifiers, KeyStateError> {
            if self.fail_query.load(Ordering::SeqCst) {
                return Err(KeyStateError("GetAsyncKeyState unavailable".to_string()));
            }
            Ok(self.modifiers)
        }
    }

    fn processor(keyboard: StubKeyboard) -> (TransitionProcessor<StubKeyboard>, UnboundedReceiver<KeyEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (TransitionProcessor::new(keyboard, tx), rx)
    }

    fn drain(rx: &mut UnboundedReceiver<KeyEvent>) -> Vec<String> {
        std::iter::from_fn(|| rx.try_recv().ok()).map(|e| e.display_text()).collect()
    }

    #[test]
    fn test_ordinary_key_down_emits_with_live_modifiers() {
        let keyboard = StubKeyboard {
            modifiers: Modifiers::NONE.with(Modifier::Control),
            ..Default::default()
        };
        let (processor, mut rx) = processor(keyboard);

        let _ = processor.process(0x43, Transition::Down);

        assert_eq!(drain(&mut rx), vec!["CTRL + C"]);
    }

    #[test]
    fn test_ordinary_key_up_emits_nothing() {
        let (processor, mut rx) = processor(StubKeyboard::default());
        let _ = processor.process(0x43, Transition::Up);
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn test_modifier_auto_repeat_is_suppressed() {
        // Arrange
        let (processor, mut rx) = processor(StubKeyboard::default());

        // Act: OS auto-repeat sends repeated downs while Shift is held
        for _ in 0..5 {
            let _ = processor.process(vk::VK_LSHIFT, Transition::Down);
        }

        // Assert
        assert_eq!(drain(&mut rx), vec!["SHIFT"]);
        assert!(processor.is_held(vk::VK_LSHIFT));
    }

    #[test]
    fn test_modifier_down_up_down_emits_twice() {
        let (processor, mut rx) = processor(StubKeyboard::default());

        let _ = processor.process(vk::VK_LCONTROL, Transition::Down);
        let _ = processor.process(vk::VK_LCONTROL, Transition::Up);
        let _ = processor.process(vk::VK_LCONTROL, Transition::Down);

        assert_eq!(drain(&mut rx), vec!["CTRL", "CTRL"]);
    }

    #[test]
    fn test_modifier_up_never_emits_and_releases() {
        let (processor, mut rx) = processor(StubKeyboard::default());
        let _ = processor.process(vk::VK_RMENU, Transition::Down);
        drain(&mut rx);

        let _ = processor.process(vk::VK_RMENU, Transition::Up);

        assert!(drain(&mut rx).is_empty());
        assert!(!processor.is_held(vk::VK_RMENU));
    }

    #[test]
    fn test_left_and_right_variants_are_tracked_independently() {
        let (processor, mut rx) = processor(StubKeyboard::default());

        let _ = processor.process(vk::VK_LSHIFT, Transition::Down);
        let _ = processor.process(vk::VK_RSHIFT, Transition::Down);
        let _ = processor.process(vk::VK_LSHIFT, Transition::Up);

        assert_eq!(drain(&mut rx), vec!["SHIFT", "SHIFT"]);
        assert!(processor.is_held(vk::VK_RSHIFT));
        assert!(!processor.is_held(vk::VK_LSHIFT));
    }

    #[test]
    fn test_layout_resolved_name_is_emitted() {
        let (processor, mut rx) = processor(StubKeyboard::default());
        let _ = processor.process(vk::VK_OEM_1, Transition::Down);
        assert_eq!(drain(&mut rx), vec!["Ö"]);
    }

    #[test]
    fn test_modifier_query_failure_emits_nothing() {
        let keyboard = StubKeyboard::default();
        keyboard.fail_query.store(true, Ordering::SeqCst);
        let (processor, mut rx) = processor(keyboard);

        let disposition = processor.process(0x41, Transition::Down);

        assert_eq!(disposition, HookDisposition::PassThrough);
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn test_panic_during_translation_is_contained() {
        let keyboard = StubKeyboard::default();
        keyboard.panic_in_layout.store(true, Ordering::SeqCst);
        let (processor, mut rx) = processor(keyboard);

        let disposition = processor.process(vk::VK_OEM_1, Transition::Down);

        assert_eq!(disposition, HookDisposition::PassThrough);
        assert!(drain(&mut rx).is_empty());

        // The processor keeps working once the fault clears.
        processor.keyboard().panic_in_layout.store(false, Ordering::SeqCst);
        let _ = processor.process(0x41, Transition::Down);
        assert_eq!(drain(&mut rx), vec!["A"]);
    }

    #[test]
    fn test_closed_subscriber_does_not_fail_processing() {
        let (processor, rx) = processor(StubKeyboard::default());
        drop(rx);
        assert_eq!(processor.process(0x41, Transition::Down), HookDisposition::PassThrough);
    }
}
