//! Simulated keyboard listener for tests and hook-less hosts.
//!
//! Allows callers to inject synthetic key transitions without a Win32
//! message loop. Injected transitions run through the same
//! [`TransitionProcessor`] the Windows hook uses, against a
//! [`ScriptedKeyboard`] that tracks physical key state and an optional
//! per-key layout table.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use keyshow_core::keymap::vk;
use keyshow_core::{LayoutError, LayoutResolver, Modifiers, Transition};
use tokio::sync::mpsc;
use tracing::debug;

use super::processor::TransitionProcessor;
use super::{HookDisposition, KeyEventReceiver, KeyStateError, KeyboardListener, KeyboardState, ListenerError};

#[derive(Debug, Default)]
struct ScriptedState {
    pressed: HashSet<u32>,
    layout: HashMap<u32, String>,
    fail_queries: bool,
}

/// Scriptable keyboard state shared between a test and the processor.
///
/// Like the real low-level hook, the physical state is updated *after* the
/// transition has been processed, so a modifier's own down event does not yet
/// see that modifier in the live mask.
#[derive(Debug, Clone, Default)]
pub struct ScriptedKeyboard {
    state: Arc<Mutex<ScriptedState>>,
}

impl ScriptedKeyboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the layout produce `text` for `code`, whatever the modifiers.
    pub fn map_key(&self, code: u32, text: impl Into<String>) {
        self.lock().layout.insert(code, text.into());
    }

    /// Makes every live state query fail until called again with `false`.
    pub fn fail_queries(&self, fail: bool) {
        self.lock().fail_queries = fail;
    }

    pub fn is_pressed(&self, code: u32) -> bool {
        self.lock().pressed.contains(&code)
    }

    /// Changes the physical state of `code` without a hook callback, as for a
    /// key already held before the hook was installed.
    pub fn set_pressed(&self, code: u32, pressed: bool) {
        let transition = if pressed { Transition::Down } else { Transition::Up };
        self.apply(code, transition);
    }

    fn apply(&self, code: u32, transition: Transition) {
        let mut state = self.lock();
        match transition {
            Transition::Down => state.pressed.insert(code),
            Transition::Up => state.pressed.remove(&code),
        };
    }

    fn lock(&self) -> MutexGuard<'_, ScriptedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl LayoutResolver for ScriptedKeyboard {
    fn resolve(&self, code: u32, _modifiers: Modifiers) -> Result<Option<String>, LayoutError> {
        let state = self.lock();
        if state.fail_queries {
            return Err(LayoutError("scripted layout failure".to_string()));
        }
        Ok(state.layout.get(&code).cloned())
    }
}

impl KeyboardState for ScriptedKeyboard {
    fn live_modifiers(&self) -> Result<Modifiers, KeyStateError> {
        let state = self.lock();
        if state.fail_queries {
            return Err(KeyStateError("scripted key state failure".to_string()));
        }
        Ok(Modifiers::from_slice(
            &state
                .pressed
                .iter()
                .filter_map(|&code| vk::modifier_for(code))
                .collect::<Vec<_>>(),
        ))
    }
}

/// A [`KeyboardListener`] driven by [`inject`](Self::inject) instead of an OS hook.
pub struct SimulatedKeyboardListener {
    keyboard: ScriptedKeyboard,
    processor: Mutex<Option<Arc<TransitionProcessor<ScriptedKeyboard>>>>,
    fail_next_install: AtomicBool,
    install_count: AtomicUsize,
    removal_count: AtomicUsize,
}

impl SimulatedKeyboardListener {
    pub fn new() -> Self {
        Self::with_keyboard(ScriptedKeyboard::new())
    }

    pub fn with_keyboard(keyboard: ScriptedKeyboard) -> Self {
        Self {
            keyboard,
            processor: Mutex::new(None),
            fail_next_install: AtomicBool::new(false),
            install_count: AtomicUsize::new(0),
            removal_count: AtomicUsize::new(0),
        }
    }

    pub fn keyboard(&self) -> &ScriptedKeyboard {
        &self.keyboard
    }

    /// Makes the next `start()` fail as if the OS refused the hook.
    pub fn fail_next_install(&self) {
        self.fail_next_install.store(true, Ordering::SeqCst);
    }

    /// Delivers a synthetic transition, as the OS would to the hook callback.
    ///
    /// When not started there is no hook to call; the transition only updates
    /// the physical key state.
    pub fn inject(&self, code: u32, transition: Transition) -> HookDisposition {
        let processor = self.lock_processor().clone();
        let disposition = match processor {
            Some(processor) => processor.process(code, transition),
            None => HookDisposition::PassThrough,
        };
        self.keyboard.apply(code, transition);
        disposition
    }

    /// Convenience for a full down/up press of `code`.
    pub fn tap(&self, code: u32) -> [HookDisposition; 2] {
        [
            self.inject(code, Transition::Down),
            self.inject(code, Transition::Up),
        ]
    }

    /// Number of successful hook installs.
    pub fn install_count(&self) -> usize {
        self.install_count.load(Ordering::SeqCst)
    }

    /// Number of times the removal primitive actually ran.
    pub fn removal_count(&self) -> usize {
        self.removal_count.load(Ordering::SeqCst)
    }

    fn lock_processor(&self) -> MutexGuard<'_, Option<Arc<TransitionProcessor<ScriptedKeyboard>>>> {
        self.processor.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SimulatedKeyboardListener {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyboardListener for SimulatedKeyboardListener {
    fn start(&self) -> Result<KeyEventReceiver, ListenerError> {
        let mut slot = self.lock_processor();
        if slot.is_some() {
            return Err(ListenerError::AlreadyStarted);
        }
        if self.fail_next_install.swap(false, Ordering::SeqCst) {
            return Err(ListenerError::HookInstallFailed(
                "simulated hook installation refused".to_string(),
            ));
        }

        let (tx, rx) = mpsc::unbounded_channel();
        *slot = Some(Arc::new(TransitionProcessor::new(self.keyboard.clone(), tx)));
        self.install_count.fetch_add(1, Ordering::SeqCst);
        debug!("simulated keyboard listener started");
        Ok(rx)
    }

    fn stop(&self) {
        if self.lock_processor().take().is_some() {
            self.removal_count.fetch_add(1, Ordering::SeqCst);
            debug!("simulated keyboard listener stopped");
        }
    }

    fn is_running(&self) -> bool {
        self.lock_processor().is_some()
    }
}
