//! Keyboard capture infrastructure.
//!
//! On Windows, [`windows::WindowsKeyboardListener`] installs a `WH_KEYBOARD_LL`
//! hook on a dedicated Win32 message loop thread. Every transition is handed
//! to a [`processor::TransitionProcessor`], which tracks held modifiers,
//! translates the key, and pushes a [`KeyEvent`] into an unbounded channel
//! consumed by the Tokio runtime.
//!
//! # Windows-Specific Implementation
//!
//! The hook callback must return quickly or Windows removes the hook, and an
//! unwinding panic must never cross the FFI boundary. The processor therefore
//! does O(1) work, never blocks on the consumer, contains every error and
//! panic locally, and always lets the event continue down the hook chain.
//!
//! # Testability
//!
//! The [`KeyboardListener`] trait is the seam between the host and the
//! capture facility. Tests and the demo mode use
//! [`simulated::SimulatedKeyboardListener`], which feeds synthetic
//! transitions through the same processor the Windows hook uses.

use keyshow_core::{KeyEvent, LayoutResolver, Modifiers};
use tokio::sync::mpsc::UnboundedReceiver;

pub mod demo;
pub mod processor;
pub mod simulated;

#[cfg(target_os = "windows")]
pub mod windows;

/// Receiving end of a listener's event channel. There is exactly one subscriber.
pub type KeyEventReceiver = UnboundedReceiver<KeyEvent>;

/// Error type for keyboard listener operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ListenerError {
    #[error("keyboard listener is already started")]
    AlreadyStarted,
    #[error("failed to install keyboard hook: {0}")]
    HookInstallFailed(String),
}

/// Failure while querying live key state inside the capture callback.
///
/// Never leaves the callback: the transition is dropped instead.
#[derive(Debug, thiserror::Error)]
#[error("live keyboard state unavailable: {0}")]
pub struct KeyStateError(pub String);

/// What the capture callback tells the OS to do with the event.
///
/// There is deliberately no variant that swallows the event: other hooks and
/// the focused application must keep receiving every keystroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum HookDisposition {
    /// Forward the event to the next hook in the chain.
    PassThrough,
}

/// Real-time keyboard state as seen from the capture callback.
pub trait KeyboardState: LayoutResolver + Send + Sync {
    /// Logical modifiers physically held right now, read from the platform
    /// rather than from any tracked state.
    fn live_modifiers(&self) -> Result<Modifiers, KeyStateError>;
}

/// A system-wide keyboard capture source.
///
/// The production implementation uses the Windows low-level hook; tests and
/// hosts without a hook facility use the simulated and demo listeners.
pub trait KeyboardListener: Send + Sync {
    /// Installs the capture and returns the receiver for emitted key events.
    ///
    /// # Errors
    ///
    /// [`ListenerError::AlreadyStarted`] if called while started;
    /// [`ListenerError::HookInstallFailed`] if the OS refuses the hook, in
    /// which case the listener stays stopped.
    fn start(&self) -> Result<KeyEventReceiver, ListenerError>;

    /// Removes the capture. A no-op when not started.
    ///
    /// Once this returns, no event is emitted for later transitions and the
    /// event channel closes.
    fn stop(&self);

    fn is_running(&self) -> bool;
}
