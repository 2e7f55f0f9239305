//! # keyshow-core
//!
//! Shared library for KeyShow containing the key event model, the
//! layout-aware key name translator, and the display debounce state machine.
//!
//! This crate has zero dependencies on OS APIs, UI frameworks, or an async
//! runtime. Everything OS-specific (the keyboard hook, the live keyboard
//! layout, the overlay window) is reached through small traits that the
//! application crate implements.
//!
//! # Architecture overview
//!
//! KeyShow displays the most recently pressed key combination (for example
//! `CTRL + SHIFT + S`) on an always-visible overlay for a configurable
//! duration, even while another application has focus.
//!
//! - **`event`** – The [`KeyEvent`] emitted for every displayed key press,
//!   the [`Modifiers`] flag set, and the overlay text rendering.
//!
//! - **`keymap`** – Translation from a virtual key code to a stable,
//!   human-readable name. Layout-dependent keys are resolved through a
//!   [`LayoutResolver`]; everything else falls back to a static table and
//!   finally to a `VK_<code>` marker, so translation never fails.
//!
//! - **`display`** – The generation-based debounce state that decides when
//!   the overlay may be cleared.

pub mod display;
pub mod event;
pub mod keymap;

pub use display::{DebounceState, DisplayPhase, DisplaySession, Generation};
pub use event::{KeyEvent, Modifier, Modifiers, Transition};
pub use keymap::{translate, LayoutError, LayoutResolver, NoLayout};
