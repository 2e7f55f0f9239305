//! Infrastructure layer for KeyShow.
//!
//! Contains OS-facing adapters: the keyboard capture hook, the overlay sinks,
//! and file-system storage for settings.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `keyshow_core`, but MUST NOT be imported by the `application` layer.

pub mod keyboard_capture;
pub mod overlay;
pub mod storage;
