//! Application layer for KeyShow.
//!
//! - [`display_coordinator`] – the show/hide debounce engine.
//! - [`overlay_context`] – the serialized context that owns the overlay sink.
//!
//! **Dependency rule**: this layer depends only on `keyshow_core` and on the
//! traits it defines itself ([`overlay_context::OverlaySink`],
//! [`display_coordinator::DisplayDurationSource`]). Concrete OS adapters live
//! in `infrastructure`.

pub mod display_coordinator;
pub mod overlay_context;
