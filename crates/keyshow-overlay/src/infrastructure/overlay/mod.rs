//! Overlay sinks.
//!
//! Window chrome, positioning and painting belong to the host window. The
//! headless binary renders through [`console::ConsoleOverlay`], which keeps
//! the current key combination on a single terminal line.

pub mod console;
