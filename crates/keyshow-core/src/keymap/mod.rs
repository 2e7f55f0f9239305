//! Key code translation: virtual key code to a stable, human-readable name.
//!
//! [`translate`] is total and deterministic. Resolution order, first match wins:
//!
//! 1. Letters `A`–`Z` render as the upper-case letter regardless of modifiers,
//!    so `Ctrl+A` and `A` both produce `"A"` (the modifiers are rendered
//!    separately by the caller).
//! 2. Top-row digits render as the bare digit regardless of modifiers.
//! 3. Shift/Ctrl/Alt codes render as `SHIFT`/`CTRL`/`ALT`, either side.
//! 4. Layout-aware resolution through a [`LayoutResolver`]. Results containing
//!    control characters, or consisting only of whitespace, are discarded.
//! 5. The static table in [`vk`] (numpad, function, navigation, editing,
//!    lock/meta and OEM punctuation keys).
//! 6. `VK_<code>` for everything else.

pub mod vk;

use thiserror::Error;
use tracing::trace;

use crate::event::Modifiers;

/// Error reported by a [`LayoutResolver`] when the platform layout query fails.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("keyboard layout query failed: {0}")]
pub struct LayoutError(pub String);

/// Resolves a physical key to the text a normal keystroke would produce under
/// the active keyboard layout.
///
/// The Windows implementation wraps `ToUnicodeEx`; tests use a mock.
#[cfg_attr(test, mockall::automock)]
pub trait LayoutResolver {
    /// Returns the produced text, `Ok(None)` if the key produces no text
    /// (or is a dead key), or an error if the layout could not be queried.
    fn resolve(&self, code: u32, modifiers: Modifiers) -> Result<Option<String>, LayoutError>;
}

/// A resolver for hosts without a keyboard layout facility. Never produces text.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLayout;

impl LayoutResolver for NoLayout {
    fn resolve(&self, _code: u32, _modifiers: Modifiers) -> Result<Option<String>, LayoutError> {
        Ok(None)
    }
}

/// Translates a virtual key code to its display name. Never fails and never
/// returns an empty string.
pub fn translate(code: u32, modifiers: Modifiers, layout: &dyn LayoutResolver) -> String {
    if (vk::VK_A..=vk::VK_Z).contains(&code) || (vk::VK_0..=vk::VK_9).contains(&code) {
        // Both ranges coincide with their ASCII characters.
        return char::from(code as u8).to_string();
    }

    if let Some(modifier) = vk::modifier_for(code) {
        return modifier.display_name().to_string();
    }

    if let Some(text) = resolve_printable(code, modifiers, layout) {
        return text;
    }

    match vk::static_name(code) {
        Some(name) => name.into_owned(),
        None => format!("VK_{code}"),
    }
}

fn resolve_printable(code: u32, modifiers: Modifiers, layout: &dyn LayoutResolver) -> Option<String> {
    let text = match layout.resolve(code, modifiers) {
        Ok(Some(text)) => text,
        Ok(None) => return None,
        Err(e) => {
            trace!("layout resolution for VK {code} fell back: {e}");
            return None;
        }
    };

    if text.trim().is_empty() || text.chars().any(char::is_control) {
        return None;
    }
    Some(text.to_uppercase())
}
