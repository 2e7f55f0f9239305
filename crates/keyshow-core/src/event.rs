//! Key event model shared by the keyboard listener and the display coordinator.

use std::fmt;
use std::time::Instant;

/// Separator placed between modifier names and the key name on the overlay.
pub const DISPLAY_SEPARATOR: &str = " + ";

/// Direction of a physical key transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Down,
    Up,
}

/// A logical modifier key. Left and right physical variants collapse to one value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modifier {
    Control,
    Alt,
    Shift,
}

impl Modifier {
    /// Canonical display order on the overlay.
    pub const ALL: [Modifier; 3] = [Modifier::Control, Modifier::Alt, Modifier::Shift];

    /// Upper-case name shown on the overlay.
    pub fn display_name(self) -> &'static str {
        match self {
            Modifier::Control => "CTRL",
            Modifier::Alt => "ALT",
            Modifier::Shift => "SHIFT",
        }
    }

    fn bit(self) -> u8 {
        match self {
            Modifier::Control => Modifiers::CONTROL,
            Modifier::Alt => Modifiers::ALT,
            Modifier::Shift => Modifiers::SHIFT,
        }
    }
}

/// Set of logical modifiers held while a key was pressed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Modifiers(pub u8);

impl Modifiers {
    pub const CONTROL: u8 = 1 << 0;
    pub const ALT: u8 = 1 << 1;
    pub const SHIFT: u8 = 1 << 2;

    /// The empty set.
    pub const NONE: Modifiers = Modifiers(0);

    /// Builds a set from individual modifiers.
    pub fn from_slice(modifiers: &[Modifier]) -> Self {
        modifiers.iter().fold(Self::NONE, |acc, m| acc.with(*m))
    }

    /// Returns a copy of `self` with `modifier` added.
    #[must_use]
    pub fn with(self, modifier: Modifier) -> Self {
        Modifiers(self.0 | modifier.bit())
    }

    pub fn contains(&self, modifier: Modifier) -> bool {
        self.0 & modifier.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if either Ctrl key is held.
    pub fn ctrl(&self) -> bool {
        self.contains(Modifier::Control)
    }

    /// Returns `true` if either Alt key is held.
    pub fn alt(&self) -> bool {
        self.contains(Modifier::Alt)
    }

    /// Returns `true` if either Shift key is held.
    pub fn shift(&self) -> bool {
        self.contains(Modifier::Shift)
    }

    /// Iterates the held modifiers in canonical display order (CTRL, ALT, SHIFT).
    pub fn iter(&self) -> impl Iterator<Item = Modifier> + '_ {
        Modifier::ALL.into_iter().filter(move |m| self.contains(*m))
    }
}

/// A key press ready for display.
///
/// Immutable once constructed: produced by the keyboard listener and consumed
/// once by the display coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    name: String,
    modifiers: Modifiers,
    observed_at: Instant,
}

impl KeyEvent {
    /// Creates an event observed now.
    ///
    /// An empty `name` is replaced by `"?"` so the non-empty invariant holds
    /// even for a misbehaving producer.
    pub fn new(name: impl Into<String>, modifiers: Modifiers) -> Self {
        Self::observed(name, modifiers, Instant::now())
    }

    /// Creates an event with an explicit observation instant.
    pub fn observed(name: impl Into<String>, modifiers: Modifiers, observed_at: Instant) -> Self {
        let mut name = name.into();
        if name.is_empty() {
            name.push('?');
        }
        Self {
            name,
            modifiers,
            observed_at,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    pub fn observed_at(&self) -> Instant {
        self.observed_at
    }

    /// Renders the overlay text: modifier names in canonical order followed
    /// by the key name, all joined with `" + "`.
    ///
    /// A modifier key pressed while other modifiers are held is rendered the
    /// same way, so Ctrl pressed while Shift is held shows `"SHIFT + CTRL"`.
    pub fn display_text(&self) -> String {
        let mut parts: Vec<&str> = self.modifiers.iter().map(Modifier::display_name).collect();
        parts.push(&self.name);
        parts.join(DISPLAY_SEPARATOR)
    }
}

impl fmt::Display for KeyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_text())
    }
}
