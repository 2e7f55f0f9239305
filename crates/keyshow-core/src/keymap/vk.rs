//! Virtual key code constants and the static key name table.
//!
//! Reference: Windows Virtual-Key Codes (winuser.h). The low-level keyboard
//! hook reports codes in the range 0x00–0xFF, but callers may hand the
//! translator any `u32`; codes outside the table simply have no static name.
//!
//! # How the table works
//!
//! `STATIC_NAMES` is a compile-time constant array of 256 optional names,
//! indexed by VK code. Position 0x1B holds `"ESC"` because `VK_ESCAPE` is
//! 0x1B. Letters, top-row digits, numpad digits, and function keys are
//! ranges and are handled by [`static_name`] rather than spelled out here.

use std::borrow::Cow;

use crate::event::Modifier;

pub const VK_BACK: u32 = 0x08;
pub const VK_TAB: u32 = 0x09;
pub const VK_RETURN: u32 = 0x0D;
pub const VK_SHIFT: u32 = 0x10;
pub const VK_CONTROL: u32 = 0x11;
pub const VK_MENU: u32 = 0x12;
pub const VK_CAPITAL: u32 = 0x14;
pub const VK_ESCAPE: u32 = 0x1B;
pub const VK_SPACE: u32 = 0x20;
pub const VK_LEFT: u32 = 0x25;
pub const VK_DELETE: u32 = 0x2E;
pub const VK_0: u32 = 0x30;
pub const VK_9: u32 = 0x39;
pub const VK_A: u32 = 0x41;
pub const VK_Z: u32 = 0x5A;
pub const VK_NUMPAD0: u32 = 0x60;
pub const VK_NUMPAD9: u32 = 0x69;
pub const VK_F1: u32 = 0x70;
pub const VK_F12: u32 = 0x7B;
pub const VK_F24: u32 = 0x87;
pub const VK_LSHIFT: u32 = 0xA0;
pub const VK_RSHIFT: u32 = 0xA1;
pub const VK_LCONTROL: u32 = 0xA2;
pub const VK_RCONTROL: u32 = 0xA3;
pub const VK_LMENU: u32 = 0xA4;
pub const VK_RMENU: u32 = 0xA5;
pub const VK_OEM_1: u32 = 0xBA;
pub const VK_OEM_PLUS: u32 = 0xBB;

/// Returns the logical modifier for a Shift/Ctrl/Alt code (either side), if any.
pub fn modifier_for(code: u32) -> Option<Modifier> {
    match code {
        VK_SHIFT | VK_LSHIFT | VK_RSHIFT => Some(Modifier::Shift),
        VK_CONTROL | VK_LCONTROL | VK_RCONTROL => Some(Modifier::Control),
        VK_MENU | VK_LMENU | VK_RMENU => Some(Modifier::Alt),
        _ => None,
    }
}

/// Returns `true` for any Shift, Ctrl, or Alt code, generic or sided.
pub fn is_modifier(code: u32) -> bool {
    modifier_for(code).is_some()
}

/// Looks up the static display name for `code`: numpad digits, function
/// keys, and the named keys in `STATIC_NAMES`.
///
/// Letters, top-row digits and Shift/Ctrl/Alt are not included; the
/// translator handles them before layout resolution.
pub fn static_name(code: u32) -> Option<Cow<'static, str>> {
    match code {
        VK_NUMPAD0..=VK_NUMPAD9 => Some(Cow::Owned(format!("NUM{}", code - VK_NUMPAD0))),
        VK_F1..=VK_F24 => Some(Cow::Owned(format!("F{}", code - VK_F1 + 1))),
        _ => STATIC_NAMES
            .get(code as usize)
            .copied()
            .flatten()
            .map(Cow::Borrowed),
    }
}

/// Named-key table indexed by VK code (0x00–0xFF).
const STATIC_NAMES: [Option<&str>; 256] = {
    let mut t: [Option<&str>; 256] = [None; 256];

    // ── Editing keys ──────────────────────────────────────────────────────────
    t[0x08] = Some("BACK");         // VK_BACK
    t[0x09] = Some("TAB");          // VK_TAB
    t[0x0D] = Some("ENTER");        // VK_RETURN
    t[0x1B] = Some("ESC");          // VK_ESCAPE
    t[0x20] = Some("SPACE");        // VK_SPACE

    // ── Lock and meta keys ────────────────────────────────────────────────────
    t[0x14] = Some("CAPS");         // VK_CAPITAL
    t[0x90] = Some("NUMLOCK");
    t[0x91] = Some("SCROLLLOCK");
    t[0x5B] = Some("LWIN");
    t[0x5C] = Some("RWIN");
    t[0x5D] = Some("APPS");
    t[0x2C] = Some("PRINTSCREEN");  // VK_SNAPSHOT

    // ── Navigation ────────────────────────────────────────────────────────────
    t[0x21] = Some("PGUP");         // VK_PRIOR
    t[0x22] = Some("PGDN");         // VK_NEXT
    t[0x23] = Some("END");
    t[0x24] = Some("HOME");
    t[0x25] = Some("LEFT");
    t[0x26] = Some("UP");
    t[0x27] = Some("RIGHT");
    t[0x28] = Some("DOWN");
    t[0x2D] = Some("INS");
    t[0x2E] = Some("DEL");

    // ── OEM punctuation (US layout glyphs) ────────────────────────────────────
    t[0xBA] = Some(";");            // VK_OEM_1
    t[0xBB] = Some("=");            // VK_OEM_PLUS
    t[0xBC] = Some(",");            // VK_OEM_COMMA
    t[0xBD] = Some("-");            // VK_OEM_MINUS
    t[0xBE] = Some(".");            // VK_OEM_PERIOD
    t[0xBF] = Some("/");            // VK_OEM_2
    t[0xC0] = Some("`");            // VK_OEM_3
    t[0xDB] = Some("[");            // VK_OEM_4
    t[0xDC] = Some("\\");           // VK_OEM_5
    t[0xDD] = Some("]");            // VK_OEM_6
    t[0xDE] = Some("'");            // VK_OEM_7

    t
};

#[cfg(test)]
mod tests {
    use super::*;

    const NAMED: &[(u32, &str)] = &[
        (0x08, "BACK"), (0x09, "TAB"), (0x0D, "ENTER"), (0x1B, "ESC"), (0x20, "SPACE"),
        (0x14, "CAPS"), (0x90, "NUMLOCK"), (0x91, "SCROLLLOCK"),
        (0x5B, "LWIN"), (0x5C, "RWIN"), (0x5D, "APPS"),
        (0x21, "PGUP"), (0x22, "PGDN"), (0x23, "END"), (0x24, "HOME"),
        (0x25, "LEFT"), (0x26, "UP"), (0x27, "RIGHT"), (0x28, "DOWN"),
        (0x2D, "INS"), (0x2E, "DEL"),
        (0xBA, ";"), (0xBB, "="), (0xBC, ","), (0xBD, "-"), (0xBE, "."), (0xBF, "/"),
        (0xC0, "`"), (0xDB, "["), (0xDC, "\\"), (0xDD, "]"), (0xDE, "'"),
    ];

    #[test]
    fn test_named_keys_resolve_from_static_table() {
        for &(code, expected) in NAMED {
            assert_eq!(
                static_name(code).as_deref(),
                Some(expected),
                "static_name(0x{code:02X}) should be {expected:?}"
            );
        }
    }

    #[test]
    fn test_numpad_digits_are_prefixed_with_num() {
        for n in 0..=9u32 {
            assert_eq!(static_name(VK_NUMPAD0 + n).as_deref(), Some(format!("NUM{n}").as_str()));
        }
    }

    #[test]
    fn test_function_keys_cover_f1_through_f24() {
        assert_eq!(static_name(VK_F1).as_deref(), Some("F1"));
        assert_eq!(static_name(VK_F12).as_deref(), Some("F12"));
        assert_eq!(static_name(VK_F24).as_deref(), Some("F24"));
        assert_eq!(static_name(VK_F24 + 1), None);
    }

    #[test]
    fn test_codes_outside_the_table_have_no_static_name() {
        assert_eq!(static_name(0x07), None);
        assert_eq!(static_name(256), None);
        assert_eq!(static_name(u32::MAX), None);
    }

    #[test]
    fn test_modifier_codes_have_no_static_name() {
        for code in [VK_SHIFT, VK_LSHIFT, VK_RSHIFT, VK_CONTROL, VK_LCONTROL, VK_RCONTROL, VK_MENU, VK_LMENU, VK_RMENU] {
            assert_eq!(static_name(code), None, "0x{code:02X}");
        }
    }

    #[test]
    fn test_sided_modifiers_collapse_to_one_logical_modifier() {
        for code in [VK_SHIFT, VK_LSHIFT, VK_RSHIFT] {
            assert_eq!(modifier_for(code), Some(Modifier::Shift));
        }
        for code in [VK_CONTROL, VK_LCONTROL, VK_RCONTROL] {
            assert_eq!(modifier_for(code), Some(Modifier::Control));
        }
        for code in [VK_MENU, VK_LMENU, VK_RMENU] {
            assert_eq!(modifier_for(code), Some(Modifier::Alt));
        }
        assert!(!is_modifier(VK_A));
        assert!(!is_modifier(0x5B), "Windows key is not a tracked modifier");
    }
}
