//! Platform-independent key identifiers.
//!
//! Two id spaces live here:
//!
//! - [`KeyId`] names *what a key press produces*: a printable character, a
//!   named action key (arrows, function keys, modifiers), or a dead-key
//!   placeholder.  This is the representation handed to the network layer.
//! - [`ButtonId`] names *which physical key was pressed*, independent of the
//!   character it produces under the current layout.
//!
//! # Why two id spaces? (for beginners)
//!
//! The same physical key produces different characters on different keyboard
//! layouts, and the same character can live on different physical keys.  The
//! input-sharing system needs both views: characters to replay text
//! faithfully on the remote machine, buttons to replay *key positions* for
//! games and shortcuts.  Keeping them as separate newtypes means the
//! compiler rejects code that mixes them up.
//!
//! `KeyId` values for printable characters are Unicode scalar values.  Named
//! non-printable keys occupy the private plane `0xEF00..=0xEFFF` (the same
//! values the wider system transmits on the wire).  `KeyId::NONE` (0) means
//! "produces nothing".

use serde::{Deserialize, Serialize};

/// Ordered sequence of [`KeyId`]s produced by one physical key press.
///
/// Normally length 1; length 2 when a dead-key sequence fails to combine
/// (the dead key's base character followed by the new key's character).
pub type KeySequence = Vec<KeyId>;

// ── KeyId ─────────────────────────────────────────────────────────────────────

/// Abstract identifier for a produced character, glyph, or named key action.
///
/// Printable characters map 1:1 to their Unicode scalar value.  Named keys
/// use the `0xEF00` plane constants below.  A dead key is represented as the
/// combining character's id with [`KeyId::DEAD_BIT`] set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct KeyId(pub u32);

impl KeyId {
    /// Sentinel meaning "this press produces nothing".
    pub const NONE: KeyId = KeyId(0);

    /// Flag bit marking a dead-key placeholder (pending combination).
    pub const DEAD_BIT: u32 = 0x0100_0000;

    // Editing and whitespace.
    pub const BACKSPACE: KeyId = KeyId(0xEF08);
    pub const TAB: KeyId = KeyId(0xEF09);
    pub const RETURN: KeyId = KeyId(0xEF0D);
    pub const ESCAPE: KeyId = KeyId(0xEF1B);
    pub const DELETE: KeyId = KeyId(0xEFFF);

    // Navigation.
    pub const HOME: KeyId = KeyId(0xEF50);
    pub const LEFT: KeyId = KeyId(0xEF51);
    pub const UP: KeyId = KeyId(0xEF52);
    pub const RIGHT: KeyId = KeyId(0xEF53);
    pub const DOWN: KeyId = KeyId(0xEF54);
    pub const PAGE_UP: KeyId = KeyId(0xEF55);
    pub const PAGE_DOWN: KeyId = KeyId(0xEF56);
    pub const END: KeyId = KeyId(0xEF57);
    pub const INSERT: KeyId = KeyId(0xEF63);
    pub const HELP: KeyId = KeyId(0xEF6A);

    // Locks.
    pub const NUM_LOCK: KeyId = KeyId(0xEF7F);
    pub const CAPS_LOCK: KeyId = KeyId(0xEFE5);

    // Keypad.  Operators and digits are contiguous so the glyph predicate
    // can test a single range.
    pub const KP_ENTER: KeyId = KeyId(0xEF8D);
    pub const KP_MULTIPLY: KeyId = KeyId(0xEFAA);
    pub const KP_ADD: KeyId = KeyId(0xEFAB);
    pub const KP_SUBTRACT: KeyId = KeyId(0xEFAD);
    pub const KP_DECIMAL: KeyId = KeyId(0xEFAE);
    pub const KP_DIVIDE: KeyId = KeyId(0xEFAF);
    pub const KP_0: KeyId = KeyId(0xEFB0);
    pub const KP_1: KeyId = KeyId(0xEFB1);
    pub const KP_2: KeyId = KeyId(0xEFB2);
    pub const KP_3: KeyId = KeyId(0xEFB3);
    pub const KP_4: KeyId = KeyId(0xEFB4);
    pub const KP_5: KeyId = KeyId(0xEFB5);
    pub const KP_6: KeyId = KeyId(0xEFB6);
    pub const KP_7: KeyId = KeyId(0xEFB7);
    pub const KP_8: KeyId = KeyId(0xEFB8);
    pub const KP_9: KeyId = KeyId(0xEFB9);
    pub const KP_EQUAL: KeyId = KeyId(0xEFBD);

    // Function keys, F1 at 0xEFBE.
    pub const F1: KeyId = KeyId(0xEFBE);
    pub const F2: KeyId = KeyId(0xEFBF);
    pub const F3: KeyId = KeyId(0xEFC0);
    pub const F4: KeyId = KeyId(0xEFC1);
    pub const F5: KeyId = KeyId(0xEFC2);
    pub const F6: KeyId = KeyId(0xEFC3);
    pub const F7: KeyId = KeyId(0xEFC4);
    pub const F8: KeyId = KeyId(0xEFC5);
    pub const F9: KeyId = KeyId(0xEFC6);
    pub const F10: KeyId = KeyId(0xEFC7);
    pub const F11: KeyId = KeyId(0xEFC8);
    pub const F12: KeyId = KeyId(0xEFC9);
    pub const F13: KeyId = KeyId(0xEFCA);
    pub const F14: KeyId = KeyId(0xEFCB);
    pub const F15: KeyId = KeyId(0xEFCC);
    pub const F16: KeyId = KeyId(0xEFCD);

    // Modifiers, left/right variants.
    pub const SHIFT_L: KeyId = KeyId(0xEFE1);
    pub const SHIFT_R: KeyId = KeyId(0xEFE2);
    pub const CONTROL_L: KeyId = KeyId(0xEFE3);
    pub const CONTROL_R: KeyId = KeyId(0xEFE4);
    pub const META_L: KeyId = KeyId(0xEFE7);
    pub const META_R: KeyId = KeyId(0xEFE8);
    pub const ALT_L: KeyId = KeyId(0xEFE9);
    pub const ALT_R: KeyId = KeyId(0xEFEA);
    pub const SUPER_L: KeyId = KeyId(0xEFEB);
    pub const SUPER_R: KeyId = KeyId(0xEFEC);

    /// Converts a character code read from a layout table into a `KeyId`.
    ///
    /// Codes below 0x100 pass through the legacy control-code promotion the
    /// layout tables use (e.g. 0x03 is the keypad Enter, 0x08 Backspace);
    /// unrecognised control codes map to [`KeyId::NONE`].  Codes at or above
    /// 0x100 are Unicode scalar values and map 1:1.
    pub fn from_keyboard_char(c: u32) -> KeyId {
        if c >= 0x100 {
            return KeyId(c);
        }
        match c {
            0x03 => KeyId::KP_ENTER,
            0x08 => KeyId::BACKSPACE,
            0x09 => KeyId::TAB,
            0x0D => KeyId::RETURN,
            0x1B => KeyId::ESCAPE,
            0x7F => KeyId::DELETE,
            c if c < 0x20 => KeyId::NONE,
            c => KeyId(c),
        }
    }

    /// Marks this id as a dead-key placeholder.
    pub fn dead(self) -> KeyId {
        KeyId(self.0 | Self::DEAD_BIT)
    }

    /// True if this id is a dead-key placeholder.
    pub fn is_dead(self) -> bool {
        self.0 & Self::DEAD_BIT != 0
    }

    /// The underlying character id with the dead-key flag stripped.
    pub fn base(self) -> KeyId {
        KeyId(self.0 & !Self::DEAD_BIT)
    }

    /// True if this id produces a visible glyph rather than a pure control
    /// action.
    ///
    /// Everything outside the `0xEF00` named-key plane counts, plus the
    /// keypad operator/digit block inside it (those type characters too).
    /// Private-use scalars below the plane stay glyphs; a layout may emit
    /// them.  Used by the AltGr heuristic: a key only acts as AltGr when it
    /// actually produced a glyph.
    pub fn is_glyph(self) -> bool {
        if self == KeyId::NONE {
            return false;
        }
        let v = self.base().0;
        !(0xEF00..=0xEFFF).contains(&v)
            || (KeyId::KP_MULTIPLY.0..=KeyId::KP_EQUAL.0).contains(&v)
    }
}

// ── ButtonId ──────────────────────────────────────────────────────────────────

/// Offset between native zero-based virtual key codes and [`ButtonId`]s.
///
/// Keeps 0 free as the "no button" sentinel.
pub const KEY_BUTTON_OFFSET: u16 = 1;

/// Internal identifier for a physical key.
///
/// Value 0 is reserved to mean "no button"; every native key code `c` up to
/// `u16::MAX - 1` maps to button `c + 1` and back.  `u16::MAX` has no room
/// above the offset and maps to the sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ButtonId(pub u16);

impl ButtonId {
    /// Sentinel for "no physical key".
    pub const NONE: ButtonId = ButtonId(0);

    /// Maps a native virtual key code to its button id.
    ///
    /// The platform may report arbitrary codes; `u16::MAX` wraps to the
    /// "no button" sentinel instead of overflowing.
    pub fn from_virtual_key(vk: u16) -> ButtonId {
        ButtonId(vk.wrapping_add(KEY_BUTTON_OFFSET))
    }

    /// Recovers the native virtual key code, or `None` for the reserved
    /// zero button.
    pub fn to_virtual_key(self) -> Option<u16> {
        if self == ButtonId::NONE {
            None
        } else {
            Some(self.0 - KEY_BUTTON_OFFSET)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_virtual_key_round_trip_is_exact() {
        // Every valid native code must survive the there-and-back trip.
        for vk in 0u16..=512 {
            let button = ButtonId::from_virtual_key(vk);
            assert_ne!(button, ButtonId::NONE);
            assert_eq!(button.to_virtual_key(), Some(vk));
        }
    }

    #[test]
    fn test_zero_button_has_no_virtual_key() {
        assert_eq!(ButtonId::NONE.to_virtual_key(), None);
    }

    #[test]
    fn test_max_virtual_key_degrades_to_sentinel() {
        // The one code with no room above the offset must not overflow.
        let button = ButtonId::from_virtual_key(u16::MAX);
        assert_eq!(button, ButtonId::NONE);
        assert_eq!(button.to_virtual_key(), None);
        // The code just below it still round-trips.
        assert_eq!(
            ButtonId::from_virtual_key(u16::MAX - 1).to_virtual_key(),
            Some(u16::MAX - 1)
        );
    }

    #[test]
    fn test_legacy_control_codes_promote_to_named_keys() {
        const PROMOTIONS: &[(u32, KeyId)] = &[
            (0x03, KeyId::KP_ENTER),
            (0x08, KeyId::BACKSPACE),
            (0x09, KeyId::TAB),
            (0x0D, KeyId::RETURN),
            (0x1B, KeyId::ESCAPE),
            (0x7F, KeyId::DELETE),
        ];
        for &(code, expected) in PROMOTIONS {
            assert_eq!(KeyId::from_keyboard_char(code), expected);
        }
    }

    #[test]
    fn test_unrecognised_control_codes_map_to_none() {
        for code in [0x00, 0x01, 0x02, 0x04, 0x0A, 0x1F] {
            assert_eq!(KeyId::from_keyboard_char(code), KeyId::NONE);
        }
    }

    #[test]
    fn test_printable_codes_map_directly() {
        assert_eq!(KeyId::from_keyboard_char(b'a' as u32), KeyId(b'a' as u32));
        assert_eq!(KeyId::from_keyboard_char(0xFF), KeyId(0xFF));
        // At and above 0x100 there is no promotion, even for values that
        // would be control codes in the low range.
        assert_eq!(KeyId::from_keyboard_char(0x100), KeyId(0x100));
        assert_eq!(KeyId::from_keyboard_char(0x1F600), KeyId(0x1F600));
    }

    #[test]
    fn test_dead_flag_round_trip() {
        let circumflex = KeyId(0x02C6);
        let dead = circumflex.dead();
        assert!(dead.is_dead());
        assert!(!circumflex.is_dead());
        assert_eq!(dead.base(), circumflex);
    }

    #[test]
    fn test_glyph_predicate() {
        assert!(KeyId(b'e' as u32).is_glyph());
        assert!(KeyId(0x00E9).is_glyph()); // é
        // Private-use scalars below the named-key plane are glyphs.
        assert!(KeyId(0xE000).is_glyph());
        assert!(KeyId(0xEEFF).is_glyph());
        assert!(KeyId::KP_5.is_glyph());
        assert!(KeyId::KP_MULTIPLY.is_glyph());
        assert!(KeyId::KP_EQUAL.is_glyph());
        assert!(!KeyId::NONE.is_glyph());
        assert!(!KeyId::LEFT.is_glyph());
        assert!(!KeyId::F1.is_glyph());
        assert!(!KeyId::SHIFT_L.is_glyph());
        assert!(!KeyId::KP_ENTER.is_glyph());
    }
}
