//! Hardcoded key-map entries for keys the layout resource does not describe.
//!
//! Layout resources cover the typing area, where output depends on the
//! active layout and modifier set.  Navigation keys, function keys, the
//! keypad and the modifier keys themselves are absent from the resource
//! tables, so the builder injects these fixed entries into every group.
//! Virtual key values are Carbon `kVK_*` codes (HIToolbox Events.h).

use std::collections::HashMap;

use crate::keys::{ButtonId, KeyId};

/// Fixed (id, virtual key) pairs injected into every group's map.
///
/// Several ids share a virtual key: left/right modifier variants report the
/// same hardware code, and insert doubles as help.  The button → id
/// direction keeps the first entry listed; the id → virtual-key direction
/// resolves each id independently.
pub(crate) const SPECIAL_KEYS: &[(KeyId, u16)] = &[
    // ── Navigation ───────────────────────────────────────────────────────
    (KeyId::UP, 0x7E),        // kVK_UpArrow
    (KeyId::DOWN, 0x7D),      // kVK_DownArrow
    (KeyId::LEFT, 0x7B),      // kVK_LeftArrow
    (KeyId::RIGHT, 0x7C),     // kVK_RightArrow
    (KeyId::HOME, 0x73),      // kVK_Home
    (KeyId::END, 0x77),       // kVK_End
    (KeyId::PAGE_UP, 0x74),   // kVK_PageUp
    (KeyId::PAGE_DOWN, 0x79), // kVK_PageDown
    (KeyId::INSERT, 0x72),    // kVK_Help (insert on PC keyboards)
    (KeyId::HELP, 0x72),      // kVK_Help
    (KeyId::DELETE, 0x75),    // kVK_ForwardDelete
    // ── Function keys ────────────────────────────────────────────────────
    (KeyId::F1, 0x7A),  // kVK_F1
    (KeyId::F2, 0x78),  // kVK_F2
    (KeyId::F3, 0x63),  // kVK_F3
    (KeyId::F4, 0x76),  // kVK_F4
    (KeyId::F5, 0x60),  // kVK_F5
    (KeyId::F6, 0x61),  // kVK_F6
    (KeyId::F7, 0x62),  // kVK_F7
    (KeyId::F8, 0x64),  // kVK_F8
    (KeyId::F9, 0x65),  // kVK_F9
    (KeyId::F10, 0x6D), // kVK_F10
    (KeyId::F11, 0x67), // kVK_F11
    (KeyId::F12, 0x6F), // kVK_F12
    (KeyId::F13, 0x69), // kVK_F13
    (KeyId::F14, 0x6B), // kVK_F14
    (KeyId::F15, 0x71), // kVK_F15
    (KeyId::F16, 0x6A), // kVK_F16
    // ── Keypad ───────────────────────────────────────────────────────────
    (KeyId::KP_0, 0x52),        // kVK_ANSI_Keypad0
    (KeyId::KP_1, 0x53),        // kVK_ANSI_Keypad1
    (KeyId::KP_2, 0x54),        // kVK_ANSI_Keypad2
    (KeyId::KP_3, 0x55),        // kVK_ANSI_Keypad3
    (KeyId::KP_4, 0x56),        // kVK_ANSI_Keypad4
    (KeyId::KP_5, 0x57),        // kVK_ANSI_Keypad5
    (KeyId::KP_6, 0x58),        // kVK_ANSI_Keypad6
    (KeyId::KP_7, 0x59),        // kVK_ANSI_Keypad7
    (KeyId::KP_8, 0x5B),        // kVK_ANSI_Keypad8
    (KeyId::KP_9, 0x5C),        // kVK_ANSI_Keypad9
    (KeyId::KP_DECIMAL, 0x41),  // kVK_ANSI_KeypadDecimal
    (KeyId::KP_EQUAL, 0x51),    // kVK_ANSI_KeypadEquals
    (KeyId::KP_MULTIPLY, 0x43), // kVK_ANSI_KeypadMultiply
    (KeyId::KP_ADD, 0x45),      // kVK_ANSI_KeypadPlus
    (KeyId::KP_DIVIDE, 0x4B),   // kVK_ANSI_KeypadDivide
    (KeyId::KP_SUBTRACT, 0x4E), // kVK_ANSI_KeypadMinus
    (KeyId::KP_ENTER, 0x4C),    // kVK_ANSI_KeypadEnter
    // ── Modifier keys ────────────────────────────────────────────────────
    (KeyId::SHIFT_L, 0x38),   // kVK_Shift
    (KeyId::SHIFT_R, 0x38),   // kVK_Shift
    (KeyId::CONTROL_L, 0x3B), // kVK_Control
    (KeyId::CONTROL_R, 0x3B), // kVK_Control
    (KeyId::ALT_L, 0x3A),     // kVK_Option
    (KeyId::ALT_R, 0x3A),     // kVK_Option
    (KeyId::SUPER_L, 0x37),   // kVK_Command
    (KeyId::SUPER_R, 0x37),   // kVK_Command
    (KeyId::META_L, 0x37),    // kVK_Command
    (KeyId::META_R, 0x37),    // kVK_Command
    (KeyId::CAPS_LOCK, 0x39), // kVK_CapsLock
    (KeyId::NUM_LOCK, 0x47),  // kVK_ANSI_KeypadClear
];

/// Builds the button → id overrides for one group.
///
/// First entry wins for buttons listed more than once.
pub(crate) fn special_entries() -> HashMap<ButtonId, KeyId> {
    let mut entries = HashMap::with_capacity(SPECIAL_KEYS.len());
    for &(id, virtual_key) in SPECIAL_KEYS {
        entries
            .entry(ButtonId::from_virtual_key(virtual_key))
            .or_insert(id);
    }
    entries
}

/// The virtual key producing `id`, if `id` is one of the hardcoded keys.
pub(crate) fn virtual_key_for(id: KeyId) -> Option<u16> {
    // Linear scan; the table is small and this only runs on the hotkey and
    // modifier-synthesis paths.
    SPECIAL_KEYS
        .iter()
        .find(|&&(key, _)| key == id)
        .map(|&(_, virtual_key)| virtual_key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arrow_lookup_round_trips() {
        assert_eq!(virtual_key_for(KeyId::UP), Some(0x7E));
        let entries = special_entries();
        assert_eq!(entries.get(&ButtonId::from_virtual_key(0x7E)), Some(&KeyId::UP));
    }

    #[test]
    fn test_first_entry_wins_for_shared_button() {
        // Insert and Help share kVK_Help; the button keeps Insert.
        let entries = special_entries();
        let button = ButtonId::from_virtual_key(0x72);
        assert_eq!(entries.get(&button), Some(&KeyId::INSERT));
        // Both ids still resolve to the shared virtual key.
        assert_eq!(virtual_key_for(KeyId::INSERT), Some(0x72));
        assert_eq!(virtual_key_for(KeyId::HELP), Some(0x72));
    }

    #[test]
    fn test_left_and_right_modifiers_share_virtual_key() {
        assert_eq!(virtual_key_for(KeyId::SHIFT_L), virtual_key_for(KeyId::SHIFT_R));
        assert_eq!(virtual_key_for(KeyId::SUPER_L), virtual_key_for(KeyId::META_L));
        // The forward direction reports the left-hand variant.
        let entries = special_entries();
        assert_eq!(entries.get(&ButtonId::from_virtual_key(0x38)), Some(&KeyId::SHIFT_L));
    }

    #[test]
    fn test_unlisted_id_has_no_virtual_key() {
        assert_eq!(virtual_key_for(KeyId(u32::from('a'))), None);
    }
}
