//! Modifier mask representations and the translation between them.
//!
//! Native masks are what the OS event layer reports; unified masks are what
//! the rest of the input-sharing system speaks.  The translator is the only
//! place native bits are interpreted; outside this module a native mask is
//! an opaque word.
//!
//! The third job here is the AltGr heuristic: on the host platform one
//! physical key doubles as a command modifier and as the AltGr
//! glyph-selector.  Which role it played for a given key press can only be
//! decided *after* the character lookup, by inspecting what was produced.

use crate::keys::KeyId;

// ── Native mask ───────────────────────────────────────────────────────────────

/// Modifier flags as reported by the host's event layer.
///
/// Bit values match the host's device-independent event flags.  `super` is
/// the command-style key, `alt` the option/AltGr key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NativeModifierMask(pub u32);

impl NativeModifierMask {
    pub const EMPTY: NativeModifierMask = NativeModifierMask(0);

    pub const CAPS_LOCK: u32 = 1 << 16;
    pub const SHIFT: u32 = 1 << 17;
    pub const CONTROL: u32 = 1 << 18;
    pub const ALT: u32 = 1 << 19;
    pub const SUPER: u32 = 1 << 20;

    pub fn shift(&self) -> bool {
        self.0 & Self::SHIFT != 0
    }
    pub fn control(&self) -> bool {
        self.0 & Self::CONTROL != 0
    }
    pub fn alt(&self) -> bool {
        self.0 & Self::ALT != 0
    }
    pub fn super_key(&self) -> bool {
        self.0 & Self::SUPER != 0
    }
    pub fn caps_lock(&self) -> bool {
        self.0 & Self::CAPS_LOCK != 0
    }
}

// ── Unified mask ──────────────────────────────────────────────────────────────

/// Cross-platform modifier bitset used throughout the wider system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UnifiedModifierMask(pub u32);

impl UnifiedModifierMask {
    pub const EMPTY: UnifiedModifierMask = UnifiedModifierMask(0);

    pub const SHIFT: u32 = 0x0001;
    pub const CONTROL: u32 = 0x0002;
    pub const ALT: u32 = 0x0004;
    pub const META: u32 = 0x0008;
    pub const SUPER: u32 = 0x0010;
    pub const ALT_GR: u32 = 0x0020;
    pub const CAPS_LOCK: u32 = 0x1000;
    pub const NUM_LOCK: u32 = 0x2000;
    pub const SCROLL_LOCK: u32 = 0x4000;

    pub fn shift(&self) -> bool {
        self.0 & Self::SHIFT != 0
    }
    pub fn control(&self) -> bool {
        self.0 & Self::CONTROL != 0
    }
    pub fn alt(&self) -> bool {
        self.0 & Self::ALT != 0
    }
    pub fn meta(&self) -> bool {
        self.0 & Self::META != 0
    }
    pub fn super_key(&self) -> bool {
        self.0 & Self::SUPER != 0
    }
    pub fn alt_gr(&self) -> bool {
        self.0 & Self::ALT_GR != 0
    }
    pub fn caps_lock(&self) -> bool {
        self.0 & Self::CAPS_LOCK != 0
    }
    pub fn num_lock(&self) -> bool {
        self.0 & Self::NUM_LOCK != 0
    }
    pub fn scroll_lock(&self) -> bool {
        self.0 & Self::SCROLL_LOCK != 0
    }
}

// ── Translation ───────────────────────────────────────────────────────────────

/// Converts a native modifier mask to the unified representation.
///
/// Shift, control, alt, super and caps-lock map bit for bit; native bits
/// outside that set are dropped.
pub fn from_native(native: NativeModifierMask) -> UnifiedModifierMask {
    let mut out = UnifiedModifierMask::EMPTY;
    if native.shift() {
        out.0 |= UnifiedModifierMask::SHIFT;
    }
    if native.control() {
        out.0 |= UnifiedModifierMask::CONTROL;
    }
    if native.alt() {
        out.0 |= UnifiedModifierMask::ALT;
    }
    if native.super_key() {
        out.0 |= UnifiedModifierMask::SUPER;
    }
    if native.caps_lock() {
        out.0 |= UnifiedModifierMask::CAPS_LOCK;
    }
    out
}

/// Converts a unified modifier mask back to native flags.
///
/// Only the hotkey-registration path needs a native mask synthesized from
/// scratch.  Returns `None` when the mask contains a bit with no native
/// equivalent on this platform (meta, num-lock, scroll-lock).  The AltGr
/// bit maps to the native alt key, which is how AltGr glyphs are typed here.
pub fn to_native(unified: UnifiedModifierMask) -> Option<NativeModifierMask> {
    const REPRESENTABLE: u32 = UnifiedModifierMask::SHIFT
        | UnifiedModifierMask::CONTROL
        | UnifiedModifierMask::ALT
        | UnifiedModifierMask::SUPER
        | UnifiedModifierMask::ALT_GR
        | UnifiedModifierMask::CAPS_LOCK;
    if unified.0 & !REPRESENTABLE != 0 {
        return None;
    }

    let mut out = NativeModifierMask::EMPTY;
    if unified.shift() {
        out.0 |= NativeModifierMask::SHIFT;
    }
    if unified.control() {
        out.0 |= NativeModifierMask::CONTROL;
    }
    if unified.alt() || unified.alt_gr() {
        out.0 |= NativeModifierMask::ALT;
    }
    if unified.super_key() {
        out.0 |= NativeModifierMask::SUPER;
    }
    if unified.caps_lock() {
        out.0 |= NativeModifierMask::CAPS_LOCK;
    }
    Some(out)
}

/// Reclassifies the alt bit as AltGr when the key press actually produced a
/// glyph.
///
/// Fires only when alt is set, no command-style modifier is active, and at
/// least one produced id is a printable glyph.  On firing, alt becomes
/// AltGr and the super/meta bits are cleared so a mask never claims both a
/// command role and a glyph-selector role for the same press.
pub fn adjust_altgr(ids: &[KeyId], mask: &mut UnifiedModifierMask, command_active: bool) {
    if command_active || !mask.alt() {
        return;
    }
    if ids.iter().any(|id| id.is_glyph()) {
        mask.0 &= !(UnifiedModifierMask::ALT
            | UnifiedModifierMask::SUPER
            | UnifiedModifierMask::META);
        mask.0 |= UnifiedModifierMask::ALT_GR;
    }
}

/// Packs a native mask into the layout resource's modifier-combination
/// space.
///
/// The resource indexes its shift tables by a 5-bit word: super = 1,
/// shift = 2, caps = 4, alt = 8, control = 16, giving 32 combinations.
pub fn table_combination(native: NativeModifierMask) -> u32 {
    let mut combo = 0;
    if native.super_key() {
        combo |= 1;
    }
    if native.shift() {
        combo |= 2;
    }
    if native.caps_lock() {
        combo |= 4;
    }
    if native.alt() {
        combo |= 8;
    }
    if native.control() {
        combo |= 16;
    }
    combo
}

/// Number of distinct values `table_combination` can produce.
pub const NUM_TABLE_COMBINATIONS: u32 = 32;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_native_maps_all_five_flags() {
        let native = NativeModifierMask(
            NativeModifierMask::SHIFT
                | NativeModifierMask::CONTROL
                | NativeModifierMask::ALT
                | NativeModifierMask::SUPER
                | NativeModifierMask::CAPS_LOCK,
        );
        let unified = from_native(native);
        assert!(unified.shift());
        assert!(unified.control());
        assert!(unified.alt());
        assert!(unified.super_key());
        assert!(unified.caps_lock());
        assert!(!unified.alt_gr());
        assert!(!unified.meta());
    }

    #[test]
    fn test_from_native_drops_unknown_bits() {
        // Low device-dependent bits must not leak into the unified mask.
        let native = NativeModifierMask(0x0000_00FF | NativeModifierMask::SHIFT);
        assert_eq!(
            from_native(native),
            UnifiedModifierMask(UnifiedModifierMask::SHIFT)
        );
    }

    #[test]
    fn test_modifier_round_trip_over_all_combinations() {
        const FLAGS: [u32; 5] = [
            NativeModifierMask::SHIFT,
            NativeModifierMask::CONTROL,
            NativeModifierMask::ALT,
            NativeModifierMask::SUPER,
            NativeModifierMask::CAPS_LOCK,
        ];
        for combo in 0u32..32 {
            let mut native = NativeModifierMask::EMPTY;
            for (i, flag) in FLAGS.iter().enumerate() {
                if combo & (1 << i) != 0 {
                    native.0 |= flag;
                }
            }
            let back = to_native(from_native(native)).unwrap();
            assert_eq!(back, native, "combination {combo} did not round-trip");
        }
    }

    #[test]
    fn test_to_native_rejects_unrepresentable_bits() {
        for bit in [
            UnifiedModifierMask::META,
            UnifiedModifierMask::NUM_LOCK,
            UnifiedModifierMask::SCROLL_LOCK,
        ] {
            let mask = UnifiedModifierMask(UnifiedModifierMask::SHIFT | bit);
            assert_eq!(to_native(mask), None);
        }
    }

    #[test]
    fn test_to_native_maps_altgr_to_alt() {
        let native = to_native(UnifiedModifierMask(UnifiedModifierMask::ALT_GR)).unwrap();
        assert!(native.alt());
    }

    #[test]
    fn test_adjust_altgr_reclassifies_alt_for_glyphs() {
        let ids = [KeyId(0x00E9)]; // é
        let mut mask = UnifiedModifierMask(UnifiedModifierMask::ALT | UnifiedModifierMask::SHIFT);
        adjust_altgr(&ids, &mut mask, false);
        assert!(mask.alt_gr());
        assert!(!mask.alt());
        assert!(mask.shift());
    }

    #[test]
    fn test_adjust_altgr_skips_when_command_active() {
        let ids = [KeyId(b'a' as u32)];
        let mut mask = UnifiedModifierMask(UnifiedModifierMask::ALT);
        adjust_altgr(&ids, &mut mask, true);
        assert!(mask.alt());
        assert!(!mask.alt_gr());
    }

    #[test]
    fn test_adjust_altgr_skips_for_non_glyphs() {
        let ids = [KeyId::LEFT, KeyId::F5];
        let mut mask = UnifiedModifierMask(UnifiedModifierMask::ALT);
        adjust_altgr(&ids, &mut mask, false);
        assert!(mask.alt());
        assert!(!mask.alt_gr());
    }

    #[test]
    fn test_adjust_altgr_never_leaves_super_with_altgr() {
        let ids = [KeyId(b'q' as u32)];
        let mut mask = UnifiedModifierMask(
            UnifiedModifierMask::ALT | UnifiedModifierMask::SUPER | UnifiedModifierMask::META,
        );
        adjust_altgr(&ids, &mut mask, false);
        assert!(mask.alt_gr());
        assert!(!mask.super_key());
        assert!(!mask.meta());
    }

    #[test]
    fn test_table_combination_packing() {
        const CASES: &[(u32, u32)] = &[
            (0, 0),
            (NativeModifierMask::SUPER, 1),
            (NativeModifierMask::SHIFT, 2),
            (NativeModifierMask::CAPS_LOCK, 4),
            (NativeModifierMask::ALT, 8),
            (NativeModifierMask::CONTROL, 16),
            (NativeModifierMask::SHIFT | NativeModifierMask::CAPS_LOCK, 6),
            (NativeModifierMask::SUPER | NativeModifierMask::CONTROL, 17),
        ];
        for &(bits, expected) in CASES {
            assert_eq!(table_combination(NativeModifierMask(bits)), expected);
        }
    }
}
