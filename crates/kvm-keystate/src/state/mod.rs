//! Live key and modifier state orchestration.
//!
//! [`KeyState`] is the single entry point the embedding system talks to.
//! It owns the built [`KeyMap`](crate::keymap::KeyMap), the group cache and
//! the modifier shadow, and answers four kinds of requests:
//!
//! - *event mapping*: what does this native key event produce
//!   ([`KeyState::map_key_from_event`], [`KeyState::handle_modifier_keys`]);
//! - *state polling*: what do the hardware modifiers/group/keys look like
//!   right now ([`KeyState::poll_active_modifiers`] and friends);
//! - *hotkey mapping*: which native code and mask realize this id
//!   ([`KeyState::map_hotkey_to_native`]);
//! - *fake keys*: inject a unified keystroke back into the OS
//!   ([`KeyState::fake_key`]).
//!
//! Everything runs on the thread owning the outer event queue; there is no
//! internal locking and no operation outlives its call.

pub mod groups;

pub use groups::GroupManager;

use std::sync::Arc;

use tracing::{debug, trace};

use crate::config::KeyStateOptions;
use crate::keymap::{special, KeyMap, KeyMapBuilder};
use crate::keys::{ButtonId, KeyId, KeySequence};
use crate::modifiers::{self, NativeModifierMask, UnifiedModifierMask};
use crate::platform::{InputSourceId, NativeKeyEvent, PlatformError, PlatformKeyboard};

/// One unified keystroke handed down for injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keystroke {
    /// Press or release one mapped button.
    Button { button: ButtonId, press: bool },
    /// Switch keyboard group, absolutely or relative to the active one.
    /// Relative offsets wrap modulo the group count.
    Group { group: i32, absolute: bool },
}

/// Result of mapping one native key event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedKey {
    /// Mapped button, or [`ButtonId::NONE`] when the code has no mapping.
    pub button: ButtonId,
    /// Ordered ids the event produces; empty when unmapped or the cell has
    /// no output.
    pub ids: KeySequence,
    /// Unified modifiers after the AltGr adjustment.
    pub mask: UnifiedModifierMask,
}

/// Receives the synthetic modifier events [`KeyState::handle_modifier_keys`]
/// emits.
pub trait KeyEventSink {
    fn key_event(&mut self, press: bool, id: KeyId, button: ButtonId, mask: UnifiedModifierMask);
}

/// The five modifier flags shadowing the last observed native mask.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShadowModifiers {
    pub shift: bool,
    pub control: bool,
    pub alt: bool,
    pub super_key: bool,
    pub caps_lock: bool,
}

impl ShadowModifiers {
    fn from_unified(mask: UnifiedModifierMask) -> ShadowModifiers {
        ShadowModifiers {
            shift: mask.shift(),
            control: mask.control(),
            alt: mask.alt(),
            super_key: mask.super_key(),
            caps_lock: mask.caps_lock(),
        }
    }

    /// Renders the flags as a unified mask.
    pub fn unified(&self) -> UnifiedModifierMask {
        let mut mask = 0;
        if self.shift {
            mask |= UnifiedModifierMask::SHIFT;
        }
        if self.control {
            mask |= UnifiedModifierMask::CONTROL;
        }
        if self.alt {
            mask |= UnifiedModifierMask::ALT;
        }
        if self.super_key {
            mask |= UnifiedModifierMask::SUPER;
        }
        if self.caps_lock {
            mask |= UnifiedModifierMask::CAPS_LOCK;
        }
        UnifiedModifierMask(mask)
    }

    /// Renders the flags as a native mask, for synthesized events that need
    /// a plausible native flag word.
    pub fn native(&self) -> NativeModifierMask {
        let mut mask = 0;
        if self.shift {
            mask |= NativeModifierMask::SHIFT;
        }
        if self.control {
            mask |= NativeModifierMask::CONTROL;
        }
        if self.alt {
            mask |= NativeModifierMask::ALT;
        }
        if self.super_key {
            mask |= NativeModifierMask::SUPER;
        }
        if self.caps_lock {
            mask |= NativeModifierMask::CAPS_LOCK;
        }
        NativeModifierMask(mask)
    }
}

/// Canonical emission order for modifier changes.  Fixed so sequences sent
/// to the network are deterministic.
const MODIFIER_ORDER: [(u32, KeyId); 5] = [
    (UnifiedModifierMask::SHIFT, KeyId::SHIFT_L),
    (UnifiedModifierMask::CONTROL, KeyId::CONTROL_L),
    (UnifiedModifierMask::ALT, KeyId::ALT_L),
    (UnifiedModifierMask::SUPER, KeyId::SUPER_L),
    (UnifiedModifierMask::CAPS_LOCK, KeyId::CAPS_LOCK),
];

/// Façade over layout decoding, group tracking and modifier state.
pub struct KeyState {
    platform: Arc<dyn PlatformKeyboard>,
    options: KeyStateOptions,
    groups: GroupManager,
    builder: KeyMapBuilder,
    map: KeyMap,
    shadow: ShadowModifiers,
}

impl KeyState {
    /// Creates an uninitialized instance; call [`KeyState::init`] before
    /// mapping events.
    pub fn new(platform: Arc<dyn PlatformKeyboard>, options: KeyStateOptions) -> KeyState {
        let groups = GroupManager::new(platform.clone());
        KeyState {
            platform,
            options,
            groups,
            builder: KeyMapBuilder::new(0),
            map: KeyMap::new(),
            shadow: ShadowModifiers::default(),
        }
    }

    /// Resolves the keyboard type, enumerates groups, builds the key map
    /// and seeds the modifier shadow from live hardware state.
    pub fn init(&mut self) -> Result<(), PlatformError> {
        let keyboard_type = match self.options.keyboard_type {
            Some(keyboard_type) => keyboard_type,
            None => self.platform.keyboard_type()?,
        };
        self.builder = KeyMapBuilder::new(keyboard_type);
        self.groups.enumerate()?;
        self.groups.refresh_active()?;
        self.map = self
            .builder
            .build_all(self.platform.as_ref(), self.groups.groups());
        self.shadow =
            ShadowModifiers::from_unified(modifiers::from_native(self.platform.modifier_flags()?));
        debug!(
            "key state ready: {} groups, active group {}",
            self.groups.num_groups(),
            self.groups.active_index()
        );
        Ok(())
    }

    /// The built key map.
    pub fn key_map(&self) -> &KeyMap {
        &self.map
    }

    /// Groups in enumeration order.
    pub fn groups(&self) -> &[InputSourceId] {
        self.groups.groups()
    }

    /// Cached index of the active group.
    pub fn active_group_index(&self) -> usize {
        self.groups.active_index()
    }

    /// The current shadow modifier flags.
    pub fn shadow(&self) -> ShadowModifiers {
        self.shadow
    }

    /// The shadow flags rendered as a native mask.
    pub fn shadow_native_mask(&self) -> NativeModifierMask {
        self.shadow.native()
    }

    /// Maps one native key event to its button, produced ids and adjusted
    /// unified mask.  Codes without any mapping yield [`ButtonId::NONE`]
    /// and an empty sequence.
    pub fn map_key_from_event(&self, event: NativeKeyEvent) -> MappedKey {
        let mut mask = modifiers::from_native(event.modifiers);
        let button = ButtonId::from_virtual_key(event.virtual_key);

        let Some(group) = self.map.group(self.groups.active_index()) else {
            return MappedKey {
                button: ButtonId::NONE,
                ids: Vec::new(),
                mask,
            };
        };

        let (button, ids) = match group.special(button) {
            Some(id) => (button, vec![id]),
            None => {
                let combination = modifiers::table_combination(event.modifiers);
                let table = group.table_for_combination(combination);
                match group.entry(table, button) {
                    Some(entry) => (button, entry.ids.clone()),
                    None => (ButtonId::NONE, Vec::new()),
                }
            }
        };

        let command_active = event.modifiers.super_key() || event.modifiers.control();
        modifiers::adjust_altgr(&ids, &mut mask, command_active);
        trace!(
            "mapped vk {} to button {:?} ({} ids)",
            event.virtual_key,
            button,
            ids.len()
        );
        MappedKey { button, ids, mask }
    }

    /// Emits a synthetic down or up event for every modifier flag differing
    /// between `old_native` and `new_native`, then updates the shadow.
    ///
    /// Flags are visited in the canonical order shift, control, alt, super,
    /// caps; each event carries the mask with the changes so far applied.
    /// A caps toggle emits a press+release pair when
    /// `synthesize_caps_release` is set, since the hardware latches caps
    /// rather than holding it.
    pub fn handle_modifier_keys(
        &mut self,
        sink: &mut dyn KeyEventSink,
        old_native: NativeModifierMask,
        new_native: NativeModifierMask,
    ) {
        let old = modifiers::from_native(old_native);
        let new = modifiers::from_native(new_native);
        let mut running = old;
        for (bit, id) in MODIFIER_ORDER {
            let was = old.0 & bit != 0;
            let is = new.0 & bit != 0;
            if was == is {
                continue;
            }
            if is {
                running.0 |= bit;
            } else {
                running.0 &= !bit;
            }
            let button = special::virtual_key_for(id)
                .map(ButtonId::from_virtual_key)
                .unwrap_or(ButtonId::NONE);
            if bit == UnifiedModifierMask::CAPS_LOCK && self.options.synthesize_caps_release {
                sink.key_event(true, id, button, running);
                sink.key_event(false, id, button, running);
            } else {
                sink.key_event(is, id, button, running);
            }
        }
        self.shadow = ShadowModifiers::from_unified(new);
    }

    /// Resolves a hotkey request to the native (virtual key, mask) pair
    /// realizing it under the active group.  `None` when the unified mask
    /// has no native form or no button produces `id`.
    pub fn map_hotkey_to_native(
        &self,
        id: KeyId,
        mask: UnifiedModifierMask,
    ) -> Option<(u16, NativeModifierMask)> {
        let native = modifiers::to_native(mask)?;
        let group = self.map.group(self.groups.active_index())?;
        let combination = modifiers::table_combination(native);
        let button = group.hotkey_button(id, combination)?;
        let virtual_key = button.to_virtual_key()?;
        Some((virtual_key, native))
    }

    /// Live unified modifier flags; always reflects hardware at call time.
    pub fn poll_active_modifiers(&self) -> Result<UnifiedModifierMask, PlatformError> {
        Ok(modifiers::from_native(self.platform.modifier_flags()?))
    }

    /// Live active group index; sources unknown to the enumerated set
    /// resolve to 0.
    pub fn poll_active_group(&self) -> Result<usize, PlatformError> {
        let source = self.groups.active_group()?;
        Ok(self.groups.index_of(&source).unwrap_or(0))
    }

    /// Buttons physically held right now.
    pub fn poll_pressed_keys(&self) -> Result<Vec<ButtonId>, PlatformError> {
        Ok(self
            .platform
            .pressed_virtual_keys()?
            .into_iter()
            .map(ButtonId::from_virtual_key)
            .collect())
    }

    /// Injects one keystroke.
    ///
    /// Button strokes go to the OS with the shadow mask attached; group
    /// strokes switch the active group.  Shadow state is not touched here;
    /// the resulting native events come back through the event queue and
    /// update it via [`KeyState::handle_modifier_keys`], which keeps the
    /// shadow from counting a change twice.
    pub fn fake_key(&mut self, keystroke: Keystroke) -> Result<(), PlatformError> {
        match keystroke {
            Keystroke::Button { button, press } => {
                let Some(virtual_key) = button.to_virtual_key() else {
                    trace!("dropping keystroke for unmapped button");
                    return Ok(());
                };
                self.platform
                    .inject_key(virtual_key, self.shadow.native(), press)
            }
            Keystroke::Group { group, absolute } => {
                let count = self.groups.num_groups() as i32;
                if count == 0 {
                    return Ok(());
                }
                let index = if absolute {
                    group.rem_euclid(count)
                } else {
                    (self.groups.active_index() as i32 + group).rem_euclid(count)
                } as usize;
                self.groups.set_group(index)
            }
        }
    }

    /// The secure attention sequence cannot be synthesized on this
    /// platform; callers expand it into individual keystrokes instead.
    pub fn fake_ctrl_alt_del(&self) -> bool {
        false
    }

    /// Handles an external "active input source may have changed"
    /// notification.  Returns whether the key map was rebuilt; spurious
    /// notifications cost one OS query and nothing else.
    pub fn handle_layout_change(&mut self) -> Result<bool, PlatformError> {
        let source = self.platform.active_input_source()?;
        match self.groups.index_of(&source) {
            Some(index) if index == self.groups.active_index() => Ok(false),
            Some(index) => {
                self.groups.set_active_index(index);
                let section = self.builder.build_group(self.platform.as_ref(), &source);
                self.map.set_group(index, section);
                debug!("layout change: now group {index} ({source})");
                Ok(true)
            }
            None => {
                // A source installed since the last enumeration.
                self.groups.enumerate()?;
                self.groups.refresh_active()?;
                self.map = self
                    .builder
                    .build_all(self.platform.as_ref(), self.groups.groups());
                debug!(
                    "layout change: group set replaced ({} groups)",
                    self.groups.num_groups()
                );
                Ok(true)
            }
        }
    }
}
