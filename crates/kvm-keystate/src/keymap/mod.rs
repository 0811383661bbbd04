//! The built key map: group × modifier combination × button → KeyId sequence.
//!
//! A [`KeyMap`] holds one [`GroupKeyMap`] section per keyboard group, each
//! built once from that group's layout resource by [`KeyMapBuilder`] and
//! immutable until the next rebuild.  Sections are swapped in whole, so a
//! rebuild of one group is never observable half-done and never touches
//! another group's entries.
//!
//! Each section stores the resource's shift tables row by row, a per
//! modifier-combination table index resolved at build time, and the
//! hardcoded entries for keys the resource does not describe (navigation,
//! function and modifier keys).  Hardcoded entries take precedence over
//! resource cells for the same button.

mod builder;
pub(crate) mod special;

pub use builder::KeyMapBuilder;

use std::collections::HashMap;

use crate::keys::{ButtonId, KeyId, KeySequence};
use crate::modifiers::{self, NativeModifierMask};

/// Output of one resolved key-map cell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyMapEntry {
    /// Ordered ids this cell produces; empty when the cell has no output.
    /// Length 2 when an uncombinable dead-key fallback is baked in; a
    /// pending dead key is stored as its base id with the dead bit set.
    pub ids: KeySequence,
}

/// One group's section of the key map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupKeyMap {
    /// Table index per modifier combination, resolved once at build time.
    tables: Vec<u32>,
    /// Resource-derived cells indexed `[table][button position]`.  Tables
    /// no combination references stay empty.
    rows: Vec<Vec<KeyMapEntry>>,
    /// Hardcoded overrides; take precedence over resource cells.
    special: HashMap<ButtonId, KeyId>,
}

impl GroupKeyMap {
    pub(crate) fn new(
        tables: Vec<u32>,
        rows: Vec<Vec<KeyMapEntry>>,
        special: HashMap<ButtonId, KeyId>,
    ) -> GroupKeyMap {
        GroupKeyMap {
            tables,
            rows,
            special,
        }
    }

    /// The shift table serving `combination`.  Combinations outside the
    /// cached range use table 0, per the zero-combination resource rule.
    pub fn table_for_combination(&self, combination: u32) -> u32 {
        self.tables.get(combination as usize).copied().unwrap_or(0)
    }

    /// The resource-derived cell for `button` in `table`, if any.
    pub fn entry(&self, table: u32, button: ButtonId) -> Option<&KeyMapEntry> {
        let position = button.to_virtual_key()?;
        self.rows.get(table as usize)?.get(position as usize)
    }

    /// The hardcoded override for `button`, if any.
    pub fn special(&self, button: ButtonId) -> Option<KeyId> {
        self.special.get(&button).copied()
    }

    /// Resolves `button` under `mask`: hardcoded entries first, then the
    /// cell in the table the mask's combination selects.  Unmapped buttons
    /// yield an empty sequence.
    pub fn lookup(&self, mask: NativeModifierMask, button: ButtonId) -> KeySequence {
        if let Some(id) = self.special(button) {
            return vec![id];
        }
        let combination = modifiers::table_combination(mask);
        let table = self.table_for_combination(combination);
        self.entry(table, button)
            .map(|entry| entry.ids.clone())
            .unwrap_or_default()
    }

    /// Reverse search: the button whose first produced id equals `id`,
    /// preferring the table `combination` selects, then any other table a
    /// combination reaches.  Hardcoded keys win outright.
    pub(crate) fn hotkey_button(&self, id: KeyId, combination: u32) -> Option<ButtonId> {
        if let Some(virtual_key) = special::virtual_key_for(id) {
            return Some(ButtonId::from_virtual_key(virtual_key));
        }
        let requested = self.table_for_combination(combination);
        if let Some(button) = self.find_button(id, requested) {
            return Some(button);
        }
        for table in 0..self.rows.len() as u32 {
            if table == requested {
                continue;
            }
            if let Some(button) = self.find_button(id, table) {
                return Some(button);
            }
        }
        None
    }

    fn find_button(&self, id: KeyId, table: u32) -> Option<ButtonId> {
        let row = self.rows.get(table as usize)?;
        row.iter()
            .position(|entry| entry.ids.first() == Some(&id))
            .map(|position| ButtonId::from_virtual_key(position as u16))
    }
}

/// The complete map, one section per group in enumeration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyMap {
    groups: Vec<GroupKeyMap>,
}

impl KeyMap {
    pub fn new() -> KeyMap {
        KeyMap::default()
    }

    pub fn num_groups(&self) -> usize {
        self.groups.len()
    }

    pub fn group(&self, index: usize) -> Option<&GroupKeyMap> {
        self.groups.get(index)
    }

    /// Resolves `button` under `mask` in group `index`.  Unknown groups
    /// yield an empty sequence.
    pub fn lookup(&self, index: usize, mask: NativeModifierMask, button: ButtonId) -> KeySequence {
        self.group(index)
            .map(|group| group.lookup(mask, button))
            .unwrap_or_default()
    }

    /// Installs `section` as group `index`, growing the map with empty
    /// sections if needed.  The swap is wholesale; readers see either the
    /// old section or the new one, never a mixture.
    pub(crate) fn set_group(&mut self, index: usize, section: GroupKeyMap) {
        if index >= self.groups.len() {
            self.groups.resize_with(index + 1, GroupKeyMap::default);
        }
        self.groups[index] = section;
    }
}
