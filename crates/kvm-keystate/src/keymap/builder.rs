//! Key-map construction from layout resources.

use tracing::{debug, warn};

use crate::keymap::{special, GroupKeyMap, KeyMap, KeyMapEntry};
use crate::layout::{self, LayoutResource};
use crate::modifiers::NUM_TABLE_COMBINATIONS;
use crate::platform::{InputSourceId, PlatformKeyboard};

/// Builds [`KeyMap`] sections from OS layout resources.
///
/// One builder serves all groups; it carries only the keyboard type used to
/// select the matching section inside each resource.
#[derive(Debug, Clone, Copy)]
pub struct KeyMapBuilder {
    keyboard_type: u32,
}

impl KeyMapBuilder {
    pub fn new(keyboard_type: u32) -> KeyMapBuilder {
        KeyMapBuilder { keyboard_type }
    }

    /// Builds the complete map for `groups`, one section per group in
    /// enumeration order.
    pub fn build_all(&self, platform: &dyn PlatformKeyboard, groups: &[InputSourceId]) -> KeyMap {
        let mut map = KeyMap::new();
        for (index, source) in groups.iter().enumerate() {
            map.set_group(index, self.build_group(platform, source));
        }
        map
    }

    /// Builds one group's section.
    ///
    /// A group whose resource cannot be fetched or decoded is logged and
    /// degrades to its hardcoded entries; the group keeps its slot so later
    /// groups keep their indices.
    pub fn build_group(
        &self,
        platform: &dyn PlatformKeyboard,
        source: &InputSourceId,
    ) -> GroupKeyMap {
        match platform.layout_resource(source) {
            Ok((format, bytes)) => match layout::open_resource(format, &bytes, self.keyboard_type) {
                Ok(resource) if resource.is_valid() => {
                    let section = self.build_from_resource(resource.as_ref());
                    debug!(
                        "built key map for {source}: {} tables, {} buttons",
                        resource.num_tables(),
                        resource.num_buttons()
                    );
                    section
                }
                Ok(_) => {
                    warn!("layout resource for {source} has no usable tables; keeping hardcoded keys only");
                    GroupKeyMap::new(Vec::new(), Vec::new(), special::special_entries())
                }
                Err(e) => {
                    warn!("failed to decode layout resource for {source}: {e}");
                    GroupKeyMap::new(Vec::new(), Vec::new(), special::special_entries())
                }
            },
            Err(e) => {
                warn!("failed to fetch layout resource for {source}: {e}");
                GroupKeyMap::new(Vec::new(), Vec::new(), special::special_entries())
            }
        }
    }

    /// Builds a section straight from an already-open resource.
    ///
    /// Every modifier combination's table index is resolved once and cached;
    /// each referenced table is then resolved cell by cell, so aliased
    /// combinations share one pass.  Cells that open a dead-key state store
    /// the state's base ids with the dead bit set.
    pub fn build_from_resource(&self, resource: &dyn LayoutResource) -> GroupKeyMap {
        let num_buttons = resource.num_buttons();
        let mut tables = Vec::with_capacity(NUM_TABLE_COMBINATIONS as usize);
        let mut rows: Vec<Vec<KeyMapEntry>> = vec![Vec::new(); resource.num_tables() as usize];

        for combination in 0..NUM_TABLE_COMBINATIONS {
            let table = resource.table_for_modifier(combination);
            tables.push(table);
            let Some(row) = rows.get_mut(table as usize) else {
                debug_assert!(false, "table {table} out of range for combination {combination}");
                continue;
            };
            if !row.is_empty() {
                // Aliased combination; this table is already resolved.
                continue;
            }
            row.reserve_exact(num_buttons as usize);
            for position in 0..num_buttons {
                let resolution = resource.key_at(table, position, None);
                let ids = match resolution.pending {
                    Some(state) => state.base.iter().map(|id| id.dead()).collect(),
                    None => resolution.emitted,
                };
                row.push(KeyMapEntry { ids });
            }
        }

        GroupKeyMap::new(tables, rows, special::special_entries())
    }
}
