//! Keyboard group enumeration and active-group tracking.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::platform::{InputSourceId, PlatformError, PlatformKeyboard};

/// Tracks installed keyboard groups and which one is active.
///
/// The group list and its index map are replaced wholesale on enumeration,
/// so readers never observe a partially updated set.  The active index is a
/// cache of the last resolved OS state; layout-change handling compares
/// against it to tell a real switch from a spurious notification.
pub struct GroupManager {
    platform: Arc<dyn PlatformKeyboard>,
    groups: Vec<InputSourceId>,
    index_of: HashMap<InputSourceId, usize>,
    active: usize,
}

impl GroupManager {
    pub fn new(platform: Arc<dyn PlatformKeyboard>) -> GroupManager {
        GroupManager {
            platform,
            groups: Vec::new(),
            index_of: HashMap::new(),
            active: 0,
        }
    }

    /// Queries the OS and replaces the group set.  The previous set stays
    /// in place when the query fails.
    pub fn enumerate(&mut self) -> Result<&[InputSourceId], PlatformError> {
        let groups = self.platform.input_sources()?;
        self.index_of = groups
            .iter()
            .cloned()
            .enumerate()
            .map(|(index, group)| (group, index))
            .collect();
        self.groups = groups;
        if self.active >= self.groups.len() {
            self.active = 0;
        }
        debug!("enumerated {} keyboard groups", self.groups.len());
        Ok(&self.groups)
    }

    /// Groups in enumeration order.
    pub fn groups(&self) -> &[InputSourceId] {
        &self.groups
    }

    pub fn num_groups(&self) -> usize {
        self.groups.len()
    }

    /// Index of the last resolved active group.
    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn group_at(&self, index: usize) -> Option<&InputSourceId> {
        self.groups.get(index)
    }

    /// Index of `source` within the enumerated set.
    pub fn index_of(&self, source: &InputSourceId) -> Option<usize> {
        self.index_of.get(source).copied()
    }

    pub(crate) fn set_active_index(&mut self, index: usize) {
        self.active = index;
    }

    /// Read-through query for the presently selected input source.
    pub fn active_group(&self) -> Result<InputSourceId, PlatformError> {
        self.platform.active_input_source()
    }

    /// Re-resolves the active group from the OS and caches its index.
    /// Sources unknown to the current set resolve to index 0.
    pub fn refresh_active(&mut self) -> Result<usize, PlatformError> {
        let source = self.platform.active_input_source()?;
        self.active = self.index_of(&source).unwrap_or(0);
        Ok(self.active)
    }

    /// Asks the OS to switch to the group at `index`.  A no-op when that
    /// group is already active or the index is out of range; does not
    /// trigger a key-map rebuild.
    pub fn set_group(&mut self, index: usize) -> Result<(), PlatformError> {
        if index == self.active {
            return Ok(());
        }
        let Some(source) = self.groups.get(index).cloned() else {
            debug_assert!(false, "group index {index} out of range");
            return Ok(());
        };
        self.platform.set_active_input_source(&source)?;
        self.active = index;
        debug!("switched to keyboard group {index} ({source})");
        Ok(())
    }
}
