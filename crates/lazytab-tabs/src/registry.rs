//! Tab Registry
//!
//! Holds one [`TabState`] per tab known to the controller.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use lazytab_navigation::NavigationCapability;

use crate::error::TabError;
use crate::id::TabId;
use crate::state::TabState;
use crate::Result;

#[derive(Debug, Default)]
pub struct TabRegistry {
    tabs: HashMap<TabId, TabState>,
}

impl TabRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tab, replacing any existing record for the same id
    pub fn register(&mut self, id: TabId, navigation: Box<dyn NavigationCapability>) -> &mut TabState {
        let state = TabState::new(id, navigation);
        tracing::debug!(tab_id = %id, "Registered tab");
        match self.tabs.entry(id) {
            Entry::Occupied(mut entry) => {
                tracing::warn!(tab_id = %id, "Tab registered twice, replacing record");
                entry.insert(state);
                entry.into_mut()
            }
            Entry::Vacant(entry) => entry.insert(state),
        }
    }

    pub fn get(&self, id: TabId) -> Result<&TabState> {
        self.tabs.get(&id).ok_or(TabError::NotFound(id))
    }

    pub fn get_mut(&mut self, id: TabId) -> Result<&mut TabState> {
        self.tabs.get_mut(&id).ok_or(TabError::NotFound(id))
    }

    pub fn remove(&mut self, id: TabId) -> Option<TabState> {
        let removed = self.tabs.remove(&id);
        if removed.is_some() {
            tracing::debug!(tab_id = %id, "Dropped tab record");
        }
        removed
    }

    pub fn contains(&self, id: TabId) -> bool {
        self.tabs.contains_key(&id)
    }

    /// Unknown tabs count as loaded.
    pub fn is_suspended(&self, id: TabId) -> bool {
        self.tabs.get(&id).map(TabState::is_suspended).unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }
}
