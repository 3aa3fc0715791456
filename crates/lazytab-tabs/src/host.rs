//! Capabilities the host browser provides
//!
//! Host events are delivered by calling the controller; host methods
//! called by the controller must not call back into it. After
//! [`TabCollection::select`] the controller runs its own selection
//! handling.

use serde::{Deserialize, Serialize};

use lazytab_navigation::NavigationCapability;

use crate::id::TabId;

/// The host's ordered tab strip.
pub trait TabCollection {
    /// All tabs in strip order.
    fn tabs(&self) -> Vec<TabId>;
    /// Tabs currently shown (e.g. the active tab group), in strip order.
    fn visible_tabs(&self) -> Vec<TabId>;
    fn selected(&self) -> Option<TabId>;
    fn select(&mut self, tab: TabId);
    fn position(&self, tab: TabId) -> Option<usize>;
    /// Tab that opened `tab` through a user action.
    fn owner(&self, tab: TabId) -> Option<TabId>;
    /// Tab right after `tab` in the strip. Must still answer for a tab that
    /// is being closed.
    fn next_sibling(&self, tab: TabId) -> Option<TabId>;

    fn parent(&self, _tab: TabId) -> Option<TabId> {
        None
    }
    fn children(&self, _tab: TabId) -> Vec<TabId> {
        Vec::new()
    }
    /// True when tabs form a tree (parent/children are meaningful).
    fn supports_tree(&self) -> bool {
        false
    }
    fn attach_child(&mut self, _child: TabId, _parent: TabId) {}

    /// Open a blank, unselected tab at `index`.
    fn open_blank_tab(&mut self, index: usize) -> (TabId, Box<dyn NavigationCapability>);
    /// Give `keep` the content of `donor` and close `donor`. The old
    /// content of `keep` is discarded.
    fn swap_contents_and_close(&mut self, keep: TabId, donor: TabId);

    fn set_label(&mut self, tab: TabId, title: &str);
    fn set_icon(&mut self, tab: TabId, icon: Option<&str>);
    fn set_busy(&mut self, tab: TabId, busy: bool);
}

/// Load-state notifications for a tab's content.
pub trait ProgressEvents {
    fn subscribe(&mut self, tab: TabId);
    fn unsubscribe(&mut self, tab: TabId);
}

/// Opaque serialized tab state (history, scroll positions, form data).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionSnapshot(pub serde_json::Value);

/// Session-state serialization used when swapping a tab's content.
pub trait SessionStore {
    fn capture_state(&mut self, tab: TabId) -> Option<SessionSnapshot>;
    /// Restore into `tab`. The navigation this causes reaches the
    /// controller as ordinary navigation calls after this returns.
    fn restore_state(&mut self, tab: TabId, snapshot: SessionSnapshot);
}

/// Everything the lifecycle controller needs from the host.
pub trait Host: TabCollection + ProgressEvents + SessionStore {}

impl<T: TabCollection + ProgressEvents + SessionStore> Host for T {}
