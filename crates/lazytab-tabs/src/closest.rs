//! Closest loaded tab
//!
//! Picks the tab to select when the selected tab is suspended or closed:
//! the owner if it is loaded, else the nearest loaded neighbour in the
//! visible strip, else any neighbour.

use crate::id::TabId;

/// Host relations of the tab being replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TabRelations {
    pub tab: TabId,
    pub owner: Option<TabId>,
    pub next_sibling: Option<TabId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClosestTabSelector {
    select_owner_on_close: bool,
}

impl ClosestTabSelector {
    pub fn new(select_owner_on_close: bool) -> Self {
        Self { select_owner_on_close }
    }

    /// `visible` may or may not still contain `target.tab`: a closing tab
    /// has usually been removed already, a tab being suspended has not.
    pub fn select<F>(&self, visible: &[TabId], target: &TabRelations, is_suspended: F) -> Option<TabId>
    where
        F: Fn(TabId) -> bool,
    {
        if visible.len() <= 1 {
            return None;
        }

        let owner = self.visible_owner(visible, target);
        if let Some(owner) = owner.filter(|o| !is_suspended(*o)) {
            return Some(owner);
        }

        let pivot = pivot_index(visible, target);
        if let Some(found) = search_outward(visible, pivot, target.tab, &is_suspended) {
            return Some(found);
        }

        // Nothing loaded; settle for a suspended tab
        if owner.is_some() {
            return owner;
        }
        if visible[pivot] != target.tab {
            return Some(visible[pivot]);
        }
        if let Some(next) = visible.get(pivot + 1) {
            return Some(*next);
        }
        if pivot >= 1 {
            return Some(visible[pivot - 1]);
        }

        tracing::error!(
            tab_id = %target.tab,
            visible = visible.len(),
            "No substitute tab found among visible tabs"
        );
        None
    }

    fn visible_owner(&self, visible: &[TabId], target: &TabRelations) -> Option<TabId> {
        if !self.select_owner_on_close {
            return None;
        }
        target.owner.filter(|owner| visible.contains(owner))
    }
}

/// Index of the tab itself, else of its next sibling (it was removed),
/// else the last index.
fn pivot_index(visible: &[TabId], target: &TabRelations) -> usize {
    let mut index = 0;
    while index + 1 < visible.len()
        && visible[index] != target.tab
        && Some(visible[index]) != target.next_sibling
    {
        index += 1;
    }
    index
}

/// Alternate forward and backward from `pivot`. When the pivot is not the
/// tab itself it sits half a step to the right of the tab's old slot, so
/// the first backward probe is at distance one instead of zero.
fn search_outward<F>(visible: &[TabId], pivot: usize, tab: TabId, is_suspended: &F) -> Option<TabId>
where
    F: Fn(TabId) -> bool,
{
    let len = visible.len() as isize;
    let pivot = pivot as isize;
    let candidate = |index: isize| -> Option<TabId> {
        let id = visible[index as usize];
        (id != tab && !is_suspended(id)).then_some(id)
    };

    let mut offset: isize = 0;
    while pivot - offset >= 0 || pivot + offset < len {
        if pivot + offset < len {
            if let Some(found) = candidate(pivot + offset) {
                return Some(found);
            }
        }

        let shifted = offset == 0 && visible[pivot as usize] != tab;
        if shifted {
            offset += 1;
        }
        if pivot - offset >= 0 {
            if let Some(found) = candidate(pivot - offset) {
                return Some(found);
            }
        }
        if shifted {
            offset -= 1;
        }

        offset += 1;
    }
    None
}
