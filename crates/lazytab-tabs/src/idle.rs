//! Idle Timer
//!
//! One countdown per tab. Armed when a tab loses selection, cancelled
//! when it is selected again, suspended or closed. Expiry is delivered
//! through the owner's [`Scheduler`].

use std::collections::HashMap;
use std::time::Duration;

use crate::id::TabId;
use crate::scheduler::{Scheduler, TaskId};

#[derive(Debug, Default)]
pub struct IdleTimer {
    timers: HashMap<TabId, TaskId>,
    selected: Option<TabId>,
}

impl IdleTimer {
    pub fn new(selected: Option<TabId>) -> Self {
        Self {
            selected,
            ..Self::default()
        }
    }

    /// Start the countdown for `tab`, replacing any running one.
    pub fn arm<T>(&mut self, scheduler: &mut Scheduler<T>, tab: TabId, after: Duration, task: T) -> TaskId {
        self.disarm(scheduler, tab);
        let task_id = scheduler.schedule(after, task);
        self.timers.insert(tab, task_id);
        tracing::debug!(tab_id = %tab, seconds = after.as_secs(), "Idle timer armed");
        task_id
    }

    pub fn disarm<T>(&mut self, scheduler: &mut Scheduler<T>, tab: TabId) -> bool {
        match self.timers.remove(&tab) {
            Some(task_id) => {
                scheduler.cancel(task_id);
                tracing::debug!(tab_id = %tab, "Idle timer cancelled");
                true
            }
            None => false,
        }
    }

    /// Consume the handle of a timer that just fired. False if `task_id`
    /// is not the tab's live timer.
    pub fn expire(&mut self, tab: TabId, task_id: TaskId) -> bool {
        if self.timers.get(&tab) == Some(&task_id) {
            self.timers.remove(&tab);
            true
        } else {
            false
        }
    }

    /// Record a selection change. Returns the tab that lost selection.
    pub fn on_select(&mut self, tab: TabId) -> Option<TabId> {
        let previous = self.selected.replace(tab);
        if previous == Some(tab) {
            return None;
        }
        previous
    }

    pub fn on_close<T>(&mut self, scheduler: &mut Scheduler<T>, tab: TabId) {
        self.disarm(scheduler, tab);
        if self.selected == Some(tab) {
            self.selected = None;
        }
    }
}

/// Idle period for a timeout value and a unit expressed in seconds.
pub fn idle_duration(value: u64, unit_seconds: u64) -> Duration {
    Duration::from_secs(value.saturating_mul(unit_seconds))
}
