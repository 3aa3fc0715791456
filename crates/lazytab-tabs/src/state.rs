//! Per-tab suspension record
//!
//! A tab is suspended exactly when its interceptor is attached, and a
//! suspended tab always carries a [`ProgressGuard`]. Every transition
//! bumps `epoch` so work queued against the old state can be dropped.

use chrono::{DateTime, Utc};

use lazytab_navigation::{
    Interception, LoadFlags, LoadRequest, NavigationCapability, NavigationInterceptor, Resumption,
};
use lazytab_whitelist::WhitelistPolicy;

use crate::id::TabId;
use crate::progress::{GuardSet, ProgressGuard, RestoreGuard};
use crate::scheduler::TaskId;

pub struct TabState {
    id: TabId,
    navigation: NavigationInterceptor,
    guards: GuardSet,
    epoch: u64,
    suspended_at: Option<DateTime<Utc>>,
    subscribed: bool,
    placeholder: Option<TaskId>,
}

impl TabState {
    pub fn new(id: TabId, navigation: Box<dyn NavigationCapability>) -> Self {
        Self {
            id,
            navigation: NavigationInterceptor::new(navigation),
            guards: GuardSet::default(),
            epoch: 0,
            suspended_at: None,
            subscribed: false,
            placeholder: None,
        }
    }

    pub fn id(&self) -> TabId {
        self.id
    }

    pub fn is_suspended(&self) -> bool {
        self.navigation.is_attached()
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn suspended_at(&self) -> Option<DateTime<Utc>> {
        self.suspended_at
    }

    pub fn navigation(&self) -> &NavigationInterceptor {
        &self.navigation
    }

    pub fn navigation_mut(&mut self) -> &mut NavigationInterceptor {
        &mut self.navigation
    }

    pub fn guards(&self) -> &GuardSet {
        &self.guards
    }

    /// Whether the host should be delivering progress events for this tab.
    pub fn wants_progress_events(&self) -> bool {
        !self.guards.is_empty()
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscribed
    }

    pub fn set_subscribed(&mut self, subscribed: bool) {
        self.subscribed = subscribed;
    }

    /// Record the queued placeholder update for the captured call,
    /// returning the one it supersedes.
    pub fn replace_placeholder(&mut self, task: Option<TaskId>) -> Option<TaskId> {
        std::mem::replace(&mut self.placeholder, task)
    }

    /// Enter the suspended state. Returns false if already suspended.
    pub fn suspend(&mut self) -> bool {
        if !self.navigation.attach() {
            return false;
        }
        self.guards.progress = Some(ProgressGuard);
        self.suspended_at = Some(Utc::now());
        self.epoch += 1;
        tracing::debug!(tab_id = %self.id, epoch = self.epoch, "Tab suspended");
        true
    }

    pub fn guard_restore(&mut self) {
        self.guards.restore = Some(RestoreGuard);
    }

    pub fn settle_restore(&mut self) -> bool {
        self.guards.restore.take().is_some()
    }

    /// Leave the suspended state, replaying the captured navigation.
    pub fn resume(&mut self) -> Resumption {
        let resumption = self.navigation.resume();
        self.after_resume(&resumption);
        resumption
    }

    /// Leave the suspended state without replaying anything; the host is
    /// already loading the page.
    pub fn release(&mut self) -> bool {
        if !self.navigation.detach() {
            return false;
        }
        self.mark_loaded();
        true
    }

    pub fn load_uri(&mut self, request: LoadRequest, policy: &WhitelistPolicy) -> Interception {
        let interception = self.navigation.load_uri(request, policy);
        if interception == Interception::Released {
            self.mark_loaded();
        }
        interception
    }

    pub fn goto_index(&mut self, index: usize, policy: &WhitelistPolicy) -> Interception {
        let interception = self.navigation.goto_index(index, policy);
        if interception == Interception::Released {
            self.mark_loaded();
        }
        interception
    }

    pub fn reload(&mut self, flags: LoadFlags) -> Resumption {
        let resumption = self.navigation.reload(flags);
        self.after_resume(&resumption);
        resumption
    }

    /// Install fresh content after the host swapped the tab's document.
    /// The new interceptor starts detached.
    pub fn replace_navigation(&mut self, navigation: Box<dyn NavigationCapability>) {
        self.navigation = NavigationInterceptor::new(navigation);
        self.guards.progress = None;
        self.suspended_at = None;
        self.epoch += 1;
    }

    fn after_resume(&mut self, resumption: &Resumption) {
        if *resumption != Resumption::NotSuspended {
            self.mark_loaded();
        }
    }

    fn mark_loaded(&mut self) {
        self.guards.progress = None;
        self.suspended_at = None;
        self.epoch += 1;
        tracing::debug!(tab_id = %self.id, epoch = self.epoch, "Tab loaded");
    }
}

impl std::fmt::Debug for TabState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TabState")
            .field("id", &self.id)
            .field("suspended", &self.is_suspended())
            .field("guards", &self.guards)
            .field("epoch", &self.epoch)
            .field("suspended_at", &self.suspended_at)
            .finish()
    }
}
