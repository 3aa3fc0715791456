//! Tab lifecycle controller
//!
//! Owns the suspension state of every tab and reacts to the host's tab
//! strip events. All deferred work (placeholder labels, re-issued loads,
//! delayed loads on select, idle expiry) goes through one task queue on a
//! virtual clock advanced with [`TabLifecycleController::advance`].

use std::sync::Arc;
use std::time::Duration;

use lazytab_navigation::{
    describe, is_blank, Interception, LoadFlags, LoadRequest, MetadataLookup, NavigationCapability,
    NavigationInterceptor, Resumption,
};
use lazytab_tabs::{
    ClosestTabSelector, GuardVerdict, Host, IdleTimer, ProgressEvent, Scheduler, TabId, TabRegistry,
    TabRelations, TaskId,
};
use lazytab_whitelist::{host_of, Toggled, WhitelistPolicy};

use crate::config::{BackgroundTabMode, Configuration, Preferences};
use crate::Result;

/// Delay before labelling a tab whose load carried no referrer.
const PENDING_LOCATION_DELAY: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, PartialEq, Eq)]
enum Task {
    Placeholder {
        tab: TabId,
        epoch: u64,
        uri: String,
        title: Option<String>,
        fake_location: bool,
    },
    Reissue {
        tab: TabId,
        epoch: u64,
        request: LoadRequest,
    },
    LoadOnSelect {
        tab: TabId,
        epoch: u64,
    },
    IdleExpired {
        tab: TabId,
    },
}

/// What a tab context menu shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuState {
    /// `None` hides the whitelist entries.
    pub host: Option<String>,
    pub host_whitelisted: bool,
    pub url_whitelisted: bool,
    pub can_unload: bool,
}

pub struct TabLifecycleController<H: Host> {
    host: H,
    policy: WhitelistPolicy,
    metadata: Arc<dyn MetadataLookup>,
    prefs: Preferences,
    registry: TabRegistry,
    idle: IdleTimer,
    scheduler: Scheduler<Task>,
}

impl<H: Host> TabLifecycleController<H> {
    pub fn new(
        host: H,
        policy: WhitelistPolicy,
        metadata: Arc<dyn MetadataLookup>,
        config: Arc<dyn Configuration>,
    ) -> Self {
        let idle = IdleTimer::new(host.selected());
        Self {
            host,
            policy,
            metadata,
            prefs: Preferences::new(config),
            registry: TabRegistry::new(),
            idle,
            scheduler: Scheduler::new(),
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn preferences(&self) -> &Preferences {
        &self.prefs
    }

    pub fn policy(&self) -> &WhitelistPolicy {
        &self.policy
    }

    // === Host events ===

    pub fn on_tab_open(&mut self, tab: TabId, navigation: Box<dyn NavigationCapability>) {
        self.registry.register(tab, navigation);
        if self.host.selected() == Some(tab) {
            return;
        }

        match self.prefs.background_tabs() {
            BackgroundTabMode::Defer => self.park(tab, false),
            // Loading in the background starts its idle period right away
            BackgroundTabMode::Load => self.arm_idle(tab),
        }
    }

    pub fn on_tab_restoring(&mut self, tab: TabId) {
        if !self.registry.contains(tab) {
            tracing::debug!(tab_id = %tab, "Restore event for unknown tab");
            return;
        }
        if !self.prefs.defer_restored_tabs()
            || self.host.selected() == Some(tab)
            || self.registry.is_suspended(tab)
        {
            return;
        }
        self.park(tab, true);
    }

    pub fn on_tab_select(&mut self, tab: TabId) {
        let previous = self.idle.on_select(tab);

        let suspended = self.registry.get(tab).ok().filter(|state| state.is_suspended()).map(|state| {
            let blank = state.navigation().current_uri().map_or(true, |uri| is_blank(&uri));
            (blank, state.epoch())
        });
        if let Some((blank, epoch)) = suspended {
            // A blank tab has nothing worth waiting for
            let delay = self.prefs.load_on_select_delay();
            if blank || delay.is_zero() {
                self.resume_tab(tab);
            } else {
                tracing::debug!(tab_id = %tab, delay_ms = delay.as_millis() as u64, "Delaying load of selected tab");
                self.scheduler.schedule(delay, Task::LoadOnSelect { tab, epoch });
            }
        }

        if let Some(previous) = previous {
            self.arm_idle(previous);
        }
        self.idle.disarm(&mut self.scheduler, tab);
    }

    pub fn on_tab_close(&mut self, tab: TabId) {
        if self.prefs.find_closest_loaded_tab() && self.host.selected() == Some(tab) {
            if let Some(substitute) = self.closest_loaded_tab(tab) {
                self.select(substitute);
            }
        }

        self.idle.on_close(&mut self.scheduler, tab);
        if let Some(state) = self.registry.remove(tab) {
            if state.is_subscribed() {
                self.host.unsubscribe(tab);
            }
        }
    }

    pub fn on_state_change(&mut self, tab: TabId, event: &ProgressEvent) {
        let Ok(state) = self.registry.get_mut(tab) else {
            tracing::debug!(tab_id = %tab, "Progress event for unknown tab");
            return;
        };

        if let Some(restore) = state.guards().restore {
            if restore.observe(event) {
                state.settle_restore();
                tracing::debug!(tab_id = %tab, "Restore settled");
            }
        }

        if let Some(progress) = state.guards().progress {
            match progress.inspect(event, state.is_suspended(), &self.policy) {
                GuardVerdict::Ignore => {}
                GuardVerdict::Release => {
                    state.release();
                    tracing::info!(tab_id = %tab, "Whitelisted load released tab");
                }
                GuardVerdict::Defer(request) => {
                    state.navigation_mut().stop();
                    let epoch = state.epoch();
                    tracing::debug!(tab_id = %tab, uri = %request.uri, "Re-issuing load through deferred path");
                    self.scheduler.schedule(Duration::ZERO, Task::Reissue { tab, epoch, request });
                }
            }
        }

        self.sync_subscription(tab);
    }

    // === Navigation ===

    pub fn navigation(&self, tab: TabId) -> Result<&NavigationInterceptor> {
        Ok(self.registry.get(tab)?.navigation())
    }

    pub fn load_uri(&mut self, tab: TabId, request: LoadRequest) -> Result<Interception> {
        let state = self.registry.get_mut(tab)?;
        let interception = state.load_uri(request, &self.policy);
        let epoch = state.epoch();
        self.after_interception(tab, epoch, &interception);
        Ok(interception)
    }

    pub fn goto_index(&mut self, tab: TabId, index: usize) -> Result<Interception> {
        let state = self.registry.get_mut(tab)?;
        let interception = state.goto_index(index, &self.policy);
        let epoch = state.epoch();
        self.after_interception(tab, epoch, &interception);
        Ok(interception)
    }

    pub fn reload(&mut self, tab: TabId, flags: LoadFlags) -> Result<Resumption> {
        let resumption = self.registry.get_mut(tab)?.reload(flags);
        self.sync_subscription(tab);
        Ok(resumption)
    }

    pub fn stop(&mut self, tab: TabId) -> Result<()> {
        self.registry.get_mut(tab)?.navigation_mut().stop();
        Ok(())
    }

    pub fn go_back(&mut self, tab: TabId) -> Result<()> {
        self.registry.get_mut(tab)?.navigation_mut().go_back();
        Ok(())
    }

    pub fn go_forward(&mut self, tab: TabId) -> Result<()> {
        self.registry.get_mut(tab)?.navigation_mut().go_forward();
        Ok(())
    }

    // === Time ===

    /// Move the clock forward by `delta`, running every task that falls
    /// due on the way.
    pub fn advance(&mut self, delta: Duration) {
        let until = self.scheduler.now() + delta;
        while let Some((task_id, task)) = self.scheduler.pop_due(until) {
            self.run_task(task_id, task);
        }
        self.scheduler.advance_to(until);
    }

    /// Run work queued with zero delay.
    pub fn run_pending(&mut self) {
        self.advance(Duration::ZERO);
    }

    /// Time until the next queued task falls due, for hosts that sleep
    /// between calls to [`advance`](Self::advance).
    pub fn next_deadline(&self) -> Option<Duration> {
        self.scheduler
            .next_deadline()
            .map(|deadline| deadline.saturating_sub(self.scheduler.now()))
    }

    pub fn pending_tasks(&self) -> usize {
        self.scheduler.task_count()
    }

    // === Public operations ===

    pub fn is_suspended(&self, tab: TabId) -> bool {
        self.registry.is_suspended(tab)
    }

    pub fn is_host_whitelisted(&self, uri: &str) -> bool {
        self.policy.is_host_whitelisted(uri)
    }

    pub fn is_url_whitelisted(&self, uri: &str) -> bool {
        self.policy.is_url_whitelisted(uri)
    }

    /// Unload a tab's content. Returns false when there was nothing to do.
    pub fn suspend(&mut self, tab: TabId) -> Result<bool> {
        let state = self.registry.get(tab)?;
        if state.is_suspended() {
            return Ok(false);
        }
        let Some(location) = state.navigation().current_uri().filter(|uri| !is_blank(uri)) else {
            tracing::debug!(tab_id = %tab, "Nothing loaded, not suspending");
            return Ok(false);
        };
        if self.policy.permits(&location) {
            tracing::debug!(tab_id = %tab, uri = %location, "Whitelisted, not suspending");
            return Ok(false);
        }

        if self.host.selected() == Some(tab) {
            if let Some(substitute) = self.closest_loaded_tab(tab) {
                self.select(substitute);
            }
        }

        let snapshot = self.host.capture_state(tab);
        let parent = self.host.parent(tab);
        let children = self.host.children(tab);
        let index = self
            .host
            .position(tab)
            .map(|p| p + 1)
            .unwrap_or_else(|| self.host.tabs().len());

        let (donor, navigation) = self.host.open_blank_tab(index);
        self.host.swap_contents_and_close(tab, donor);

        self.idle.disarm(&mut self.scheduler, tab);
        let state = self.registry.get_mut(tab)?;
        state.replace_navigation(navigation);
        state.suspend();
        self.sync_subscription(tab);

        if self.host.supports_tree() {
            if let Some(parent) = parent {
                self.host.attach_child(tab, parent);
            }
            for child in children {
                self.host.attach_child(child, tab);
            }
        }

        if let Some(snapshot) = snapshot {
            self.host.restore_state(tab, snapshot);
        }

        tracing::info!(tab_id = %tab, uri = %location, "Suspended tab");
        Ok(true)
    }

    /// Load a suspended tab. Returns false if it was not suspended.
    pub fn resume(&mut self, tab: TabId) -> Result<bool> {
        self.registry.get(tab)?;
        Ok(self.resume_tab(tab))
    }

    /// Select `tab` and suspend every other tab. Returns how many were
    /// suspended.
    pub fn suspend_all_except(&mut self, tab: TabId) -> Result<usize> {
        self.registry.get(tab)?;
        if self.host.selected() != Some(tab) {
            self.select(tab);
        }

        let others: Vec<TabId> = if self.prefs.unload_only_visible_tabs() {
            self.host.visible_tabs()
        } else {
            self.host.tabs()
        };

        let mut suspended = 0;
        for other in others.into_iter().filter(|t| *t != tab) {
            match self.suspend(other) {
                Ok(true) => suspended += 1,
                Ok(false) => {}
                Err(e) => tracing::warn!(tab_id = %other, error = %e, "Failed to suspend tab"),
            }
        }

        tracing::info!(tab_id = %tab, suspended, "Suspended other tabs");
        Ok(suspended)
    }

    pub fn toggle_host_whitelist(&self, tab: TabId) -> Result<Option<Toggled>> {
        let Some(location) = self.navigation(tab)?.current_uri() else {
            return Ok(None);
        };
        Ok(self.policy.toggle_host(&location)?)
    }

    pub fn toggle_url_whitelist(&self, tab: TabId) -> Result<Option<Toggled>> {
        let Some(location) = self.navigation(tab)?.current_uri() else {
            return Ok(None);
        };
        Ok(self.policy.toggle_url(&location)?)
    }

    pub fn menu_state(&self, tab: TabId) -> Result<MenuState> {
        let state = self.registry.get(tab)?;
        let location = state.navigation().current_uri().filter(|uri| !is_blank(uri));

        let Some(location) = location else {
            return Ok(MenuState {
                host: None,
                host_whitelisted: false,
                url_whitelisted: false,
                can_unload: false,
            });
        };

        let host_whitelisted = self.policy.is_host_whitelisted(&location);
        let url_whitelisted = self.policy.is_url_whitelisted(&location);
        Ok(MenuState {
            host: host_of(&location),
            host_whitelisted,
            url_whitelisted,
            can_unload: !state.is_suspended() && !host_whitelisted && !url_whitelisted,
        })
    }

    // === Internals ===

    fn select(&mut self, tab: TabId) {
        self.host.select(tab);
        self.on_tab_select(tab);
    }

    fn closest_loaded_tab(&self, tab: TabId) -> Option<TabId> {
        let visible = self.host.visible_tabs();
        let relations = TabRelations {
            tab,
            owner: self.host.owner(tab),
            next_sibling: self.host.next_sibling(tab),
        };
        let registry = &self.registry;
        ClosestTabSelector::new(self.prefs.select_owner_on_close())
            .select(&visible, &relations, |id| registry.is_suspended(id))
    }

    /// Start a tab suspended in place.
    fn park(&mut self, tab: TabId, restoring: bool) {
        let Ok(state) = self.registry.get_mut(tab) else {
            return;
        };
        state.suspend();
        if restoring {
            state.guard_restore();
        }
        self.idle.disarm(&mut self.scheduler, tab);
        self.sync_subscription(tab);
        tracing::debug!(tab_id = %tab, restoring, "Tab starts suspended");
    }

    fn resume_tab(&mut self, tab: TabId) -> bool {
        let Ok(state) = self.registry.get_mut(tab) else {
            return false;
        };
        let resumption = state.resume();
        self.sync_subscription(tab);
        match resumption {
            Resumption::NotSuspended => false,
            Resumption::Blank => {
                tracing::info!(tab_id = %tab, "Resumed tab with nothing to load");
                true
            }
            Resumption::Replayed(call) => {
                tracing::info!(tab_id = %tab, call = ?call, "Resumed tab");
                true
            }
        }
    }

    fn arm_idle(&mut self, tab: TabId) {
        if !self.prefs.unload_after_timeout() || !self.registry.contains(tab) || self.registry.is_suspended(tab) {
            return;
        }
        let period = self.prefs.idle_period();
        self.idle.arm(&mut self.scheduler, tab, period, Task::IdleExpired { tab });
    }

    fn after_interception(&mut self, tab: TabId, epoch: u64, interception: &Interception) {
        match interception {
            Interception::Forwarded => {}
            Interception::Released => {
                tracing::info!(tab_id = %tab, "Whitelisted navigation released tab");
            }
            Interception::Deferred(update) => {
                self.host.set_busy(tab, false);
                let placeholder = update.as_ref().map(|update| {
                    let delay = if update.location_pending {
                        PENDING_LOCATION_DELAY
                    } else {
                        Duration::ZERO
                    };
                    self.scheduler.schedule(
                        delay,
                        Task::Placeholder {
                            tab,
                            epoch,
                            uri: update.uri.clone(),
                            title: update.title.clone(),
                            fake_location: update.location_pending,
                        },
                    )
                });
                // Only the latest captured call may relabel the tab
                if let Ok(state) = self.registry.get_mut(tab) {
                    if let Some(superseded) = state.replace_placeholder(placeholder) {
                        self.scheduler.cancel(superseded);
                    }
                }
            }
        }
        self.sync_subscription(tab);
    }

    /// Keep the host's progress subscription in line with the tab's guards.
    fn sync_subscription(&mut self, tab: TabId) {
        let Ok(state) = self.registry.get_mut(tab) else {
            return;
        };
        let wants = state.wants_progress_events();
        if wants == state.is_subscribed() {
            return;
        }
        state.set_subscribed(wants);
        if wants {
            self.host.subscribe(tab);
        } else {
            self.host.unsubscribe(tab);
        }
    }

    /// The tab's current epoch if it is still suspended.
    fn live_epoch(&self, tab: TabId) -> Option<u64> {
        self.registry
            .get(tab)
            .ok()
            .filter(|state| state.is_suspended())
            .map(|state| state.epoch())
    }

    fn run_task(&mut self, task_id: TaskId, task: Task) {
        match task {
            Task::Placeholder {
                tab,
                epoch,
                uri,
                title,
                fake_location,
            } => {
                if self.live_epoch(tab) != Some(epoch) {
                    return;
                }
                if let Ok(state) = self.registry.get_mut(tab) {
                    state.replace_placeholder(None);
                }
                if fake_location {
                    if let Ok(state) = self.registry.get_mut(tab) {
                        state.navigation_mut().fake_location(&uri);
                    }
                }
                let placeholder = describe(self.metadata.as_ref(), &uri, title.as_deref());
                self.host.set_label(tab, &placeholder.title);
                self.host.set_icon(tab, placeholder.icon.as_deref());
            }
            Task::Reissue { tab, epoch, request } => {
                if self.live_epoch(tab) != Some(epoch) {
                    tracing::debug!(tab_id = %tab, uri = %request.uri, "Dropping stale re-issued load");
                    return;
                }
                if let Err(e) = self.load_uri(tab, request) {
                    tracing::warn!(tab_id = %tab, error = %e, "Failed to re-issue load");
                }
            }
            Task::LoadOnSelect { tab, epoch } => {
                if self.live_epoch(tab) == Some(epoch) && self.host.selected() == Some(tab) {
                    self.resume_tab(tab);
                }
            }
            Task::IdleExpired { tab } => {
                if !self.idle.expire(tab, task_id) {
                    return;
                }
                tracing::debug!(tab_id = %tab, "Idle period elapsed");
                if let Err(e) = self.suspend(tab) {
                    tracing::warn!(tab_id = %tab, error = %e, "Failed to suspend idle tab");
                }
            }
        }
    }
}
