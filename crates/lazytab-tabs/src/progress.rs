//! Progress and restore guards
//!
//! Hosts can start loads below the navigation layer (form resubmission,
//! session restore internals). While a tab is suspended the
//! [`ProgressGuard`] turns those network starts back into deferred loads.
//! The [`RestoreGuard`] waits for the single network transition of a tab
//! restored from saved state.

use serde::{Deserialize, Serialize};

use lazytab_navigation::{LoadFlags, LoadRequest, BLANK_URI};
use lazytab_whitelist::WhitelistPolicy;

/// Schemes hosts use for placeholder documents.
const INTERNAL_SCHEMES: &[&str] = &["wyciwyg", "jar"];

/// Web-progress state bits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateFlags(pub u32);

impl StateFlags {
    pub const NONE: StateFlags = StateFlags(0);
    pub const START: StateFlags = StateFlags(0x0000_0001);
    pub const STOP: StateFlags = StateFlags(0x0000_0010);
    pub const IS_NETWORK: StateFlags = StateFlags(0x0004_0000);
    pub const RESTORING: StateFlags = StateFlags(0x0100_0000);

    pub fn contains(self, other: StateFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for StateFlags {
    type Output = StateFlags;

    fn bitor(self, rhs: StateFlags) -> StateFlags {
        StateFlags(self.0 | rhs.0)
    }
}

/// A load-state change reported by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub uri: Option<String>,
    pub referrer: Option<String>,
    pub post_data: Option<Vec<u8>>,
    pub flags: StateFlags,
}

impl ProgressEvent {
    pub fn new(uri: Option<String>, flags: StateFlags) -> Self {
        Self {
            uri,
            referrer: None,
            post_data: None,
            flags,
        }
    }

    /// A fresh network load, not one replayed from session state.
    pub fn is_network_start(&self) -> bool {
        self.flags.contains(StateFlags::START | StateFlags::IS_NETWORK)
            && !self.flags.contains(StateFlags::RESTORING)
    }
}

/// What to do with a suspended tab after a progress event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardVerdict {
    Ignore,
    /// The target is whitelisted; let the load through and unsuspend.
    Release,
    /// Stop the load and issue this one through the deferred path.
    Defer(LoadRequest),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressGuard;

impl ProgressGuard {
    pub fn inspect(&self, event: &ProgressEvent, suspended: bool, policy: &WhitelistPolicy) -> GuardVerdict {
        if !suspended || !event.is_network_start() {
            return GuardVerdict::Ignore;
        }
        let Some(uri) = event.uri.as_deref() else {
            return GuardVerdict::Ignore;
        };
        if is_internal(uri) {
            return GuardVerdict::Ignore;
        }
        if policy.permits(uri) {
            return GuardVerdict::Release;
        }

        GuardVerdict::Defer(LoadRequest {
            uri: uri.to_string(),
            flags: LoadFlags::BYPASS_HISTORY,
            referrer: event.referrer.clone(),
            post_data: event.post_data.clone(),
        })
    }
}

fn is_internal(uri: &str) -> bool {
    if uri == BLANK_URI {
        return true;
    }
    uri.split_once(':')
        .map(|(scheme, _)| INTERNAL_SCHEMES.iter().any(|s| scheme.eq_ignore_ascii_case(s)))
        .unwrap_or(false)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestoreGuard;

impl RestoreGuard {
    /// True once the restore has settled and the guard should go.
    pub fn observe(&self, event: &ProgressEvent) -> bool {
        event.flags.contains(StateFlags::IS_NETWORK)
    }
}

/// Guards attached to one tab.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GuardSet {
    pub progress: Option<ProgressGuard>,
    pub restore: Option<RestoreGuard>,
}

impl GuardSet {
    pub fn is_empty(&self) -> bool {
        self.progress.is_none() && self.restore.is_none()
    }
}
