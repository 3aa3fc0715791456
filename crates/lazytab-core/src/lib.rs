//! lazytab Core
//!
//! Coordination layer: defers loading of background, restored and idle
//! tabs until they are selected, and picks which tab to show when the
//! selected one is suspended or closed.

mod config;
mod controller;
mod error;
#[cfg(test)]
mod testing;

pub use config::{
    keys, validate, BackgroundTabMode, Config, Configuration, Preferences, SettingsConfiguration,
};
pub use controller::{MenuState, TabLifecycleController};
pub use error::CoreError;

// Re-export the building blocks hosts implement against
pub use lazytab_navigation::{
    HistoryMetadata, Interception, LoadFlags, LoadRequest, MetadataLookup, NavigationCapability,
    NavigationError, NavigationInterceptor, PageMetadata, Resumption, SessionHistoryEntry,
};
pub use lazytab_storage::{Database, StorageError};
pub use lazytab_tabs::{
    Host, ProgressEvent, ProgressEvents, SessionSnapshot, SessionStore, StateFlags, TabCollection, TabError,
    TabId,
};
pub use lazytab_whitelist::{
    MemoryWhitelistStore, SettingsWhitelistStore, Toggled, WhitelistError, WhitelistPolicy, WhitelistStore,
};

pub type Result<T> = std::result::Result<T, CoreError>;

/// Initialize logging
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt().with_env_filter(filter).with_target(true).init();
}
