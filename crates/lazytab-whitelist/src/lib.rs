//! lazytab Whitelists
//!
//! Two independent lists exempt navigation targets from suspension:
//! - host whitelist: any URL on a listed host loads normally
//! - URL whitelist: only the exact listed URL loads normally
//!
//! Lists are owned by a [`WhitelistStore`] and read fresh on every check,
//! so edits made elsewhere (a settings panel) apply immediately.

mod error;
mod policy;
mod store;

pub use error::WhitelistError;
pub use policy::{host_of, Toggled, WhitelistPolicy};
pub use store::{MemoryWhitelistStore, SettingsWhitelistStore, WhitelistStore};

pub type Result<T> = std::result::Result<T, WhitelistError>;
