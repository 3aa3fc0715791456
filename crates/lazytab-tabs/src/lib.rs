//! lazytab Tab Suspension
//!
//! Per-tab suspension state and the mechanisms around it:
//!
//! ```text
//! Loaded
//!   ↓ opened in background / restored / idle timeout / explicit suspend
//! Suspended  (navigation captured, ProgressGuard watching the network)
//!   ↓ selected / reload / explicit resume / whitelisted target
//! Loaded     (captured navigation replayed once)
//! ```
//!
//! The host tab strip is reached only through the traits in [`host`].

mod closest;
mod error;
pub mod host;
mod id;
mod idle;
mod progress;
mod registry;
mod scheduler;
mod state;

pub use closest::{ClosestTabSelector, TabRelations};
pub use error::TabError;
pub use host::{Host, ProgressEvents, SessionSnapshot, SessionStore, TabCollection};
pub use id::TabId;
pub use idle::{idle_duration, IdleTimer};
pub use progress::{GuardSet, GuardVerdict, ProgressEvent, ProgressGuard, RestoreGuard, StateFlags};
pub use registry::TabRegistry;
pub use scheduler::{Scheduler, TaskId};
pub use state::TabState;

pub type Result<T> = std::result::Result<T, TabError>;
