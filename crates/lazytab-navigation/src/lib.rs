//! lazytab Navigation
//!
//! Wraps a tab's navigation capability so that, while the tab is
//! suspended, loads are captured instead of executed:
//! - `load_uri` / `goto_index` are stored as a single [`DeferredCall`]
//! - `reload` resumes whatever was captured
//! - `resume` replays the captured call against the real capability
//!
//! Also provides the metadata used to label a suspended tab (title and
//! favicon looked up from page history, with a URI-derived fallback).

mod capability;
mod error;
mod history;
mod interceptor;
mod metadata;
mod request;

pub use capability::{NavigationCapability, SessionHistoryEntry};
pub use error::NavigationError;
pub use history::HistoryMetadata;
pub use interceptor::{Interception, NavigationInterceptor, PlaceholderUpdate, Resumption};
pub use metadata::{
    describe, strip_fragment, title_from_uri, MetadataLookup, PageMetadata, Placeholder,
};
pub use request::{is_blank, DeferredCall, LoadFlags, LoadRequest, BLANK_URI};

pub type Result<T> = std::result::Result<T, NavigationError>;
