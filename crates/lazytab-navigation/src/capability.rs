//! The navigation capability a host attaches to every tab

use serde::{Deserialize, Serialize};

use crate::request::{LoadFlags, LoadRequest};

/// One entry of a tab's back/forward history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionHistoryEntry {
    pub uri: String,
    pub title: String,
    pub referrer: Option<String>,
}

/// Performs real network loads for one tab.
///
/// Implemented by the host's navigation backend. The core never calls it
/// directly for a suspended tab; it goes through a
/// [`NavigationInterceptor`](crate::NavigationInterceptor).
pub trait NavigationCapability {
    fn load_uri(&mut self, request: LoadRequest);
    fn goto_index(&mut self, index: usize);
    fn reload(&mut self, flags: LoadFlags);
    fn stop(&mut self);
    fn go_back(&mut self);
    fn go_forward(&mut self);

    fn current_uri(&self) -> Option<String>;
    fn can_go_back(&self) -> bool;
    fn can_go_forward(&self) -> bool;
    fn document_title(&self) -> Option<String>;
    fn history_len(&self) -> usize;
    fn history_entry(&self, index: usize) -> Option<SessionHistoryEntry>;
}
