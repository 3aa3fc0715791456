//! Navigation interceptor
//!
//! Sits between a tab and its [`NavigationCapability`]. Detached, every
//! call goes straight through. Attached (the tab is suspended), loads are
//! captured into a single [`DeferredCall`] slot, last write wins, and are
//! replayed by [`NavigationInterceptor::resume`].

use lazytab_whitelist::WhitelistPolicy;

use crate::capability::{NavigationCapability, SessionHistoryEntry};
use crate::request::{DeferredCall, LoadFlags, LoadRequest};

/// What happened to an intercepted call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interception {
    /// The call reached the wrapped capability.
    Forwarded,
    /// The target is whitelisted: the interceptor detached and forwarded.
    Released,
    /// The call was captured. Carries what the tab should display, if the
    /// target is known.
    Deferred(Option<PlaceholderUpdate>),
}

/// Display state for a captured navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderUpdate {
    pub uri: String,
    /// Title recorded in session history, if any
    pub title: Option<String>,
    /// The location is not faked yet. Loads without a referrer usually
    /// come from outside the browser, whose own title/location assignment
    /// would race an immediate update.
    pub location_pending: bool,
}

/// Result of resuming a tab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resumption {
    /// The interceptor was not attached; nothing happened.
    NotSuspended,
    /// Detached with nothing to replay.
    Blank,
    /// Detached and replayed this call.
    Replayed(DeferredCall),
}

#[derive(Debug, Default)]
struct Deferral {
    pending: Option<DeferredCall>,
    fake_location: Option<String>,
    referrer: Option<String>,
}

pub struct NavigationInterceptor {
    original: Box<dyn NavigationCapability>,
    deferral: Option<Deferral>,
}

impl NavigationInterceptor {
    /// Wrap a capability, detached.
    pub fn new(original: Box<dyn NavigationCapability>) -> Self {
        Self {
            original,
            deferral: None,
        }
    }

    /// Start capturing loads. Returns false if already attached.
    pub fn attach(&mut self) -> bool {
        if self.deferral.is_some() {
            return false;
        }
        self.deferral = Some(Deferral::default());
        true
    }

    /// Stop capturing and discard any captured call.
    pub fn detach(&mut self) -> bool {
        match self.deferral.take() {
            Some(deferral) => {
                if let Some(call) = deferral.pending {
                    tracing::debug!(call = ?call, "Discarding deferred navigation");
                }
                true
            }
            None => false,
        }
    }

    pub fn is_attached(&self) -> bool {
        self.deferral.is_some()
    }

    pub fn pending_call(&self) -> Option<&DeferredCall> {
        self.deferral.as_ref().and_then(|d| d.pending.as_ref())
    }

    pub fn load_uri(&mut self, request: LoadRequest, policy: &WhitelistPolicy) -> Interception {
        // Blank loads never have suspension side effects
        if !self.is_attached() || request.is_blank() {
            self.original.load_uri(request);
            return Interception::Forwarded;
        }

        if policy.permits(&request.uri) {
            tracing::debug!(uri = %request.uri, "Whitelisted load releases tab");
            self.detach();
            self.original.load_uri(request);
            return Interception::Released;
        }

        self.original.stop();

        let uri = request.uri.clone();
        let location_pending = request.referrer.is_none();
        if let Some(deferral) = self.deferral.as_mut() {
            if !location_pending {
                deferral.fake_location = Some(uri.clone());
            }
            deferral.referrer = request.referrer.clone();
            deferral.pending = Some(DeferredCall::LoadUri(request));
        }

        tracing::debug!(uri = %uri, "Deferred load");

        Interception::Deferred(Some(PlaceholderUpdate {
            uri,
            title: None,
            location_pending,
        }))
    }

    pub fn goto_index(&mut self, index: usize, policy: &WhitelistPolicy) -> Interception {
        if !self.is_attached() {
            self.original.goto_index(index);
            return Interception::Forwarded;
        }

        let entry = self.original.history_entry(index);
        if let Some(entry) = &entry {
            if policy.permits(&entry.uri) {
                tracing::debug!(uri = %entry.uri, "Whitelisted history entry releases tab");
                self.detach();
                self.original.goto_index(index);
                return Interception::Released;
            }
        }

        self.original.stop();

        let Some(deferral) = self.deferral.as_mut() else {
            return Interception::Forwarded;
        };
        deferral.pending = Some(DeferredCall::GotoIndex(index));

        match entry {
            Some(entry) => {
                deferral.fake_location = Some(entry.uri.clone());
                deferral.referrer = entry.referrer;
                tracing::debug!(index, uri = %entry.uri, "Deferred history navigation");
                Interception::Deferred(Some(PlaceholderUpdate {
                    uri: entry.uri,
                    title: Some(entry.title).filter(|t| !t.is_empty()),
                    location_pending: false,
                }))
            }
            None => {
                tracing::debug!(index, "Deferred history navigation to unknown entry");
                Interception::Deferred(None)
            }
        }
    }

    /// Reloading a suspended tab resumes it; otherwise the reload is
    /// forwarded and `NotSuspended` returned.
    pub fn reload(&mut self, flags: LoadFlags) -> Resumption {
        if self.is_attached() {
            return self.resume();
        }
        self.original.reload(flags);
        Resumption::NotSuspended
    }

    /// Detach, drop the faked location, and replay the captured call.
    pub fn resume(&mut self) -> Resumption {
        let Some(deferral) = self.deferral.take() else {
            return Resumption::NotSuspended;
        };

        match deferral.pending {
            None => Resumption::Blank,
            Some(call) => {
                match &call {
                    DeferredCall::GotoIndex(index) => self.original.goto_index(*index),
                    DeferredCall::LoadUri(request) => self.original.load_uri(request.clone()),
                }
                tracing::debug!(call = ?call, "Replayed deferred navigation");
                Resumption::Replayed(call)
            }
        }
    }

    /// Show `uri` as the current location while suspended.
    pub fn fake_location(&mut self, uri: &str) -> bool {
        match self.deferral.as_mut() {
            Some(deferral) => {
                deferral.fake_location = Some(uri.to_string());
                true
            }
            None => false,
        }
    }

    pub fn current_uri(&self) -> Option<String> {
        self.deferral
            .as_ref()
            .and_then(|d| d.fake_location.clone())
            .or_else(|| self.original.current_uri())
    }

    /// Referrer of the captured navigation, else the current location.
    pub fn referring_uri(&self) -> Option<String> {
        self.deferral
            .as_ref()
            .and_then(|d| d.referrer.clone())
            .or_else(|| self.original.current_uri())
    }

    pub fn stop(&mut self) {
        self.original.stop();
    }

    pub fn go_back(&mut self) {
        self.original.go_back();
    }

    pub fn go_forward(&mut self) {
        self.original.go_forward();
    }

    pub fn can_go_back(&self) -> bool {
        self.original.can_go_back()
    }

    pub fn can_go_forward(&self) -> bool {
        self.original.can_go_forward()
    }

    pub fn document_title(&self) -> Option<String> {
        self.original.document_title()
    }

    pub fn history_len(&self) -> usize {
        self.original.history_len()
    }

    pub fn history_entry(&self, index: usize) -> Option<SessionHistoryEntry> {
        self.original.history_entry(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lazytab_whitelist::{MemoryWhitelistStore, WhitelistStore};
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::sync::Arc;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Load(LoadRequest),
        Goto(usize),
        Reload(LoadFlags),
        Stop,
    }

    #[derive(Default)]
    struct Backend {
        calls: Vec<Call>,
        current: Option<String>,
        history: Vec<SessionHistoryEntry>,
    }

    struct FakeNavigation(Rc<RefCell<Backend>>);

    impl NavigationCapability for FakeNavigation {
        fn load_uri(&mut self, request: LoadRequest) {
            let mut backend = self.0.borrow_mut();
            backend.current = Some(request.uri.clone());
            backend.calls.push(Call::Load(request));
        }
        fn goto_index(&mut self, index: usize) {
            self.0.borrow_mut().calls.push(Call::Goto(index));
        }
        fn reload(&mut self, flags: LoadFlags) {
            self.0.borrow_mut().calls.push(Call::Reload(flags));
        }
        fn stop(&mut self) {
            self.0.borrow_mut().calls.push(Call::Stop);
        }
        fn go_back(&mut self) {}
        fn go_forward(&mut self) {}
        fn current_uri(&self) -> Option<String> {
            self.0.borrow().current.clone()
        }
        fn can_go_back(&self) -> bool {
            self.0.borrow().history.len() > 1
        }
        fn can_go_forward(&self) -> bool {
            false
        }
        fn document_title(&self) -> Option<String> {
            None
        }
        fn history_len(&self) -> usize {
            self.0.borrow().history.len()
        }
        fn history_entry(&self, index: usize) -> Option<SessionHistoryEntry> {
            self.0.borrow().history.get(index).cloned()
        }
    }

    fn setup() -> (Rc<RefCell<Backend>>, NavigationInterceptor, WhitelistPolicy, Arc<MemoryWhitelistStore>) {
        let backend = Rc::new(RefCell::new(Backend::default()));
        let interceptor = NavigationInterceptor::new(Box::new(FakeNavigation(backend.clone())));
        let store = Arc::new(MemoryWhitelistStore::new());
        let policy = WhitelistPolicy::new(store.clone());
        (backend, interceptor, policy, store)
    }

    fn loads(backend: &Rc<RefCell<Backend>>) -> Vec<LoadRequest> {
        backend
            .borrow()
            .calls
            .iter()
            .filter_map(|c| match c {
                Call::Load(r) => Some(r.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_detached_forwards() {
        let (backend, mut nav, policy, _) = setup();

        let outcome = nav.load_uri(LoadRequest::new("https://example.com/"), &policy);
        assert_eq!(outcome, Interception::Forwarded);
        assert_eq!(loads(&backend).len(), 1);
        assert_eq!(nav.reload(LoadFlags::BYPASS_CACHE), Resumption::NotSuspended);
        assert_eq!(backend.borrow().calls.last(), Some(&Call::Reload(LoadFlags::BYPASS_CACHE)));
    }

    #[test]
    fn test_attached_captures_without_loading() {
        let (backend, mut nav, policy, _) = setup();
        nav.attach();

        let request = LoadRequest::new("https://example.com/article")
            .with_flags(LoadFlags::IS_LINK)
            .with_referrer("https://example.com/")
            .with_post_data(b"q=rust".to_vec());
        let outcome = nav.load_uri(request.clone(), &policy);

        assert_eq!(
            outcome,
            Interception::Deferred(Some(PlaceholderUpdate {
                uri: "https://example.com/article".to_string(),
                title: None,
                location_pending: false,
            }))
        );
        assert!(loads(&backend).is_empty());
        assert_eq!(backend.borrow().calls, vec![Call::Stop]);
        assert_eq!(nav.pending_call(), Some(&DeferredCall::LoadUri(request.clone())));
        assert_eq!(nav.current_uri().as_deref(), Some("https://example.com/article"));
        assert_eq!(nav.referring_uri().as_deref(), Some("https://example.com/"));

        assert_eq!(nav.resume(), Resumption::Replayed(DeferredCall::LoadUri(request.clone())));
        assert_eq!(loads(&backend), vec![request]);
        assert!(!nav.is_attached());
        assert!(nav.pending_call().is_none());
    }

    #[test]
    fn test_last_write_wins() {
        let (backend, mut nav, policy, _) = setup();
        nav.attach();

        nav.load_uri(LoadRequest::new("https://a.example/"), &policy);
        nav.load_uri(LoadRequest::new("https://b.example/"), &policy);
        nav.resume();

        assert_eq!(loads(&backend), vec![LoadRequest::new("https://b.example/")]);
    }

    #[test]
    fn test_later_load_replaces_referrer() {
        let (_, mut nav, policy, _) = setup();
        nav.attach();

        nav.load_uri(
            LoadRequest::new("https://a.example/").with_referrer("https://r.example/"),
            &policy,
        );
        assert_eq!(nav.referring_uri().as_deref(), Some("https://r.example/"));

        nav.load_uri(LoadRequest::new("https://b.example/"), &policy);
        assert_eq!(nav.referring_uri(), None);
    }

    #[test]
    fn test_referrerless_location_is_pending() {
        let (_, mut nav, policy, _) = setup();
        nav.attach();

        let outcome = nav.load_uri(LoadRequest::new("https://example.com/"), &policy);
        match outcome {
            Interception::Deferred(Some(update)) => assert!(update.location_pending),
            other => panic!("Expected Deferred, got {:?}", other),
        }
        assert_eq!(nav.current_uri(), None);

        assert!(nav.fake_location("https://example.com/"));
        assert_eq!(nav.current_uri().as_deref(), Some("https://example.com/"));
    }

    #[test]
    fn test_blank_passes_through() {
        let (backend, mut nav, policy, _) = setup();
        nav.attach();

        assert_eq!(nav.load_uri(LoadRequest::new("about:blank"), &policy), Interception::Forwarded);
        assert!(nav.is_attached());
        assert!(nav.pending_call().is_none());
        assert_eq!(loads(&backend), vec![LoadRequest::new("about:blank")]);
    }

    #[test]
    fn test_whitelisted_load_releases() {
        let (backend, mut nav, policy, store) = setup();
        store.set_hosts(&["example.com".to_string()]).unwrap();
        nav.attach();

        let outcome = nav.load_uri(LoadRequest::new("https://example.com/x"), &policy);
        assert_eq!(outcome, Interception::Released);
        assert!(!nav.is_attached());
        assert_eq!(loads(&backend), vec![LoadRequest::new("https://example.com/x")]);
    }

    #[test]
    fn test_goto_index_uses_history_entry() {
        let (backend, mut nav, policy, _) = setup();
        backend.borrow_mut().history = vec![
            SessionHistoryEntry {
                uri: "https://example.com/".to_string(),
                title: "Example".to_string(),
                referrer: None,
            },
            SessionHistoryEntry {
                uri: "https://example.com/next".to_string(),
                title: String::new(),
                referrer: Some("https://example.com/".to_string()),
            },
        ];
        nav.attach();

        let outcome = nav.goto_index(1, &policy);
        assert_eq!(
            outcome,
            Interception::Deferred(Some(PlaceholderUpdate {
                uri: "https://example.com/next".to_string(),
                title: None,
                location_pending: false,
            }))
        );
        assert_eq!(nav.current_uri().as_deref(), Some("https://example.com/next"));
        assert_eq!(nav.referring_uri().as_deref(), Some("https://example.com/"));
        assert!(!backend.borrow().calls.contains(&Call::Goto(1)));

        assert_eq!(nav.reload(LoadFlags::NONE), Resumption::Replayed(DeferredCall::GotoIndex(1)));
        assert_eq!(backend.borrow().calls.last(), Some(&Call::Goto(1)));
    }

    #[test]
    fn test_goto_unknown_entry_is_captured() {
        let (backend, mut nav, policy, _) = setup();
        nav.attach();

        assert_eq!(nav.goto_index(4, &policy), Interception::Deferred(None));
        assert_eq!(nav.pending_call(), Some(&DeferredCall::GotoIndex(4)));
        assert!(!backend.borrow().calls.contains(&Call::Goto(4)));
    }

    #[test]
    fn test_resume_is_idempotent() {
        let (backend, mut nav, policy, _) = setup();
        nav.attach();
        nav.load_uri(
            LoadRequest::new("https://example.com/").with_referrer("https://r.example/"),
            &policy,
        );

        assert!(matches!(nav.resume(), Resumption::Replayed(_)));
        assert_eq!(nav.resume(), Resumption::NotSuspended);
        assert_eq!(loads(&backend).len(), 1);
    }

    #[test]
    fn test_blank_resume_and_detach_discards() {
        let (backend, mut nav, policy, _) = setup();
        nav.attach();
        assert_eq!(nav.resume(), Resumption::Blank);

        nav.attach();
        nav.load_uri(LoadRequest::new("https://example.com/"), &policy);
        assert!(nav.detach());
        assert!(!nav.detach());
        assert_eq!(nav.resume(), Resumption::NotSuspended);
        assert!(loads(&backend).is_empty());
        assert!(!nav.fake_location("https://example.com/"));
    }
}
