//! Whitelist lookups and toggles

use serde::Serialize;
use std::sync::Arc;
use url::Url;

use crate::store::WhitelistStore;
use crate::Result;

/// Outcome of toggling a whitelist entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Toggled {
    Added,
    Removed,
}

/// Host component of `uri`, if it has one.
///
/// URIs without a host (`about:`, `file:`, `data:`, unparsable input) return
/// `None`; callers treat that as "not whitelistable".
pub fn host_of(uri: &str) -> Option<String> {
    let parsed = Url::parse(uri).ok()?;
    parsed
        .host_str()
        .filter(|host| !host.is_empty())
        .map(|host| host.to_lowercase())
}

fn canonical(uri: &str) -> String {
    Url::parse(uri)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| uri.to_string())
}

/// Decides whether a navigation target bypasses suspension.
#[derive(Clone)]
pub struct WhitelistPolicy {
    store: Arc<dyn WhitelistStore>,
}

impl WhitelistPolicy {
    pub fn new(store: Arc<dyn WhitelistStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn WhitelistStore> {
        &self.store
    }

    /// True if the URI's host is on the host whitelist.
    pub fn is_host_whitelisted(&self, uri: &str) -> bool {
        let Some(host) = host_of(uri) else {
            return false;
        };

        match self.store.hosts() {
            Ok(hosts) => hosts.iter().any(|entry| entry.eq_ignore_ascii_case(&host)),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read host whitelist");
                false
            }
        }
    }

    /// True if the URI itself is on the URL whitelist.
    pub fn is_url_whitelisted(&self, uri: &str) -> bool {
        if host_of(uri).is_none() {
            return false;
        }
        let target = canonical(uri);

        match self.store.urls() {
            Ok(urls) => urls
                .iter()
                .any(|entry| *entry == target || canonical(entry) == target),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read URL whitelist");
                false
            }
        }
    }

    /// True if either list exempts the URI.
    pub fn permits(&self, uri: &str) -> bool {
        self.is_host_whitelisted(uri) || self.is_url_whitelisted(uri)
    }

    /// Add the URI's host to the host whitelist, or remove it if present.
    ///
    /// Returns `None` when the URI has no host.
    pub fn toggle_host(&self, uri: &str) -> Result<Option<Toggled>> {
        let Some(host) = host_of(uri) else {
            return Ok(None);
        };

        let mut hosts = self.store.hosts()?;
        let toggled = match hosts.iter().position(|h| h.eq_ignore_ascii_case(&host)) {
            Some(index) => {
                hosts.remove(index);
                Toggled::Removed
            }
            None => {
                hosts.push(host.clone());
                Toggled::Added
            }
        };
        self.store.set_hosts(&hosts)?;

        tracing::info!(host = %host, result = ?toggled, "Toggled host whitelist");

        Ok(Some(toggled))
    }

    /// Add the exact URI to the URL whitelist, or remove it if present.
    ///
    /// Returns `None` when the URI has no host.
    pub fn toggle_url(&self, uri: &str) -> Result<Option<Toggled>> {
        if host_of(uri).is_none() {
            return Ok(None);
        }
        let target = canonical(uri);

        let mut urls = self.store.urls()?;
        let toggled = match urls
            .iter()
            .position(|entry| *entry == target || canonical(entry) == target)
        {
            Some(index) => {
                urls.remove(index);
                Toggled::Removed
            }
            None => {
                urls.push(target.clone());
                Toggled::Added
            }
        };
        self.store.set_urls(&urls)?;

        tracing::info!(url = %target, result = ?toggled, "Toggled URL whitelist");

        Ok(Some(toggled))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryWhitelistStore;
    use crate::WhitelistError;

    fn policy_with(hosts: &[&str], urls: &[&str]) -> (Arc<MemoryWhitelistStore>, WhitelistPolicy) {
        let store = Arc::new(MemoryWhitelistStore::with_entries(
            hosts.iter().map(|s| s.to_string()).collect(),
            urls.iter().map(|s| s.to_string()).collect(),
        ));
        let policy = WhitelistPolicy::new(store.clone());
        (store, policy)
    }

    #[test]
    fn test_host_of() {
        assert_eq!(host_of("https://www.Example.com/a?b#c").as_deref(), Some("www.example.com"));
        assert_eq!(host_of("http://localhost:8080/").as_deref(), Some("localhost"));
        assert_eq!(host_of("about:blank"), None);
        assert_eq!(host_of("file:///home/user/notes.txt"), None);
        assert_eq!(host_of("not a uri"), None);
    }

    #[test]
    fn test_host_whitelist_matches_any_path() {
        let (_, policy) = policy_with(&["mail.example.com"], &[]);

        assert!(policy.is_host_whitelisted("https://mail.example.com/"));
        assert!(policy.is_host_whitelisted("https://mail.example.com/inbox?page=2"));
        assert!(!policy.is_host_whitelisted("https://example.com/"));
        assert!(!policy.is_url_whitelisted("https://mail.example.com/"));
        assert!(policy.permits("http://mail.example.com:8443/x"));
    }

    #[test]
    fn test_url_whitelist_is_exact() {
        let (_, policy) = policy_with(&[], &["https://example.com/dashboard"]);

        assert!(policy.is_url_whitelisted("https://example.com/dashboard"));
        assert!(!policy.is_url_whitelisted("https://example.com/dashboard/other"));
        assert!(!policy.is_host_whitelisted("https://example.com/dashboard"));
    }

    #[test]
    fn test_hostless_uris_fail_closed() {
        let (_, policy) = policy_with(&[""], &["file:///tmp/page.html"]);

        assert!(!policy.permits("file:///tmp/page.html"));
        assert!(!policy.permits("about:blank"));
        assert_eq!(policy.toggle_host("about:blank").unwrap(), None);
        assert_eq!(policy.toggle_url("file:///tmp/page.html").unwrap(), None);
    }

    #[test]
    fn test_toggle_host_roundtrip() {
        let (store, policy) = policy_with(&["rust-lang.org", "docs.rs"], &[]);
        let mut original = store.hosts().unwrap();

        assert_eq!(
            policy.toggle_host("https://example.com/page").unwrap(),
            Some(Toggled::Added)
        );
        assert!(policy.is_host_whitelisted("https://example.com/other"));

        assert_eq!(
            policy.toggle_host("https://example.com/again").unwrap(),
            Some(Toggled::Removed)
        );
        assert!(!policy.is_host_whitelisted("https://example.com/other"));

        let mut after = store.hosts().unwrap();
        original.sort();
        after.sort();
        assert_eq!(original, after);
    }

    #[test]
    fn test_toggle_url_roundtrip() {
        let (store, policy) = policy_with(&[], &[]);

        assert_eq!(
            policy.toggle_url("https://example.com").unwrap(),
            Some(Toggled::Added)
        );
        assert_eq!(store.urls().unwrap(), vec!["https://example.com/"]);
        assert!(policy.is_url_whitelisted("https://example.com/"));

        assert_eq!(
            policy.toggle_url("https://example.com/").unwrap(),
            Some(Toggled::Removed)
        );
        assert!(store.urls().unwrap().is_empty());
    }

    #[test]
    fn test_concurrent_edit_observed() {
        let (store, policy) = policy_with(&[], &[]);
        assert!(!policy.permits("https://example.com/"));

        store.set_hosts(&["example.com".to_string()]).unwrap();
        assert!(policy.permits("https://example.com/"));
    }

    struct BrokenStore;

    impl WhitelistStore for BrokenStore {
        fn hosts(&self) -> Result<Vec<String>> {
            Err(WhitelistError::Storage(
                lazytab_storage::StorageError::InvalidSetting {
                    key: "whitelist".to_string(),
                    reason: "unreadable".to_string(),
                },
            ))
        }
        fn set_hosts(&self, _hosts: &[String]) -> Result<()> {
            Ok(())
        }
        fn urls(&self) -> Result<Vec<String>> {
            self.hosts()
        }
        fn set_urls(&self, _urls: &[String]) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_store_failure_is_not_whitelisted() {
        let policy = WhitelistPolicy::new(Arc::new(BrokenStore));
        assert!(!policy.permits("https://example.com/"));
        assert!(policy.toggle_host("https://example.com/").is_err());
    }
}
