//! Whitelist storage
//!
//! Whitelists are plain ordered string lists. The settings-backed store
//! keeps each list under one key as a `;`-separated string.

use parking_lot::RwLock;

use lazytab_storage::{Database, StorageError};

use crate::Result;

/// Settings key of the host whitelist.
pub const HOSTS_KEY: &str = "whitelist";
/// Settings key of the exact-URL whitelist.
pub const URLS_KEY: &str = "whitelist_specific";

const SEPARATOR: char = ';';

/// Persistence for the two whitelists.
///
/// Implementations may be shared with a settings UI that edits the lists
/// concurrently; readers never cache what they get back.
pub trait WhitelistStore: Send + Sync {
    fn hosts(&self) -> Result<Vec<String>>;
    fn set_hosts(&self, hosts: &[String]) -> Result<()>;
    fn urls(&self) -> Result<Vec<String>>;
    fn set_urls(&self, urls: &[String]) -> Result<()>;
}

#[derive(Default)]
pub struct MemoryWhitelistStore {
    hosts: RwLock<Vec<String>>,
    urls: RwLock<Vec<String>>,
}

impl MemoryWhitelistStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(hosts: Vec<String>, urls: Vec<String>) -> Self {
        Self {
            hosts: RwLock::new(hosts),
            urls: RwLock::new(urls),
        }
    }
}

impl WhitelistStore for MemoryWhitelistStore {
    fn hosts(&self) -> Result<Vec<String>> {
        Ok(self.hosts.read().clone())
    }

    fn set_hosts(&self, hosts: &[String]) -> Result<()> {
        *self.hosts.write() = hosts.to_vec();
        Ok(())
    }

    fn urls(&self) -> Result<Vec<String>> {
        Ok(self.urls.read().clone())
    }

    fn set_urls(&self, urls: &[String]) -> Result<()> {
        *self.urls.write() = urls.to_vec();
        Ok(())
    }
}

pub struct SettingsWhitelistStore {
    db: Database,
}

impl SettingsWhitelistStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn read_list(&self, key: &str) -> Result<Vec<String>> {
        Ok(self
            .db
            .get_setting(key)?
            .map(|joined| split_list(&joined))
            .unwrap_or_default())
    }

    fn write_list(&self, key: &str, entries: &[String]) -> Result<()> {
        if let Some(entry) = entries.iter().find(|e| e.contains(SEPARATOR)) {
            return Err(StorageError::InvalidSetting {
                key: key.to_string(),
                reason: format!("entry {:?} contains the list separator", entry),
            }
            .into());
        }
        self.db.set_setting(key, &entries.join(";"))?;
        Ok(())
    }
}

impl WhitelistStore for SettingsWhitelistStore {
    fn hosts(&self) -> Result<Vec<String>> {
        self.read_list(HOSTS_KEY)
    }

    fn set_hosts(&self, hosts: &[String]) -> Result<()> {
        self.write_list(HOSTS_KEY, hosts)
    }

    fn urls(&self) -> Result<Vec<String>> {
        self.read_list(URLS_KEY)
    }

    fn set_urls(&self, urls: &[String]) -> Result<()> {
        self.write_list(URLS_KEY, urls)
    }
}

fn split_list(joined: &str) -> Vec<String> {
    joined
        .split(SEPARATOR)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_store_roundtrip() {
        let db = Database::open_in_memory().unwrap();
        let store = SettingsWhitelistStore::new(db.clone());

        assert!(store.hosts().unwrap().is_empty());
        assert!(store.urls().unwrap().is_empty());

        store
            .set_hosts(&["example.com".to_string(), "rust-lang.org".to_string()])
            .unwrap();
        store
            .set_urls(&["https://example.com/inbox".to_string()])
            .unwrap();

        assert_eq!(
            db.get_setting(HOSTS_KEY).unwrap().as_deref(),
            Some("example.com;rust-lang.org")
        );
        assert_eq!(store.hosts().unwrap(), vec!["example.com", "rust-lang.org"]);
        assert_eq!(store.urls().unwrap(), vec!["https://example.com/inbox"]);
    }

    #[test]
    fn test_empty_list_is_stored_as_empty_string() {
        let db = Database::open_in_memory().unwrap();
        let store = SettingsWhitelistStore::new(db.clone());

        store.set_hosts(&["example.com".to_string()]).unwrap();
        store.set_hosts(&[]).unwrap();

        assert_eq!(db.get_setting(HOSTS_KEY).unwrap().as_deref(), Some(""));
        assert!(store.hosts().unwrap().is_empty());
    }

    #[test]
    fn test_rejects_entries_containing_separator() {
        let db = Database::open_in_memory().unwrap();
        let store = SettingsWhitelistStore::new(db);

        store.set_hosts(&["example.com".to_string()]).unwrap();
        assert!(store
            .set_urls(&["https://example.com/?a=1;b=2".to_string()])
            .is_err());
        assert!(store.urls().unwrap().is_empty());
    }

    #[test]
    fn test_external_edit_is_visible() {
        let db = Database::open_in_memory().unwrap();
        let store = SettingsWhitelistStore::new(db.clone());

        db.set_setting(HOSTS_KEY, "a.example;;b.example").unwrap();
        assert_eq!(store.hosts().unwrap(), vec!["a.example", "b.example"]);
    }
}
