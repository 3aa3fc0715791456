//! Tab lifecycle configuration
//!
//! [`Config`] holds the defaults. Anything implementing [`Configuration`]
//! can stand in for it, e.g. [`SettingsConfiguration`] backed by the
//! settings table. [`Preferences`] reads through to the source on every
//! access, so edits made from a settings UI apply immediately.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use lazytab_storage::Database;
use lazytab_tabs::idle_duration;

use crate::error::CoreError;
use crate::Result;

/// Setting keys shared by every [`Configuration`] source.
pub mod keys {
    pub const LOAD_BACKGROUND_TABS: &str = "load_background_tabs";
    pub const LOAD_ON_SELECT_DELAY_MS: &str = "load_on_select_delay_ms";
    pub const UNLOAD_AFTER_TIMEOUT: &str = "unload_after_timeout";
    pub const TIMEOUT_VALUE: &str = "timeout_value";
    pub const TIMEOUT_UNIT: &str = "timeout_unit";
    pub const FIND_CLOSEST_LOADED_TAB: &str = "find_closest_loaded_tab";
    pub const SELECT_OWNER_ON_CLOSE: &str = "select_owner_on_close";
    pub const UNLOAD_ONLY_VISIBLE_TABS: &str = "unload_only_visible_tabs";
    pub const DEFER_RESTORED_TABS: &str = "defer_restored_tabs";
}

/// What happens to tabs opened without being selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackgroundTabMode {
    /// Load right away like any other tab
    Load,
    /// Keep suspended until selected
    Defer,
}

impl BackgroundTabMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackgroundTabMode::Load => "load",
            BackgroundTabMode::Defer => "defer",
        }
    }
}

impl std::fmt::Display for BackgroundTabMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BackgroundTabMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "load" => Ok(BackgroundTabMode::Load),
            "defer" => Ok(BackgroundTabMode::Defer),
            _ => Err(format!("Unknown background tab mode: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to the database file
    pub database_path: PathBuf,
    pub load_background_tabs: BackgroundTabMode,
    /// Delay before a selected suspended tab loads. Zero loads at once.
    pub load_on_select_delay_ms: u64,
    /// Suspend tabs that stay unselected for the idle period
    pub unload_after_timeout: bool,
    pub timeout_value: u64,
    /// Seconds per `timeout_value` step
    pub timeout_unit: u64,
    pub find_closest_loaded_tab: bool,
    pub select_owner_on_close: bool,
    /// Limit "unload other tabs" to the visible tab group
    pub unload_only_visible_tabs: bool,
    /// Restored tabs start suspended
    pub defer_restored_tabs: bool,
}

impl Config {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            database_path: data_dir.join("lazytab.db"),
            load_background_tabs: BackgroundTabMode::Defer,
            load_on_select_delay_ms: 0,
            unload_after_timeout: false,
            timeout_value: 30,
            timeout_unit: 60,
            find_closest_loaded_tab: true,
            select_owner_on_close: true,
            unload_only_visible_tabs: false,
            defer_restored_tabs: true,
        }
    }

    pub fn data_dir() -> PathBuf {
        data_local_dir()
            .map(|d| d.join("lazytab"))
            .unwrap_or_else(|| PathBuf::from(".lazytab"))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Open the settings/history database, creating its directory.
    pub fn open_database(&self) -> Result<Database> {
        if let Some(parent) = self.database_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(Database::open(&self.database_path)?)
    }

    /// Write every preference into the settings table.
    pub fn store(&self, db: &Database) -> Result<()> {
        for key in ALL_KEYS {
            if let Some(value) = self.value(key) {
                db.set_setting(key, &value)?;
            }
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Self::data_dir())
    }
}

const ALL_KEYS: &[&str] = &[
    keys::LOAD_BACKGROUND_TABS,
    keys::LOAD_ON_SELECT_DELAY_MS,
    keys::UNLOAD_AFTER_TIMEOUT,
    keys::TIMEOUT_VALUE,
    keys::TIMEOUT_UNIT,
    keys::FIND_CLOSEST_LOADED_TAB,
    keys::SELECT_OWNER_ON_CLOSE,
    keys::UNLOAD_ONLY_VISIBLE_TABS,
    keys::DEFER_RESTORED_TABS,
];

/// Read-only key/value access to preferences.
pub trait Configuration: Send + Sync {
    fn value(&self, key: &str) -> Option<String>;
}

impl Configuration for Config {
    fn value(&self, key: &str) -> Option<String> {
        let value = match key {
            keys::LOAD_BACKGROUND_TABS => self.load_background_tabs.to_string(),
            keys::LOAD_ON_SELECT_DELAY_MS => self.load_on_select_delay_ms.to_string(),
            keys::UNLOAD_AFTER_TIMEOUT => self.unload_after_timeout.to_string(),
            keys::TIMEOUT_VALUE => self.timeout_value.to_string(),
            keys::TIMEOUT_UNIT => self.timeout_unit.to_string(),
            keys::FIND_CLOSEST_LOADED_TAB => self.find_closest_loaded_tab.to_string(),
            keys::SELECT_OWNER_ON_CLOSE => self.select_owner_on_close.to_string(),
            keys::UNLOAD_ONLY_VISIBLE_TABS => self.unload_only_visible_tabs.to_string(),
            keys::DEFER_RESTORED_TABS => self.defer_restored_tabs.to_string(),
            _ => return None,
        };
        Some(value)
    }
}

impl Configuration for RwLock<Config> {
    fn value(&self, key: &str) -> Option<String> {
        self.read().value(key)
    }
}

/// Preferences stored in the settings table, with [`Config`] defaults
/// for anything missing.
pub struct SettingsConfiguration {
    db: Database,
    defaults: Config,
}

impl SettingsConfiguration {
    pub fn new(db: Database) -> Self {
        Self::with_defaults(db, Config::default())
    }

    pub fn with_defaults(db: Database, defaults: Config) -> Self {
        Self { db, defaults }
    }
}

impl Configuration for SettingsConfiguration {
    fn value(&self, key: &str) -> Option<String> {
        match self.db.get_setting(key) {
            Ok(Some(value)) => Some(value),
            Ok(None) => self.defaults.value(key),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Failed to read setting, using default");
                self.defaults.value(key)
            }
        }
    }
}

/// Typed view over a [`Configuration`].
#[derive(Clone)]
pub struct Preferences {
    source: Arc<dyn Configuration>,
    defaults: Arc<Config>,
}

impl Preferences {
    pub fn new(source: Arc<dyn Configuration>) -> Self {
        Self {
            source,
            defaults: Arc::new(Config::new(PathBuf::new())),
        }
    }

    pub fn background_tabs(&self) -> BackgroundTabMode {
        self.get(keys::LOAD_BACKGROUND_TABS, self.defaults.load_background_tabs)
    }

    pub fn load_on_select_delay(&self) -> Duration {
        Duration::from_millis(self.get(keys::LOAD_ON_SELECT_DELAY_MS, self.defaults.load_on_select_delay_ms))
    }

    pub fn unload_after_timeout(&self) -> bool {
        self.flag(keys::UNLOAD_AFTER_TIMEOUT, self.defaults.unload_after_timeout)
    }

    pub fn idle_period(&self) -> Duration {
        idle_duration(
            self.get(keys::TIMEOUT_VALUE, self.defaults.timeout_value),
            self.get(keys::TIMEOUT_UNIT, self.defaults.timeout_unit),
        )
    }

    pub fn find_closest_loaded_tab(&self) -> bool {
        self.flag(keys::FIND_CLOSEST_LOADED_TAB, self.defaults.find_closest_loaded_tab)
    }

    pub fn select_owner_on_close(&self) -> bool {
        self.flag(keys::SELECT_OWNER_ON_CLOSE, self.defaults.select_owner_on_close)
    }

    pub fn unload_only_visible_tabs(&self) -> bool {
        self.flag(keys::UNLOAD_ONLY_VISIBLE_TABS, self.defaults.unload_only_visible_tabs)
    }

    pub fn defer_restored_tabs(&self) -> bool {
        self.flag(keys::DEFER_RESTORED_TABS, self.defaults.defer_restored_tabs)
    }

    fn get<T: FromStr>(&self, key: &str, default: T) -> T {
        match self.source.value(key) {
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                tracing::warn!(key = %key, value = %raw, "Invalid preference value, using default");
                default
            }),
            None => default,
        }
    }

    fn flag(&self, key: &str, default: bool) -> bool {
        match self.source.value(key).as_deref().map(str::trim) {
            Some("true") | Some("1") => true,
            Some("false") | Some("0") => false,
            Some(other) => {
                tracing::warn!(key = %key, value = %other, "Invalid boolean preference, using default");
                default
            }
            None => default,
        }
    }
}

impl std::fmt::Debug for Preferences {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Preferences")
            .field("background_tabs", &self.background_tabs())
            .field("load_on_select_delay", &self.load_on_select_delay())
            .field("unload_after_timeout", &self.unload_after_timeout())
            .field("idle_period", &self.idle_period())
            .finish_non_exhaustive()
    }
}

/// Reject values a [`Configuration`] source would silently replace.
pub fn validate(config: &dyn Configuration) -> Result<()> {
    for key in ALL_KEYS {
        let Some(raw) = config.value(key) else {
            continue;
        };
        let raw = raw.trim();
        let ok = match *key {
            keys::LOAD_BACKGROUND_TABS => raw.parse::<BackgroundTabMode>().is_ok(),
            keys::LOAD_ON_SELECT_DELAY_MS | keys::TIMEOUT_VALUE | keys::TIMEOUT_UNIT => {
                raw.parse::<u64>().is_ok()
            }
            _ => matches!(raw, "true" | "false" | "1" | "0"),
        };
        if !ok {
            return Err(CoreError::Config(format!("invalid value {:?} for {}", raw, key)));
        }
    }
    Ok(())
}

/// Per-user data directory: `LOCALAPPDATA` on Windows, the XDG data
/// home elsewhere.
fn data_local_dir() -> Option<PathBuf> {
    if cfg!(windows) {
        return std::env::var_os("LOCALAPPDATA").map(PathBuf::from);
    }
    std::env::var_os("XDG_DATA_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".local/share")))
}
