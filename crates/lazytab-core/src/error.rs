//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Storage error: {0}")]
    Storage(#[from] lazytab_storage::StorageError),

    #[error("Whitelist error: {0}")]
    Whitelist(#[from] lazytab_whitelist::WhitelistError),

    #[error("Navigation error: {0}")]
    Navigation(#[from] lazytab_navigation::NavigationError),

    #[error("Tab error: {0}")]
    Tab(#[from] lazytab_tabs::TabError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}
