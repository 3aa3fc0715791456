//! lazytab Storage Layer
//!
//! SQLite persistence for the settings the tab lifecycle reads
//! (preferences, whitelists) and the page history used to label
//! suspended tabs.

mod database;
mod error;
mod migrations;

pub use database::Database;
pub use error::StorageError;

pub type Result<T> = std::result::Result<T, StorageError>;
