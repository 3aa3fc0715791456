//! Whitelist error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WhitelistError {
    #[error("Storage error: {0}")]
    Storage(#[from] lazytab_storage::StorageError),
}
