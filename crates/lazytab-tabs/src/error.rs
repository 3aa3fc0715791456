//! Tab error types

use thiserror::Error;

use crate::id::TabId;

#[derive(Error, Debug)]
pub enum TabError {
    #[error("Tab not found: {0}")]
    NotFound(TabId),
}
