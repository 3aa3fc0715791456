//! Load requests and the deferred call captured for a suspended tab

use serde::{Deserialize, Serialize};
use std::ops::BitOr;

/// The placeholder page a suspended tab sits on.
pub const BLANK_URI: &str = "about:blank";

/// True for targets that load without suspension side effects.
pub fn is_blank(uri: &str) -> bool {
    uri.is_empty() || uri == BLANK_URI
}

/// Load flags passed through to the navigation backend untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LoadFlags(pub u32);

impl LoadFlags {
    pub const NONE: LoadFlags = LoadFlags(0);
    pub const IS_REFRESH: LoadFlags = LoadFlags(0x10);
    pub const IS_LINK: LoadFlags = LoadFlags(0x20);
    pub const BYPASS_HISTORY: LoadFlags = LoadFlags(0x40);
    pub const REPLACE_HISTORY: LoadFlags = LoadFlags(0x80);
    pub const BYPASS_CACHE: LoadFlags = LoadFlags(0x100);
    pub const BYPASS_PROXY: LoadFlags = LoadFlags(0x200);

    pub fn contains(self, other: LoadFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn bits(self) -> u32 {
        self.0
    }
}

impl BitOr for LoadFlags {
    type Output = LoadFlags;

    fn bitor(self, rhs: LoadFlags) -> LoadFlags {
        LoadFlags(self.0 | rhs.0)
    }
}

/// Arguments of a `load_uri` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadRequest {
    pub uri: String,
    pub flags: LoadFlags,
    pub referrer: Option<String>,
    /// Request body of a form submission
    pub post_data: Option<Vec<u8>>,
}

impl LoadRequest {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            flags: LoadFlags::NONE,
            referrer: None,
            post_data: None,
        }
    }

    pub fn with_flags(mut self, flags: LoadFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_referrer(mut self, referrer: impl Into<String>) -> Self {
        self.referrer = Some(referrer.into());
        self
    }

    pub fn with_post_data(mut self, post_data: Vec<u8>) -> Self {
        self.post_data = Some(post_data);
        self
    }

    pub fn is_blank(&self) -> bool {
        is_blank(&self.uri)
    }
}

/// A navigation captured while a tab was suspended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeferredCall {
    GotoIndex(usize),
    LoadUri(LoadRequest),
}
