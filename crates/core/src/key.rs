//! Menu node identifiers.

use std::borrow::Borrow;

use serde::{Deserialize, Serialize};

/// Identifier of a menu node.
///
/// Keys are unique across the whole navigation forest, not just among
/// siblings: every lookup is by key alone.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MenuKey(String);

impl MenuKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl core::fmt::Display for MenuKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MenuKey {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for MenuKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for MenuKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// Lets `BTreeSet<MenuKey>` / `HashMap<MenuKey, _>` be queried with `&str`.
impl Borrow<str> for MenuKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for MenuKey {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for MenuKey {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}
