//! Menu payload versions.

use serde::{Deserialize, Serialize};

/// Opaque version of a menu payload (`config.version`).
///
/// Versions are compared for strict string equality only; no semantic-version
/// ordering is ever attempted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MenuVersion(String);

impl MenuVersion {
    pub fn new(version: impl Into<String>) -> Self {
        Self(version.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for MenuVersion {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MenuVersion {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}
