use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Permission a menu node may require (e.g. "billing.read").
///
/// Opaque to the navigation core; only equality and the `*` wildcard carry
/// meaning.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub const WILDCARD: Permission = Permission(Cow::Borrowed("*"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    /// Split a comma-separated list, skipping blank entries.
    pub fn parse_list(raw: &str) -> Vec<Permission> {
        raw.split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(|name| Self::new(name.to_string()))
            .collect()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wildcard(&self) -> bool {
        *self == Self::WILDCARD
    }
}

impl From<&'static str> for Permission {
    fn from(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
