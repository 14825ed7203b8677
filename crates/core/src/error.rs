//! Navigation error model.

use thiserror::Error;

/// Result type used across the navigation core.
pub type NavResult<T> = Result<T, NavError>;

/// Navigation-level error.
///
/// Lookup misses are not errors (they are `None`); this covers untrusted
/// payloads and caller bugs only.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NavError {
    /// The menu payload did not have a recognizable shape.
    #[error("malformed menu payload: {0}")]
    MalformedPayload(String),

    /// A UI event referenced a key that is not in the active forest.
    #[error("unknown menu key: {0}")]
    UnknownKey(String),
}

impl NavError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedPayload(msg.into())
    }

    pub fn unknown_key(key: impl Into<String>) -> Self {
        Self::UnknownKey(key.into())
    }
}
