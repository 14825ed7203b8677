//! `navshell-core`: shared navigation primitives.
//!
//! This crate contains identifiers and the error model used by every other
//! navshell crate (no IO, no tree logic).

pub mod error;
pub mod key;
pub mod version;

pub use error::{NavError, NavResult};
pub use key::MenuKey;
pub use version::MenuVersion;
