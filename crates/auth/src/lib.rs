//! `navshell-auth`: authorization signals consumed by the navigation core.
//!
//! Authentication itself happens elsewhere; this crate only models what the
//! navigation layer is told: whether a session exists and which permissions
//! it carries.

pub mod grants;
pub mod permissions;

pub use grants::Grants;
pub use permissions::Permission;
