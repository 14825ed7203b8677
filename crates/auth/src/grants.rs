use std::collections::HashSet;

use crate::Permission;

/// What the session is allowed to see.
///
/// - No IO
/// - No token handling (the host decides `authenticated`)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Grants {
    authenticated: bool,
    permissions: HashSet<Permission>,
}

impl Grants {
    /// Signed-out session: nothing is granted.
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(permissions: impl IntoIterator<Item = Permission>) -> Self {
        Self {
            authenticated: true,
            permissions: permissions.into_iter().collect(),
        }
    }

    /// Authenticated session holding the wildcard permission.
    pub fn all() -> Self {
        Self::authenticated([Permission::WILDCARD])
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Whether a node guarded by `required` is visible.
    ///
    /// Unguarded nodes (`None`) are visible to any authenticated session.
    pub fn allows(&self, required: Option<&Permission>) -> bool {
        if !self.authenticated {
            return false;
        }

        match required {
            None => true,
            Some(required) => {
                self.permissions.iter().any(Permission::is_wildcard)
                    || self.permissions.contains(required)
            }
        }
    }
}
