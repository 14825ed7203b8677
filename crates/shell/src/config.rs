//! Environment-driven configuration for the shell and its binary.

use std::path::PathBuf;

use thiserror::Error;

use navshell_auth::{Grants, Permission};
use navshell_menu::join_route;

use crate::persistence::{FilePersistence, default_storage_dir};
use crate::store::DEFAULT_STORAGE_KEY;

pub const MENU_FILE_ENV: &str = "NAVSHELL_MENU_FILE";
pub const MENU_URL_ENV: &str = "NAVSHELL_MENU_URL";
pub const AUTH_TOKEN_ENV: &str = "NAVSHELL_AUTH_TOKEN";
pub const APP_BASE_ENV: &str = "NAVSHELL_APP_BASE";
pub const STORAGE_KEY_ENV: &str = "NAVSHELL_STORAGE_KEY";
pub const STORAGE_DIR_ENV: &str = "NAVSHELL_STORAGE_DIR";
pub const PERMISSIONS_ENV: &str = "NAVSHELL_PERMISSIONS";

pub const DEFAULT_APP_BASE: &str = "/apps";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("NAVSHELL_MENU_FILE and NAVSHELL_MENU_URL are mutually exclusive")]
    Conflict,
    #[error("NAVSHELL_AUTH_TOKEN requires NAVSHELL_MENU_URL")]
    TokenWithoutUrl,
}

/// Where the menu payload is fetched from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuSourceConfig {
    File(PathBuf),
    Http { url: String, token: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellConfig {
    pub source: Option<MenuSourceConfig>,
    /// Normalized mount point of the authenticated app, e.g. `/apps`.
    pub app_base: String,
    pub storage_key: String,
    /// `None` means the OS data directory.
    pub storage_dir: Option<PathBuf>,
    /// Granted permissions; `*` grants everything.
    pub permissions: Vec<Permission>,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            source: None,
            app_base: DEFAULT_APP_BASE.to_string(),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            storage_dir: None,
            permissions: vec![Permission::WILDCARD],
        }
    }
}

impl ShellConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let token = get(AUTH_TOKEN_ENV);
        let source = match (get(MENU_FILE_ENV), get(MENU_URL_ENV)) {
            (Some(_), Some(_)) => return Err(ConfigError::Conflict),
            (Some(_), None) if token.is_some() => return Err(ConfigError::TokenWithoutUrl),
            (Some(path), None) => Some(MenuSourceConfig::File(PathBuf::from(path))),
            (None, Some(url)) => Some(MenuSourceConfig::Http { url, token }),
            (None, None) if token.is_some() => return Err(ConfigError::TokenWithoutUrl),
            (None, None) => None,
        };

        let defaults = Self::default();
        Ok(Self {
            source,
            app_base: get(APP_BASE_ENV)
                .map(|base| join_route([base.as_str()]))
                .unwrap_or(defaults.app_base),
            storage_key: get(STORAGE_KEY_ENV).unwrap_or(defaults.storage_key),
            storage_dir: get(STORAGE_DIR_ENV).map(PathBuf::from),
            permissions: get(PERMISSIONS_ENV)
                .map(|raw| Permission::parse_list(&raw))
                .unwrap_or(defaults.permissions),
        })
    }

    /// File persistence rooted at the configured or default storage directory.
    pub fn persistence(&self) -> anyhow::Result<FilePersistence> {
        let dir = match &self.storage_dir {
            Some(dir) => dir.clone(),
            None => default_storage_dir()?,
        };
        Ok(FilePersistence::new(dir))
    }

    /// Grants of the signed-in user.
    pub fn grants(&self) -> Grants {
        Grants::authenticated(self.permissions.iter().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<ShellConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ShellConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = config(&[]).unwrap();
        assert_eq!(config, ShellConfig::default());
        assert_eq!(config.app_base, "/apps");
        assert_eq!(config.storage_key, "menu-selection");
    }

    #[test]
    fn reads_http_source_and_normalizes_base() {
        let config = config(&[
            (MENU_URL_ENV, "https://example.test/menus"),
            (AUTH_TOKEN_ENV, "secret"),
            (APP_BASE_ENV, "portal//apps/"),
            (STORAGE_DIR_ENV, "/var/lib/navshell"),
            (PERMISSIONS_ENV, "billing.read, ,admin.users"),
        ])
        .unwrap();

        assert_eq!(
            config.source,
            Some(MenuSourceConfig::Http {
                url: "https://example.test/menus".to_string(),
                token: Some("secret".to_string()),
            })
        );
        assert_eq!(config.app_base, "/portal/apps");
        assert_eq!(config.storage_dir, Some(PathBuf::from("/var/lib/navshell")));
        assert_eq!(
            config.permissions,
            vec![Permission::from("billing.read"), Permission::from("admin.users")]
        );
    }

    #[test]
    fn blank_values_are_unset() {
        let config = config(&[(MENU_FILE_ENV, "  "), (APP_BASE_ENV, "")]).unwrap();
        assert_eq!(config.source, None);
        assert_eq!(config.app_base, DEFAULT_APP_BASE);
    }

    #[test]
    fn file_and_url_conflict() {
        let err = config(&[(MENU_FILE_ENV, "menu.json"), (MENU_URL_ENV, "http://x")]).unwrap_err();
        assert_eq!(err, ConfigError::Conflict);
    }

    #[test]
    fn token_needs_url() {
        assert_eq!(config(&[(AUTH_TOKEN_ENV, "t")]).unwrap_err(), ConfigError::TokenWithoutUrl);
        assert_eq!(
            config(&[(AUTH_TOKEN_ENV, "t"), (MENU_FILE_ENV, "menu.json")]).unwrap_err(),
            ConfigError::TokenWithoutUrl
        );
    }

    #[test]
    fn default_permissions_grant_everything() {
        let grants = config(&[]).unwrap().grants();
        assert!(grants.allows(Some(&Permission::new("anything"))));
    }
}
