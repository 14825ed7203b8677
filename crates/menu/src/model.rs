//! Canonical in-memory navigation forest.
//!
//! A forest is created by one fetch and replaced wholesale on refetch; nodes
//! are never edited in place.

use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use navshell_auth::{Grants, Permission};
use navshell_core::{MenuKey, MenuVersion};

use crate::normalize::normalize_badge;
use crate::resolver::{find_by_key, resolve_path_segment, route_slug};
use crate::scope::scope_nodes;

/// Badge shown next to a menu label.
///
/// Raw API badges arrive in several encodings; `normalize_badge` is the only
/// place that converts them into this union.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Badge {
    #[default]
    None,
    Count(i64),
    Labeled { count: i64, color: String },
    /// Free-form text the backend sent that is not a count (e.g. "new").
    Text(String),
}

impl Badge {
    pub fn is_none(&self) -> bool {
        matches!(self, Badge::None)
    }

    pub fn count(&self) -> Option<i64> {
        match self {
            Badge::Count(count) | Badge::Labeled { count, .. } => Some(*count),
            Badge::None | Badge::Text(_) => None,
        }
    }

    pub fn color(&self) -> Option<&str> {
        match self {
            Badge::Labeled { color, .. } => Some(color),
            _ => None,
        }
    }
}

impl Serialize for Badge {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Badge::None => serializer.serialize_none(),
            Badge::Count(count) => serializer.serialize_i64(*count),
            Badge::Labeled { count, color } => {
                let mut state = serializer.serialize_struct("Badge", 2)?;
                state.serialize_field("count", count)?;
                state.serialize_field("color", color)?;
                state.end()
            }
            Badge::Text(text) => serializer.serialize_str(text),
        }
    }
}

impl<'de> Deserialize<'de> for Badge {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        Ok(normalize_badge(&raw))
    }
}

/// A node of the navigation tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuNode {
    pub key: MenuKey,
    #[serde(default, deserialize_with = "null_as_default")]
    pub label: String,
    /// Explicit path segment; when blank the key is used instead.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Badge::is_none")]
    pub badge: Badge,
    /// Permission required to see this node (and its subtree).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permission: Option<Permission>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub children: Vec<MenuNode>,
}

impl MenuNode {
    /// Bare node with no route, badge or children.
    pub fn new(key: impl Into<MenuKey>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            route: None,
            icon: None,
            description: None,
            badge: Badge::None,
            permission: None,
            children: Vec::new(),
        }
    }

    pub fn with_route(mut self, route: impl Into<String>) -> Self {
        self.route = Some(route.into());
        self
    }

    pub fn with_children(mut self, children: Vec<MenuNode>) -> Self {
        self.children = children;
        self
    }

    pub fn with_permission(mut self, permission: Permission) -> Self {
        self.permission = Some(permission);
        self
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// `route` is set and yields a non-empty slug.
    pub fn has_explicit_route(&self) -> bool {
        self.route.as_deref().is_some_and(|r| !route_slug(r).is_empty())
    }

    /// Selectable on its own: a leaf, or a branch with its own route.
    pub fn is_navigable(&self) -> bool {
        self.has_explicit_route() || self.is_leaf()
    }

    /// URL segment contributed by this node.
    pub fn path_segment(&self) -> &str {
        resolve_path_segment(self)
    }
}

/// Non-hierarchical profile block (user card + account links).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSection {
    #[serde(default)]
    pub user_data: Value,
    #[serde(default, deserialize_with = "null_as_default")]
    pub menu_items: Vec<MenuNode>,
}

/// Payload metadata: versioning and default selection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuConfig {
    #[serde(default)]
    pub version: Option<MenuVersion>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub default_selected_keys: Vec<MenuKey>,
    /// Any other config keys the backend sends, kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The complete navigation payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuForest {
    #[serde(deserialize_with = "null_as_default")]
    pub main_navigation: Vec<MenuNode>,
    #[serde(default)]
    pub profile_section: Option<ProfileSection>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub config: MenuConfig,
}

impl MenuForest {
    pub fn version(&self) -> Option<&MenuVersion> {
        self.config.version.as_ref()
    }

    /// Strict version equality. A missing version never matches, so legacy
    /// payloads always replace what is cached.
    pub fn is_same_version(&self, other: &MenuForest) -> bool {
        match (self.version(), other.version()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    /// Fetched, but there is nothing to navigate.
    pub fn is_empty(&self) -> bool {
        self.main_navigation.is_empty()
    }

    /// Top-level entry by key (main menus only, not descendants).
    pub fn main_menu(&self, key: &str) -> Option<&MenuNode> {
        self.main_navigation.iter().find(|node| node.key.as_str() == key)
    }

    /// Secondary navigation shown while `main_key` is active.
    pub fn sidebar_menus(&self, main_key: &str) -> &[MenuNode] {
        self.main_menu(main_key)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    /// Key lookup across main navigation (any depth).
    pub fn find(&self, key: &str) -> Option<&MenuNode> {
        find_by_key(&self.main_navigation, key)
    }

    /// Main menu selected when nothing was restored: the first configured
    /// default that exists, else the first top-level node.
    pub fn default_main_menu(&self) -> Option<&MenuNode> {
        self.config
            .default_selected_keys
            .iter()
            .find_map(|key| self.main_menu(key.as_str()))
            .or_else(|| self.main_navigation.first())
    }

    /// Copy of this forest restricted to what `grants` may see.
    pub fn scoped(&self, grants: &Grants) -> MenuForest {
        MenuForest {
            main_navigation: scope_nodes(&self.main_navigation, grants),
            profile_section: self.profile_section.as_ref().map(|profile| ProfileSection {
                user_data: profile.user_data.clone(),
                menu_items: scope_nodes(&profile.menu_items, grants),
            }),
            config: self.config.clone(),
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
