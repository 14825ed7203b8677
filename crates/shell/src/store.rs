//! Persisted navigation selection.

use std::collections::BTreeSet;

use serde::{Deserialize, Deserializer, Serialize};

use navshell_core::MenuKey;
use navshell_menu::{MenuForest, MenuNode, ancestor_chain};

use crate::persistence::SelectionPersistence;

/// Storage key used when the host does not configure one.
pub const DEFAULT_STORAGE_KEY: &str = "menu-selection";

/// Which menus are selected and which sidebar branches are expanded.
///
/// Sidebar selection and expansion are scoped to the selected main menu.
/// `open_sidebar_keys` always contains the ancestors of the selected sidebar
/// node, plus any branch the user expanded by hand.
///
/// Blank keys in a stored blob (`""`, the host's own "nothing selected") load
/// as `None` and are dropped from the open set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionState {
    #[serde(default, deserialize_with = "blank_key_as_none")]
    pub selected_main_menu_key: Option<MenuKey>,
    #[serde(default, deserialize_with = "blank_key_as_none")]
    pub selected_sidebar_key: Option<MenuKey>,
    #[serde(default, deserialize_with = "non_blank_keys")]
    pub open_sidebar_keys: BTreeSet<MenuKey>,
}

fn blank_key_as_none<'de, D>(deserializer: D) -> Result<Option<MenuKey>, D::Error>
where
    D: Deserializer<'de>,
{
    let key = Option::<MenuKey>::deserialize(deserializer)?;
    Ok(key.filter(|key| !key.as_str().trim().is_empty()))
}

fn non_blank_keys<'de, D>(deserializer: D) -> Result<BTreeSet<MenuKey>, D::Error>
where
    D: Deserializer<'de>,
{
    let keys = Option::<Vec<MenuKey>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(keys.into_iter().filter(|key| !key.as_str().trim().is_empty()).collect())
}

/// Selection state container with an injected persistence port.
///
/// Every mutation is written through to storage. Storage failures are logged
/// and do not affect the in-memory state.
#[derive(Debug)]
pub struct SelectionStore<P> {
    state: SelectionState,
    persistence: P,
    storage_key: String,
}

impl<P: SelectionPersistence> SelectionStore<P> {
    /// Restore state previously saved under `storage_key` (or start empty).
    pub fn open(persistence: P, storage_key: impl Into<String>) -> Self {
        let storage_key = storage_key.into();
        let state = match persistence.load(&storage_key) {
            Ok(Some(blob)) => serde_json::from_str(&blob).unwrap_or_else(|err| {
                tracing::warn!("discarding unreadable selection state: {err}");
                SelectionState::default()
            }),
            Ok(None) => SelectionState::default(),
            Err(err) => {
                tracing::warn!("failed to load selection state: {err:?}");
                SelectionState::default()
            }
        };

        Self {
            state,
            persistence,
            storage_key,
        }
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn selected_main_menu(&self) -> Option<&MenuKey> {
        self.state.selected_main_menu_key.as_ref()
    }

    pub fn selected_sidebar(&self) -> Option<&MenuKey> {
        self.state.selected_sidebar_key.as_ref()
    }

    pub fn open_sidebar_keys(&self) -> &BTreeSet<MenuKey> {
        &self.state.open_sidebar_keys
    }

    /// Switch top-level context. Always clears sidebar selection and expansion.
    pub fn select_main_menu(&mut self, key: MenuKey) {
        tracing::info!(main = %key, "main menu selected");
        self.state.selected_main_menu_key = Some(key);
        self.state.selected_sidebar_key = None;
        self.state.open_sidebar_keys.clear();
        self.persist();
    }

    /// Select a sidebar node and expand its ancestors within `sidebar` (the
    /// active main menu's children). Existing expansions are kept.
    pub fn select_sidebar_menu(&mut self, key: MenuKey, sidebar: &[MenuNode]) {
        match ancestor_chain(sidebar, key.as_str()) {
            Some(ancestors) => self.state.open_sidebar_keys.extend(ancestors),
            None => tracing::debug!(sidebar = %key, "selected key is not in the active sidebar"),
        }
        self.state.selected_sidebar_key = Some(key);
        self.persist();
    }

    /// Replace the expanded branches (user expand/collapse).
    ///
    /// This does not re-add ancestors of the current selection; the next
    /// location reconciliation or sidebar selection restores them.
    pub fn set_open_sidebar_keys(&mut self, keys: impl IntoIterator<Item = MenuKey>) {
        self.state.open_sidebar_keys = keys.into_iter().collect();
        self.persist();
    }

    /// Re-open the ancestors of the selected sidebar node within `sidebar`.
    /// Writes to storage only when something was missing.
    pub fn expand_selected_ancestors(&mut self, sidebar: &[MenuNode]) {
        let Some(selected) = &self.state.selected_sidebar_key else {
            return;
        };
        let Some(ancestors) = ancestor_chain(sidebar, selected.as_str()) else {
            return;
        };

        let before = self.state.open_sidebar_keys.len();
        self.state.open_sidebar_keys.extend(ancestors);
        if self.state.open_sidebar_keys.len() != before {
            tracing::debug!(sidebar = %selected, "re-opened ancestors of selected sidebar node");
            self.persist();
        }
    }

    /// Make sure a main menu that exists in `forest` is selected.
    ///
    /// A restored key that still exists is kept as-is. Otherwise the first
    /// configured default (or the first top-level node) is selected. Returns
    /// `None` only when the forest has no main menus.
    pub fn ensure_main_menu(&mut self, forest: &MenuForest) -> Option<MenuKey> {
        if let Some(current) = &self.state.selected_main_menu_key {
            if forest.main_menu(current.as_str()).is_some() {
                return Some(current.clone());
            }
            tracing::info!(main = %current, "restored main menu no longer exists");
        }

        match forest.default_main_menu() {
            Some(node) => {
                let key = node.key.clone();
                self.select_main_menu(key.clone());
                Some(key)
            }
            None => {
                if self.state != SelectionState::default() {
                    self.reset();
                }
                None
            }
        }
    }

    /// Drop all selection state, in memory and in storage.
    pub fn reset(&mut self) {
        self.state = SelectionState::default();
        if let Err(err) = self.persistence.remove(&self.storage_key) {
            tracing::error!("failed to remove selection state: {err:?}");
        }
    }

    fn persist(&self) {
        let blob = match serde_json::to_string(&self.state) {
            Ok(blob) => blob,
            Err(err) => {
                tracing::error!("failed to serialize selection state: {err}");
                return;
            }
        };

        if let Err(err) = self.persistence.save(&self.storage_key, &blob) {
            tracing::error!("failed to persist selection state: {err:?}");
        }
    }
}
