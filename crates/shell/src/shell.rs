//! `NavigationShell`: the state a host UI holds for navigation.
//!
//! Wires the provider, the permission-scoped forest, the selection store and
//! the URL synchronizer, and keeps them in the load order
//! forest -> main menu -> sidebar.

use navshell_auth::Grants;
use navshell_core::{MenuKey, NavError, NavResult};
use navshell_menu::{MenuForest, MenuNode};

use crate::config::ShellConfig;
use crate::persistence::SelectionPersistence;
use crate::provider::{MenuProvider, MenuSource, MenuStatus, ProviderError, RefreshOutcome};
use crate::store::{SelectionState, SelectionStore};
use crate::sync::{Location, NavigationIntent, SyncContext, SyncOutcome, UrlSynchronizer};

/// What a refresh did, to the forest and to the selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshReport {
    pub refresh: RefreshOutcome,
    /// Reconciliation of the last seen location against the new forest.
    /// `None` when the forest did not change or no location was seen yet.
    pub sync: Option<SyncOutcome>,
}

#[derive(Debug)]
pub struct NavigationShell<P> {
    provider: MenuProvider,
    /// Provider forest restricted to `grants`.
    scoped: Option<MenuForest>,
    grants: Grants,
    store: SelectionStore<P>,
    sync: UrlSynchronizer,
    location: Option<Location>,
}

impl<P: SelectionPersistence> NavigationShell<P> {
    pub fn new(persistence: P, grants: Grants, app_base: &str, storage_key: &str) -> Self {
        Self {
            provider: MenuProvider::new(),
            scoped: None,
            grants,
            store: SelectionStore::open(persistence, storage_key),
            sync: UrlSynchronizer::new(app_base),
            location: None,
        }
    }

    pub fn from_config(persistence: P, config: &ShellConfig) -> Self {
        Self::new(persistence, config.grants(), &config.app_base, &config.storage_key)
    }

    /// Fetch the forest. A new forest is rescoped and the last seen location
    /// reconciled against it; an unchanged one leaves everything as it was.
    pub async fn refresh<S>(&mut self, source: &S) -> RefreshReport
    where
        S: MenuSource + ?Sized,
    {
        let refresh = self.provider.refresh(source).await;
        let sync = match &refresh {
            RefreshOutcome::Replaced { .. } => self.rescope(),
            RefreshOutcome::Unchanged | RefreshOutcome::Failed(_) => None,
        };
        RefreshReport { refresh, sync }
    }

    /// The session's grants changed (sign-in, sign-out, role change).
    pub fn set_grants(&mut self, grants: Grants) -> Option<SyncOutcome> {
        if grants == self.grants {
            return None;
        }
        self.grants = grants;
        self.rescope()
    }

    /// Router reported a new location.
    pub fn on_location_change(&mut self, href: &str) -> SyncOutcome {
        let location = Location::parse(href);
        let outcome = self.reconcile(&location);
        self.location = Some(location);
        outcome
    }

    pub fn click_main_menu(&mut self, key: &str) -> NavResult<NavigationIntent> {
        // Clicks before the forest exists cannot name a real node.
        let forest = self.scoped.as_ref().ok_or_else(|| NavError::unknown_key(key))?;
        self.sync.navigate_to_main_menu(key, forest, &mut self.store)
    }

    pub fn click_sidebar_menu(&mut self, key: &str) -> NavResult<NavigationIntent> {
        let forest = self.scoped.as_ref().ok_or_else(|| NavError::unknown_key(key))?;
        self.sync.navigate_to_sidebar(key, forest, &mut self.store)
    }

    /// User expanded or collapsed sidebar branches.
    pub fn set_open_sidebar_keys(&mut self, keys: impl IntoIterator<Item = MenuKey>) {
        self.store.set_open_sidebar_keys(keys);
    }

    pub fn route_for(&self, key: &str) -> Option<String> {
        self.scoped
            .as_ref()
            .and_then(|forest| self.sync.route_for(forest, key))
    }

    pub fn status(&self) -> MenuStatus {
        self.provider.status()
    }

    pub fn last_error(&self) -> Option<&ProviderError> {
        self.provider.last_error()
    }

    /// Forest as this session may see it.
    pub fn forest(&self) -> Option<&MenuForest> {
        self.scoped.as_ref()
    }

    pub fn main_menus(&self) -> &[MenuNode] {
        self.scoped
            .as_ref()
            .map(|forest| forest.main_navigation.as_slice())
            .unwrap_or(&[])
    }

    /// Sidebar of the selected main menu.
    pub fn sidebar_menus(&self) -> &[MenuNode] {
        match (&self.scoped, self.store.selected_main_menu()) {
            (Some(forest), Some(main)) => forest.sidebar_menus(main.as_str()),
            _ => &[],
        }
    }

    pub fn selection(&self) -> &SelectionState {
        self.store.state()
    }

    pub fn grants(&self) -> &Grants {
        &self.grants
    }

    fn rescope(&mut self) -> Option<SyncOutcome> {
        self.scoped = self.provider.forest().map(|forest| forest.scoped(&self.grants));
        self.sync.invalidate();

        match self.location.clone() {
            Some(location) => Some(self.reconcile(&location)),
            None => {
                let authenticated = self.grants.is_authenticated();
                if let Some(forest) = self.scoped.as_ref().filter(|_| authenticated) {
                    self.store.ensure_main_menu(forest);
                }
                None
            }
        }
    }

    fn reconcile(&mut self, location: &Location) -> SyncOutcome {
        let ctx = SyncContext {
            forest: self.scoped.as_ref(),
            authenticated: self.grants.is_authenticated(),
        };
        self.sync.on_location_change(location, ctx, &mut self.store)
    }
}
