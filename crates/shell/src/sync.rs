//! URL <-> selection reconciliation.
//!
//! Two one-way paths, never chained for the same event:
//!
//! - a location change is the only thing that writes selection *from* a path
//!   (`on_location_change`)
//! - a user click is the only thing that writes a path *from* selection
//!   (`navigate_to_main_menu` / `navigate_to_sidebar`)
//!
//! A click records the route it produced; when the router reports that route
//! back it is acknowledged without being reconciled again.

use serde::Serialize;

use navshell_core::{MenuKey, NavError, NavResult};
use navshell_menu::{
    MenuForest, MenuNode, build_route, find_by_key, first_navigable, join_route,
    match_path_segments, relative_segments, resolve_path_segment,
};

use crate::persistence::SelectionPersistence;
use crate::store::{SelectionState, SelectionStore};

/// Browser location split into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub path: String,
    pub query: Option<String>,
    pub hash: Option<String>,
}

impl Location {
    /// Parse `path[?query][#hash]`.
    pub fn parse(href: &str) -> Self {
        let (rest, hash) = match href.split_once('#') {
            Some((rest, hash)) => (rest, Some(hash.to_string())),
            None => (href, None),
        };
        let (path, query) = match rest.split_once('?') {
            Some((path, query)) => (path, Some(query.to_string())),
            None => (rest, None),
        };

        Self {
            path: path.to_string(),
            query,
            hash,
        }
    }
}

impl From<&str> for Location {
    fn from(href: &str) -> Self {
        Self::parse(href)
    }
}

/// What the host knows at the time of a location change.
#[derive(Debug, Clone, Copy)]
pub struct SyncContext<'a> {
    /// `None` while the forest is still being fetched.
    pub forest: Option<&'a MenuForest>,
    pub authenticated: bool,
}

/// What a location change did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SyncOutcome {
    Unauthenticated,
    AwaitingForest,
    EmptyForest,
    /// This path was produced by a click or already reconciled.
    AlreadyReconciled,
    /// The main menu has no sidebar; its own route is the destination.
    MainMenuOnly { main: MenuKey, route: String },
    /// Bare section root. Nothing selected; `default_route` is where the
    /// host may redirect.
    SectionRoot { main: MenuKey, default_route: Option<String> },
    /// The path is not under the active section.
    OutsideSection { main: MenuKey },
    /// No sidebar node matches the path.
    NoMatch { main: MenuKey },
    Selected { main: MenuKey, sidebar: MenuKey, changed: bool },
}

/// Route the host should navigate to after a click.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavigationIntent {
    pub route: String,
    pub main: MenuKey,
    pub sidebar: Option<MenuKey>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Reconciled {
    path: String,
    selection: SelectionState,
}

#[derive(Debug)]
pub struct UrlSynchronizer {
    app_base: String,
    /// Route issued by the last click, not yet seen as a location.
    expected: Option<String>,
    last: Option<Reconciled>,
}

impl UrlSynchronizer {
    /// `app_base` is where the authenticated app is mounted (e.g. `/apps`).
    pub fn new(app_base: &str) -> Self {
        Self {
            app_base: join_route([app_base]),
            expected: None,
            last: None,
        }
    }

    pub fn app_base(&self) -> &str {
        &self.app_base
    }

    /// Forget what was reconciled (e.g. after the forest changed) so the next
    /// location is reconciled from scratch.
    pub fn invalidate(&mut self) {
        self.expected = None;
        self.last = None;
    }

    /// `/apps/<main slug>`.
    pub fn section_prefix(&self, main: &MenuNode) -> String {
        join_route([self.app_base.as_str(), resolve_path_segment(main)])
    }

    /// Route of any node in the forest, main or sidebar.
    pub fn route_for(&self, forest: &MenuForest, key: &str) -> Option<String> {
        build_route(&forest.main_navigation, key, &self.app_base)
    }

    /// Bring selection in line with `location`.
    pub fn on_location_change<P: SelectionPersistence>(
        &mut self,
        location: &Location,
        ctx: SyncContext<'_>,
        store: &mut SelectionStore<P>,
    ) -> SyncOutcome {
        // A click's route only acknowledges the very next location event.
        let expected = self.expected.take();

        if !ctx.authenticated {
            return SyncOutcome::Unauthenticated;
        }
        let Some(forest) = ctx.forest else {
            return SyncOutcome::AwaitingForest;
        };

        let path = join_route([location.path.as_str()]);

        if expected.as_deref() == Some(path.as_str()) {
            self.remember(path, store);
            return SyncOutcome::AlreadyReconciled;
        }
        if self
            .last
            .as_ref()
            .is_some_and(|last| last.path == path && &last.selection == store.state())
        {
            return SyncOutcome::AlreadyReconciled;
        }

        let outcome = self.reconcile(&path, forest, store);
        tracing::debug!(path = %path, ?outcome, "reconciled location");
        self.remember(path, store);
        outcome
    }

    /// User clicked a main menu: select it and route to its first navigable
    /// sidebar node (or to the section itself when it has no sidebar).
    pub fn navigate_to_main_menu<P: SelectionPersistence>(
        &mut self,
        key: &str,
        forest: &MenuForest,
        store: &mut SelectionStore<P>,
    ) -> NavResult<NavigationIntent> {
        let main = forest.main_menu(key).ok_or_else(|| NavError::unknown_key(key))?;
        store.select_main_menu(main.key.clone());

        let prefix = self.section_prefix(main);
        let (route, sidebar) = match first_navigable(&main.children) {
            Some(leaf) => {
                store.select_sidebar_menu(leaf.key.clone(), &main.children);
                let route = build_route(&main.children, leaf.key.as_str(), &prefix)
                    .unwrap_or(prefix);
                (route, Some(leaf.key.clone()))
            }
            None => (prefix, None),
        };

        Ok(self.issue(route, main.key.clone(), sidebar))
    }

    /// User clicked a sidebar node. Switches main menu first when the node
    /// lives under a different one.
    pub fn navigate_to_sidebar<P: SelectionPersistence>(
        &mut self,
        key: &str,
        forest: &MenuForest,
        store: &mut SelectionStore<P>,
    ) -> NavResult<NavigationIntent> {
        let main = forest
            .main_navigation
            .iter()
            .find(|main| find_by_key(&main.children, key).is_some())
            .ok_or_else(|| NavError::unknown_key(key))?;

        if store.selected_main_menu() != Some(&main.key) {
            store.select_main_menu(main.key.clone());
        }

        let prefix = self.section_prefix(main);
        let route = build_route(&main.children, key, &prefix)
            .ok_or_else(|| NavError::unknown_key(key))?;
        let sidebar = MenuKey::from(key);
        store.select_sidebar_menu(sidebar.clone(), &main.children);

        Ok(self.issue(route, main.key.clone(), Some(sidebar)))
    }

    fn reconcile<P: SelectionPersistence>(
        &self,
        path: &str,
        forest: &MenuForest,
        store: &mut SelectionStore<P>,
    ) -> SyncOutcome {
        if forest.is_empty() {
            return SyncOutcome::EmptyForest;
        }

        // A deep link into another section switches the main menu first. The
        // longest matching section prefix wins.
        if let Some((_, main)) = forest
            .main_navigation
            .iter()
            .filter_map(|main| {
                relative_segments(path, &self.section_prefix(main)).map(|rest| (rest.len(), main))
            })
            .min_by_key(|(rest, _)| *rest)
        {
            if store.selected_main_menu() != Some(&main.key) {
                store.select_main_menu(main.key.clone());
            }
        }

        let Some(main_key) = store.ensure_main_menu(forest) else {
            return SyncOutcome::EmptyForest;
        };
        let Some(main) = forest.main_menu(main_key.as_str()) else {
            return SyncOutcome::EmptyForest;
        };

        let prefix = self.section_prefix(main);
        if main.is_leaf() {
            return SyncOutcome::MainMenuOnly {
                main: main_key,
                route: prefix,
            };
        }

        let Some(segments) = relative_segments(path, &prefix) else {
            return SyncOutcome::OutsideSection { main: main_key };
        };

        if segments.is_empty() {
            let default_route = first_navigable(&main.children)
                .and_then(|leaf| build_route(&main.children, leaf.key.as_str(), &prefix));
            return SyncOutcome::SectionRoot {
                main: main_key,
                default_route,
            };
        }

        let Some(matched) = match_path_segments(&main.children, &segments, 0) else {
            return SyncOutcome::NoMatch { main: main_key };
        };

        let changed = store.selected_sidebar() != Some(&matched.key);
        if changed {
            store.select_sidebar_menu(matched.key.clone(), &main.children);
        } else {
            store.expand_selected_ancestors(&main.children);
        }

        SyncOutcome::Selected {
            main: main_key,
            sidebar: matched.key.clone(),
            changed,
        }
    }

    fn issue(
        &mut self,
        route: String,
        main: MenuKey,
        sidebar: Option<MenuKey>,
    ) -> NavigationIntent {
        tracing::debug!(route = %route, "navigation requested");
        self.expected = Some(route.clone());
        NavigationIntent { route, main, sidebar }
    }

    fn remember<P: SelectionPersistence>(&mut self, path: String, store: &SelectionStore<P>) {
        self.last = Some(Reconciled {
            path,
            selection: store.state().clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use navshell_core::MenuVersion;
    use navshell_menu::MenuConfig;

    use crate::persistence::InMemoryPersistence;

    type Store = SelectionStore<Arc<InMemoryPersistence>>;

    /// `A -> B(route="reports") -> summary`, plus a sidebar-less main `Z`.
    fn forest() -> MenuForest {
        MenuForest {
            main_navigation: vec![
                MenuNode::new("A", "A").with_children(vec![
                    MenuNode::new("B", "B")
                        .with_route("reports")
                        .with_children(vec![MenuNode::new("summary", "Summary")]),
                    MenuNode::new("settings", "Settings"),
                ]),
                MenuNode::new("Z", "Z").with_route("zeta"),
                MenuNode::new("C", "C").with_children(vec![
                    MenuNode::new("grp", "Group")
                        .with_children(vec![MenuNode::new("c-leaf", "Leaf")]),
                ]),
            ],
            profile_section: None,
            config: MenuConfig {
                version: Some(MenuVersion::from("1")),
                ..MenuConfig::default()
            },
        }
    }

    fn new_store() -> Store {
        SelectionStore::open(Arc::new(InMemoryPersistence::new()), "k")
    }

    fn ctx(forest: &MenuForest) -> SyncContext<'_> {
        SyncContext {
            forest: Some(forest),
            authenticated: true,
        }
    }

    fn visit(
        sync: &mut UrlSynchronizer,
        href: &str,
        forest: &MenuForest,
        store: &mut Store,
    ) -> SyncOutcome {
        sync.on_location_change(&href.into(), ctx(forest), store)
    }

    #[test]
    fn location_parse_splits_query_and_hash() {
        let loc = Location::parse("/apps/A/reports?tab=1#top");
        assert_eq!(loc.path, "/apps/A/reports");
        assert_eq!(loc.query.as_deref(), Some("tab=1"));
        assert_eq!(loc.hash.as_deref(), Some("top"));
        assert_eq!(Location::parse("/x#h").query, None);
    }

    #[test]
    fn deep_link_selects_node_and_expands_ancestors() {
        let forest = forest();
        let mut store = new_store();
        store.select_main_menu(MenuKey::from("A"));
        let mut sync = UrlSynchronizer::new("/apps");

        let outcome = visit(&mut sync, "/apps/A/reports/summary", &forest, &mut store);

        assert_eq!(
            outcome,
            SyncOutcome::Selected { main: "A".into(), sidebar: "summary".into(), changed: true }
        );
        assert_eq!(store.selected_sidebar().unwrap(), "summary");
        assert!(store.open_sidebar_keys().contains("B"));
    }

    #[test]
    fn waits_for_forest_and_authentication() {
        let forest = forest();
        let mut store = new_store();
        let mut sync = UrlSynchronizer::new("/apps");
        let loc = Location::parse("/apps/A/reports");

        let pending = SyncContext { forest: None, authenticated: true };
        assert_eq!(
            sync.on_location_change(&loc, pending, &mut store),
            SyncOutcome::AwaitingForest
        );

        let signed_out = SyncContext { forest: Some(&forest), authenticated: false };
        assert_eq!(
            sync.on_location_change(&loc, signed_out, &mut store),
            SyncOutcome::Unauthenticated
        );

        assert_eq!(store.state(), &SelectionState::default());
    }

    #[test]
    fn reload_without_selection_picks_main_menu_then_matches() {
        let forest = forest();
        let mut store = new_store();
        let mut sync = UrlSynchronizer::new("/apps");

        let outcome = visit(&mut sync, "/apps/A/settings", &forest, &mut store);

        assert_eq!(store.selected_main_menu().unwrap(), "A");
        assert!(matches!(
            outcome,
            SyncOutcome::Selected { ref sidebar, .. } if sidebar == "settings"
        ));
    }

    #[test]
    fn deep_link_into_other_section_switches_main_menu() {
        let forest = forest();
        let mut store = new_store();
        store.select_main_menu(MenuKey::from("A"));
        store.select_sidebar_menu(MenuKey::from("summary"), forest.sidebar_menus("A"));
        let mut sync = UrlSynchronizer::new("/apps");

        let outcome = visit(&mut sync, "/apps/C/grp/c-leaf", &forest, &mut store);

        assert_eq!(
            outcome,
            SyncOutcome::Selected { main: "C".into(), sidebar: "c-leaf".into(), changed: true }
        );
        let open: Vec<&str> = store.open_sidebar_keys().iter().map(|k| k.as_str()).collect();
        assert_eq!(open, vec!["grp"]);
    }

    #[test]
    fn section_root_selects_nothing_but_suggests_default_leaf() {
        let forest = forest();
        let mut store = new_store();
        store.select_main_menu(MenuKey::from("C"));
        let mut sync = UrlSynchronizer::new("/apps");

        let outcome = visit(&mut sync, "/apps/C/", &forest, &mut store);

        assert_eq!(
            outcome,
            SyncOutcome::SectionRoot {
                main: "C".into(),
                default_route: Some("/apps/C/grp/c-leaf".into()),
            }
        );
        assert_eq!(store.selected_sidebar(), None);
    }

    #[test]
    fn main_menu_without_children_uses_its_own_route() {
        let forest = forest();
        let mut store = new_store();
        let mut sync = UrlSynchronizer::new("/apps");

        let outcome = visit(&mut sync, "/apps/zeta/anything", &forest, &mut store);

        assert_eq!(
            outcome,
            SyncOutcome::MainMenuOnly { main: "Z".into(), route: "/apps/zeta".into() }
        );
    }

    #[test]
    fn unmatched_and_foreign_paths_change_nothing() {
        let forest = forest();
        let mut store = new_store();
        store.select_main_menu(MenuKey::from("A"));
        store.select_sidebar_menu(MenuKey::from("settings"), forest.sidebar_menus("A"));
        let before = store.state().clone();
        let mut sync = UrlSynchronizer::new("/apps");

        assert_eq!(
            visit(&mut sync, "/apps/A/nope", &forest, &mut store),
            SyncOutcome::NoMatch { main: "A".into() }
        );
        assert_eq!(
            visit(&mut sync, "/login", &forest, &mut store),
            SyncOutcome::OutsideSection { main: "A".into() }
        );
        assert_eq!(store.state(), &before);
    }

    #[test]
    fn federated_sub_routes_resolve_to_owning_leaf() {
        let forest = forest();
        let mut store = new_store();
        store.select_main_menu(MenuKey::from("A"));
        let mut sync = UrlSynchronizer::new("/apps");

        let outcome = visit(&mut sync, "/apps/A/settings/profile/edit", &forest, &mut store);

        assert!(matches!(

            outcome,

            SyncOutcome::Selected { ref sidebar, .. } if sidebar == "settings"

        ));
    }

    #[test]
    fn repeated_location_is_not_reconciled_twice() {
        let forest = forest();
        let mut store = new_store();
        let mut sync = UrlSynchronizer::new("/apps");
        let loc = Location::parse("/apps/A/reports/summary");

        sync.on_location_change(&loc, ctx(&forest), &mut store);
        let again = visit(&mut sync, "/apps/A/reports/summary?x=1", &forest, &mut store);

        assert_eq!(again, SyncOutcome::AlreadyReconciled);
    }

    #[test]
    fn manual_selection_change_makes_same_path_reconcile_again() {
        let forest = forest();
        let mut store = new_store();
        let mut sync = UrlSynchronizer::new("/apps");
        let loc = Location::parse("/apps/A/reports/summary");

        sync.on_location_change(&loc, ctx(&forest), &mut store);
        store.set_open_sidebar_keys(Vec::new());
        let again = sync.on_location_change(&loc, ctx(&forest), &mut store);

        assert!(matches!(again, SyncOutcome::Selected { changed: false, .. }));
        assert!(store.open_sidebar_keys().contains("B"));
    }

    #[test]
    fn unechoed_click_does_not_swallow_a_later_visit() {
        let forest = forest();
        let mut store = new_store();
        let mut sync = UrlSynchronizer::new("/apps");

        // The router never reports this route (navigation was blocked).
        let intent = sync.navigate_to_sidebar("summary", &forest, &mut store).unwrap();
        let settings = visit(&mut sync, "/apps/A/settings", &forest, &mut store);
        assert!(matches!(
            settings,
            SyncOutcome::Selected { ref sidebar, .. } if sidebar == "settings"
        ));

        // Back to the clicked route is a real navigation.
        let back = visit(&mut sync, &intent.route, &forest, &mut store);

        assert!(matches!(
            back,
            SyncOutcome::Selected { ref sidebar, changed: true, .. } if sidebar == "summary"
        ));
        assert_eq!(store.selected_sidebar().unwrap(), "summary");
    }

    #[test]
    fn longest_section_prefix_picks_the_main_menu() {
        let forest = MenuForest {
            main_navigation: vec![
                MenuNode::new("ops", "Ops")
                    .with_route("ops")
                    .with_children(vec![MenuNode::new("queue", "Queue")]),
                MenuNode::new("ops-reports", "Ops reports")
                    .with_route("ops/reports")
                    .with_children(vec![MenuNode::new("daily", "Daily")]),
            ],
            ..MenuForest::default()
        };
        let mut store = new_store();
        let mut sync = UrlSynchronizer::new("/apps");

        let outcome = visit(&mut sync, "/apps/ops/reports/daily", &forest, &mut store);
        assert_eq!(
            outcome,
            SyncOutcome::Selected {
                main: "ops-reports".into(),
                sidebar: "daily".into(),
                changed: true,
            }
        );

        let outcome = visit(&mut sync, "/apps/ops/queue", &forest, &mut store);
        assert!(matches!(outcome, SyncOutcome::Selected { ref main, .. } if main == "ops"));
    }

    #[test]
    fn click_on_main_menu_routes_to_first_navigable_leaf() {
        let forest = forest();
        let mut store = new_store();
        let mut sync = UrlSynchronizer::new("/apps");

        let intent = sync.navigate_to_main_menu("C", &forest, &mut store).unwrap();

        assert_eq!(intent.route, "/apps/C/grp/c-leaf");
        assert_eq!(intent.sidebar.as_ref().unwrap(), "c-leaf");
        assert!(store.open_sidebar_keys().contains("grp"));

        // The router echoing the route back does not re-enter reconciliation.
        let echoed = visit(&mut sync, &intent.route, &forest, &mut store);
        assert_eq!(echoed, SyncOutcome::AlreadyReconciled);
    }

    #[test]
    fn click_on_leaf_main_menu_routes_to_section() {
        let forest = forest();
        let mut store = new_store();
        let mut sync = UrlSynchronizer::new("/apps");

        let intent = sync.navigate_to_main_menu("Z", &forest, &mut store).unwrap();
        assert_eq!(intent.route, "/apps/zeta");
        assert_eq!(intent.sidebar, None);
    }

    #[test]
    fn click_on_sidebar_in_other_section_switches_main() {
        let forest = forest();
        let mut store = new_store();
        store.select_main_menu(MenuKey::from("C"));
        let mut sync = UrlSynchronizer::new("/apps/");

        let intent = sync.navigate_to_sidebar("summary", &forest, &mut store).unwrap();

        assert_eq!(intent.route, "/apps/A/reports/summary");
        assert_eq!(store.selected_main_menu().unwrap(), "A");
        assert!(store.open_sidebar_keys().contains("B"));
        assert_eq!(sync.route_for(&forest, "summary"), Some(intent.route));
    }

    #[test]
    fn clicks_on_unknown_keys_are_errors() {
        let forest = forest();
        let mut store = new_store();
        let mut sync = UrlSynchronizer::new("/apps");

        assert!(matches!(
            sync.navigate_to_main_menu("summary", &forest, &mut store),
            Err(NavError::UnknownKey(_))
        ));
        assert!(matches!(
            sync.navigate_to_sidebar("nope", &forest, &mut store),
            Err(NavError::UnknownKey(_))
        ));
        assert_eq!(store.state(), &SelectionState::default());
    }
}
