//! `navshell-shell`
//!
//! **Responsibility:** keep navigation state consistent with the URL.
//!
//! This crate provides:
//! - Menu forest fetching with version-aware caching (`provider`)
//! - Persisted selection state behind an injected storage port (`store`, `persistence`)
//! - URL <-> selection reconciliation (`sync`)
//! - A `NavigationShell` facade wiring the above for a host UI
//!
//! Rendering, routing and authentication are the host's job; this crate only
//! consumes their signals and hands back route strings.

pub mod config;
pub mod persistence;
pub mod provider;
pub mod shell;
pub mod store;
pub mod sync;

pub use config::{ConfigError, MenuSourceConfig, ShellConfig};
pub use persistence::{FilePersistence, InMemoryPersistence, SelectionPersistence};
pub use provider::{
    FileMenuSource, MenuProvider, MenuSource, MenuStatus, ProviderError, RefreshOutcome,
    SourceError, StaticMenuSource,
};
#[cfg(feature = "http")]
pub use provider::HttpMenuSource;
pub use shell::{NavigationShell, RefreshReport};
pub use store::{SelectionState, SelectionStore};
pub use sync::{Location, NavigationIntent, SyncContext, SyncOutcome, UrlSynchronizer};
