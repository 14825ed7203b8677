//! Menu forest fetching with version-aware caching.
//!
//! A refetch that returns the cached `config.version` is a no-op: the cached
//! forest (and therefore every selection derived from it) is left untouched.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;

use navshell_core::{MenuVersion, NavError};
use navshell_menu::{MenuForest, normalize_payload};

/// Where the raw menu payload comes from.
#[async_trait]
pub trait MenuSource: Send + Sync {
    async fn fetch(&self) -> Result<Value, SourceError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("failed to read menu source: {0}")]
    Io(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("API error ({0}): {1}")]
    Api(u16, String),
    #[error("parse error: {0}")]
    Parse(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Payload(#[from] NavError),
}

/// Fetch status as seen by the UI.
///
/// "still fetching", "fetch failed" and "fetched but empty" are distinct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuStatus {
    Idle,
    Loading,
    Empty,
    Ready,
    Failed,
}

/// Result of one refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A new forest was installed.
    Replaced { version: Option<MenuVersion> },
    /// Same version as the cached forest; nothing changed.
    Unchanged,
    /// The fetch or payload failed. Any cached forest is kept.
    Failed(ProviderError),
}

/// Holds the current forest and the state of the last fetch.
#[derive(Debug, Default)]
pub struct MenuProvider {
    forest: Option<MenuForest>,
    loading: bool,
    last_error: Option<ProviderError>,
    fetched_at: Option<DateTime<Utc>>,
}

impl MenuProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current forest, or `None` while nothing has been loaded.
    pub fn forest(&self) -> Option<&MenuForest> {
        self.forest.as_ref()
    }

    pub fn last_error(&self) -> Option<&ProviderError> {
        self.last_error.as_ref()
    }

    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.fetched_at
    }

    pub fn status(&self) -> MenuStatus {
        match (&self.forest, self.loading, &self.last_error) {
            (Some(forest), _, _) if forest.is_empty() => MenuStatus::Empty,
            (Some(_), _, _) => MenuStatus::Ready,
            (None, true, _) => MenuStatus::Loading,
            (None, false, Some(_)) => MenuStatus::Failed,
            (None, false, None) => MenuStatus::Idle,
        }
    }

    /// Fetch from `source` and install the result.
    ///
    /// Dropping the returned future cancels the fetch; the provider goes back
    /// to its previous status and nothing is committed.
    pub async fn refresh<S>(&mut self, source: &S) -> RefreshOutcome
    where
        S: MenuSource + ?Sized,
    {
        let pending = PendingFetch::begin(self);
        let fetched = source.fetch().await;
        pending.complete(fetched)
    }

    /// Install the result of a fetch performed by the caller.
    pub fn accept(&mut self, fetched: Result<Value, SourceError>) -> RefreshOutcome {
        let parsed = fetched
            .map_err(ProviderError::from)
            .and_then(|raw| normalize_payload(raw).map_err(ProviderError::from));

        let forest = match parsed {
            Ok(forest) => forest,
            Err(err) => {
                tracing::warn!(cached = self.forest.is_some(), "menu fetch failed: {err}");
                self.last_error = Some(err.clone());
                return RefreshOutcome::Failed(err);
            }
        };

        self.last_error = None;
        self.fetched_at = Some(Utc::now());

        if let Some(current) = &self.forest {
            if current.is_same_version(&forest) {
                tracing::debug!(
                    version = ?forest.version(),
                    "menu version unchanged; keeping cached forest"
                );
                return RefreshOutcome::Unchanged;
            }
        }

        let version = forest.version().cloned();
        tracing::info!(
            version = ?version,
            nodes = forest.main_navigation.len(),
            "installed menu forest"
        );
        self.forest = Some(forest);
        RefreshOutcome::Replaced { version }
    }
}

/// Marks the provider as loading until completed or dropped.
struct PendingFetch<'a> {
    provider: &'a mut MenuProvider,
    done: bool,
}

impl<'a> PendingFetch<'a> {
    fn begin(provider: &'a mut MenuProvider) -> Self {
        provider.loading = true;
        Self {
            provider,
            done: false,
        }
    }

    fn complete(mut self, fetched: Result<Value, SourceError>) -> RefreshOutcome {
        self.done = true;
        self.provider.loading = false;
        self.provider.accept(fetched)
    }
}

impl Drop for PendingFetch<'_> {
    fn drop(&mut self) {
        if !self.done {
            self.provider.loading = false;
            tracing::debug!("menu fetch cancelled");
        }
    }
}

/// Fixed payload (bundled menus, tests).
#[derive(Debug, Clone)]
pub struct StaticMenuSource {
    payload: Value,
}

impl StaticMenuSource {
    pub fn new(payload: Value) -> Self {
        Self { payload }
    }
}

#[async_trait]
impl MenuSource for StaticMenuSource {
    async fn fetch(&self) -> Result<Value, SourceError> {
        Ok(self.payload.clone())
    }
}

/// Versioned static menu file on disk.
#[derive(Debug, Clone)]
pub struct FileMenuSource {
    path: PathBuf,
}

impl FileMenuSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl MenuSource for FileMenuSource {
    async fn fetch(&self) -> Result<Value, SourceError> {
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| SourceError::Io(format!("{}: {e}", self.path.display())))?;
        serde_json::from_str(&text).map_err(|e| SourceError::Parse(e.to_string()))
    }
}

/// Menu backend endpoint.
#[cfg(feature = "http")]
#[derive(Debug, Clone)]
pub struct HttpMenuSource {
    url: String,
    token: Option<String>,
    client: reqwest::Client,
}

#[cfg(feature = "http")]
impl HttpMenuSource {
    pub fn new(url: String) -> Self {
        Self {
            url,
            token: None,
            client: reqwest::Client::new(),
        }
    }

    pub fn with_token(url: String, token: String) -> Self {
        Self {
            url,
            token: Some(token),
            client: reqwest::Client::new(),
        }
    }
}

#[cfg(feature = "http")]
#[async_trait]
impl MenuSource for HttpMenuSource {
    async fn fetch(&self) -> Result<Value, SourceError> {
        let mut req = self.client.get(&self.url);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }

        let resp = req.send().await.map_err(|e| SourceError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(SourceError::Api(
                resp.status().as_u16(),
                resp.text().await.unwrap_or_default(),
            ));
        }

        resp.json().await.map_err(|e| SourceError::Parse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    struct NeverSource;

    #[async_trait]
    impl MenuSource for NeverSource {
        async fn fetch(&self) -> Result<Value, SourceError> {
            std::future::pending().await
        }
    }

    struct FailingSource;

    #[async_trait]
    impl MenuSource for FailingSource {
        async fn fetch(&self) -> Result<Value, SourceError> {
            Err(SourceError::Network("connection refused".into()))
        }
    }

    fn payload(version: &str, keys: &[&str]) -> Value {
        let nodes: Vec<Value> = keys.iter().map(|k| json!({ "key": k })).collect();
        json!({ "mainNavigation": nodes, "config": { "version": version } })
    }

    #[tokio::test]
    async fn first_fetch_installs_forest() {
        let mut provider = MenuProvider::new();
        assert_eq!(provider.status(), MenuStatus::Idle);

        let outcome = provider.refresh(&StaticMenuSource::new(payload("1", &["home"]))).await;

        assert_eq!(outcome, RefreshOutcome::Replaced { version: Some(MenuVersion::from("1")) });
        assert_eq!(provider.status(), MenuStatus::Ready);
        assert!(provider.fetched_at().is_some());
    }

    #[tokio::test]
    async fn same_version_keeps_cached_forest() {
        let mut provider = MenuProvider::new();
        provider.refresh(&StaticMenuSource::new(payload("1", &["home"]))).await;

        let outcome = provider.refresh(&StaticMenuSource::new(payload("1", &["other"]))).await;

        assert_eq!(outcome, RefreshOutcome::Unchanged);
        assert_eq!(provider.forest().unwrap().main_navigation[0].key, "home");
    }

    #[tokio::test]
    async fn new_version_replaces_forest() {
        let mut provider = MenuProvider::new();
        provider.refresh(&StaticMenuSource::new(payload("1", &["home"]))).await;

        let outcome = provider.refresh(&StaticMenuSource::new(payload("2", &["other"]))).await;

        assert!(matches!(outcome, RefreshOutcome::Replaced { .. }));
        assert_eq!(provider.forest().unwrap().main_navigation[0].key, "other");
    }

    #[tokio::test]
    async fn failure_is_distinct_from_loading_and_empty() {
        let mut provider = MenuProvider::new();
        let outcome = provider.refresh(&FailingSource).await;
        assert!(matches!(
            outcome,
            RefreshOutcome::Failed(ProviderError::Source(SourceError::Network(_)))
        ));
        assert_eq!(provider.status(), MenuStatus::Failed);

        provider.refresh(&StaticMenuSource::new(payload("1", &[]))).await;
        assert_eq!(provider.status(), MenuStatus::Empty);
        assert!(provider.last_error().is_none());
    }

    #[tokio::test]
    async fn failed_refetch_keeps_cached_forest() {
        let mut provider = MenuProvider::new();
        provider.refresh(&StaticMenuSource::new(payload("1", &["home"]))).await;

        provider.refresh(&FailingSource).await;

        assert_eq!(provider.status(), MenuStatus::Ready);
        assert!(provider.last_error().is_some());
        assert_eq!(provider.forest().unwrap().main_navigation[0].key, "home");
    }

    #[tokio::test]
    async fn malformed_payload_is_a_failure() {
        let mut provider = MenuProvider::new();
        let outcome = provider.refresh(&StaticMenuSource::new(json!(42))).await;
        assert!(matches!(outcome, RefreshOutcome::Failed(ProviderError::Payload(_))));
    }

    #[test]
    fn status_is_loading_only_without_cached_forest() {
        let mut provider = MenuProvider::new();
        let pending = PendingFetch::begin(&mut provider);
        assert_eq!(pending.provider.status(), MenuStatus::Loading);
        drop(pending);
        assert_eq!(provider.status(), MenuStatus::Idle);

        provider.accept(Ok(payload("1", &["home"])));
        let pending = PendingFetch::begin(&mut provider);
        assert_eq!(pending.provider.status(), MenuStatus::Ready);
    }

    #[tokio::test]
    async fn cancelled_fetch_commits_nothing() {
        let mut provider = MenuProvider::new();
        {
            let mut fut = Box::pin(provider.refresh(&NeverSource));
            let timed_out = tokio::time::timeout(Duration::from_millis(10), &mut fut).await;
            assert!(timed_out.is_err());
        }
        assert_eq!(provider.status(), MenuStatus::Idle);
        assert!(provider.forest().is_none());
    }

    #[tokio::test]
    async fn file_source_reads_json() {
        let path = std::env::temp_dir().join(format!("navshell-menu-{}.json", std::process::id()));
        tokio::fs::write(&path, payload("9", &["home"]).to_string()).await.unwrap();

        let mut provider = MenuProvider::new();
        let outcome = provider.refresh(&FileMenuSource::new(&path)).await;
        assert_eq!(outcome, RefreshOutcome::Replaced { version: Some(MenuVersion::from("9")) });

        let _ = tokio::fs::remove_file(&path).await;
        let missing = FileMenuSource::new(&path).fetch().await;
        assert!(matches!(missing, Err(SourceError::Io(_))));
    }
}
