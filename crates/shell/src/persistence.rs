//! Storage ports for persisted selection state.
//!
//! The store only ever hands these a JSON blob under a stable key; nothing
//! here knows what the blob contains.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use anyhow::{Context, anyhow};

/// Durable key/value storage for JSON blobs.
pub trait SelectionPersistence: Send + Sync {
    fn load(&self, key: &str) -> anyhow::Result<Option<String>>;
    fn save(&self, key: &str, blob: &str) -> anyhow::Result<()>;
    fn remove(&self, key: &str) -> anyhow::Result<()>;
}

impl<S> SelectionPersistence for Arc<S>
where
    S: SelectionPersistence + ?Sized,
{
    fn load(&self, key: &str) -> anyhow::Result<Option<String>> {
        (**self).load(key)
    }

    fn save(&self, key: &str, blob: &str) -> anyhow::Result<()> {
        (**self).save(key, blob)
    }

    fn remove(&self, key: &str) -> anyhow::Result<()> {
        (**self).remove(key)
    }
}

/// In-memory storage for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryPersistence {
    inner: RwLock<HashMap<String, String>>,
}

impl InMemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SelectionPersistence for InMemoryPersistence {
    fn load(&self, key: &str) -> anyhow::Result<Option<String>> {
        let map = self.inner.read().map_err(|_| anyhow!("selection storage lock poisoned"))?;
        Ok(map.get(key).cloned())
    }

    fn save(&self, key: &str, blob: &str) -> anyhow::Result<()> {
        let mut map = self.inner.write().map_err(|_| anyhow!("selection storage lock poisoned"))?;
        map.insert(key.to_string(), blob.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> anyhow::Result<()> {
        let mut map = self.inner.write().map_err(|_| anyhow!("selection storage lock poisoned"))?;
        map.remove(key);
        Ok(())
    }
}

/// One JSON file per storage key inside a directory.
#[derive(Debug, Clone)]
pub struct FilePersistence {
    dir: PathBuf,
}

impl FilePersistence {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `{app_data_dir}/navshell`.
    pub fn in_data_dir() -> anyhow::Result<Self> {
        Ok(Self::new(default_storage_dir()?))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File for `key`. ASCII alphanumerics and `-` are kept; every other
    /// byte (including `_`) becomes `_XX`, so distinct keys never share a file.
    fn path_for(&self, key: &str) -> PathBuf {
        let mut file = String::with_capacity(key.len());
        for byte in key.bytes() {
            if byte.is_ascii_alphanumeric() || byte == b'-' {
                file.push(char::from(byte));
            } else {
                file.push_str(&format!("_{byte:02X}"));
            }
        }
        self.dir.join(format!("{file}.json"))
    }
}

impl SelectionPersistence for FilePersistence {
    fn load(&self, key: &str) -> anyhow::Result<Option<String>> {
        let path = self.path_for(key);
        match std::fs::read_to_string(&path) {
            Ok(blob) => Ok(Some(blob)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => {
                Err(err).with_context(|| format!("failed to read selection state at {path:?}"))
            }
        }
    }

    fn save(&self, key: &str, blob: &str) -> anyhow::Result<()> {
        std::fs::create_dir_all(&self.dir).with_context(|| {
            format!("failed to create selection storage directory at {:?}", self.dir)
        })?;

        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, blob)
            .with_context(|| format!("failed to write selection state to {tmp:?}"))?;
        std::fs::rename(&tmp, &path)
            .with_context(|| format!("failed to move selection state into {path:?}"))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> anyhow::Result<()> {
        let path = self.path_for(key);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => {
                Err(err).with_context(|| format!("failed to remove selection state at {path:?}"))
            }
        }
    }
}

/// Resolve the default storage directory: `{app_data_dir}/navshell`.
pub fn default_storage_dir() -> anyhow::Result<PathBuf> {
    let base = dirs::data_dir()
        .or_else(|| {
            dirs::home_dir().map(|mut h| {
                h.push(".local");
                h.push("share");
                h
            })
        })
        .context("failed to resolve OS app data directory - tried data_dir() and home_dir()/.local/share")?;

    Ok(base.join("navshell"))
}
