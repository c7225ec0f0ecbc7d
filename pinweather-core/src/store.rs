//! Durable client storage behind an injectable interface.
//!
//! Each entry is a JSON document under a string key. `FileStore` keeps one
//! file per key in a data directory; `MemoryStore` is used in tests and for
//! throwaway sessions.

use parking_lot::Mutex;
use serde::{Serialize, de::DeserializeOwned};
use std::{
    collections::HashMap,
    fmt::Debug,
    fs, io,
    path::{Path, PathBuf},
};
use tokio::sync::broadcast;

use crate::error::StoreError;

pub const PINNED_KEY: &str = "pinned";
pub const CARDS_KEY: &str = "cards";
pub const PREFERENCES_KEY: &str = "preferences";

const EVENT_CAPACITY: usize = 32;

/// Change notification published to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    Set(String),
    Removed(String),
}

pub trait Store: Send + Sync + Debug {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
    fn subscribe(&self) -> broadcast::Receiver<StoreEvent>;
}

#[derive(Debug)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
    events: broadcast::Sender<StoreEvent>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self { entries: Mutex::new(HashMap::new()), events }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Store for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        let _ = self.events.send(StoreEvent::Set(key.to_string()));
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        if self.entries.lock().remove(key).is_some() {
            let _ = self.events.send(StoreEvent::Removed(key.to_string()));
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }
}

/// One `<key>.json` file per entry, replaced atomically on write.
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
    events: broadcast::Sender<StoreEvent>,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self { dir: dir.into(), events }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    fn io_err(key: &str, source: io::Error) -> StoreError {
        StoreError::Io { key: key.to_string(), source }
    }
}

impl Store for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Self::io_err(key, e)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir).map_err(|e| Self::io_err(key, e))?;

        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value).map_err(|e| Self::io_err(key, e))?;
        fs::rename(&tmp, &path).map_err(|e| Self::io_err(key, e))?;

        let _ = self.events.send(StoreEvent::Set(key.to_string()));
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => {
                let _ = self.events.send(StoreEvent::Removed(key.to_string()));
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Self::io_err(key, e)),
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }
}

/// Read and decode an entry. Anything unreadable, unparseable or rejected by
/// `accept` is dropped from the store and reported as absent.
pub fn load_json_with<T, F>(store: &dyn Store, key: &str, accept: F) -> Option<T>
where
    T: DeserializeOwned,
    F: FnOnce(&T) -> bool,
{
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            tracing::warn!(key, error = %e, "failed to read stored entry");
            return None;
        }
    };

    match serde_json::from_str::<T>(&raw) {
        Ok(value) if accept(&value) => return Some(value),
        Ok(_) => tracing::warn!(key, "discarding stored entry with unexpected shape"),
        Err(e) => tracing::warn!(key, error = %e, "discarding unparseable stored entry"),
    }

    if let Err(e) = store.remove(key) {
        tracing::warn!(key, error = %e, "failed to remove discarded entry");
    }
    None
}

pub fn load_json<T: DeserializeOwned>(store: &dyn Store, key: &str) -> Option<T> {
    load_json_with(store, key, |_: &T| true)
}

pub fn save_json<T: Serialize + ?Sized>(
    store: &dyn Store,
    key: &str,
    value: &T,
) -> Result<(), StoreError> {
    let json = serde_json::to_string(value)
        .map_err(|source| StoreError::Serialize { key: key.to_string(), source })?;
    store.set(key, &json)
}

/// Memory-backed store whose writes can be switched to fail.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct FailingStore {
    inner: MemoryStore,
    failing: std::sync::atomic::AtomicBool,
}

#[cfg(test)]
impl FailingStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn set_failing(&self, failing: bool) {
        self.failing.store(failing, std::sync::atomic::Ordering::SeqCst);
    }

    fn check(&self, key: &str) -> Result<(), StoreError> {
        if self.failing.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(StoreError::Io {
                key: key.to_string(),
                source: io::Error::new(io::ErrorKind::PermissionDenied, "read-only"),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
impl Store for FailingStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.check(key)?;
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.check(key)?;
        self.inner.remove(key)
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.inner.subscribe()
    }
}
