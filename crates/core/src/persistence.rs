use std::{collections::HashMap, sync::Mutex};

/// Raised by a [KeyValueStore] when a write could not be committed.
///
/// Every caller inside this crate treats these as best-effort failures:
/// they are logged and then dropped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, uniffi::Error)]
pub enum StorageError {
    #[error("Storage unavailable - {reason}")]
    Unavailable { reason: String },
    #[error("Storage quota exceeded")]
    QuotaExceeded,
}

impl From<uniffi::UnexpectedUniFFICallbackError> for StorageError {
    fn from(value: uniffi::UnexpectedUniFFICallbackError) -> Self {
        StorageError::Unavailable {
            reason: value.reason,
        }
    }
}

/// Origin scoped key/value storage shared by the consent store and the locale router.
/// In a browser this is `localStorage`; native webview shells can back it with
/// whatever their platform offers.
///
/// Reads must never fail: a store that cannot be read (disabled by policy,
/// private browsing) simply reports `None`.
#[uniffi::export(callback_interface)]
pub trait KeyValueStore: Send + Sync {
    /// Gets the value for the given key, or None if not found or unreadable
    fn get(&self, key: String) -> Option<String>;

    /// Sets the value for the given key
    fn set(&self, key: String, value: String) -> Result<(), StorageError>;
}

/// Process local store, used by tests and by hosts without persistent storage.
#[derive(Default, Debug)]
pub struct InMemoryStore(Mutex<HashMap<String, String>>);

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store pre-populated with `entries`, as if written on a prior visit.
    pub fn with_entries<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let map = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self(Mutex::new(map))
    }
}

impl KeyValueStore for InMemoryStore {
    fn get(&self, key: String) -> Option<String> {
        self.0.lock().ok()?.get(&key).cloned()
    }

    fn set(&self, key: String, value: String) -> Result<(), StorageError> {
        let mut map = self.0.lock().map_err(|e| StorageError::Unavailable {
            reason: e.to_string(),
        })?;
        map.insert(key, value);
        Ok(())
    }
}

/// A store whose every read is empty and every write is refused, the way
/// `localStorage` behaves when disabled by browser policy.
#[derive(Default, Debug, Clone, Copy)]
pub struct UnavailableStore;

impl KeyValueStore for UnavailableStore {
    fn get(&self, _key: String) -> Option<String> {
        None
    }

    fn set(&self, _key: String, _value: String) -> Result<(), StorageError> {
        Err(StorageError::Unavailable {
            reason: "storage disabled".to_owned(),
        })
    }
}

/// Reads `key`, treating an empty string the same as a missing entry.
pub(crate) fn read(store: &dyn KeyValueStore, key: &str) -> Option<String> {
    store.get(key.to_owned()).filter(|value| !value.is_empty())
}

/// Best-effort write. Failures are logged and swallowed.
pub(crate) fn write_best_effort(store: &dyn KeyValueStore, key: &str, value: &str) -> bool {
    match store.set(key.to_owned(), value.to_owned()) {
        Ok(()) => true,
        Err(e) => {
            log::warn!("Failed to persist `{key}`: {e}");
            false
        }
    }
}
