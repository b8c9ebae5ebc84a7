//! Key-value persistence and the best-effort mirror on top of it.
//!
//! Stores never talk to a [`KeyValueStore`] directly. They go through
//! [`load`] and [`save`], which never fail: a missing key, unavailable
//! storage or an unparseable value all fall back to a default, and write
//! failures are logged and dropped.

use crate::error::{Error, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Stable storage keys.
pub mod keys {
    pub const SESSIONS: &str = "sessions";
    pub const ACTIVE_SESSION: &str = "activeSession";
    pub const TASKS: &str = "tasks";
    pub const REWARDS: &str = "rewards_list";
    pub const PURCHASES: &str = "purchases_history";
    pub const STAR_BALANCE: &str = "stars_balance";
    pub const TUTORIAL: &str = "activity-tracker-tutorial-state";
}

/// A durable string slot per key.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    fn remove(&self, key: &str) -> Result<()>;
}

/// Read `key` as JSON, or `fallback` when absent, unreadable or malformed.
pub fn load<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str, fallback: T) -> T {
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return fallback,
        Err(e) => {
            tracing::error!(key, error = %e, "storage load failed, using fallback");
            return fallback;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(e) => {
            tracing::error!(key, error = %e, "stored value is malformed, using fallback");
            fallback
        }
    }
}

/// Write `value` under `key` as JSON. Failures are logged, never returned.
pub fn save<T: Serialize + ?Sized>(store: &dyn KeyValueStore, key: &str, value: &T) {
    let serialized = match serde_json::to_string(value) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(key, error = %e, "failed to serialize value for storage");
            return;
        }
    };

    if let Err(e) = store.set(key, &serialized) {
        tracing::error!(key, error = %e, "storage save failed");
    }
}

/// Drop `key`. Failures are logged, never returned.
pub fn remove(store: &dyn KeyValueStore, key: &str) {
    if let Err(e) = store.remove(key) {
        tracing::error!(key, error = %e, "storage remove failed");
    }
}

/// Subscriber that mirrors every value of a cell to `key`.
pub fn mirror_to<T: Serialize>(
    store: Arc<dyn KeyValueStore>,
    key: &'static str,
) -> impl FnMut(&T) + Send + 'static {
    move |value: &T| save(store.as_ref(), key, value)
}

/// Like [`mirror_to`], but `None` removes the key instead of storing `null`.
pub fn mirror_optional_to<T: Serialize>(
    store: Arc<dyn KeyValueStore>,
    key: &'static str,
) -> impl FnMut(&Option<T>) + Send + 'static {
    move |value: &Option<T>| match value {
        Some(v) => save(store.as_ref(), key, v),
        None => remove(store.as_ref(), key),
    }
}

/// In-process store, mainly for tests.
///
/// [`MemoryStore::set_unavailable`] makes every call fail, which is how
/// tests simulate inaccessible storage.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Raw stored string, bypassing availability checks
    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries().get(key).cloned()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "storage unavailable",
            )));
        }
        Ok(())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.check_available()?;
        Ok(self.entries().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.check_available()?;
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.check_available()?;
        self.entries().remove(key);
        Ok(())
    }
}
