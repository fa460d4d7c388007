// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Mock remote store for testing.
//!
//! This module provides `MockStore`, an in-memory [`RemoteStore`] that honors TTLs,
//! records all operations and supports failure injection for testing error paths.

use std::{collections::HashMap, sync::Arc, time::Duration};

use parking_lot::Mutex;
use tokio::time::Instant;

use crate::{CacheEntry, Error, RemoteStore};

/// Recorded store operation with full context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp {
    /// A get operation was performed with the given key.
    Get(String),
    /// A set operation was performed.
    Set {
        /// The key that was written.
        key: String,
        /// The payload that was written.
        value: Vec<u8>,
        /// The requested time to live.
        ttl: Duration,
    },
    /// A delete operation was performed with the given key.
    Delete(String),
    /// A set-if-absent operation was performed.
    SetIfAbsent {
        /// The key that was claimed.
        key: String,
        /// The requested time to live.
        ttl: Duration,
    },
}

impl StoreOp {
    /// Returns the key the operation targeted.
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::Get(key) | Self::Delete(key) | Self::Set { key, .. } | Self::SetIfAbsent { key, .. } => key,
        }
    }
}

type FailPredicate = Box<dyn Fn(&StoreOp) -> bool + Send + Sync>;

/// A configurable mock remote store for testing.
///
/// Values expire according to the TTL given on write, measured with [`tokio::time`] so
/// paused-clock tests can drive expiry. Clones share state.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use stash_tier::RemoteStore;
/// use stash_tier::testing::{MockStore, StoreOp};
///
/// # async fn example() {
/// let store = MockStore::new();
/// store.set_with_ttl("key", b"42".to_vec(), Duration::from_secs(60)).await.unwrap();
/// assert_eq!(store.get("key").await.unwrap(), Some(b"42".to_vec()));
///
/// store.fail_when(|op| matches!(op, StoreOp::Get(_)));
/// assert!(store.get("key").await.is_err());
/// # }
/// ```
#[derive(Clone)]
pub struct MockStore {
    data: Arc<Mutex<HashMap<String, CacheEntry<Vec<u8>>>>>,
    operations: Arc<Mutex<Vec<StoreOp>>>,
    fail_when: Arc<Mutex<Option<FailPredicate>>>,
}

impl std::fmt::Debug for MockStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockStore")
            .field("data", &self.data)
            .field("operations", &self.operations)
            .field("fail_when", &self.fail_when.lock().is_some())
            .finish()
    }
}

impl Default for MockStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MockStore {
    /// Creates a new empty mock store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            data: Arc::new(Mutex::new(HashMap::new())),
            operations: Arc::new(Mutex::new(Vec::new())),
            fail_when: Arc::new(Mutex::new(None)),
        }
    }

    /// Seeds a payload without recording an operation.
    pub fn seed(&self, key: impl Into<String>, value: impl Into<Vec<u8>>, ttl: Duration) {
        self.data.lock().insert(key.into(), CacheEntry::new(value.into(), ttl));
    }

    /// Returns the live payload stored under `key` without recording an operation.
    #[must_use]
    pub fn peek(&self, key: &str) -> Option<Vec<u8>> {
        let now = Instant::now();
        self.data
            .lock()
            .get(key)
            .filter(|entry| !entry.is_expired_at(now))
            .map(|entry| entry.value().clone())
    }

    /// Returns true if the store holds a live value for `key`.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.peek(key).is_some()
    }

    /// Returns the number of live entries.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        let now = Instant::now();
        self.data.lock().values().filter(|entry| !entry.is_expired_at(now)).count()
    }

    /// Sets a predicate that determines when operations should fail.
    ///
    /// A failing operation is still recorded but leaves the data untouched.
    pub fn fail_when<F>(&self, predicate: F)
    where
        F: Fn(&StoreOp) -> bool + Send + Sync + 'static,
    {
        *self.fail_when.lock() = Some(Box::new(predicate));
    }

    /// Clears the failure predicate, allowing all operations to succeed.
    pub fn clear_failures(&self) {
        *self.fail_when.lock() = None;
    }

    /// Returns a clone of all recorded operations.
    #[must_use]
    pub fn operations(&self) -> Vec<StoreOp> {
        self.operations.lock().clone()
    }

    /// Returns the recorded operations that targeted `key`.
    #[must_use]
    pub fn operations_for(&self, key: &str) -> Vec<StoreOp> {
        self.operations.lock().iter().filter(|op| op.key() == key).cloned().collect()
    }

    /// Clears all recorded operations.
    pub fn clear_operations(&self) {
        self.operations.lock().clear();
    }

    fn check(&self, op: StoreOp) -> Result<(), Error> {
        let fail = self.fail_when.lock().as_ref().is_some_and(|predicate| predicate(&op));
        self.operations.lock().push(op);
        if fail {
            return Err(Error::transport("mock: operation failed"));
        }
        Ok(())
    }
}

impl RemoteStore for MockStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, Error> {
        self.check(StoreOp::Get(key.to_owned()))?;

        let now = Instant::now();
        let mut data = self.data.lock();
        match data.get(key) {
            Some(entry) if entry.is_expired_at(now) => {
                data.remove(key);
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.value().clone())),
            None => Ok(None),
        }
    }

    async fn set_with_ttl(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), Error> {
        self.check(StoreOp::Set {
            key: key.to_owned(),
            value: value.clone(),
            ttl,
        })?;
        self.data.lock().insert(key.to_owned(), CacheEntry::new(value, ttl));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), Error> {
        self.check(StoreOp::Delete(key.to_owned()))?;
        self.data.lock().remove(key);
        Ok(())
    }

    async fn set_if_absent_with_ttl(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<bool, Error> {
        self.check(StoreOp::SetIfAbsent { key: key.to_owned(), ttl })?;

        let now = Instant::now();
        let mut data = self.data.lock();
        if data.get(key).is_some_and(|entry| !entry.is_expired_at(now)) {
            return Ok(false);
        }
        data.insert(key.to_owned(), CacheEntry::new(value, ttl));
        Ok(true)
    }
}
