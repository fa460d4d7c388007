// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The tiered cache with single-flight loading.

use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use oneflight::{FlightAborted, FlightGroup};
use serde::{Serialize, de::DeserializeOwned};
use stash_tier::{Error, NoRemote, RemoteStore};

use crate::{
    BoundedStore, CacheOptions, CacheStats,
    builder::CacheBuilder,
    codec,
    key::lock_key,
    stats::hit_rate,
};

/// A two-tier cache: a bounded in-process tier (L1) in front of an optional shared remote
/// tier (L2), with single-flight loading of missing values.
///
/// - Reads check L1, then L2. A remote hit is copied into L1 with a TTL capped at
///   [`CacheOptions::l1_max_ttl`].
/// - On a miss, [`get_or_load`](Self::get_or_load) runs the producer at most once per key
///   per process, however many callers ask concurrently. Every caller receives the same
///   result, error included.
/// - Successful results populate both tiers. Errors are never cached.
/// - Remote failures on the read and populate paths are logged and otherwise ignored; the
///   remote tier is an optimization, not a dependency.
///
/// `V` is the cached value type. `E` is the error type of producers; it must be cloneable
/// because a single failure is delivered to every waiting caller. `R` is the remote tier.
///
/// Clones share the same tiers and in-flight registry.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use oneflight::FlightAborted;
/// use stash::TieredCache;
///
/// #[derive(Debug, Clone)]
/// enum LoadError {
///     Aborted,
/// }
///
/// impl From<FlightAborted> for LoadError {
///     fn from(_: FlightAborted) -> Self {
///         Self::Aborted
///     }
/// }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let cache = TieredCache::builder::<String, LoadError>().max_size(100).build();
///
/// let value = cache
///     .get_or_load("greeting", Duration::from_secs(60), || async { Ok("hello".to_string()) })
///     .await
///     .unwrap();
/// assert_eq!(value, "hello");
/// assert_eq!(cache.get("greeting").await.as_deref(), Some("hello"));
/// # }
/// ```
pub struct TieredCache<V, E, R = NoRemote> {
    core: Arc<CacheCore<V, R>>,
    flights: FlightGroup<String, Result<V, E>>,
}

struct CacheCore<V, R> {
    name: &'static str,
    local: BoundedStore<V>,
    remote: Option<R>,
    options: CacheOptions,
    remote_hits: AtomicU64,
    loads: AtomicU64,
}

impl<V, E, R> Clone for TieredCache<V, E, R> {
    fn clone(&self) -> Self {
        Self {
            core: Arc::clone(&self.core),
            flights: self.flights.clone(),
        }
    }
}

impl<V, E, R> std::fmt::Debug for TieredCache<V, E, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TieredCache")
            .field("name", &self.core.name)
            .field("local", &self.core.local)
            .field("remote", &self.core.remote.is_some())
            .field("options", &self.core.options)
            .field("flights", &self.flights)
            .finish()
    }
}

impl TieredCache<(), (), NoRemote> {
    /// Creates a new cache builder for values of type `V` loaded with errors of type `E`.
    ///
    /// # Examples
    ///
    /// ```
    /// use stash::TieredCache;
    ///
    /// let cache = TieredCache::builder::<u64, std::sync::Arc<std::io::Error>>().build();
    /// assert_eq!(cache.stats().size, 0);
    /// ```
    #[must_use]
    pub fn builder<V, E>() -> CacheBuilder<V, E> {
        CacheBuilder::new()
    }
}

impl<V: Clone, E, R> TieredCache<V, E, R> {
    pub(crate) fn new(name: &'static str, options: CacheOptions, remote: Option<R>) -> Self {
        Self {
            core: Arc::new(CacheCore {
                name,
                local: BoundedStore::new(options.max_size),
                remote,
                options,
                remote_hits: AtomicU64::new(0),
                loads: AtomicU64::new(0),
            }),
            flights: FlightGroup::default(),
        }
    }

    /// Returns the name reported in logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.core.name
    }

    /// Returns the options the cache was built with.
    #[must_use]
    pub fn options(&self) -> &CacheOptions {
        &self.core.options
    }

    /// Returns a snapshot of the counters and of the in-process keys.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        let local = &self.core.local;
        let (hits, misses) = (local.hits(), local.misses());
        CacheStats {
            hits,
            misses,
            hit_rate: hit_rate(hits, misses),
            size: local.len(),
            keys: local.keys(),
            remote_hits: self.core.remote_hits.load(Ordering::Relaxed),
            loads: self.core.loads.load(Ordering::Relaxed),
        }
    }

    /// Drops every in-process entry. The remote tier and the counters are left alone.
    pub fn clear_local(&self) {
        self.core.local.clear();
    }
}

impl<V, E, R> TieredCache<V, E, R>
where
    V: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
    E: Clone + From<FlightAborted> + Send + Sync + 'static,
    R: RemoteStore + 'static,
{
    /// Returns the cached value for `key`, or loads it with `producer`.
    ///
    /// Concurrent calls for the same missing key run `producer` once; the others wait for
    /// it and receive a clone of its result. The producer runs on its own task, so a
    /// caller giving up does not abort it for the others. On success the value is cached
    /// for `ttl` (in-process at most for [`CacheOptions::l1_max_ttl`]); on failure nothing
    /// is cached and the error is returned to every waiter unchanged. A zero `ttl` returns
    /// the produced value without caching it.
    ///
    /// # Errors
    ///
    /// Returns the producer's error, or the conversion of [`FlightAborted`] if the producer
    /// panicked.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime.
    pub async fn get_or_load<F, Fut>(&self, key: &str, ttl: Duration, producer: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        if let Some(value) = self.core.lookup(key, ttl).await {
            return Ok(value);
        }

        let core = Arc::clone(&self.core);
        let owned_key = key.to_owned();
        self.flights
            .execute(key.to_owned(), move || core.load(owned_key, ttl, producer))
            .await
            .unwrap_or_else(|aborted| Err(E::from(aborted)))
    }

    /// Returns the cached value for `key`, if any tier holds it.
    ///
    /// A remote hit is copied into L1 for `min(default_ttl, l1_max_ttl)`, because the remote
    /// tier does not report the remaining TTL.
    pub async fn get(&self, key: &str) -> Option<V> {
        self.core.lookup(key, self.core.options.default_ttl).await
    }

    /// Stores `value` under `key` in every tier.
    ///
    /// A zero `ttl` stores nothing and removes `key` from every tier instead.
    ///
    /// # Errors
    ///
    /// Returns the remote tier's error. The in-process tier is updated regardless.
    pub async fn set(&self, key: &str, value: V, ttl: Duration) -> Result<(), Error> {
        if ttl.is_zero() {
            return self.delete(key).await;
        }

        let core = &self.core;
        core.store_local(key, value.clone(), ttl);
        match &core.remote {
            Some(remote) => remote.set_with_ttl(key, codec::encode(&value)?, ttl).await,
            None => Ok(()),
        }
    }

    /// Removes `key` from every tier.
    ///
    /// # Errors
    ///
    /// Returns the remote tier's error. The in-process entry is removed regardless.
    pub async fn delete(&self, key: &str) -> Result<(), Error> {
        let core = &self.core;
        core.local.remove(key);
        match &core.remote {
            Some(remote) => remote.delete(key).await,
            None => Ok(()),
        }
    }
}

impl<V, R> CacheCore<V, R>
where
    V: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
    R: RemoteStore + 'static,
{
    async fn lookup(&self, key: &str, ttl: Duration) -> Option<V> {
        if let Some(value) = self.local.get(key) {
            return Some(value);
        }
        self.read_remote(key, ttl).await
    }

    /// Reads `key` from the remote tier and promotes a hit into L1.
    async fn read_remote(&self, key: &str, ttl: Duration) -> Option<V> {
        let remote = self.remote.as_ref()?;

        let bytes = match remote.get(key).await {
            Ok(bytes) => bytes?,
            Err(error) => {
                self.remote_failed("get", key, &error);
                return None;
            }
        };
        let value = match codec::decode::<V>(&bytes) {
            Ok(value) => value,
            Err(error) => {
                self.remote_failed("decode", key, &error);
                return None;
            }
        };

        self.remote_hits.fetch_add(1, Ordering::Relaxed);
        self.store_local(key, value.clone(), ttl);
        Some(value)
    }

    async fn load<F, Fut, E>(self: Arc<Self>, key: String, ttl: Duration, producer: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        // A flight that settled just before this one started may have filled L1.
        if let Some(value) = self.local.peek(&key) {
            return Ok(value);
        }

        match &self.remote {
            Some(remote) if self.options.lock.enabled => self.load_locked(remote, &key, ttl, producer).await,
            _ => self.produce(&key, ttl, producer).await,
        }
    }

    async fn load_locked<F, Fut, E>(&self, remote: &R, key: &str, ttl: Duration, producer: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let lock = &self.options.lock;
        let lock_key = lock_key(key);
        let holder = std::process::id().to_string().into_bytes();

        match remote.set_if_absent_with_ttl(&lock_key, holder, lock.ttl).await {
            Ok(true) => {
                let result = self.produce(key, ttl, producer).await;
                if let Err(error) = remote.delete(&lock_key).await {
                    self.remote_failed("unlock", key, &error);
                }
                result
            }
            Ok(false) => {
                tracing::event!(
                    name: "stash.lock.contended",
                    tracing::Level::DEBUG,
                    cache.name = self.name,
                    cache.key = key,
                    stash.lock.poll_attempts = lock.poll_attempts,
                );
                for _ in 0..lock.poll_attempts {
                    tokio::time::sleep(lock.poll_interval).await;
                    if let Some(value) = self.read_remote(key, ttl).await {
                        return Ok(value);
                    }
                }
                self.produce(key, ttl, producer).await
            }
            Err(error) => {
                self.remote_failed("lock", key, &error);
                self.produce(key, ttl, producer).await
            }
        }
    }

    async fn produce<F, Fut, E>(&self, key: &str, ttl: Duration, producer: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        self.loads.fetch_add(1, Ordering::Relaxed);
        let value = producer().await?;

        if ttl.is_zero() {
            return Ok(value);
        }
        self.store_local(key, value.clone(), ttl);
        if let Some(remote) = &self.remote {
            let written = match codec::encode(&value) {
                Ok(bytes) => remote.set_with_ttl(key, bytes, ttl).await,
                Err(error) => Err(error),
            };
            if let Err(error) = written {
                self.remote_failed("set", key, &error);
            }
        }
        Ok(value)
    }

    /// Copies `value` into L1, unless the capped TTL is zero: an entry that is expired on
    /// arrival must not evict a live one.
    fn store_local(&self, key: &str, value: V, ttl: Duration) {
        let local_ttl = self.options.local_ttl(ttl);
        if local_ttl.is_zero() {
            self.local.remove(key);
        } else {
            self.local.insert(key.to_owned(), value, local_ttl);
        }
    }

    fn remote_failed(&self, operation: &'static str, key: &str, error: &Error) {
        tracing::event!(
            name: "stash.remote.error",
            tracing::Level::WARN,
            cache.name = self.name,
            cache.key = key,
            stash.remote.operation = operation,
            error = %error,
        );
    }
}
