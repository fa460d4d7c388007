// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Builder for [`TieredCache`].

use std::{marker::PhantomData, time::Duration};

use stash_tier::{NoRemote, RemoteStore};

use crate::{CacheOptions, LockOptions, TieredCache, constants::DEFAULT_NAME};

/// Builder for constructing a [`TieredCache`].
///
/// Created by calling [`TieredCache::builder()`]. The remote tier is optional; adding one
/// changes the builder's type so that caches without a remote tier carry no remote code.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use stash::TieredCache;
///
/// let cache = TieredCache::builder::<String, String>()
///     .name("greetings")
///     .max_size(500)
///     .l1_max_ttl(Duration::from_secs(60))
///     .build();
/// assert_eq!(cache.name(), "greetings");
/// ```
#[derive(Debug)]
pub struct CacheBuilder<V, E, R = NoRemote> {
    name: &'static str,
    options: CacheOptions,
    remote: Option<R>,
    _phantom: PhantomData<fn() -> (V, E)>,
}

impl<V, E> CacheBuilder<V, E, NoRemote> {
    pub(crate) fn new() -> Self {
        Self {
            name: DEFAULT_NAME,
            options: CacheOptions::default(),
            remote: None,
            _phantom: PhantomData,
        }
    }

    /// Adds a shared remote tier (L2).
    ///
    /// Values are stored in the remote tier as JSON. Unless switched off with
    /// [`without_lock`](Self::without_lock), loads are additionally guarded by a
    /// best-effort distributed lock held in the remote tier.
    pub fn remote<R: RemoteStore>(self, remote: R) -> CacheBuilder<V, E, R> {
        CacheBuilder {
            name: self.name,
            options: self.options,
            remote: Some(remote),
            _phantom: PhantomData,
        }
    }
}

impl<V, E, R> CacheBuilder<V, E, R> {
    /// Sets the name reported in logs.
    #[must_use]
    pub fn name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Replaces all options at once, typically with options read from configuration.
    #[must_use]
    pub fn options(mut self, options: CacheOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the maximum number of in-process entries.
    #[must_use]
    pub fn max_size(mut self, max_size: usize) -> Self {
        self.options.max_size = max_size;
        self
    }

    /// Sets the TTL used when a plain `get` promotes a remote hit.
    #[must_use]
    pub fn default_ttl(mut self, ttl: Duration) -> Self {
        self.options.default_ttl = ttl;
        self
    }

    /// Sets the upper bound of the TTL of in-process copies.
    #[must_use]
    pub fn l1_max_ttl(mut self, ttl: Duration) -> Self {
        self.options.l1_max_ttl = ttl;
        self
    }

    /// Sets the distributed lock options.
    #[must_use]
    pub fn lock(mut self, lock: LockOptions) -> Self {
        self.options.lock = lock;
        self
    }

    /// Loads without taking the distributed lock. Only in-process single-flight remains.
    #[must_use]
    pub fn without_lock(mut self) -> Self {
        self.options.lock.enabled = false;
        self
    }

    /// Builds the cache.
    #[must_use]
    pub fn build(self) -> TieredCache<V, E, R>
    where
        V: Clone,
    {
        TieredCache::new(self.name, self.options, self.remote)
    }
}
