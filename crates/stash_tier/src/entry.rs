// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::{ops::Deref, time::Duration};

use tokio::time::Instant;

/// Thirty years, used when `now + ttl` overflows the clock.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// A cached value with the instant at which it expires.
///
/// Every tier holds its own independently expiring copy. An entry is served while
/// `now < expires_at` and is absent from `now >= expires_at` onwards.
///
/// Instants come from [`tokio::time`] so that tests can drive expiry with a paused clock.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use stash_tier::CacheEntry;
/// use tokio::time::Instant;
///
/// let now = Instant::now();
/// let entry = CacheEntry::expiring_at("data", now + Duration::from_secs(60));
///
/// assert!(!entry.is_expired_at(now));
/// assert!(entry.is_expired_at(now + Duration::from_secs(60)));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

impl<V> CacheEntry<V> {
    /// Creates an entry that expires `ttl` from now.
    pub fn new(value: V, ttl: Duration) -> Self {
        let now = Instant::now();
        let expires_at = now.checked_add(ttl).unwrap_or_else(|| now + FAR_FUTURE);
        Self { value, expires_at }
    }

    /// Creates an entry that expires at an explicit instant.
    pub fn expiring_at(value: V, expires_at: Instant) -> Self {
        Self { value, expires_at }
    }

    /// Returns the instant from which the entry is no longer served.
    #[must_use]
    pub fn expires_at(&self) -> Instant {
        self.expires_at
    }

    /// Returns `true` if the entry must not be served at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: Instant) -> bool {
        now >= self.expires_at
    }

    /// Returns `true` if the entry must not be served right now.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    /// Returns how long the entry remains fresh, or zero if it already expired.
    #[must_use]
    pub fn remaining_ttl(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }

    /// Returns a reference to the cached value.
    #[must_use]
    pub fn value(&self) -> &V {
        &self.value
    }

    /// Consumes the entry, returning the cached value.
    #[must_use]
    pub fn into_value(self) -> V {
        self.value
    }
}

impl<V> Deref for CacheEntry<V> {
    type Target = V;

    fn deref(&self) -> &Self::Target {
        &self.value
    }
}
