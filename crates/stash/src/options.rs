// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::Duration;

use crate::constants::{
    DEFAULT_L1_MAX_TTL, DEFAULT_LOCK_POLL_ATTEMPTS, DEFAULT_LOCK_POLL_INTERVAL, DEFAULT_LOCK_TTL, DEFAULT_MAX_SIZE, DEFAULT_TTL,
};

/// Sizing and expiry options of a [`TieredCache`](crate::TieredCache).
///
/// With the `serde` feature enabled the options can be read from configuration files;
/// missing fields take their defaults and durations accept ISO 8601 or friendly spans
/// such as `"15m"`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(default))]
pub struct CacheOptions {
    /// Maximum number of entries held in process. Defaults to 1000.
    pub max_size: usize,

    /// TTL used when a plain [`get`](crate::TieredCache::get) promotes a remote hit.
    /// Defaults to 5 minutes.
    #[cfg_attr(feature = "serde", serde(with = "crate::serde_duration"))]
    pub default_ttl: Duration,

    /// Upper bound of the TTL of in-process copies. Defaults to 15 minutes.
    #[cfg_attr(feature = "serde", serde(with = "crate::serde_duration"))]
    pub l1_max_ttl: Duration,

    /// Distributed lock used when a remote tier is configured.
    pub lock: LockOptions,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_MAX_SIZE,
            default_ttl: DEFAULT_TTL,
            l1_max_ttl: DEFAULT_L1_MAX_TTL,
            lock: LockOptions::default(),
        }
    }
}

impl CacheOptions {
    /// Returns the TTL of an in-process copy for a value cached for `ttl`.
    #[must_use]
    pub fn local_ttl(&self, ttl: Duration) -> Duration {
        ttl.min(self.l1_max_ttl)
    }
}

/// Options of the best-effort distributed lock taken around a load when a remote tier is
/// configured.
///
/// The lock holder runs the producer; other processes poll the remote tier for the value
/// and fall back to running the producer themselves once polling is exhausted.
///
/// The lock value only records the holder's process id. Release is an unconditional
/// delete of the lock key: a producer that outlives [`ttl`](Self::ttl) removes a lock
/// another process may have taken since.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(default))]
pub struct LockOptions {
    /// Whether the lock is taken at all. Defaults to `true`.
    pub enabled: bool,

    /// Expiry of the lock key, bounding how long a crashed holder blocks others.
    /// Defaults to 10 seconds.
    #[cfg_attr(feature = "serde", serde(with = "crate::serde_duration"))]
    pub ttl: Duration,

    /// Pause between two polls of the remote tier while the lock is held elsewhere.
    /// Defaults to 100 milliseconds.
    #[cfg_attr(feature = "serde", serde(with = "crate::serde_duration"))]
    pub poll_interval: Duration,

    /// Number of polls before giving up and running the producer. Defaults to 50.
    pub poll_attempts: u32,
}

impl Default for LockOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl: DEFAULT_LOCK_TTL,
            poll_interval: DEFAULT_LOCK_POLL_INTERVAL,
            poll_attempts: DEFAULT_LOCK_POLL_ATTEMPTS,
        }
    }
}

impl LockOptions {
    /// Returns options with the lock switched off.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_ttl_is_capped() {
        let options = CacheOptions::default();
        assert_eq!(options.local_ttl(Duration::from_secs(60)), Duration::from_secs(60));
        assert_eq!(options.local_ttl(Duration::from_secs(3_600)), Duration::from_secs(900));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn deserialize_partial_options() {
        let options: CacheOptions = serde_json::from_str(r#"{"max_size": 10, "l1_max_ttl": "PT1M", "lock": {"poll_attempts": 3}}"#).unwrap();

        assert_eq!(options.max_size, 10);
        assert_eq!(options.l1_max_ttl, Duration::from_secs(60));
        assert_eq!(options.default_ttl, DEFAULT_TTL);
        assert_eq!(options.lock.poll_attempts, 3);
        assert!(options.lock.enabled);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn negative_duration_is_rejected() {
        let err = serde_json::from_str::<LockOptions>(r#"{"ttl": "-PT1S"}"#).unwrap_err();
        assert!(err.to_string().contains("must not be negative"));
    }
}
