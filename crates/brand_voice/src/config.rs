// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use serde::{Deserialize, Serialize};
use stash::CacheOptions;
use steadfetch::FetchOptions;

use crate::ProfileError;
use crate::constants::DEFAULT_SCHEMA_VERSION;

/// Configuration of a [`ProfileRepository`](crate::ProfileRepository).
///
/// Profiles are cached for [`CacheOptions::default_ttl`]. Every field except `base_url`
/// has a default, so a minimal configuration file is a single line:
///
/// ```
/// use brand_voice::AccessConfig;
///
/// let config = AccessConfig::from_toml(
///     r#"
///     base_url = "https://profiles.example.com/api"
///     schema_version = 2
///
///     [fetch]
///     attempt_timeout = "1s"
///
///     [fetch.breaker]
///     trip_threshold = 3
///
///     [cache]
///     max_size = 500
///     default_ttl = "10m"
///     "#,
/// )?;
///
/// assert_eq!(config.schema_version, 2);
/// assert_eq!(config.fetch.attempts, 3);
/// assert_eq!(config.cache.default_ttl.as_secs(), 600);
/// # Ok::<(), brand_voice::ProfileError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AccessConfig {
    /// Base URL of the profile service; profiles are read from `<base_url>/resource/{id}`.
    pub base_url: String,

    /// Schema version requested from the service and required of its documents.
    pub schema_version: u32,

    /// Timeouts, retries and circuit breaker.
    pub fetch: FetchOptions,

    /// Cache sizing, expiry and distributed lock.
    pub cache: CacheOptions,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            schema_version: DEFAULT_SCHEMA_VERSION,
            fetch: FetchOptions::default(),
            cache: CacheOptions::default(),
        }
    }
}

impl AccessConfig {
    /// Creates a configuration for the service at `base_url` with default options.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError::Config`] if the document cannot be parsed or fails
    /// [`validate`](Self::validate).
    pub fn from_toml(document: &str) -> Result<Self, ProfileError> {
        let config: Self = toml::from_str(document).map_err(ProfileError::config)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the values that have no sensible interpretation.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError::Config`] naming the first invalid field.
    pub fn validate(&self) -> Result<(), ProfileError> {
        let fail = |reason: &str| Err(ProfileError::config(reason));

        if self.base_url.trim().is_empty() {
            return fail("`base_url` must be set");
        }
        if self.schema_version == 0 {
            return fail("`schema_version` must be at least 1");
        }
        if self.fetch.attempts == 0 {
            return fail("`fetch.attempts` must be at least 1");
        }
        if self.fetch.attempt_timeout.is_zero() {
            return fail("`fetch.attempt_timeout` must be positive");
        }
        if self.fetch.backoff.min_delay > self.fetch.backoff.max_delay {
            return fail("`fetch.backoff.min_delay` must not exceed `fetch.backoff.max_delay`");
        }
        if self.fetch.breaker.trip_threshold == 0 {
            return fail("`fetch.breaker.trip_threshold` must be at least 1");
        }
        if self.cache.max_size == 0 {
            return fail("`cache.max_size` must be at least 1");
        }
        if self.cache.lock.enabled && self.cache.lock.ttl.is_zero() {
            return fail("`cache.lock.ttl` must be positive when the lock is enabled");
        }

        Ok(())
    }
}
