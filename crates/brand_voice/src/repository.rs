// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::sync::Arc;
use std::time::Duration;

use stash::{CacheStats, KeySpace, NoRemote, RemoteStore, TieredCache};
use steadfetch::{CircuitBreaker, CircuitState, FetchClient, HttpUpstream, Upstream};

use crate::constants::{CACHE_NAME, CLIENT_NAME, KEY_DISCRIMINATOR, KEY_NAMESPACE};
use crate::{AccessConfig, BrandVoiceProfile, ProfileError, ProfileValidator};

type ProfileClient<U> = FetchClient<U, ProfileValidator>;

/// Cached, resilient access to brand voice profiles.
///
/// Profiles are fetched from an [`Upstream`] through a [`FetchClient`] and cached in a
/// [`TieredCache`] under `brand_voice:v<schema_version>:profile:<id>`. Concurrent requests
/// for the same profile share one fetch, failures are never cached, and bumping the schema
/// version moves to a fresh key space.
///
/// Clones share the cache and the circuit breaker.
///
/// # Example
///
/// ```no_run
/// use brand_voice::{AccessConfig, ProfileRepository};
///
/// # async fn example() -> Result<(), brand_voice::ProfileError> {
/// let config = AccessConfig::new("https://profiles.example.com/api");
/// let repository = ProfileRepository::from_config(&config)?;
///
/// match repository.get_profile("acme").await {
///     Ok(profile) => println!("{} sounds {:?}", profile.name, profile.tone),
///     Err(error) if error.is_unavailable() => println!("using the default voice"),
///     Err(error) => return Err(error),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ProfileRepository<U, R = NoRemote> {
    client: Arc<ProfileClient<U>>,
    cache: TieredCache<BrandVoiceProfile, ProfileError, R>,
    keys: KeySpace,
    ttl: Duration,
}

impl<U, R> Clone for ProfileRepository<U, R> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            cache: self.cache.clone(),
            keys: self.keys.clone(),
            ttl: self.ttl,
        }
    }
}

impl ProfileRepository<HttpUpstream> {
    /// Creates a repository reading from the HTTP service named by `config`, without a
    /// remote cache tier.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError::Config`] if the configuration is invalid.
    pub fn from_config(config: &AccessConfig) -> Result<Self, ProfileError> {
        config.validate()?;
        let upstream = HttpUpstream::new(&config.base_url, config.schema_version).map_err(ProfileError::config)?;
        Ok(Self::new(upstream, config))
    }
}

impl<U> ProfileRepository<U> {
    /// Creates a repository over `upstream` with an in-process cache only.
    #[must_use]
    pub fn new(upstream: U, config: &AccessConfig) -> Self {
        let cache = TieredCache::builder::<BrandVoiceProfile, ProfileError>()
            .name(CACHE_NAME)
            .options(config.cache.clone())
            .build();
        Self::assemble(upstream, cache, config, None)
    }
}

impl<U, R: RemoteStore> ProfileRepository<U, R> {
    /// Creates a repository over `upstream` that shares profiles with other processes
    /// through `remote`.
    #[must_use]
    pub fn with_remote(upstream: U, remote: R, config: &AccessConfig) -> Self {
        let cache = TieredCache::builder::<BrandVoiceProfile, ProfileError>()
            .name(CACHE_NAME)
            .options(config.cache.clone())
            .remote(remote)
            .build();
        Self::assemble(upstream, cache, config, None)
    }

    /// Like [`with_remote`](Self::with_remote), but guards the upstream with a breaker shared
    /// with other clients.
    #[must_use]
    pub fn with_breaker(upstream: U, remote: R, breaker: Arc<CircuitBreaker>, config: &AccessConfig) -> Self {
        let cache = TieredCache::builder::<BrandVoiceProfile, ProfileError>()
            .name(CACHE_NAME)
            .options(config.cache.clone())
            .remote(remote)
            .build();
        Self::assemble(upstream, cache, config, Some(breaker))
    }
}

impl<U, R> ProfileRepository<U, R> {
    fn assemble(
        upstream: U,
        cache: TieredCache<BrandVoiceProfile, ProfileError, R>,
        config: &AccessConfig,
        breaker: Option<Arc<CircuitBreaker>>,
    ) -> Self {
        let mut client = FetchClient::builder(upstream, ProfileValidator::new(config.schema_version))
            .name(CLIENT_NAME)
            .options(config.fetch.clone());
        if let Some(breaker) = breaker {
            client = client.breaker(breaker);
        }

        Self {
            client: Arc::new(client.build()),
            cache,
            keys: KeySpace::new(KEY_NAMESPACE, config.schema_version, KEY_DISCRIMINATOR),
            ttl: config.cache.default_ttl,
        }
    }

    /// Returns the cache key of profile `id`.
    #[must_use]
    pub fn key(&self, id: &str) -> String {
        self.keys.key(id)
    }

    /// Returns cache statistics.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Returns a snapshot of the circuit guarding the upstream.
    #[must_use]
    pub fn circuit_state(&self) -> CircuitState {
        self.client.circuit_state()
    }
}

impl<U, R> ProfileRepository<U, R>
where
    U: Upstream + 'static,
    R: RemoteStore + 'static,
{
    /// Returns profile `id`, from cache when possible.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError::InvalidId`] for a blank id, [`ProfileError::Fetch`] when the
    /// upstream failed or returned an invalid document, and [`ProfileError::Aborted`] when the
    /// shared load died. Use [`ProfileError::is_unavailable`] to decide whether to fall back.
    pub async fn get_profile(&self, id: &str) -> Result<BrandVoiceProfile, ProfileError> {
        let id = checked_id(id)?;
        let key = self.keys.key(id);
        let client = Arc::clone(&self.client);
        let id = id.to_owned();

        self.cache
            .get_or_load(&key, self.ttl, move || async move { Ok(client.fetch(&id).await?) })
            .await
    }

    /// Drops profile `id` from every cache tier so the next request fetches it again.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError::Store`] if the remote tier could not be updated; the
    /// in-process copy is gone either way.
    pub async fn invalidate(&self, id: &str) -> Result<(), ProfileError> {
        let id = checked_id(id)?;
        let key = self.keys.key(id);

        tracing::event!(
            name: "brand_voice.profile.invalidated",
            tracing::Level::DEBUG,
            cache.key = %key,
        );

        Ok(self.cache.delete(&key).await?)
    }
}

fn checked_id(id: &str) -> Result<&str, ProfileError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        return Err(ProfileError::InvalidId(id.to_owned()));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_versioned() {
        let mut config = AccessConfig::new("https://example.com");
        config.schema_version = 4;
        let repository = ProfileRepository::from_config(&config).unwrap();

        assert_eq!(repository.key("acme"), "brand_voice:v4:profile:acme");
    }

    #[test]
    fn blank_ids_are_rejected() {
        assert_eq!(checked_id(" acme "), Ok("acme"));
        assert_eq!(checked_id("  "), Err(ProfileError::InvalidId("  ".to_owned())));
    }

    #[test]
    fn invalid_base_url_is_a_config_error() {
        let config = AccessConfig::new("not a url");
        assert!(matches!(
            ProfileRepository::from_config(&config),
            Err(ProfileError::Config(reason)) if reason.contains("invalid base url")
        ));
    }
}
