// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt::Debug;
use std::time::Duration;

use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use stash_tier::{Error, RemoteStore};

/// A [`RemoteStore`] backed by Redis.
///
/// Clones share the underlying multiplexed connection, which reconnects on its own after
/// network failures. Failed commands surface as [`Error::Transport`].
#[derive(Clone)]
pub struct RedisStore {
    connection: ConnectionManager,
    prefix: String,
}

impl RedisStore {
    /// Wraps an existing connection manager.
    #[must_use]
    pub fn new(connection: ConnectionManager) -> Self {
        Self {
            connection,
            prefix: String::new(),
        }
    }

    /// Connects to the server at `url`, for example `redis://127.0.0.1/`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if the URL is invalid or the server cannot be reached.
    pub async fn connect(url: &str) -> Result<Self, Error> {
        let client = redis::Client::open(url).map_err(Error::transport)?;
        let connection = client.get_connection_manager().await.map_err(Error::transport)?;
        Ok(Self::new(connection))
    }

    /// Prepends `prefix` to every key.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Returns the key prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}{key}", self.prefix)
    }
}

impl Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore").field("prefix", &self.prefix).finish_non_exhaustive()
    }
}

impl RemoteStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, Error> {
        let mut connection = self.connection.clone();
        connection.get(self.full_key(key)).await.map_err(Error::transport)
    }

    async fn set_with_ttl(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), Error> {
        let mut connection = self.connection.clone();
        connection
            .pset_ex(self.full_key(key), value, ttl_millis(ttl))
            .await
            .map_err(Error::transport)
    }

    async fn delete(&self, key: &str) -> Result<(), Error> {
        let mut connection = self.connection.clone();
        connection.del(self.full_key(key)).await.map_err(Error::transport)
    }

    async fn set_if_absent_with_ttl(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<bool, Error> {
        let mut connection = self.connection.clone();
        let reply: Option<String> = redis::cmd("SET")
            .arg(self.full_key(key))
            .arg(value)
            .arg("NX")
            .arg("PX")
            .arg(ttl_millis(ttl))
            .query_async(&mut connection)
            .await
            .map_err(Error::transport)?;

        // `OK` when set, nil when the key already exists.
        Ok(reply.is_some())
    }
}

/// Redis rejects a zero expiry.
fn ttl_millis(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ttl_is_at_least_one_millisecond() {
        assert_eq!(ttl_millis(Duration::ZERO), 1);
        assert_eq!(ttl_millis(Duration::from_micros(999)), 1);
        assert_eq!(ttl_millis(Duration::from_millis(1_500)), 1_500);
        assert_eq!(ttl_millis(Duration::from_secs(300)), 300_000);
        assert_eq!(ttl_millis(Duration::MAX), u64::MAX);
    }
}
