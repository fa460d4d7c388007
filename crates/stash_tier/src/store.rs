// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The contract of a shared second-tier store.
//!
//! [`RemoteStore`] is deliberately byte-oriented: the tiered cache encodes values before
//! they reach the store, so one store implementation serves every value type.

use std::{sync::Arc, time::Duration};

use crate::Error;

/// A shared key/value store used as the second cache tier (L2).
///
/// Implementations are externally owned services such as Redis. Every method may fail
/// with a transport error; the tiered cache treats such failures as soft and carries on
/// as if the store had missed.
pub trait RemoteStore: Send + Sync {
    /// Reads the raw payload stored under `key`.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<Vec<u8>>, Error>> + Send;

    /// Stores `value` under `key`, replacing any previous value, expiring after `ttl`.
    fn set_with_ttl(&self, key: &str, value: Vec<u8>, ttl: Duration) -> impl Future<Output = Result<(), Error>> + Send;

    /// Removes `key`. Removing a missing key is not an error.
    fn delete(&self, key: &str) -> impl Future<Output = Result<(), Error>> + Send;

    /// Atomically stores `value` under `key` only if the key is absent.
    ///
    /// Returns `true` if the value was stored. This is the primitive behind the
    /// best-effort distributed lock.
    fn set_if_absent_with_ttl(&self, key: &str, value: Vec<u8>, ttl: Duration) -> impl Future<Output = Result<bool, Error>> + Send;
}

impl<S: RemoteStore + ?Sized> RemoteStore for Arc<S> {
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<Vec<u8>>, Error>> + Send {
        (**self).get(key)
    }

    fn set_with_ttl(&self, key: &str, value: Vec<u8>, ttl: Duration) -> impl Future<Output = Result<(), Error>> + Send {
        (**self).set_with_ttl(key, value, ttl)
    }

    fn delete(&self, key: &str) -> impl Future<Output = Result<(), Error>> + Send {
        (**self).delete(key)
    }

    fn set_if_absent_with_ttl(&self, key: &str, value: Vec<u8>, ttl: Duration) -> impl Future<Output = Result<bool, Error>> + Send {
        (**self).set_if_absent_with_ttl(key, value, ttl)
    }
}

/// Marker for a cache without a second tier.
///
/// `NoRemote` has no values, so code paths that talk to the remote store are statically
/// unreachable for caches built without one.
#[derive(Debug, Clone, Copy)]
pub enum NoRemote {}

impl RemoteStore for NoRemote {
    async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, Error> {
        match *self {}
    }

    async fn set_with_ttl(&self, _key: &str, _value: Vec<u8>, _ttl: Duration) -> Result<(), Error> {
        match *self {}
    }

    async fn delete(&self, _key: &str) -> Result<(), Error> {
        match *self {}
    }

    async fn set_if_absent_with_ttl(&self, _key: &str, _value: Vec<u8>, _ttl: Duration) -> Result<bool, Error> {
        match *self {}
    }
}
