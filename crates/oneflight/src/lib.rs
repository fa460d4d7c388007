// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Coalesces duplicate async work into a single execution.
//!
//! This crate provides [`FlightGroup`], a registry of in-flight work keyed by an arbitrary
//! key. When several tasks request the same key concurrently, only the first one (the
//! "leader") starts the work; every other caller (a "follower") attaches to it and receives
//! a clone of the same result.
//!
//! # Example
//!
//! ```
//! use oneflight::FlightGroup;
//!
//! # async fn example() {
//! let group: FlightGroup<&str, String> = FlightGroup::new();
//!
//! // Concurrent calls with the same key share a single execution.
//! let result = group
//!     .execute("user:123", || async { "expensive_result".to_string() })
//!     .await;
//! assert_eq!(result.as_deref(), Ok("expensive_result"));
//! # }
//! ```
//!
//! # Cancellation and Panic Safety
//!
//! The work runs on its own Tokio task:
//!
//! - Dropping the leader's future does not cancel the work; attached followers still get
//!   the result.
//! - If the work panics, every attached caller receives [`FlightAborted::Panicked`] and the
//!   key is released so the next call starts over.
//! - The registry entry is removed as soon as the work settles. Nothing is cached here.
//!
//! The spawned work runs inside the leader's current `tracing` span.

use std::{
    collections::HashMap,
    hash::Hash,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use futures_util::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use tracing::Instrument;

/// The shared handle every caller of one flight awaits.
type FlightResult<T> = Shared<BoxFuture<'static, Result<T, FlightAborted>>>;

/// Error returned when in-flight work did not produce a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum FlightAborted {
    /// The work panicked.
    #[error("in-flight work panicked")]
    Panicked,

    /// The work was cancelled before it settled, typically because the runtime shut down.
    #[error("in-flight work was cancelled before it settled")]
    Cancelled,
}

impl From<tokio::task::JoinError> for FlightAborted {
    fn from(error: tokio::task::JoinError) -> Self {
        if error.is_panic() { Self::Panicked } else { Self::Cancelled }
    }
}

struct Flight<T> {
    id: u64,
    result: FlightResult<T>,
}

struct Registry<K, T> {
    flights: Mutex<HashMap<K, Flight<T>, ahash::RandomState>>,
    next_id: AtomicU64,
}

/// Removes a flight from the registry when its task finishes, however it finishes.
struct Settle<K: Hash + Eq, T> {
    registry: Arc<Registry<K, T>>,
    key: Option<K>,
    id: u64,
}

impl<K: Hash + Eq, T> Drop for Settle<K, T> {
    fn drop(&mut self) {
        let Some(key) = self.key.take() else {
            return;
        };
        let mut flights = self.registry.flights.lock();
        // A newer flight may already own the key.
        if flights.get(&key).is_some_and(|flight| flight.id == self.id) {
            flights.remove(&key);
        }
    }
}

/// Represents a class of work and creates a space in which units of work can be executed
/// with duplicate suppression.
///
/// Clones share the same registry.
pub struct FlightGroup<K, T> {
    registry: Arc<Registry<K, T>>,
}

impl<K, T> std::fmt::Debug for FlightGroup<K, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlightGroup")
            .field("in_flight", &self.registry.flights.lock().len())
            .finish()
    }
}

impl<K, T> Clone for FlightGroup<K, T> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
        }
    }
}

impl<K, T> Default for FlightGroup<K, T> {
    fn default() -> Self {
        Self {
            registry: Arc::new(Registry {
                flights: Mutex::new(HashMap::default()),
                next_id: AtomicU64::new(0),
            }),
        }
    }
}

impl<K, T> FlightGroup<K, T>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    /// Creates an empty group.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `func` for `key` unless work for `key` is already in flight, in which case the
    /// caller attaches to that work instead. Every caller receives a clone of the result.
    ///
    /// The work is spawned immediately, before the returned future is first polled. `func`
    /// is invoked while the registry is locked, so it must not call back into the same group
    /// synchronously; the future it returns may.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime.
    pub fn execute<F, Fut>(&self, key: K, func: F) -> impl Future<Output = Result<T, FlightAborted>> + Send + use<K, T, F, Fut>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let mut flights = self.registry.flights.lock();
        if let Some(flight) = flights.get(&key) {
            return flight.result.clone();
        }

        let id = self.registry.next_id.fetch_add(1, Ordering::Relaxed);
        let settle = Settle {
            registry: Arc::clone(&self.registry),
            key: Some(key.clone()),
            id,
        };
        let work = func();
        let handle = tokio::spawn(
            async move {
                let _settle = settle;
                work.await
            }
            .in_current_span(),
        );

        let result = handle.map(|joined| joined.map_err(FlightAborted::from)).boxed().shared();
        flights.insert(
            key,
            Flight {
                id,
                result: result.clone(),
            },
        );
        result
    }

    /// Returns `true` if work for `key` is currently in flight.
    #[must_use]
    pub fn contains(&self, key: &K) -> bool {
        self.registry.flights.lock().contains_key(key)
    }

    /// Returns the number of keys with work in flight.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.registry.flights.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn entry_removed_after_settlement() {
        let group: FlightGroup<&str, u32> = FlightGroup::new();

        let pending = group.execute("k", || async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            1
        });
        assert!(group.contains(&"k"));
        assert_eq!(group.in_flight(), 1);

        assert_eq!(pending.await, Ok(1));
        tokio::task::yield_now().await;
        assert!(!group.contains(&"k"));
        assert_eq!(group.in_flight(), 0);
    }

    #[tokio::test]
    async fn stale_guard_leaves_newer_flight_alone() {
        let group: FlightGroup<&str, u32> = FlightGroup::new();
        group.registry.flights.lock().insert(
            "k",
            Flight {
                id: 99,
                result: futures_util::future::ready(Ok(5)).boxed().shared(),
            },
        );

        drop(Settle {
            registry: Arc::clone(&group.registry),
            key: Some("k"),
            id: 3,
        });
        assert!(group.contains(&"k"));
    }

    #[test]
    fn debug_reports_in_flight_count() {
        let group: FlightGroup<String, ()> = FlightGroup::new();
        assert_eq!(format!("{group:?}"), "FlightGroup { in_flight: 0 }");
    }
}
