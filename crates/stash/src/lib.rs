// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! A tiered cache with single-flight loading.
//!
//! [`TieredCache`] keeps a bounded in-process tier (L1, a [`BoundedStore`]) in front of an
//! optional shared remote tier (L2, any [`RemoteStore`]) and suppresses duplicate loads of
//! the same key:
//!
//! ```text
//! get_or_load(key) ── L1 hit ──────────────────────────────▶ value
//!        │
//!        └─ L1 miss ── L2 hit ── copy into L1 ─────────────▶ value
//!                         │
//!                         └─ L2 miss ── one producer per key ── populate L1 + L2 ──▶ value
//!                                         (everyone else waits for it)
//! ```
//!
//! # Quick Start
//!
//! ```
//! use std::time::Duration;
//!
//! use stash::{KeySpace, TieredCache};
//! use stash_tier::testing::MockStore;
//!
//! # #[derive(Debug, Clone)]
//! # struct Aborted;
//! # impl From<oneflight::FlightAborted> for Aborted {
//! #     fn from(_: oneflight::FlightAborted) -> Self { Self }
//! # }
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let cache = TieredCache::builder::<u32, Aborted>()
//!     .name("answers")
//!     .remote(MockStore::new())
//!     .build();
//!
//! let keys = KeySpace::new("quiz", 1, "answer");
//! let answer = cache
//!     .get_or_load(&keys.key("life"), Duration::from_secs(300), || async { Ok(42) })
//!     .await
//!     .unwrap();
//! assert_eq!(answer, 42);
//! assert_eq!(cache.stats().loads, 1);
//! # }
//! ```
//!
//! # Eviction and Expiry
//!
//! L1 evicts by insertion order (oldest inserted key first), not by recency of use.
//! Entries expire lazily: an expired entry is dropped when it is next read. In-process
//! copies never live longer than [`CacheOptions::l1_max_ttl`], so a value changed in L2
//! becomes visible in every process within that bound.
//!
//! # Distributed Locking
//!
//! With a remote tier configured, the process that runs a load first claims
//! `<key>:lock` in the remote tier with an atomic set-if-absent. Other processes poll the
//! remote tier for the value and only run the producer themselves once polling is
//! exhausted. This is best effort: under contention or remote failures the producer may
//! still run more than once across processes, so producers should be idempotent.
//!
//! # Features
//!
//! - `serde`: derives `Serialize`/`Deserialize` for [`CacheOptions`] and [`LockOptions`]
//!   (durations as ISO 8601 or friendly spans) and `Serialize` for [`CacheStats`].

mod bounded;
mod builder;
mod cache;
mod codec;
mod constants;
mod key;
mod options;
#[cfg(feature = "serde")]
mod serde_duration;
mod stats;

#[doc(inline)]
pub use bounded::BoundedStore;
#[doc(inline)]
pub use builder::CacheBuilder;
#[doc(inline)]
pub use cache::TieredCache;
#[doc(inline)]
pub use key::{KeySpace, lock_key};
#[doc(inline)]
pub use options::{CacheOptions, LockOptions};
#[doc(inline)]
pub use stash_tier::{CacheEntry, Error, NoRemote, RemoteStore};
#[doc(inline)]
pub use stats::CacheStats;
