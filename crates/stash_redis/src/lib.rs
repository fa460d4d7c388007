// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Redis-backed [`RemoteStore`](stash_tier::RemoteStore) for the stash tiered cache.
//!
//! [`RedisStore`] keeps values as raw bytes with a millisecond TTL, and implements
//! `set_if_absent_with_ttl` with `SET NX PX`, which is what the cache uses as a
//! best-effort distributed load lock.
//!
//! ```no_run
//! use stash_redis::RedisStore;
//! use stash_tier::RemoteStore;
//!
//! # async fn example() -> Result<(), stash_tier::Error> {
//! let store = RedisStore::connect("redis://127.0.0.1/").await?.with_prefix("app:");
//!
//! store.set_with_ttl("greeting", b"hello".to_vec(), std::time::Duration::from_secs(60)).await?;
//! assert_eq!(store.get("greeting").await?, Some(b"hello".to_vec()));
//! # Ok(())
//! # }
//! ```

mod store;

#[doc(inline)]
pub use store::RedisStore;
