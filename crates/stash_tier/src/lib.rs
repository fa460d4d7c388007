// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Storage tier abstractions for the `stash` tiered cache.
//!
//! This crate defines the pieces every cache tier shares:
//!
//! - [`CacheEntry`] pairs a value with the instant at which it stops being served.
//! - [`RemoteStore`] is the contract of a shared, byte-oriented second tier (L2).
//! - [`Error`] describes failures of a remote store.
//!
//! # Implementing a Remote Store
//!
//! ```
//! use std::collections::HashMap;
//! use std::sync::Mutex;
//! use std::time::Duration;
//!
//! use stash_tier::{Error, RemoteStore};
//!
//! #[derive(Default)]
//! struct MapStore(Mutex<HashMap<String, Vec<u8>>>);
//!
//! impl RemoteStore for MapStore {
//!     async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, Error> {
//!         Ok(self.0.lock().map_err(|e| Error::transport(e.to_string()))?.get(key).cloned())
//!     }
//!
//!     async fn set_with_ttl(&self, key: &str, value: Vec<u8>, _ttl: Duration) -> Result<(), Error> {
//!         self.0.lock().map_err(|e| Error::transport(e.to_string()))?.insert(key.to_owned(), value);
//!         Ok(())
//!     }
//!
//!     async fn delete(&self, key: &str) -> Result<(), Error> {
//!         self.0.lock().map_err(|e| Error::transport(e.to_string()))?.remove(key);
//!         Ok(())
//!     }
//!
//!     async fn set_if_absent_with_ttl(&self, key: &str, value: Vec<u8>, _ttl: Duration) -> Result<bool, Error> {
//!         let mut map = self.0.lock().map_err(|e| Error::transport(e.to_string()))?;
//!         if map.contains_key(key) {
//!             return Ok(false);
//!         }
//!         map.insert(key.to_owned(), value);
//!         Ok(true)
//!     }
//! }
//! ```
//!
//! # Testing
//!
//! Enable the `test-util` feature for [`testing::MockStore`], an in-memory store that
//! honors TTLs, records every operation and supports failure injection.

mod entry;
pub mod error;
mod store;
#[cfg(any(feature = "test-util", test))]
pub mod testing;

#[doc(inline)]
pub use entry::CacheEntry;
#[doc(inline)]
pub use error::{Error, Result};
#[doc(inline)]
pub use store::{NoRemote, RemoteStore};
