// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Resilient fetching of upstream documents.
//!
//! A [`FetchClient`] wraps an [`Upstream`] and a [`Validator`]. Each fetch goes through:
//!
//! ```text
//! fetch(id) ── circuit open? ── yes ──────────────────────────────▶ CircuitOpen
//!                  │
//!                  no
//!                  ▼
//!          attempt (bounded by attempt_timeout)
//!                  │
//!   2xx ── parse JSON ── validate ── ok ── close circuit ─────────▶ document
//!    │                       └─ invalid ──────────────────────────▶ Validation
//!    │
//!    └─ timeout / non-2xx / transport ── attempts left? ── jittered sleep, next attempt
//!                                              │
//!                                              no ── count failure, maybe open circuit ──▶ error
//! ```
//!
//! Callers can give up at any time through [`FetchClient::fetch_until`]; the wait is bounded
//! by [`FetchOptions::max_latency`] either way.
//!
//! # Errors
//!
//! [`FetchError`] is a closed set of kinds. Branch on the variant, or use
//! [`FetchError::is_unavailable`] to decide whether to show a fallback.
//!
//! # Sharing a breaker
//!
//! ```
//! use std::sync::Arc;
//!
//! use steadfetch::{BreakerOptions, CircuitBreaker, FetchClient, FetchError, JsonValidator, Upstream, UpstreamResponse};
//!
//! struct Down;
//!
//! impl Upstream for Down {
//!     async fn get(&self, _id: &str) -> Result<UpstreamResponse, FetchError> {
//!         Ok(UpstreamResponse::new(503, Vec::new()))
//!     }
//! }
//!
//! # #[tokio::main(flavor = "current_thread", start_paused = true)]
//! # async fn main() {
//! let breaker = Arc::new(CircuitBreaker::new(BreakerOptions {
//!     trip_threshold: 1,
//!     ..BreakerOptions::default()
//! }));
//!
//! let first = FetchClient::builder(Down, JsonValidator::<serde_json::Value>::new())
//!     .breaker(Arc::clone(&breaker))
//!     .build();
//! let second = FetchClient::builder(Down, JsonValidator::<serde_json::Value>::new())
//!     .breaker(Arc::clone(&breaker))
//!     .build();
//!
//! assert_eq!(first.fetch("a").await.unwrap_err(), FetchError::Http { status: 503 });
//! assert!(matches!(second.fetch("a").await, Err(FetchError::CircuitOpen { .. })));
//! # }
//! ```
//!
//! # Logs
//!
//! | Event                       | Level  | When                                     |
//! |-----------------------------|--------|------------------------------------------|
//! | `steadfetch.retry`          | WARN   | an attempt failed with a retryable error |
//! | `steadfetch.circuit.opened` | WARN   | the circuit opened or reopened           |
//! | `steadfetch.circuit.closed` | INFO   | a success closed an open circuit         |
//!
//! # Features
//!
//! - `http` (default): [`HttpUpstream`] over `reqwest`.
//! - `serde`: `Serialize`/`Deserialize` for [`FetchOptions`] and its parts.
//! - `test-util`: the [`testing`] module with [`ScriptedUpstream`](testing::ScriptedUpstream).

mod attempt;
mod backoff;
mod breaker;
mod callbacks;
mod client;
mod constants;
mod error;
mod options;
mod rnd;
#[cfg(feature = "serde")]
mod serde_duration;
#[cfg(any(feature = "test-util", test))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-util")))]
pub mod testing;
mod upstream;
mod validate;

#[doc(inline)]
pub use attempt::Attempt;
#[doc(inline)]
pub use breaker::{CircuitBreaker, CircuitState};
#[doc(inline)]
pub use callbacks::{AttemptFailedArgs, CircuitOpenedArgs};
#[doc(inline)]
pub use client::{FetchClient, FetchClientBuilder};
#[doc(inline)]
pub use error::{FetchError, ValidationError};
#[doc(inline)]
pub use options::{BackoffOptions, BreakerOptions, FetchOptions};
#[cfg(feature = "http")]
#[cfg_attr(docsrs, doc(cfg(feature = "http")))]
#[doc(inline)]
pub use upstream::{HttpUpstream, HttpUpstreamError};
#[doc(inline)]
pub use upstream::{Upstream, UpstreamResponse};
#[doc(inline)]
pub use validate::{JsonValidator, Validator};
