// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Cached, resilient access to brand voice profiles.
//!
//! This crate wires the [`steadfetch`] fetch client and the [`stash`] tiered cache for one
//! resource: the [`BrandVoiceProfile`] served by the profile service.
//!
//! - [`AccessConfig`] holds the service URL, schema version and all fetch and cache options,
//!   and can be loaded from TOML.
//! - [`ProfileValidator`] checks documents against the expected schema version.
//! - [`ProfileRepository`] serves profiles from cache, fetching each missing profile once no
//!   matter how many callers ask for it concurrently.
//! - [`ProfileError`] tells callers whether to fall back with
//!   [`is_unavailable`](ProfileError::is_unavailable).
//!
//! See `examples/fetch_profile.rs` for a runnable program.

mod config;
mod constants;
mod error;
mod profile;
mod repository;
mod validator;

#[doc(inline)]
pub use config::AccessConfig;
#[doc(inline)]
pub use error::ProfileError;
#[doc(inline)]
pub use profile::{BrandVoiceProfile, Vocabulary};
#[doc(inline)]
pub use repository::ProfileRepository;
#[doc(inline)]
pub use validator::ProfileValidator;
