// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Versioned cache key construction.

use std::fmt::{self, Display};

use crate::constants::LOCK_SUFFIX;

/// A versioned key space, rendered as `<namespace>:v<version>:<discriminator>`.
///
/// Bumping the version invalidates every key of the previous schema without touching
/// the stores.
///
/// # Examples
///
/// ```
/// use stash::KeySpace;
///
/// let profiles = KeySpace::new("brand_voice", 3, "profile");
/// assert_eq!(profiles.key("acme"), "brand_voice:v3:profile:acme");
/// assert_eq!(profiles.key_with(["acme", "en"]), "brand_voice:v3:profile:acme:en");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeySpace {
    prefix: String,
}

impl KeySpace {
    /// Creates a key space.
    #[must_use]
    pub fn new(namespace: &str, version: u32, discriminator: &str) -> Self {
        Self {
            prefix: format!("{namespace}:v{version}:{discriminator}"),
        }
    }

    /// Returns the key for a single identifier.
    #[must_use]
    pub fn key(&self, id: impl Display) -> String {
        format!("{}:{id}", self.prefix)
    }

    /// Returns the key for a compound identifier, parts joined with `:`.
    #[must_use]
    pub fn key_with<I>(&self, parts: I) -> String
    where
        I: IntoIterator,
        I::Item: Display,
    {
        let mut key = self.prefix.clone();
        for part in parts {
            key.push(':');
            key.push_str(&part.to_string());
        }
        key
    }

    /// Returns the shared prefix of every key in this space.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl Display for KeySpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.prefix)
    }
}

/// Returns the key of the distributed lock guarding `key`.
#[must_use]
pub fn lock_key(key: &str) -> String {
    format!("{key}{LOCK_SUFFIX}")
}
