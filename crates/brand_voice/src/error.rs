// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use oneflight::FlightAborted;
use steadfetch::FetchError;

/// Failure to provide a profile.
///
/// The error is [`Clone`] because one failed load is handed to every caller that waited
/// for it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum ProfileError {
    /// The upstream fetch failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The load was aborted before it produced a result.
    #[error("profile load aborted: {0}")]
    Aborted(#[from] FlightAborted),

    /// The remote cache tier failed.
    #[error(transparent)]
    Store(#[from] stash_tier::Error),

    /// The profile id is not usable.
    #[error("invalid profile id `{0}`")]
    InvalidId(String),

    /// The configuration is invalid.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ProfileError {
    pub(crate) fn config(reason: impl std::fmt::Display) -> Self {
        Self::Config(reason.to_string())
    }

    /// Returns `true` if the profile service is unavailable right now and a fallback
    /// experience should be shown instead.
    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        match self {
            Self::Fetch(error) => error.is_unavailable(),
            Self::Aborted(_) => true,
            Self::Store(_) | Self::InvalidId(_) | Self::Config(_) => false,
        }
    }

    /// Returns the fetch error, if the failure came from the upstream.
    #[must_use]
    pub fn as_fetch(&self) -> Option<&FetchError> {
        match self {
            Self::Fetch(error) => Some(error),
            _ => None,
        }
    }
}
