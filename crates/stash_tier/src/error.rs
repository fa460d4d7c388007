// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Error types for remote store operations.

/// An error from a remote store operation.
///
/// Errors are cheap to clone so that a single failure can be reported to every
/// caller waiting on the same key.
///
/// # Example
///
/// ```
/// use stash_tier::Error;
///
/// let error = Error::transport("connection reset");
/// assert!(error.is_transport());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The store could not be reached or rejected the command.
    #[error("remote store transport error: {0}")]
    Transport(String),

    /// A payload could not be encoded for, or decoded from, the store.
    #[error("remote store codec error: {0}")]
    Codec(String),
}

impl Error {
    /// Creates a transport error from anything displayable.
    pub fn transport(cause: impl std::fmt::Display) -> Self {
        Self::Transport(cause.to_string())
    }

    /// Creates a codec error from anything displayable.
    pub fn codec(cause: impl std::fmt::Display) -> Self {
        Self::Codec(cause.to_string())
    }

    /// Returns `true` if the store itself failed, as opposed to the payload.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

/// A specialized [`Result`] type for remote store operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_contains_cause() {
        let error = Error::transport("broken pipe");
        assert_eq!(error.to_string(), "remote store transport error: broken pipe");

        let error = Error::codec("expected value at line 1 column 1");
        assert!(error.to_string().contains("expected value"));
        assert!(!error.is_transport());
    }

    #[test]
    fn result_type_alias_propagates_errors() {
        fn returns_err() -> Result<i32> {
            Err(Error::transport("expected failure"))
        }

        let err = returns_err().expect_err("should return an error");
        assert!(err.is_transport());
    }
}
