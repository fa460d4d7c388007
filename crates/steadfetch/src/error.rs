// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Error types of a fetch.

use std::time::Duration;

/// A document failed validation, or its body was not JSON.
///
/// # Example
///
/// ```
/// use steadfetch::ValidationError;
///
/// let error = ValidationError::new("`name` must not be empty");
/// assert_eq!(error.to_string(), "`name` must not be empty");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    /// Creates a validation error with a human readable reason.
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }

    /// Returns the reason.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<serde_json::Error> for ValidationError {
    fn from(error: serde_json::Error) -> Self {
        Self::new(error.to_string())
    }
}

/// The reason a fetch failed.
///
/// Callers branch on the variant, never on the message. [`is_unavailable`](Self::is_unavailable)
/// singles out the failures for which a fallback experience should be shown.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum FetchError {
    /// The circuit is open; no upstream call was made.
    #[error("circuit open, retry in {retry_after:?}")]
    CircuitOpen {
        /// Time left until the circuit lets a trial call through.
        retry_after: Duration,
    },

    /// The upstream did not answer within the per-attempt timeout.
    #[error("upstream did not answer within {timeout:?}")]
    Timeout {
        /// The per-attempt timeout that elapsed.
        timeout: Duration,
    },

    /// The upstream answered with a non-2xx status.
    #[error("upstream answered with status {status}")]
    Http {
        /// The HTTP status code.
        status: u16,
    },

    /// The upstream could not be reached or the response could not be read.
    #[error("upstream transport error: {0}")]
    Transport(String),

    /// The document was not valid JSON or did not pass validation.
    #[error("invalid document: {0}")]
    Validation(#[from] ValidationError),

    /// The caller gave up before the fetch completed.
    #[error("fetch cancelled by the caller")]
    Cancelled,
}

impl FetchError {
    /// Creates a transport error from anything displayable.
    pub fn transport(cause: impl std::fmt::Display) -> Self {
        Self::Transport(cause.to_string())
    }

    /// Returns `true` for failures that are retried: timeouts, non-2xx statuses and
    /// transport errors.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Http { .. } | Self::Transport(_))
    }

    /// Returns `true` if the upstream is considered unavailable right now, either because
    /// the circuit is open or because it timed out.
    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::CircuitOpen { .. } | Self::Timeout { .. })
    }

    /// Returns the HTTP status for [`FetchError::Http`].
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        let open = FetchError::CircuitOpen {
            retry_after: Duration::from_secs(1),
        };
        let timeout = FetchError::Timeout {
            timeout: Duration::from_secs(1),
        };
        let http = FetchError::Http { status: 503 };
        let transport = FetchError::transport("connection refused");
        let validation = FetchError::from(ValidationError::new("bad"));

        assert!(!open.is_retryable() && open.is_unavailable());
        assert!(timeout.is_retryable() && timeout.is_unavailable());
        assert!(http.is_retryable() && !http.is_unavailable());
        assert!(transport.is_retryable() && !transport.is_unavailable());
        assert!(!validation.is_retryable() && !validation.is_unavailable());
        assert!(!FetchError::Cancelled.is_retryable() && !FetchError::Cancelled.is_unavailable());
    }

    #[test]
    fn status_only_for_http() {
        assert_eq!(FetchError::Http { status: 404 }.status(), Some(404));
        assert_eq!(FetchError::Cancelled.status(), None);
    }

    #[test]
    fn json_errors_become_validation_errors() {
        let json = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let error = FetchError::from(ValidationError::from(json));
        assert!(error.to_string().starts_with("invalid document: EOF"));
    }
}
