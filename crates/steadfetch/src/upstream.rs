// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::future::Future;
use std::sync::Arc;

use crate::FetchError;

/// A raw answer of an [`Upstream`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamResponse {
    /// HTTP status code.
    pub status: u16,

    /// Response body, expected to be JSON.
    pub body: Vec<u8>,
}

impl UpstreamResponse {
    /// Creates a response.
    #[must_use]
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Returns `true` for a 2xx status.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The service documents are fetched from.
///
/// An implementation performs one call per invocation. Timeouts, retries and the circuit
/// breaker are applied by [`FetchClient`](crate::FetchClient); a call that fails to reach
/// the service returns [`FetchError::Transport`].
pub trait Upstream: Send + Sync {
    /// Requests the document identified by `id`.
    fn get(&self, id: &str) -> impl Future<Output = Result<UpstreamResponse, FetchError>> + Send;
}

impl<U: Upstream + ?Sized> Upstream for Arc<U> {
    fn get(&self, id: &str) -> impl Future<Output = Result<UpstreamResponse, FetchError>> + Send {
        (**self).get(id)
    }
}

#[cfg(feature = "http")]
pub use http::{HttpUpstream, HttpUpstreamError};

#[cfg(feature = "http")]
mod http {
    use reqwest::Url;
    use reqwest::header::{ACCEPT, HeaderValue};

    use super::{Upstream, UpstreamResponse};
    use crate::FetchError;
    use crate::constants::{RESOURCE_SEGMENT, SCHEMA_VERSION_HEADER};

    /// Failure to set up an [`HttpUpstream`].
    #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
    #[non_exhaustive]
    pub enum HttpUpstreamError {
        /// The base URL cannot be parsed or cannot carry path segments.
        #[error("invalid base url `{url}`: {reason}")]
        InvalidBaseUrl {
            /// The rejected URL.
            url: String,
            /// Why it was rejected.
            reason: String,
        },

        /// The HTTP client could not be created.
        #[error("cannot create http client: {0}")]
        Client(String),
    }

    /// [`Upstream`] over HTTP, issuing `GET <base>/resource/{id}`.
    ///
    /// Every request carries `Accept: application/json` and an `X-Schema-Version` header.
    ///
    /// # Example
    ///
    /// ```
    /// use steadfetch::HttpUpstream;
    ///
    /// let upstream = HttpUpstream::new("https://profiles.example.com/api", 2)?;
    /// assert_eq!(
    ///     upstream.resource_url("acme").as_str(),
    ///     "https://profiles.example.com/api/resource/acme"
    /// );
    /// # Ok::<(), steadfetch::HttpUpstreamError>(())
    /// ```
    #[derive(Debug, Clone)]
    pub struct HttpUpstream {
        client: reqwest::Client,
        base_url: Url,
        schema_version: HeaderValue,
    }

    impl HttpUpstream {
        /// Creates an upstream with its own HTTP client.
        ///
        /// # Errors
        ///
        /// Returns an error if `base_url` is not a valid base URL or the client cannot be
        /// created.
        pub fn new(base_url: &str, schema_version: u32) -> Result<Self, HttpUpstreamError> {
            let client = reqwest::Client::builder()
                .build()
                .map_err(|e| HttpUpstreamError::Client(e.to_string()))?;
            Self::with_client(client, base_url, schema_version)
        }

        /// Creates an upstream sharing an existing HTTP client.
        ///
        /// # Errors
        ///
        /// Returns an error if `base_url` is not a valid base URL.
        pub fn with_client(client: reqwest::Client, base_url: &str, schema_version: u32) -> Result<Self, HttpUpstreamError> {
            let invalid = |reason: String| HttpUpstreamError::InvalidBaseUrl {
                url: base_url.to_owned(),
                reason,
            };

            let parsed = Url::parse(base_url).map_err(|e| invalid(e.to_string()))?;
            if parsed.cannot_be_a_base() {
                return Err(invalid("url cannot be a base".to_owned()));
            }

            Ok(Self {
                client,
                base_url: parsed,
                schema_version: HeaderValue::from(schema_version),
            })
        }

        /// Returns the URL a document is requested from.
        #[must_use]
        pub fn resource_url(&self, id: &str) -> Url {
            let mut url = self.base_url.clone();
            if let Ok(mut segments) = url.path_segments_mut() {
                segments.pop_if_empty().push(RESOURCE_SEGMENT).push(id);
            }
            url
        }
    }

    impl Upstream for HttpUpstream {
        async fn get(&self, id: &str) -> Result<UpstreamResponse, FetchError> {
            let response = self
                .client
                .get(self.resource_url(id))
                .header(ACCEPT, HeaderValue::from_static("application/json"))
                .header(SCHEMA_VERSION_HEADER, self.schema_version.clone())
                .send()
                .await
                .map_err(FetchError::transport)?;

            let status = response.status().as_u16();
            let body = response.bytes().await.map_err(FetchError::transport)?;

            Ok(UpstreamResponse::new(status, body.to_vec()))
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn resource_url_escapes_id() {
            let upstream = HttpUpstream::new("https://example.com/api/", 1).unwrap();
            assert_eq!(
                upstream.resource_url("a b/c").as_str(),
                "https://example.com/api/resource/a%20b%2Fc"
            );
        }

        #[test]
        fn rejects_invalid_base_urls() {
            assert!(matches!(
                HttpUpstream::new("not a url", 1),
                Err(HttpUpstreamError::InvalidBaseUrl { .. })
            ));
            assert!(matches!(
                HttpUpstream::new("mailto:someone@example.com", 1),
                Err(HttpUpstreamError::InvalidBaseUrl { .. })
            ));
        }
    }
}
