// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::borrow::Cow;
use std::future::{Future, pending};
use std::ops::ControlFlow;
use std::pin::pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::backoff::JitterBackoff;
use crate::breaker::{Admission, FailureOutcome};
use crate::callbacks::{OnAttemptFailed, OnCircuitOpened};
use crate::constants::DEFAULT_NAME;
use crate::{
    Attempt, AttemptFailedArgs, CircuitBreaker, CircuitOpenedArgs, CircuitState, FetchError, FetchOptions, Upstream,
    ValidationError, Validator,
};

/// Fetches validated documents from an [`Upstream`].
///
/// Every attempt is bounded by [`FetchOptions::attempt_timeout`]. Timeouts, non-2xx statuses
/// and transport errors are retried up to [`FetchOptions::attempts`] times with a jittered
/// delay in between. A fetch that still fails is reported to the [`CircuitBreaker`], which
/// opens after enough consecutive failures and then rejects calls without touching the
/// network until its cooldown elapses.
///
/// Bodies are parsed as JSON and handed to the [`Validator`]. Validation failures are not
/// retried and do not count against the breaker.
///
/// # Example
///
/// ```
/// use steadfetch::{FetchClient, FetchError, JsonValidator, Upstream, UpstreamResponse};
///
/// struct Static;
///
/// impl Upstream for Static {
///     async fn get(&self, id: &str) -> Result<UpstreamResponse, FetchError> {
///         Ok(UpstreamResponse::new(200, format!(r#"{{"id":"{id}"}}"#)))
///     }
/// }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), FetchError> {
/// let client = FetchClient::builder(Static, JsonValidator::<serde_json::Value>::new())
///     .name("static")
///     .build();
///
/// let document = client.fetch("acme").await?;
/// assert_eq!(document["id"], "acme");
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct FetchClient<U, V> {
    name: Cow<'static, str>,
    upstream: U,
    validator: V,
    options: FetchOptions,
    breaker: Arc<CircuitBreaker>,
    backoff: JitterBackoff,
    on_attempt_failed: Option<OnAttemptFailed>,
    on_circuit_opened: Option<OnCircuitOpened>,
}

/// Builder of a [`FetchClient`].
#[derive(Debug)]
pub struct FetchClientBuilder<U, V> {
    name: Cow<'static, str>,
    upstream: U,
    validator: V,
    options: FetchOptions,
    breaker: Option<Arc<CircuitBreaker>>,
    on_attempt_failed: Option<OnAttemptFailed>,
    on_circuit_opened: Option<OnCircuitOpened>,
}

impl<U, V> FetchClient<U, V> {
    /// Starts building a client for `upstream`, validating documents with `validator`.
    pub fn builder(upstream: U, validator: V) -> FetchClientBuilder<U, V> {
        FetchClientBuilder {
            name: Cow::Borrowed(DEFAULT_NAME),
            upstream,
            validator,
            options: FetchOptions::default(),
            breaker: None,
            on_attempt_failed: None,
            on_circuit_opened: None,
        }
    }

    /// Returns the name used in logs.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the options.
    #[must_use]
    pub fn options(&self) -> &FetchOptions {
        &self.options
    }

    /// Returns the breaker guarding the upstream.
    #[must_use]
    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    /// Returns a snapshot of the circuit.
    #[must_use]
    pub fn circuit_state(&self) -> CircuitState {
        self.breaker.state()
    }

    /// Returns the upstream.
    #[must_use]
    pub fn upstream(&self) -> &U {
        &self.upstream
    }
}

impl<U, V> FetchClientBuilder<U, V> {
    /// Sets the name used in logs.
    #[must_use]
    pub fn name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = name.into();
        self
    }

    /// Replaces the options.
    #[must_use]
    pub fn options(mut self, options: FetchOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the number of attempts, the initial one included.
    #[must_use]
    pub fn attempts(mut self, attempts: u32) -> Self {
        self.options.attempts = attempts;
        self
    }

    /// Sets the per-attempt timeout.
    #[must_use]
    pub fn attempt_timeout(mut self, timeout: Duration) -> Self {
        self.options.attempt_timeout = timeout;
        self
    }

    /// Uses a shared breaker instead of a private one built from
    /// [`FetchOptions::breaker`].
    #[must_use]
    pub fn breaker(mut self, breaker: Arc<CircuitBreaker>) -> Self {
        self.breaker = Some(breaker);
        self
    }

    /// Invoked after every failed attempt. Informational only.
    #[must_use]
    pub fn on_attempt_failed(mut self, callback: impl Fn(&FetchError, AttemptFailedArgs) + Send + Sync + 'static) -> Self {
        self.on_attempt_failed = Some(OnAttemptFailed::new(callback));
        self
    }

    /// Invoked when the circuit opens or reopens. Informational only.
    #[must_use]
    pub fn on_circuit_opened(mut self, callback: impl Fn(CircuitOpenedArgs) + Send + Sync + 'static) -> Self {
        self.on_circuit_opened = Some(OnCircuitOpened::new(callback));
        self
    }

    /// Builds the client.
    #[must_use]
    pub fn build(self) -> FetchClient<U, V> {
        let breaker = self
            .breaker
            .unwrap_or_else(|| Arc::new(CircuitBreaker::new(self.options.breaker)));

        FetchClient {
            name: self.name,
            upstream: self.upstream,
            validator: self.validator,
            backoff: JitterBackoff::new(&self.options.backoff),
            options: self.options,
            breaker,
            on_attempt_failed: self.on_attempt_failed,
            on_circuit_opened: self.on_circuit_opened,
        }
    }
}

impl<U: Upstream, V: Validator> FetchClient<U, V> {
    /// Fetches and validates the document identified by `id`.
    ///
    /// # Errors
    ///
    /// Returns the [`FetchError`] of the last attempt, [`FetchError::CircuitOpen`] if the
    /// circuit rejected the call, or [`FetchError::Validation`] if the document is invalid.
    pub async fn fetch(&self, id: &str) -> Result<V::Output, FetchError> {
        self.fetch_until(id, pending()).await
    }

    /// Like [`fetch`](Self::fetch), but gives up with [`FetchError::Cancelled`] as soon as
    /// `cancel` completes.
    ///
    /// A cancelled fetch leaves the breaker untouched.
    ///
    /// # Errors
    ///
    /// See [`fetch`](Self::fetch).
    pub async fn fetch_until<C>(&self, id: &str, cancel: C) -> Result<V::Output, FetchError>
    where
        C: Future<Output = ()> + Send,
    {
        let mut cancel = pin!(cancel);
        let max_attempts = self.options.effective_attempts();
        let mut attempt = Attempt::first(max_attempts);

        loop {
            let outcome = tokio::select! {
                biased;
                () = &mut cancel => return Err(FetchError::Cancelled),
                outcome = self.execute_attempt(id) => outcome,
            };

            match self.evaluate_attempt(id, outcome, attempt, max_attempts) {
                ControlFlow::Continue(next) => {
                    tokio::select! {
                        biased;
                        () = &mut cancel => return Err(FetchError::Cancelled),
                        () = tokio::time::sleep(next.delay) => {}
                    }
                    attempt = next.attempt;
                }
                ControlFlow::Break(result) => return result,
            }
        }
    }

    async fn execute_attempt(&self, id: &str) -> Result<V::Output, FetchError> {
        if let Admission::Rejected { retry_after } = self.breaker.admit(Instant::now()) {
            return Err(FetchError::CircuitOpen { retry_after });
        }

        let timeout = self.options.attempt_timeout;
        let response = tokio::time::timeout(timeout, self.upstream.get(id))
            .await
            .map_err(|_elapsed| FetchError::Timeout { timeout })??;

        if !response.is_success() {
            return Err(FetchError::Http { status: response.status });
        }

        let document = serde_json::from_slice(&response.body).map_err(ValidationError::from)?;
        Ok(self.validator.validate(document)?)
    }

    fn evaluate_attempt(
        &self,
        id: &str,
        outcome: Result<V::Output, FetchError>,
        attempt: Attempt,
        max_attempts: u32,
    ) -> ControlFlow<Result<V::Output, FetchError>, NextAttempt> {
        let error = match outcome {
            Ok(document) => {
                if self.breaker.record_success() {
                    tracing::event!(
                        name: "steadfetch.circuit.closed",
                        tracing::Level::INFO,
                        fetch.client = %self.name,
                        fetch.resource.id = id,
                    );
                }
                return ControlFlow::Break(Ok(document));
            }
            Err(error) if !error.is_retryable() => return ControlFlow::Break(Err(error)),
            Err(error) => error,
        };

        let next = attempt.increment(max_attempts).map(|attempt| NextAttempt {
            attempt,
            delay: self.backoff.delay(),
        });

        self.report_failed_attempt(id, &error, attempt, next.map(|next| next.delay));

        match next {
            Some(next) => ControlFlow::Continue(next),
            None => {
                self.record_exhausted(id);
                ControlFlow::Break(Err(error))
            }
        }
    }

    fn report_failed_attempt(&self, id: &str, error: &FetchError, attempt: Attempt, retry_delay: Option<Duration>) {
        tracing::event!(
            name: "steadfetch.retry",
            tracing::Level::WARN,
            fetch.client = %self.name,
            fetch.resource.id = id,
            resilience.attempt.index = attempt.index(),
            resilience.attempt.is_last = attempt.is_last(),
            resilience.retry.delay = retry_delay.unwrap_or_default().as_secs_f32(),
            error = %error,
        );

        if let Some(callback) = &self.on_attempt_failed {
            callback.call(error, AttemptFailedArgs { attempt, retry_delay });
        }
    }

    fn record_exhausted(&self, id: &str) {
        let consecutive_failures = match self.breaker.record_failure(Instant::now()) {
            FailureOutcome::Counted(_) => return,
            FailureOutcome::Opened(failures) | FailureOutcome::Reopened(failures) => failures,
        };

        let cooldown = self.breaker.options().cooldown;
        tracing::event!(
            name: "steadfetch.circuit.opened",
            tracing::Level::WARN,
            fetch.client = %self.name,
            fetch.resource.id = id,
            circuit.consecutive_failures = consecutive_failures,
            circuit.cooldown = cooldown.as_secs_f32(),
        );

        if let Some(callback) = &self.on_circuit_opened {
            callback.call(CircuitOpenedArgs {
                consecutive_failures,
                cooldown,
            });
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct NextAttempt {
    attempt: Attempt,
    delay: Duration,
}
