// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

use crate::BreakerOptions;

/// Circuit breaker shared by every client that talks to the same upstream.
///
/// The breaker counts fetches that failed after all their retries. Once the count reaches
/// [`BreakerOptions::trip_threshold`] the circuit opens and calls are rejected without
/// touching the network. After [`BreakerOptions::cooldown`] calls are let through again as
/// trials: a success closes the circuit, a failure restarts the cooldown.
///
/// Share one breaker between clients with an [`Arc`](std::sync::Arc) and
/// [`FetchClientBuilder::breaker`](crate::FetchClientBuilder::breaker).
///
/// # Example
///
/// ```
/// use steadfetch::{BreakerOptions, CircuitBreaker};
///
/// let breaker = CircuitBreaker::new(BreakerOptions::default());
/// assert!(!breaker.state().is_open());
/// ```
#[derive(Debug)]
pub struct CircuitBreaker {
    state: Mutex<CircuitState>,
    options: BreakerOptions,
}

/// A snapshot of a [`CircuitBreaker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CircuitState {
    is_open: bool,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
}

impl CircuitState {
    /// Returns `true` while the circuit is open, including while a trial is allowed.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.is_open
    }

    /// Fetches that failed in a row since the last success.
    #[must_use]
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// When the circuit was opened or last reopened.
    #[must_use]
    pub fn opened_at(&self) -> Option<Instant> {
        self.opened_at
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Admission {
    Closed,
    Trial,
    Rejected { retry_after: Duration },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FailureOutcome {
    Counted(u32),
    Opened(u32),
    Reopened(u32),
}

impl CircuitBreaker {
    /// Creates a closed breaker.
    #[must_use]
    pub fn new(options: BreakerOptions) -> Self {
        Self {
            state: Mutex::new(CircuitState::default()),
            options,
        }
    }

    /// Returns the options of this breaker.
    #[must_use]
    pub fn options(&self) -> &BreakerOptions {
        &self.options
    }

    /// Returns a snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> CircuitState {
        *self.state.lock()
    }

    /// Closes the circuit and forgets all failures.
    pub fn reset(&self) {
        *self.state.lock() = CircuitState::default();
    }

    pub(crate) fn admit(&self, now: Instant) -> Admission {
        let state = self.state.lock();
        if !state.is_open {
            return Admission::Closed;
        }

        let elapsed = state.opened_at.map_or(Duration::MAX, |opened_at| now.saturating_duration_since(opened_at));
        if elapsed < self.options.cooldown {
            Admission::Rejected {
                retry_after: self.options.cooldown - elapsed,
            }
        } else {
            Admission::Trial
        }
    }

    /// Returns `true` if this success closed an open circuit.
    pub(crate) fn record_success(&self) -> bool {
        let mut state = self.state.lock();
        let was_open = state.is_open;
        *state = CircuitState::default();
        was_open
    }

    pub(crate) fn record_failure(&self, now: Instant) -> FailureOutcome {
        let mut state = self.state.lock();
        state.consecutive_failures = state.consecutive_failures.saturating_add(1);
        let failures = state.consecutive_failures;

        if state.is_open {
            state.opened_at = Some(now);
            FailureOutcome::Reopened(failures)
        } else if failures >= self.options.trip_threshold.max(1) {
            state.is_open = true;
            state.opened_at = Some(now);
            FailureOutcome::Opened(failures)
        } else {
            FailureOutcome::Counted(failures)
        }
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(BreakerOptions::default())
    }
}
