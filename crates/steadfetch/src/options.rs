// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::Duration;

use crate::constants::{
    DEFAULT_ATTEMPTS, DEFAULT_ATTEMPT_TIMEOUT, DEFAULT_COOLDOWN, DEFAULT_MAX_DELAY, DEFAULT_MIN_DELAY, DEFAULT_TRIP_THRESHOLD,
};

/// Options of a [`FetchClient`](crate::FetchClient).
///
/// With the `serde` feature the options can be loaded from configuration. Durations accept
/// ISO 8601 (`"PT1.8S"`) or friendly (`"1.8s"`, `"150ms"`) spans; missing fields keep
/// their defaults.
///
/// # Example
///
/// ```
/// use std::time::Duration;
///
/// use steadfetch::FetchOptions;
///
/// let options = FetchOptions {
///     attempts: 2,
///     ..FetchOptions::default()
/// };
///
/// // 2 * (1.8s + 350ms)
/// assert_eq!(options.max_latency(), Duration::from_millis(4_300));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(default))]
pub struct FetchOptions {
    /// Total attempts per fetch, the initial one included. Zero is treated as one.
    pub attempts: u32,

    /// Hard bound on each upstream call.
    #[cfg_attr(feature = "serde", serde(with = "crate::serde_duration"))]
    pub attempt_timeout: Duration,

    /// Delay between attempts.
    pub backoff: BackoffOptions,

    /// When the circuit opens and for how long.
    pub breaker: BreakerOptions,
}

impl FetchOptions {
    /// Upper bound on how long a single fetch keeps the caller waiting.
    #[must_use]
    pub fn max_latency(&self) -> Duration {
        let per_attempt = self.attempt_timeout.saturating_add(self.backoff.min_delay.max(self.backoff.max_delay));
        per_attempt.saturating_mul(self.attempts.max(1))
    }

    pub(crate) fn effective_attempts(&self) -> u32 {
        self.attempts.max(1)
    }
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_ATTEMPTS,
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
            backoff: BackoffOptions::default(),
            breaker: BreakerOptions::default(),
        }
    }
}

/// Bounds of the uniformly distributed delay between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(default))]
pub struct BackoffOptions {
    /// Shortest delay.
    #[cfg_attr(feature = "serde", serde(with = "crate::serde_duration"))]
    pub min_delay: Duration,

    /// Longest delay.
    #[cfg_attr(feature = "serde", serde(with = "crate::serde_duration"))]
    pub max_delay: Duration,
}

impl Default for BackoffOptions {
    fn default() -> Self {
        Self {
            min_delay: DEFAULT_MIN_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
        }
    }
}

/// Options of a [`CircuitBreaker`](crate::CircuitBreaker).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(default))]
pub struct BreakerOptions {
    /// Consecutive failed fetches that open the circuit. Zero is treated as one.
    pub trip_threshold: u32,

    /// How long the circuit stays open before a trial call is let through.
    #[cfg_attr(feature = "serde", serde(with = "crate::serde_duration"))]
    pub cooldown: Duration,
}

impl Default for BreakerOptions {
    fn default() -> Self {
        Self {
            trip_threshold: DEFAULT_TRIP_THRESHOLD,
            cooldown: DEFAULT_COOLDOWN,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = FetchOptions::default();
        assert_eq!(options.attempts, 3);
        assert_eq!(options.attempt_timeout, Duration::from_millis(1_800));
        assert_eq!(options.backoff.min_delay, Duration::from_millis(150));
        assert_eq!(options.backoff.max_delay, Duration::from_millis(350));
        assert_eq!(options.breaker.trip_threshold, 5);
        assert_eq!(options.breaker.cooldown, Duration::from_secs(30));
        assert_eq!(options.max_latency(), Duration::from_millis(6_450));
    }

    #[test]
    fn zero_attempts_means_one() {
        let options = FetchOptions {
            attempts: 0,
            ..FetchOptions::default()
        };
        assert_eq!(options.effective_attempts(), 1);
        assert_eq!(options.max_latency(), Duration::from_millis(2_150));
    }

    #[test]
    fn max_latency_saturates() {
        let options = FetchOptions {
            attempt_timeout: Duration::MAX,
            ..FetchOptions::default()
        };
        assert_eq!(options.max_latency(), Duration::MAX);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn negative_duration_is_rejected() {
        let err = serde_json::from_str::<FetchOptions>(r#"{"attempt_timeout": "-PT1S"}"#).unwrap_err();
        assert!(err.to_string().contains("must not be negative"));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn deserialize_partial() {
        let options: FetchOptions = serde_json::from_str(
            r#"{ "attempt_timeout": "500ms", "breaker": { "cooldown": "PT10S" } }"#,
        )
        .unwrap();

        assert_eq!(options.attempts, 3);
        assert_eq!(options.attempt_timeout, Duration::from_millis(500));
        assert_eq!(options.breaker.cooldown, Duration::from_secs(10));
        assert_eq!(options.breaker.trip_threshold, 5);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serialize_roundtrip() {
        let options = FetchOptions::default();
        let json = serde_json::to_string(&options).unwrap();
        let back: FetchOptions = serde_json::from_str(&json).unwrap();
        assert_eq!(back, options);
    }
}
