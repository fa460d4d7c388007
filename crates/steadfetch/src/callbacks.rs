// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::Duration;

use crate::{Attempt, FetchError};

/// Generates a clonable wrapper around a shared `Fn` callback.
///
/// ```rust,ignore
/// define_fn_wrapper!(OnAttemptFailed(Fn(error: &FetchError, args: AttemptFailedArgs)));
/// ```
macro_rules! define_fn_wrapper {
    ($name:ident(Fn($($param_name:ident: $param_ty:ty),*))) => {
        pub(crate) struct $name(std::sync::Arc<dyn Fn($($param_ty),*) + Send + Sync>);

        impl $name {
            pub(crate) fn new<F>(callback: F) -> Self
            where
                F: Fn($($param_ty),*) + Send + Sync + 'static,
            {
                Self(std::sync::Arc::new(callback))
            }

            pub(crate) fn call(&self, $($param_name: $param_ty),*) {
                (self.0)($($param_name),*);
            }
        }

        impl Clone for $name {
            fn clone(&self) -> Self {
                Self(std::sync::Arc::clone(&self.0))
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_struct(stringify!($name)).finish()
            }
        }
    };
}

define_fn_wrapper!(OnAttemptFailed(Fn(error: &FetchError, args: AttemptFailedArgs)));
define_fn_wrapper!(OnCircuitOpened(Fn(args: CircuitOpenedArgs)));

/// Arguments for the callback registered with
/// [`FetchClientBuilder::on_attempt_failed`](crate::FetchClientBuilder::on_attempt_failed).
#[derive(Debug, Clone, Copy)]
#[non_exhaustive]
pub struct AttemptFailedArgs {
    pub(crate) attempt: Attempt,
    pub(crate) retry_delay: Option<Duration>,
}

impl AttemptFailedArgs {
    /// The attempt that failed.
    #[must_use]
    pub fn attempt(&self) -> Attempt {
        self.attempt
    }

    /// The delay before the next attempt, or `None` if no retry follows.
    #[must_use]
    pub fn retry_delay(&self) -> Option<Duration> {
        self.retry_delay
    }
}

/// Arguments for the callback registered with
/// [`FetchClientBuilder::on_circuit_opened`](crate::FetchClientBuilder::on_circuit_opened).
#[derive(Debug, Clone, Copy)]
#[non_exhaustive]
pub struct CircuitOpenedArgs {
    pub(crate) consecutive_failures: u32,
    pub(crate) cooldown: Duration,
}

impl CircuitOpenedArgs {
    /// Consecutive failed fetches that opened the circuit.
    #[must_use]
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// How long the circuit stays open before a trial call is allowed.
    #[must_use]
    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }
}
