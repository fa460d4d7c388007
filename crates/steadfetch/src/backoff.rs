// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::Duration;

use crate::{BackoffOptions, rnd::Rnd};

/// Draws retry delays uniformly from `min_delay..=max_delay`.
#[derive(Debug, Clone)]
pub(crate) struct JitterBackoff {
    min: Duration,
    span: Duration,
    rnd: Rnd,
}

impl JitterBackoff {
    pub fn new(options: &BackoffOptions) -> Self {
        Self::with_rnd(options, Rnd::default())
    }

    pub fn with_rnd(options: &BackoffOptions, rnd: Rnd) -> Self {
        let min = options.min_delay.min(options.max_delay);
        let max = options.min_delay.max(options.max_delay);
        Self { min, span: max - min, rnd }
    }

    pub fn delay(&self) -> Duration {
        let factor = self.rnd.next_f64().clamp(0.0, 1.0);
        self.min + self.span.mul_f64(factor)
    }
}
