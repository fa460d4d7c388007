// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::Duration;

pub(crate) const DEFAULT_NAME: &str = "default";
pub(crate) const DEFAULT_MAX_SIZE: usize = 1_000;
pub(crate) const DEFAULT_TTL: Duration = Duration::from_secs(300);
pub(crate) const DEFAULT_L1_MAX_TTL: Duration = Duration::from_secs(900);

pub(crate) const DEFAULT_LOCK_TTL: Duration = Duration::from_secs(10);
pub(crate) const DEFAULT_LOCK_POLL_INTERVAL: Duration = Duration::from_millis(100);
pub(crate) const DEFAULT_LOCK_POLL_ATTEMPTS: u32 = 50;

pub(crate) const LOCK_SUFFIX: &str = ":lock";
