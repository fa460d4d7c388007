// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::Duration;

pub(crate) const DEFAULT_NAME: &str = "default";

pub(crate) const DEFAULT_ATTEMPTS: u32 = 3;
pub(crate) const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_millis(1_800);
pub(crate) const DEFAULT_MIN_DELAY: Duration = Duration::from_millis(150);
pub(crate) const DEFAULT_MAX_DELAY: Duration = Duration::from_millis(350);

pub(crate) const DEFAULT_TRIP_THRESHOLD: u32 = 5;
pub(crate) const DEFAULT_COOLDOWN: Duration = Duration::from_secs(30);

#[cfg(feature = "http")]
pub(crate) const SCHEMA_VERSION_HEADER: &str = "x-schema-version";
#[cfg(feature = "http")]
pub(crate) const RESOURCE_SEGMENT: &str = "resource";
