// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! `serde` support for [`Duration`] fields, written as ISO 8601 or friendly spans
//! (`"PT1.8S"`, `"1s 800ms"`) through [`jiff::SignedDuration`].

use std::time::Duration;

use jiff::SignedDuration;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de::Error as _, ser::Error as _};

pub(crate) fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    SignedDuration::try_from(*value).map_err(S::Error::custom)?.serialize(serializer)
}

pub(crate) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    let span = SignedDuration::deserialize(deserializer)?;
    Duration::try_from(span).map_err(|error| D::Error::custom(format!("duration must not be negative, got {span}: {error}")))
}
