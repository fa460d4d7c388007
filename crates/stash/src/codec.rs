// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use serde::{Serialize, de::DeserializeOwned};
use stash_tier::Error;

pub(crate) fn encode<V: Serialize>(value: &V) -> Result<Vec<u8>, Error> {
    serde_json::to_vec(value).map_err(Error::codec)
}

pub(crate) fn decode<V: DeserializeOwned>(bytes: &[u8]) -> Result<V, Error> {
    serde_json::from_slice(bytes).map_err(Error::codec)
}
