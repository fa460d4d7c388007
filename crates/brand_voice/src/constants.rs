// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

pub(crate) const KEY_NAMESPACE: &str = "brand_voice";
pub(crate) const KEY_DISCRIMINATOR: &str = "profile";
pub(crate) const CACHE_NAME: &str = "brand_voice.profiles";
pub(crate) const CLIENT_NAME: &str = "brand_voice.upstream";

pub(crate) const DEFAULT_SCHEMA_VERSION: u32 = 1;
