// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use serde::{Deserialize, Serialize};

/// A brand voice profile as served by the profile service.
///
/// Unknown fields are ignored so that newer services can add fields without breaking
/// older readers; the schema version is checked by
/// [`ProfileValidator`](crate::ProfileValidator).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandVoiceProfile {
    /// Identifier of the profile.
    pub id: String,

    /// Display name of the brand.
    pub name: String,

    /// Schema version the document was written with.
    pub schema_version: u32,

    /// Tone descriptors, such as `"friendly"` or `"concise"`. At least one is required.
    pub tone: Vec<String>,

    /// Words to prefer and to avoid.
    #[serde(default)]
    pub vocabulary: Vocabulary,

    /// Free-form writing guidelines.
    #[serde(default)]
    pub guidelines: Vec<String>,
}

/// Word lists of a [`BrandVoiceProfile`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vocabulary {
    /// Words the brand prefers.
    #[serde(default)]
    pub preferred: Vec<String>,

    /// Words the brand avoids.
    #[serde(default)]
    pub avoided: Vec<String>,
}

impl Vocabulary {
    /// Returns the first word that is both preferred and avoided, compared case-insensitively.
    #[must_use]
    pub fn conflict(&self) -> Option<&str> {
        self.preferred
            .iter()
            .find(|word| self.avoided.iter().any(|avoided| avoided.eq_ignore_ascii_case(word)))
            .map(String::as_str)
    }
}
