// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use serde_json::Value;
use steadfetch::{ValidationError, Validator};

use crate::BrandVoiceProfile;

/// Validates profile documents against the expected schema version.
///
/// A document must deserialize into [`BrandVoiceProfile`], carry the expected
/// `schema_version`, have a non-blank `id` and `name`, at least one non-blank tone and no
/// word that is both preferred and avoided.
///
/// # Example
///
/// ```
/// use brand_voice::ProfileValidator;
/// use steadfetch::Validator;
///
/// let validator = ProfileValidator::new(2);
/// let error = validator
///     .validate(serde_json::json!({ "id": "acme", "name": "Acme", "schema_version": 1, "tone": ["bold"] }))
///     .unwrap_err();
///
/// assert_eq!(error.message(), "expected schema version 2, got 1");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfileValidator {
    schema_version: u32,
}

impl ProfileValidator {
    /// Creates a validator accepting documents of `schema_version`.
    #[must_use]
    pub fn new(schema_version: u32) -> Self {
        Self { schema_version }
    }

    /// Returns the accepted schema version.
    #[must_use]
    pub fn schema_version(&self) -> u32 {
        self.schema_version
    }
}

impl Validator for ProfileValidator {
    type Output = BrandVoiceProfile;

    fn validate(&self, document: Value) -> Result<BrandVoiceProfile, ValidationError> {
        let profile: BrandVoiceProfile = serde_json::from_value(document)?;

        if profile.schema_version != self.schema_version {
            return Err(ValidationError::new(format!(
                "expected schema version {}, got {}",
                self.schema_version, profile.schema_version
            )));
        }
        if profile.id.trim().is_empty() {
            return Err(ValidationError::new("`id` must not be blank"));
        }
        if profile.name.trim().is_empty() {
            return Err(ValidationError::new("`name` must not be blank"));
        }
        if profile.tone.is_empty() {
            return Err(ValidationError::new("`tone` must list at least one entry"));
        }
        if profile.tone.iter().any(|tone| tone.trim().is_empty()) {
            return Err(ValidationError::new("`tone` entries must not be blank"));
        }
        if let Some(word) = profile.vocabulary.conflict() {
            return Err(ValidationError::new(format!("`{word}` is both preferred and avoided")));
        }

        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn document() -> Value {
        json!({
            "id": "acme",
            "name": "Acme",
            "schema_version": 1,
            "tone": ["friendly", "concise"],
            "vocabulary": { "preferred": ["customers"], "avoided": ["users"] },
            "guidelines": ["Use active voice."],
        })
    }

    fn rejection(patch: impl FnOnce(&mut Value)) -> String {
        let mut document = document();
        patch(&mut document);
        ProfileValidator::new(1).validate(document).unwrap_err().message().to_owned()
    }

    #[test]
    fn accepts_valid_document() {
        let profile = ProfileValidator::new(1).validate(document()).unwrap();
        assert_eq!(profile.id, "acme");
        assert_eq!(profile.tone, ["friendly", "concise"]);
        assert_eq!(profile.guidelines, ["Use active voice."]);
    }

    #[test]
    fn rejects_wrong_shapes() {
        assert!(rejection(|d| d["tone"] = json!("friendly")).contains("invalid type"));
        assert!(rejection(|d| d["schema_version"] = json!(-1)).contains("invalid value"));
        assert!(rejection(|d| _ = d.as_object_mut().unwrap().remove("name")).contains("missing field `name`"));
    }

    #[test]
    fn rejects_rule_violations() {
        assert_eq!(rejection(|d| d["schema_version"] = json!(3)), "expected schema version 1, got 3");
        assert_eq!(rejection(|d| d["id"] = json!("  ")), "`id` must not be blank");
        assert_eq!(rejection(|d| d["name"] = json!("")), "`name` must not be blank");
        assert_eq!(rejection(|d| d["tone"] = json!([])), "`tone` must list at least one entry");
        assert_eq!(rejection(|d| d["tone"] = json!(["ok", " "])), "`tone` entries must not be blank");
        assert_eq!(
            rejection(|d| d["vocabulary"]["avoided"] = json!(["Customers"])),
            "`customers` is both preferred and avoided"
        );
    }
}
