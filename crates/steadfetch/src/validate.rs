// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt::Debug;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::ValidationError;

/// Turns a raw JSON document into a validated value.
///
/// Closures of the shape `Fn(Value) -> Result<T, ValidationError>` are validators, and
/// [`JsonValidator`] deserializes into any [`DeserializeOwned`] type.
pub trait Validator: Send + Sync {
    /// The validated value.
    type Output: Send;

    /// Validates `document`.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if the document does not match the expected schema.
    fn validate(&self, document: Value) -> Result<Self::Output, ValidationError>;
}

impl<F, T> Validator for F
where
    F: Fn(Value) -> Result<T, ValidationError> + Send + Sync,
    T: Send,
{
    type Output = T;

    fn validate(&self, document: Value) -> Result<T, ValidationError> {
        self(document)
    }
}

/// Validates by deserializing into `T`.
///
/// # Example
///
/// ```
/// use serde::Deserialize;
/// use steadfetch::{JsonValidator, Validator};
///
/// #[derive(Debug, Deserialize)]
/// struct Greeting {
///     text: String,
/// }
///
/// let validator = JsonValidator::<Greeting>::new();
/// let greeting = validator.validate(serde_json::json!({ "text": "hi" })).unwrap();
/// assert_eq!(greeting.text, "hi");
///
/// assert!(validator.validate(serde_json::json!({ "txt": "hi" })).is_err());
/// ```
pub struct JsonValidator<T> {
    _output: PhantomData<fn() -> T>,
}

impl<T> JsonValidator<T> {
    /// Creates the validator.
    #[must_use]
    pub fn new() -> Self {
        Self { _output: PhantomData }
    }
}

impl<T> Default for JsonValidator<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for JsonValidator<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> Debug for JsonValidator<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonValidator").field("output", &std::any::type_name::<T>()).finish()
    }
}

impl<T: DeserializeOwned + Send> Validator for JsonValidator<T> {
    type Output = T;

    fn validate(&self, document: Value) -> Result<T, ValidationError> {
        serde_json::from_value(document).map_err(ValidationError::from)
    }
}
