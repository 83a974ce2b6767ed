//! Form input with an attached validation error.

use crate::validation::{ValidationError, ValidationResult};

/// A raw input value and the error from its last validation, if any.
///
/// Editing the value always clears the error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputField<T> {
    value: T,
    error: Option<ValidationError>,
}

impl<T> InputField<T> {
    /// Create a field holding `value` with no error.
    #[must_use]
    pub const fn new(value: T) -> Self {
        Self { value, error: None }
    }

    /// Current raw value.
    #[must_use]
    pub const fn value(&self) -> &T {
        &self.value
    }

    /// Error from the last failed validation.
    #[must_use]
    pub const fn error(&self) -> Option<&ValidationError> {
        self.error.as_ref()
    }

    /// Replace the value and clear the error.
    pub fn update(&mut self, value: T) {
        self.value = value;
        self.error = None;
    }

    /// Record a validation outcome. Returns true if it passed.
    pub fn apply(&mut self, result: ValidationResult) -> bool {
        self.error = result.err();
        self.error.is_none()
    }
}
