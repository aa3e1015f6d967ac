//! Field-level validation messages shared by request validators

use serde::Serialize;

/// One failed rule on one request field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub error_message: String,
}

impl FieldError {
    pub fn new(field: &str, error_message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            error_message: error_message.into(),
        }
    }

    pub fn required(field: &str) -> Self {
        Self::new(field, format!("{} is required", field))
    }

    pub fn invalid_format(field: &str, format: &str) -> Self {
        Self::new(field, format!("{} must be in format {}", field, format))
    }

    pub fn min_length(field: &str, min: usize) -> Self {
        Self::new(field, format!("{} must be at least {} characters", field, min))
    }
}

/// Collects field errors and turns them into a `Result`
#[derive(Debug, Default)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: FieldError) {
        self.0.push(error);
    }

    /// Record `required` when the trimmed value is empty
    pub fn require(&mut self, field: &str, value: &str) -> bool {
        if value.trim().is_empty() {
            self.push(FieldError::required(field));
            return false;
        }
        true
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_result(self) -> Result<(), Vec<FieldError>> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(self.0)
        }
    }
}
