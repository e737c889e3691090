//! Configuration validation

use super::Config;

/// Validation errors for configuration values
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

impl ValidationError {
    fn invalid(field: &str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

/// Trait for validating configuration sections
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

impl Validate for Config {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.github.api_url.trim().is_empty() {
            return Err(ValidationError::invalid("github.api_url", "must not be empty"));
        }
        if self.github.fetch_timeout_seconds == 0 {
            return Err(ValidationError::invalid(
                "github.fetch_timeout_seconds",
                "must be at least 1",
            ));
        }
        if self.llm.base_url.trim().is_empty() {
            return Err(ValidationError::invalid("llm.base_url", "must not be empty"));
        }
        if self.llm.economical_model.trim().is_empty() {
            return Err(ValidationError::invalid(
                "llm.economical_model",
                "must not be empty",
            ));
        }
        if self.llm.standard_model.trim().is_empty() {
            return Err(ValidationError::invalid(
                "llm.standard_model",
                "must not be empty",
            ));
        }
        if self.llm.max_attempts == 0 {
            return Err(ValidationError::invalid("llm.max_attempts", "must be at least 1"));
        }
        if self.llm.max_backoff_ms < self.llm.initial_backoff_ms {
            return Err(ValidationError::invalid(
                "llm.max_backoff_ms",
                "must be >= llm.initial_backoff_ms",
            ));
        }
        Ok(())
    }
}
