//! Configuration error types and validation traits.

use thiserror::Error;

/// Errors that can occur during configuration validation.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A collaborator is missing its endpoint or credentials.
    #[error("{service} is not configured: {message}")]
    MissingCredentials {
        service: &'static str,
        message: String,
    },

    /// Error indicating that a configuration is invalid.
    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// A configuration file could not be read or parsed.
    #[error("failed to load configuration from {path}: {message}")]
    LoadFailed {
        path: std::path::PathBuf,
        message: String,
    },
}

/// A trait for validating configuration parameters.
///
/// Implemented by every tunable configuration section of the pipeline.
pub trait ConfigValidator {
    /// Validates the configuration.
    fn validate(&self) -> Result<(), ConfigError>;

    /// Returns the default configuration.
    fn get_defaults() -> Self
    where
        Self: Sized;

    /// Validates that a score lies in `[0, 1]`.
    fn validate_unit_interval(&self, value: f64, field_name: &str) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&value) {
            Err(ConfigError::InvalidConfig {
                message: format!("{field_name} must be between 0.0 and 1.0, got {value}"),
            })
        } else {
            Ok(())
        }
    }

    /// Validates a float value is within a specified range.
    ///
    /// # Arguments
    ///
    /// * `value` - The value to validate.
    /// * `min` - The minimum allowed value (inclusive).
    /// * `max` - The maximum allowed value (inclusive).
    /// * `field_name` - The name of the field being validated.
    fn validate_f64_range(
        &self,
        value: f64,
        min: f64,
        max: f64,
        field_name: &str,
    ) -> Result<(), ConfigError> {
        if !(min..=max).contains(&value) {
            Err(ConfigError::InvalidConfig {
                message: format!("{field_name} must be between {min} and {max}, got {value}"),
            })
        } else {
            Ok(())
        }
    }

    /// Validates a float value is non-negative and finite.
    fn validate_non_negative(&self, value: f64, field_name: &str) -> Result<(), ConfigError> {
        if !value.is_finite() || value < 0.0 {
            Err(ConfigError::InvalidConfig {
                message: format!("{field_name} must be a finite value >= 0, got {value}"),
            })
        } else {
            Ok(())
        }
    }

    /// Validates a u32 value is positive.
    fn validate_positive_u32(&self, value: u32, field_name: &str) -> Result<(), ConfigError> {
        if value == 0 {
            Err(ConfigError::InvalidConfig {
                message: format!("{field_name} must be greater than 0, got {value}"),
            })
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestValidator;

    impl ConfigValidator for TestValidator {
        fn validate(&self) -> Result<(), ConfigError> {
            Ok(())
        }

        fn get_defaults() -> Self {
            TestValidator
        }
    }

    #[test]
    fn test_validate_unit_interval() {
        let validator = TestValidator;
        assert!(validator.validate_unit_interval(0.0, "score").is_ok());
        assert!(validator.validate_unit_interval(1.0, "score").is_ok());
        assert!(validator.validate_unit_interval(1.01, "score").is_err());
        assert!(validator.validate_unit_interval(-0.1, "score").is_err());
    }

    #[test]
    fn test_validate_non_negative() {
        let validator = TestValidator;
        assert!(validator.validate_non_negative(0.0, "weight").is_ok());
        assert!(validator.validate_non_negative(-1.0, "weight").is_err());
        assert!(validator.validate_non_negative(f64::NAN, "weight").is_err());
    }

    #[test]
    fn test_config_error_to_string() {
        let error = ConfigError::MissingCredentials {
            service: "recognition",
            message: "endpoint or key not set".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "recognition is not configured: endpoint or key not set"
        );
    }
}
