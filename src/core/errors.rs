//! Error types for the verification pipeline.
//!
//! This module defines the errors that can abort a verification request:
//! image decoding failures, configuration problems, collaborator failures
//! and internal processing errors. Validation failures are deliberately absent;
//! they are reported as booleans in [`crate::domain::ValidationReport`].

use thiserror::Error;

/// Convenient result alias for verification operations.
pub type VerifyResult<T> = Result<T, VerifyError>;

/// Message returned to callers for every failure that is not a recognition failure.
pub const GENERIC_FAILURE_MESSAGE: &str = "processing failed";

/// Enum representing the stages of the verification pipeline.
///
/// Used to identify which stage an error occurred in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingStage {
    /// Skew estimation and rotation.
    Deskew,
}

impl std::fmt::Display for ProcessingStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessingStage::Deskew => write!(f, "deskew"),
        }
    }
}

/// Errors that can occur while verifying a document.
#[derive(Error, Debug)]
pub enum VerifyError {
    /// The uploaded bytes could not be decoded as an image.
    #[error("image decode")]
    Decode(#[source] image::ImageError),

    /// Error indicating invalid input.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// A message describing the invalid input.
        message: String,
    },

    /// Error indicating a configuration problem.
    #[error("configuration: {message}")]
    Config {
        /// A message describing the configuration error.
        message: String,
    },

    /// An external collaborator (recognition, correction, detector, anomaly model) failed.
    #[error("{service} failed: {message}")]
    Collaborator {
        /// Name of the collaborator, e.g. `"recognition"`.
        service: &'static str,
        /// Human readable failure description.
        message: String,
        /// The underlying error, when one exists.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Error occurred inside one of the locally-owned stages.
    #[error("{kind} failed: {context}")]
    Processing {
        /// The stage where the error occurred.
        kind: ProcessingStage,
        /// Additional context about the error.
        context: String,
        /// The underlying error that caused this error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// IO error.
    #[error("io")]
    Io(#[from] std::io::Error),
}

impl VerifyError {
    /// Creates an error for invalid input.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Creates a collaborator error without an underlying source.
    pub fn collaborator(service: &'static str, message: impl Into<String>) -> Self {
        Self::Collaborator {
            service,
            message: message.into(),
            source: None,
        }
    }

    /// Creates a collaborator error wrapping the error that caused it.
    ///
    /// # Arguments
    ///
    /// * `service` - Name of the collaborator.
    /// * `message` - What was being attempted.
    /// * `error` - The underlying error.
    pub fn collaborator_with_source(
        service: &'static str,
        message: impl Into<String>,
        error: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Collaborator {
            service,
            message: message.into(),
            source: Some(Box::new(error)),
        }
    }

    /// Creates a processing error for the given stage.
    pub fn processing(
        kind: ProcessingStage,
        context: &str,
        error: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Processing {
            kind,
            context: context.to_string(),
            source: Box::new(error),
        }
    }

    /// Returns true when the failure came from the named collaborator.
    pub fn is_collaborator(&self, name: &str) -> bool {
        matches!(self, Self::Collaborator { service, .. } if *service == name)
    }

    /// Message that may be shown to the caller of the pipeline.
    ///
    /// Recognition-service failures carry their message; every other failure
    /// collapses to [`GENERIC_FAILURE_MESSAGE`] and is only logged server-side.
    pub fn caller_message(&self) -> String {
        if self.is_collaborator(crate::core::constants::RECOGNITION_SERVICE) {
            self.to_string()
        } else {
            GENERIC_FAILURE_MESSAGE.to_string()
        }
    }
}

impl From<image::ImageError> for VerifyError {
    fn from(error: image::ImageError) -> Self {
        Self::Decode(error)
    }
}

impl From<crate::core::config::ConfigError> for VerifyError {
    fn from(error: crate::core::config::ConfigError) -> Self {
        Self::Config {
            message: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recognition_failure_is_surfaced() {
        let err = VerifyError::collaborator("recognition", "service returned 401");
        assert_eq!(err.caller_message(), "recognition failed: service returned 401");
    }

    #[test]
    fn test_other_failures_are_generic() {
        let err = VerifyError::collaborator("detector", "model crashed");
        assert_eq!(err.caller_message(), GENERIC_FAILURE_MESSAGE);

        let err = VerifyError::invalid_input("empty upload");
        assert_eq!(err.caller_message(), GENERIC_FAILURE_MESSAGE);
    }

    #[test]
    fn test_processing_stage_display() {
        let err = VerifyError::processing(
            ProcessingStage::Deskew,
            "rotation produced no pixels",
            std::io::Error::other("empty"),
        );
        assert_eq!(err.to_string(), "deskew failed: rotation produced no pixels");
    }
}
