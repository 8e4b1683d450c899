//! Capability interfaces for external collaborators.

use image::DynamicImage;

use crate::core::errors::VerifyResult;
use crate::domain::{Detection, ExtractedFields, RecognitionResult};

/// Document recognition (OCR) service.
///
/// A failure here is fatal for the request.
pub trait RecognitionService: Send + Sync {
    /// Analyzes raw image bytes and returns the recognized documents.
    fn analyze(&self, image_bytes: &[u8]) -> VerifyResult<RecognitionResult>;
}

/// Generative text-correction service.
///
/// Callers fall back to the uncorrected fields on error.
pub trait TextCorrector: Send + Sync {
    /// Returns corrected fields with the same keys as the input.
    fn correct(&self, fields: &ExtractedFields) -> VerifyResult<ExtractedFields>;
}

/// Object-detection fraud classifier.
pub trait FraudDetector: Send + Sync {
    /// Detects labeled regions in the image.
    fn detect(&self, image: &DynamicImage) -> VerifyResult<Vec<Detection>>;
}

/// Given an image, produce an anomaly score in `[0, 1]`.
pub trait AnomalyScorer: Send + Sync {
    fn score(&self, image: &DynamicImage) -> VerifyResult<f64>;
}

/// Inputs available to rule-based forgery checks.
#[derive(Debug, Clone, Copy)]
pub struct ForgeryInput<'a> {
    /// The bytes exactly as uploaded.
    pub raw_bytes: &'a [u8],
    /// The recognition result, when recognition succeeded.
    pub recognition: Option<&'a RecognitionResult>,
}

/// A single rule-based forgery check producing a score in `[0, 1]`.
pub trait ForgeryCheck: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    fn score(&self, input: &ForgeryInput<'_>) -> f64;
}
