//! Domain types for document verification.
//!
//! All types here are request-scoped value objects: they are created and
//! consumed within one verification and never shared across requests.

pub mod recognition;
pub mod reports;

pub use recognition::{
    ExtractedFields, RecognitionResult, RecognizedDocument, RecognizedField, field_keys,
};
pub use reports::{
    Decision, Detection, FraudSignal, QualityReport, Scores, ValidationReport,
    VerificationResponse,
};
