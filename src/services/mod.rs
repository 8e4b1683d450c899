//! Collaborator clients.
//!
//! Each client implements one of the capability traits in
//! [`crate::core::traits`], so the pipeline never depends on a concrete
//! service.

pub mod anomaly;
pub mod azure_recognition;
pub mod detector;
pub mod text_correction;

pub use anomaly::PlaceholderAnomalyScorer;
pub use azure_recognition::AzureRecognitionClient;
#[cfg(feature = "onnx")]
pub use detector::OnnxFraudDetector;
pub use text_correction::AzureTextCorrector;
