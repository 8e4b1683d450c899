//! Constants used throughout the verification pipeline.
//!
//! Default values here reproduce the reference behavior; most of them can be
//! overridden through [`crate::pipeline::PipelineConfig`].

/// Collaborator name used for the recognition service in errors and stage summaries.
pub const RECOGNITION_SERVICE: &str = "recognition";
/// Collaborator name used for the text-correction service.
pub const CORRECTION_SERVICE: &str = "text_correction";
/// Collaborator name used for the object-detection fraud classifier.
pub const DETECTOR_SERVICE: &str = "detector";
/// Collaborator name used for the anomaly scorer.
pub const ANOMALY_SERVICE: &str = "anomaly";

/// Median filter radius applied before binarization.
pub const DEFAULT_DENOISE_RADIUS: u32 = 1;

/// Gaussian kernel size used before skew estimation.
pub const DEFAULT_DESKEW_BLUR_KERNEL: u32 = 9;
/// Width of the horizontal dilation element that merges characters into lines.
pub const DEFAULT_DILATE_KERNEL_WIDTH: u32 = 30;
/// Height of the dilation element.
pub const DEFAULT_DILATE_KERNEL_HEIGHT: u32 = 5;
/// Number of dilation passes.
pub const DEFAULT_DILATE_ITERATIONS: u32 = 2;
/// Skew angles at or below this magnitude (degrees) are left uncorrected.
pub const DEFAULT_MIN_ROTATION_DEGREES: f32 = 0.5;

/// Laplacian variance below this value is considered blurry.
pub const DEFAULT_BLUR_THRESHOLD: f64 = 100.0;
/// Mean brightness below this value is considered dark.
pub const DEFAULT_DARK_THRESHOLD: f64 = 50.0;
/// Mean brightness above this value is considered overexposed.
pub const DEFAULT_OVEREXPOSED_THRESHOLD: f64 = 200.0;

/// Detector label for tampered text regions.
pub const LABEL_TAMPERED_TEXT: &str = "tampered_text";
/// Detector label for the card's QR code.
pub const LABEL_QR_CODE: &str = "qr_code";
/// Detector label for the national emblem.
pub const LABEL_EMBLEM: &str = "emblem";

/// Minimum confidence for a tampered-text detection to count.
pub const DEFAULT_TAMPERED_CONFIDENCE: f64 = 0.5;
/// Score added per confident tampered-text detection.
pub const DEFAULT_TAMPERED_PENALTY: f64 = 0.8;
/// Score added when no QR code was detected.
pub const DEFAULT_MISSING_QR_PENALTY: f64 = 0.2;
/// Score added when no emblem was detected.
pub const DEFAULT_MISSING_EMBLEM_PENALTY: f64 = 0.1;

/// Weight of the inverted recognition confidence in the risk score.
pub const DEFAULT_CONFIDENCE_WEIGHT: f64 = 40.0;
/// Weight of the fraud score in the risk score.
pub const DEFAULT_FRAUD_WEIGHT: f64 = 40.0;
/// Weight of the anomaly score in the risk score.
pub const DEFAULT_ANOMALY_WEIGHT: f64 = 20.0;

/// Risk at or below this value is SAFE.
pub const DEFAULT_SAFE_THRESHOLD: f64 = 40.0;
/// Risk at or below this value (and above the safe threshold) is REVIEW.
pub const DEFAULT_REVIEW_THRESHOLD: f64 = 70.0;

/// Score returned by the placeholder anomaly model.
pub const PLACEHOLDER_ANOMALY_SCORE: f64 = 0.1;

/// Default document model used by the recognition service.
pub const DEFAULT_RECOGNITION_MODEL: &str = "prebuilt-idDocument";
/// API version of the recognition service.
pub const DEFAULT_RECOGNITION_API_VERSION: &str = "2023-07-31";
/// API version of the text-correction service.
pub const DEFAULT_CORRECTION_API_VERSION: &str = "2023-12-01-preview";
/// Class names of the fraud detector, in model output order.
pub const DEFAULT_DETECTOR_CLASSES: &[&str] = &[LABEL_TAMPERED_TEXT, "face", LABEL_QR_CODE, LABEL_EMBLEM];
/// Default log verbosity.
pub const DEFAULT_LOG_LEVEL: &str = "info";
