//! Fraud evidence aggregation.
//!
//! Combines the object detector's labeled regions with rule-based forgery
//! checks. The detector contribution follows fixed rules:
//!
//! - every confident `tampered_text` detection adds a penalty,
//! - a missing `qr_code` adds a smaller penalty,
//! - a missing `emblem` adds the smallest penalty,
//!
//! and the sum is clamped to `[0, 1]`. The combined score is the maximum of the
//! detector score and the forgery-check score.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::config::{ConfigError, ConfigValidator};
use crate::core::constants::{
    DEFAULT_MISSING_EMBLEM_PENALTY, DEFAULT_MISSING_QR_PENALTY, DEFAULT_TAMPERED_CONFIDENCE,
    DEFAULT_TAMPERED_PENALTY, LABEL_EMBLEM, LABEL_QR_CODE, LABEL_TAMPERED_TEXT,
};
use crate::core::traits::{ForgeryCheck, ForgeryInput};
use crate::domain::{Detection, FraudSignal};

/// Weights of the detector rules.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FraudRulesConfig {
    /// Tampered-text detections must be strictly above this confidence.
    pub tampered_confidence: f64,
    /// Added per confident tampered-text detection.
    pub tampered_penalty: f64,
    /// Added when no QR code is detected.
    pub missing_qr_penalty: f64,
    /// Added when no emblem is detected.
    pub missing_emblem_penalty: f64,
}

impl Default for FraudRulesConfig {
    fn default() -> Self {
        Self::get_defaults()
    }
}

impl ConfigValidator for FraudRulesConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.validate_unit_interval(self.tampered_confidence, "tampered_confidence")?;
        self.validate_unit_interval(self.tampered_penalty, "tampered_penalty")?;
        self.validate_unit_interval(self.missing_qr_penalty, "missing_qr_penalty")?;
        self.validate_unit_interval(self.missing_emblem_penalty, "missing_emblem_penalty")
    }

    fn get_defaults() -> Self {
        Self {
            tampered_confidence: DEFAULT_TAMPERED_CONFIDENCE,
            tampered_penalty: DEFAULT_TAMPERED_PENALTY,
            missing_qr_penalty: DEFAULT_MISSING_QR_PENALTY,
            missing_emblem_penalty: DEFAULT_MISSING_EMBLEM_PENALTY,
        }
    }
}

/// Canonical form of a detector label: lowercase with `-` replaced by `_`.
fn canonical_label(label: &str) -> String {
    label.trim().to_lowercase().replace('-', "_")
}

/// Checks whether fonts across recognized fields are consistent.
///
/// No font model is wired in yet, so the check always reports 0.0.
#[derive(Debug, Clone, Copy, Default)]
pub struct FontConsistencyCheck;

impl ForgeryCheck for FontConsistencyCheck {
    fn name(&self) -> &'static str {
        "font_consistency"
    }

    fn score(&self, _input: &ForgeryInput<'_>) -> f64 {
        0.0
    }
}

/// Looks for traces of editing software in the image metadata.
///
/// Always 0.0 until a metadata reader is added.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetadataTamperCheck;

impl ForgeryCheck for MetadataTamperCheck {
    fn name(&self) -> &'static str {
        "metadata_tamper"
    }

    fn score(&self, _input: &ForgeryInput<'_>) -> f64 {
        0.0
    }
}

/// Fuses detector output and forgery checks into a [`FraudSignal`].
pub struct FraudSignalAggregator {
    config: FraudRulesConfig,
    checks: Vec<Box<dyn ForgeryCheck>>,
}

impl std::fmt::Debug for FraudSignalAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FraudSignalAggregator")
            .field("config", &self.config)
            .field(
                "checks",
                &self.checks.iter().map(|c| c.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Default for FraudSignalAggregator {
    fn default() -> Self {
        Self::new(FraudRulesConfig::default())
    }
}

impl FraudSignalAggregator {
    /// Creates an aggregator with the built-in forgery checks.
    pub fn new(config: FraudRulesConfig) -> Self {
        Self {
            config,
            checks: vec![Box::new(FontConsistencyCheck), Box::new(MetadataTamperCheck)],
        }
    }

    /// Replaces the forgery checks.
    pub fn with_checks(mut self, checks: Vec<Box<dyn ForgeryCheck>>) -> Self {
        self.checks = checks;
        self
    }

    /// Applies the detector rules to a set of detections.
    pub fn detector_score(&self, detections: &[Detection]) -> f64 {
        let labels: Vec<String> = detections.iter().map(|d| canonical_label(&d.class)).collect();

        let tampered = detections
            .iter()
            .zip(&labels)
            .filter(|(d, label)| {
                label.as_str() == LABEL_TAMPERED_TEXT && d.confidence > self.config.tampered_confidence
            })
            .count();

        let mut score = tampered as f64 * self.config.tampered_penalty;
        if !labels.iter().any(|l| l == LABEL_QR_CODE) {
            score += self.config.missing_qr_penalty;
        }
        if !labels.iter().any(|l| l == LABEL_EMBLEM) {
            score += self.config.missing_emblem_penalty;
        }

        score.clamp(0.0, 1.0)
    }

    /// Maximum over all forgery checks, clamped to `[0, 1]`. 0.0 without checks.
    pub fn forgery_score(&self, input: &ForgeryInput<'_>) -> f64 {
        self.checks
            .iter()
            .map(|check| {
                let score = check.score(input);
                debug!(check = check.name(), score, "Forgery check");
                if score.is_finite() { score.clamp(0.0, 1.0) } else { 0.0 }
            })
            .fold(0.0, f64::max)
    }

    /// Combines detector output with a forgery score.
    ///
    /// `detections` is `None` when the detector was unavailable or failed; its
    /// contribution is then 0.0 and no detections are reported.
    pub fn aggregate(&self, detections: Option<Vec<Detection>>, forgery_score: f64) -> FraudSignal {
        let (detector_score, detections) = match detections {
            Some(detections) => (self.detector_score(&detections), detections),
            None => (0.0, Vec::new()),
        };

        let fraud_score = detector_score.max(forgery_score);
        debug!(detector_score, forgery_score, fraud_score, "Fraud signal aggregated");

        FraudSignal {
            detections,
            fraud_score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RecognitionResult;

    fn det(class: &str, confidence: f64) -> Detection {
        Detection::new(class, confidence, [0.0, 0.0, 10.0, 10.0])
    }

    struct FixedCheck(f64);

    impl ForgeryCheck for FixedCheck {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn score(&self, _input: &ForgeryInput<'_>) -> f64 {
            self.0
        }
    }

    #[test]
    fn test_no_detections_penalizes_missing_marks() {
        let aggregator = FraudSignalAggregator::default();
        assert!((aggregator.detector_score(&[]) - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_all_marks_present() {
        let aggregator = FraudSignalAggregator::default();
        let detections = [det("qr_code", 0.9), det("emblem", 0.7), det("face", 0.99)];
        assert_eq!(aggregator.detector_score(&detections), 0.0);
    }

    #[test]
    fn test_tampered_text_needs_confidence() {
        let aggregator = FraudSignalAggregator::default();
        let weak = [det("tampered_text", 0.5), det("qr_code", 0.9), det("emblem", 0.9)];
        assert_eq!(aggregator.detector_score(&weak), 0.0);

        let strong = [det("tampered_text", 0.51), det("qr_code", 0.9), det("emblem", 0.9)];
        assert!((aggregator.detector_score(&strong) - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_score_is_clamped() {
        let aggregator = FraudSignalAggregator::default();
        let detections = [det("tampered-text", 0.9), det("Tampered_Text", 0.8)];
        assert_eq!(aggregator.detector_score(&detections), 1.0);
    }

    #[test]
    fn test_hyphenated_labels_match() {
        let aggregator = FraudSignalAggregator::default();
        let detections = [det("qr-code", 0.9)];
        assert!((aggregator.detector_score(&detections) - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_builtin_forgery_checks_score_zero() {
        let aggregator = FraudSignalAggregator::default();
        let recognition = RecognitionResult::empty();
        let input = ForgeryInput {
            raw_bytes: b"bytes",
            recognition: Some(&recognition),
        };
        assert_eq!(aggregator.forgery_score(&input), 0.0);
    }

    #[test]
    fn test_aggregate_takes_maximum() {
        let aggregator =
            FraudSignalAggregator::default().with_checks(vec![Box::new(FixedCheck(0.6)), Box::new(FixedCheck(0.2))]);
        let input = ForgeryInput {
            raw_bytes: &[],
            recognition: None,
        };
        let forgery = aggregator.forgery_score(&input);
        assert_eq!(forgery, 0.6);

        let signal = aggregator.aggregate(Some(vec![]), forgery);
        assert_eq!(signal.fraud_score, 0.6);
    }

    #[test]
    fn test_failed_detector_contributes_nothing() {
        let aggregator = FraudSignalAggregator::default();
        let signal = aggregator.aggregate(None, 0.0);
        assert_eq!(signal.fraud_score, 0.0);
        assert!(signal.detections.is_empty());
    }
}
