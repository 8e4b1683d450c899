//! Reports, signals and the response assembled by the pipeline.

use serde::{Deserialize, Serialize};

use super::recognition::ExtractedFields;

/// Image quality metrics. Advisory only: a failing report never halts the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    /// Variance of the Laplacian; higher is sharper.
    pub blur_score: f64,
    /// Mean brightness in `[0, 255]`.
    pub lighting_score: f64,
    pub is_blurry: bool,
    pub is_dark: bool,
    pub is_overexposed: bool,
    /// Always `!(is_blurry || is_dark || is_overexposed)`.
    pub quality_pass: bool,
}

impl QualityReport {
    /// Builds a report from its flags, deriving `quality_pass`.
    pub fn new(
        blur_score: f64,
        lighting_score: f64,
        is_blurry: bool,
        is_dark: bool,
        is_overexposed: bool,
    ) -> Self {
        Self {
            blur_score,
            lighting_score,
            is_blurry,
            is_dark,
            is_overexposed,
            quality_pass: !(is_blurry || is_dark || is_overexposed),
        }
    }
}

/// Outcome of the rule-based field checks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub aadhaar_valid: bool,
    pub dob_valid: bool,
    pub gender_valid: bool,
    pub name_present: bool,
    pub address_present: bool,
    /// Percentage of the five checks above that passed.
    pub validation_score: f64,
}

impl ValidationReport {
    /// Number of boolean checks that make up `validation_score`.
    pub const CHECK_COUNT: usize = 5;

    /// Builds a report from the five checks, deriving `validation_score`.
    pub fn new(
        aadhaar_valid: bool,
        dob_valid: bool,
        gender_valid: bool,
        name_present: bool,
        address_present: bool,
    ) -> Self {
        let passed = [
            aadhaar_valid,
            dob_valid,
            gender_valid,
            name_present,
            address_present,
        ]
        .iter()
        .filter(|&&ok| ok)
        .count();

        Self {
            aadhaar_valid,
            dob_valid,
            gender_valid,
            name_present,
            address_present,
            validation_score: 100.0 * passed as f64 / Self::CHECK_COUNT as f64,
        }
    }
}

/// One labeled detection from the fraud classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Class label, e.g. `tampered_text`.
    pub class: String,
    pub confidence: f64,
    /// `[x1, y1, x2, y2]` in source-image pixels.
    pub bbox: [f32; 4],
}

impl Detection {
    pub fn new(class: impl Into<String>, confidence: f64, bbox: [f32; 4]) -> Self {
        Self {
            class: class.into(),
            confidence,
            bbox,
        }
    }
}

/// Combined fraud evidence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FraudSignal {
    pub detections: Vec<Detection>,
    /// Score in `[0, 1]`.
    pub fraud_score: f64,
}

/// Final decision label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Decision {
    Safe,
    Review,
    Fraud,
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Decision::Safe => write!(f, "SAFE"),
            Decision::Review => write!(f, "REVIEW"),
            Decision::Fraud => write!(f, "FRAUD"),
        }
    }
}

/// The numeric signals that fed the decision.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scores {
    pub ocr_confidence: f64,
    pub fraud_score: f64,
    pub anomaly_score: f64,
    pub final_risk_score: f64,
}

/// Response returned for one verification request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationResponse {
    /// Fields after text correction.
    pub extracted_data: ExtractedFields,
    pub validation_report: ValidationReport,
    pub quality_metrics: QualityReport,
    pub scores: Scores,
    pub decision: Decision,
    pub fraud_details: Vec<Detection>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_pass_is_derived() {
        assert!(QualityReport::new(150.0, 120.0, false, false, false).quality_pass);
        assert!(!QualityReport::new(50.0, 120.0, true, false, false).quality_pass);
        assert!(!QualityReport::new(150.0, 20.0, false, true, false).quality_pass);
    }

    #[test]
    fn test_validation_score_counts_five_checks() {
        let report = ValidationReport::new(true, true, false, true, false);
        assert_eq!(report.validation_score, 60.0);
        assert_eq!(
            ValidationReport::new(false, false, false, false, false).validation_score,
            0.0
        );
        assert_eq!(
            ValidationReport::new(true, true, true, true, true).validation_score,
            100.0
        );
    }

    #[test]
    fn test_decision_serializes_uppercase() {
        let json = serde_json::to_string(&Decision::Review).unwrap();
        assert_eq!(json, "\"REVIEW\"");
        assert_eq!(Decision::Fraud.to_string(), "FRAUD");
    }
}
