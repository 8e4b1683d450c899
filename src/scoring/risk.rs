//! Risk fusion and the final decision.
//!
//! `risk = (1 - ocr_confidence) * w_c + fraud_score * w_f + anomaly_score * w_a`,
//! rounded to two decimals. Confidence is a goodness signal, so it is inverted
//! before weighting. With the default weights (40/40/20) and inputs in `[0, 1]`
//! the risk lies in `[0, 100]`.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::config::{ConfigError, ConfigValidator};
use crate::core::constants::{
    DEFAULT_ANOMALY_WEIGHT, DEFAULT_CONFIDENCE_WEIGHT, DEFAULT_FRAUD_WEIGHT,
    DEFAULT_REVIEW_THRESHOLD, DEFAULT_SAFE_THRESHOLD,
};
use crate::domain::{Decision, Scores};

/// Weights and decision thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    pub confidence_weight: f64,
    pub fraud_weight: f64,
    pub anomaly_weight: f64,
    /// Risk at or below this is SAFE.
    pub safe_threshold: f64,
    /// Risk at or below this (and above `safe_threshold`) is REVIEW.
    pub review_threshold: f64,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self::get_defaults()
    }
}

impl ConfigValidator for FusionConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.validate_non_negative(self.confidence_weight, "confidence_weight")?;
        self.validate_non_negative(self.fraud_weight, "fraud_weight")?;
        self.validate_non_negative(self.anomaly_weight, "anomaly_weight")?;
        self.validate_non_negative(self.safe_threshold, "safe_threshold")?;
        self.validate_non_negative(self.review_threshold, "review_threshold")?;
        if self.safe_threshold >= self.review_threshold {
            return Err(ConfigError::InvalidConfig {
                message: format!(
                    "safe_threshold ({}) must be below review_threshold ({})",
                    self.safe_threshold, self.review_threshold
                ),
            });
        }
        Ok(())
    }

    fn get_defaults() -> Self {
        Self {
            confidence_weight: DEFAULT_CONFIDENCE_WEIGHT,
            fraud_weight: DEFAULT_FRAUD_WEIGHT,
            anomaly_weight: DEFAULT_ANOMALY_WEIGHT,
            safe_threshold: DEFAULT_SAFE_THRESHOLD,
            review_threshold: DEFAULT_REVIEW_THRESHOLD,
        }
    }
}

/// Rounds to two decimal places, ties to even.
fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

/// Computes risk scores and maps them to decisions.
#[derive(Debug, Clone, Copy, Default)]
pub struct RiskFusionEngine {
    config: FusionConfig,
}

impl RiskFusionEngine {
    pub fn new(config: FusionConfig) -> Self {
        Self { config }
    }

    /// Weighted risk in `[0, 100]` for inputs in `[0, 1]`, rounded to two decimals.
    pub fn risk_score(&self, ocr_confidence: f64, fraud_score: f64, anomaly_score: f64) -> f64 {
        let c = &self.config;
        round2(
            (1.0 - ocr_confidence) * c.confidence_weight
                + fraud_score * c.fraud_weight
                + anomaly_score * c.anomaly_weight,
        )
    }

    /// Maps a risk score to a decision. Both thresholds are inclusive upper bounds.
    pub fn decide(&self, risk: f64) -> Decision {
        if risk <= self.config.safe_threshold {
            Decision::Safe
        } else if risk <= self.config.review_threshold {
            Decision::Review
        } else {
            Decision::Fraud
        }
    }

    /// Fuses the three signals into [`Scores`] and a decision.
    pub fn fuse(&self, ocr_confidence: f64, fraud_score: f64, anomaly_score: f64) -> (Scores, Decision) {
        let final_risk_score = self.risk_score(ocr_confidence, fraud_score, anomaly_score);
        let decision = self.decide(final_risk_score);
        info!(final_risk_score, %decision, "Risk fused");

        (
            Scores {
                ocr_confidence,
                fraud_score,
                anomaly_score,
                final_risk_score,
            },
            decision,
        )
    }
}
