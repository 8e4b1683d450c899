//! Image anomaly scoring.

use image::DynamicImage;

use crate::core::constants::PLACEHOLDER_ANOMALY_SCORE;
use crate::core::errors::VerifyResult;
use crate::core::traits::AnomalyScorer;

/// Stand-in for a learned reconstruction model.
///
/// Returns a fixed score for every image; a trained scorer can replace it
/// behind [`AnomalyScorer`] without touching the fusion stage.
#[derive(Debug, Clone, Copy)]
pub struct PlaceholderAnomalyScorer {
    score: f64,
}

impl Default for PlaceholderAnomalyScorer {
    fn default() -> Self {
        Self::new(PLACEHOLDER_ANOMALY_SCORE)
    }
}

impl PlaceholderAnomalyScorer {
    /// Creates a scorer that always answers `score`, clamped to `[0, 1]`.
    pub fn new(score: f64) -> Self {
        Self {
            score: score.clamp(0.0, 1.0),
        }
    }
}

impl AnomalyScorer for PlaceholderAnomalyScorer {
    fn score(&self, _image: &DynamicImage) -> VerifyResult<f64> {
        Ok(self.score)
    }
}
