//! # Stage Definition: Quality Assessment
//!
//! This stage is considered "Done" when it fulfills the following contract:
//!
//! - **Inputs**: The deskewed `image::DynamicImage`.
//! - **Outputs**: A [`QualityReport`] with blur and lighting scores and their flags.
//! - **Logging**: Warns when the report fails; the report itself is advisory.
//! - **Invariants**:
//!     - `quality_pass == !(is_blurry || is_dark || is_overexposed)`.
//!     - An empty image scores 0.0 on both metrics instead of failing.

use image::DynamicImage;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::filters::{laplacian_variance, mean_brightness};
use crate::core::config::{ConfigError, ConfigValidator};
use crate::core::constants::{
    DEFAULT_BLUR_THRESHOLD, DEFAULT_DARK_THRESHOLD, DEFAULT_OVEREXPOSED_THRESHOLD,
};
use crate::domain::QualityReport;

/// Thresholds for [`QualityAssessor`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityConfig {
    /// Laplacian variance below this is blurry.
    pub blur_threshold: f64,
    /// Mean brightness below this is dark.
    pub dark_threshold: f64,
    /// Mean brightness above this is overexposed.
    pub overexposed_threshold: f64,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self::get_defaults()
    }
}

impl ConfigValidator for QualityConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.validate_non_negative(self.blur_threshold, "blur_threshold")?;
        self.validate_f64_range(self.dark_threshold, 0.0, 255.0, "dark_threshold")?;
        self.validate_f64_range(
            self.overexposed_threshold,
            0.0,
            255.0,
            "overexposed_threshold",
        )?;
        if self.dark_threshold >= self.overexposed_threshold {
            return Err(ConfigError::InvalidConfig {
                message: format!(
                    "dark_threshold ({}) must be below overexposed_threshold ({})",
                    self.dark_threshold, self.overexposed_threshold
                ),
            });
        }
        Ok(())
    }

    fn get_defaults() -> Self {
        Self {
            blur_threshold: DEFAULT_BLUR_THRESHOLD,
            dark_threshold: DEFAULT_DARK_THRESHOLD,
            overexposed_threshold: DEFAULT_OVEREXPOSED_THRESHOLD,
        }
    }
}

/// Computes blur and lighting metrics.
#[derive(Debug, Clone, Default)]
pub struct QualityAssessor {
    config: QualityConfig,
}

impl QualityAssessor {
    pub fn new(config: QualityConfig) -> Self {
        Self { config }
    }

    /// Variance of the Laplacian of the grayscale image. Higher is sharper.
    pub fn blur_score(&self, image: &DynamicImage) -> f64 {
        laplacian_variance(&image.to_luma8())
    }

    /// Mean brightness in `[0, 255]`.
    pub fn lighting_score(&self, image: &DynamicImage) -> f64 {
        mean_brightness(image)
    }

    /// Flags the given scores. Every threshold is strict: a score equal to
    /// its threshold is not flagged.
    pub fn report_from_scores(&self, blur_score: f64, lighting_score: f64) -> QualityReport {
        QualityReport::new(
            blur_score,
            lighting_score,
            blur_score < self.config.blur_threshold,
            lighting_score < self.config.dark_threshold,
            lighting_score > self.config.overexposed_threshold,
        )
    }

    /// Produces the full quality report.
    pub fn assess(&self, image: &DynamicImage) -> QualityReport {
        let blur_score = self.blur_score(image);
        let lighting_score = self.lighting_score(image);
        let report = self.report_from_scores(blur_score, lighting_score);

        debug!(blur_score, lighting_score, "Quality metrics computed");
        if !report.quality_pass {
            warn!(
                is_blurry = report.is_blurry,
                is_dark = report.is_dark,
                is_overexposed = report.is_overexposed,
                "Image quality check failed"
            );
        }
        report
    }
}
