//! # Stage Definition: Skew Correction
//!
//! This stage is considered "Done" when it fulfills the following contract:
//!
//! - **Inputs**: An `image::DynamicImage`, normally the binarized output of
//!   [`super::ImagePreprocessor`].
//! - **Outputs**: [`DeskewResult`] holding the (possibly rotated) image and the
//!   estimated angle in degrees.
//! - **Logging**: Logs the detected angle at info level; estimation failures are
//!   logged as warnings and never propagate.
//! - **Invariants**:
//!     - Output dimensions equal input dimensions.
//!     - Images are only rotated when `|angle|` exceeds the configured minimum.
//!     - An image without any text blob yields angle 0 and is returned unchanged.
//!
//! The angle is estimated from the dominant text block: the image is blurred,
//! inverse-binarized, dilated with a wide rectangle so that characters merge
//! into lines, and the minimum-area rectangle of the largest contour is taken.

use image::{DynamicImage, GrayImage};
use imageproc::contours::find_contours;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::filters::{MAX_MASK_SIDE, dilate_rect, otsu_binarize, rotate_dynamic, sigma_for_kernel};
use super::geometry::{MinAreaRect, Polygon};
use crate::core::config::{ConfigError, ConfigValidator};
use crate::core::constants::{
    DEFAULT_DESKEW_BLUR_KERNEL, DEFAULT_DILATE_ITERATIONS, DEFAULT_DILATE_KERNEL_HEIGHT,
    DEFAULT_DILATE_KERNEL_WIDTH, DEFAULT_MIN_ROTATION_DEGREES,
};
use crate::core::errors::{ProcessingStage, VerifyError, VerifyResult};

/// Configuration for [`SkewCorrector`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeskewConfig {
    /// Odd Gaussian kernel size used before thresholding.
    pub blur_kernel: u32,
    /// Width of the dilation rectangle.
    pub dilate_width: u32,
    /// Height of the dilation rectangle.
    pub dilate_height: u32,
    /// Number of dilation passes.
    pub dilate_iterations: u32,
    /// Angles with magnitude at or below this many degrees are not corrected.
    pub min_rotation_degrees: f32,
}

impl Default for DeskewConfig {
    fn default() -> Self {
        Self::get_defaults()
    }
}

impl ConfigValidator for DeskewConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.validate_positive_u32(self.blur_kernel, "blur_kernel")?;
        if self.blur_kernel % 2 == 0 {
            return Err(ConfigError::InvalidConfig {
                message: format!("blur_kernel must be odd, got {}", self.blur_kernel),
            });
        }
        for (value, name) in [(self.dilate_width, "dilate_width"), (self.dilate_height, "dilate_height")] {
            self.validate_positive_u32(value, name)?;
            if value > MAX_MASK_SIDE {
                return Err(ConfigError::InvalidConfig {
                    message: format!("{name} must be at most {MAX_MASK_SIDE}, got {value}"),
                });
            }
        }
        self.validate_non_negative(self.min_rotation_degrees as f64, "min_rotation_degrees")?;
        self.validate_f64_range(self.min_rotation_degrees as f64, 0.0, 45.0, "min_rotation_degrees")
    }

    fn get_defaults() -> Self {
        Self {
            blur_kernel: DEFAULT_DESKEW_BLUR_KERNEL,
            dilate_width: DEFAULT_DILATE_KERNEL_WIDTH,
            dilate_height: DEFAULT_DILATE_KERNEL_HEIGHT,
            dilate_iterations: DEFAULT_DILATE_ITERATIONS,
            min_rotation_degrees: DEFAULT_MIN_ROTATION_DEGREES,
        }
    }
}

/// Output of the skew-correction stage.
#[derive(Debug, Clone)]
pub struct DeskewResult {
    /// The corrected image, or the input when no rotation was applied.
    pub image: DynamicImage,
    /// Estimated skew in degrees. Positive values were corrected by a
    /// counter-clockwise rotation.
    pub angle: f32,
    /// Whether the image was rotated.
    pub rotated: bool,
}

/// Estimates and removes small rotations of the card.
#[derive(Debug, Clone, Default)]
pub struct SkewCorrector {
    config: DeskewConfig,
}

impl SkewCorrector {
    /// Creates a corrector with the given configuration.
    pub fn new(config: DeskewConfig) -> Self {
        Self { config }
    }

    /// Estimates the skew angle of `image` in degrees, in `(-45, 45]`.
    ///
    /// Returns `Ok(0.0)` when no text blob is found.
    pub fn estimate_angle(&self, image: &DynamicImage) -> VerifyResult<f32> {
        if image.width() == 0 || image.height() == 0 {
            return Err(VerifyError::invalid_input("cannot estimate skew of an empty image"));
        }

        let gray = image.to_luma8();
        let mask = self.text_mask(&gray);

        let contours = find_contours::<u32>(&mask);
        let largest = contours
            .iter()
            .map(Polygon::from_contour)
            .map(|polygon| (polygon.area(), polygon))
            .max_by(|a, b| a.0.total_cmp(&b.0));

        let Some((area, polygon)) = largest else {
            debug!("No text blobs found, assuming no skew");
            return Ok(0.0);
        };

        let rect = polygon.min_area_rect();
        let angle = skew_from_rect(&rect);
        debug!(area, rect_angle = rect.angle, angle, "Estimated skew from largest blob");

        if !angle.is_finite() {
            return Err(VerifyError::processing(
                ProcessingStage::Deskew,
                "skew estimation",
                std::io::Error::other(format!("non-finite angle {angle}")),
            ));
        }
        Ok(angle)
    }

    /// Runs the stage. Estimation failures fall back to the unmodified input.
    pub fn correct(&self, image: &DynamicImage) -> DeskewResult {
        let angle = match self.estimate_angle(image) {
            Ok(angle) => angle,
            Err(e) => {
                warn!("Skew estimation failed, leaving image unrotated: {e}");
                return DeskewResult {
                    image: image.clone(),
                    angle: 0.0,
                    rotated: false,
                };
            }
        };

        info!("Detected skew angle: {angle:.2}");

        if angle.abs() > self.config.min_rotation_degrees {
            DeskewResult {
                image: rotate_dynamic(image, angle),
                angle,
                rotated: true,
            }
        } else {
            DeskewResult {
                image: image.clone(),
                angle,
                rotated: false,
            }
        }
    }

    fn text_mask(&self, gray: &GrayImage) -> GrayImage {
        let sigma = sigma_for_kernel(self.config.blur_kernel);
        let blurred = imageproc::filter::gaussian_blur_f32(gray, sigma);
        let thresh = otsu_binarize(&blurred, true);
        dilate_rect(
            &thresh,
            self.config.dilate_width,
            self.config.dilate_height,
            self.config.dilate_iterations,
        )
    }
}

/// Converts the direction of a minimum-area rectangle into a correction angle.
///
/// The rectangle angle is moved into a y-up frame and folded into `[-90, 0)`.
/// Folded angles below -45 describe the rectangle's other side, so they are
/// mapped back to the small tilt that needs undoing.
fn skew_from_rect(rect: &MinAreaRect) -> f32 {
    let folded = (-rect.angle).rem_euclid(90.0) - 90.0;
    if folded < -45.0 {
        -(90.0 + folded)
    } else {
        -folded
    }
}
