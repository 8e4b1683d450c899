//! # Stage Definition: Image Preprocessing
//!
//! This stage is considered "Done" when it fulfills the following contract:
//!
//! - **Inputs**: A decoded `image::DynamicImage` in any color format.
//! - **Outputs**: A single-channel `GrayImage` whose pixels are exactly 0 or 255.
//! - **Logging**: Traces the chosen binarization level at debug level.
//! - **Invariants**:
//!     - Output dimensions equal input dimensions.
//!     - Denoising happens before the grayscale conversion so color noise is smoothed first.

use image::{DynamicImage, GrayImage};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::filters::threshold_type;
use crate::core::config::{ConfigError, ConfigValidator};
use crate::core::constants::DEFAULT_DENOISE_RADIUS;

/// Configuration for [`ImagePreprocessor`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    /// Radius of the median filter used for denoising. 0 disables denoising.
    pub denoise_radius: u32,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self::get_defaults()
    }
}

impl ConfigValidator for PreprocessConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.denoise_radius > 16 {
            return Err(ConfigError::InvalidConfig {
                message: format!(
                    "denoise_radius must be at most 16, got {}",
                    self.denoise_radius
                ),
            });
        }
        Ok(())
    }

    fn get_defaults() -> Self {
        Self {
            denoise_radius: DEFAULT_DENOISE_RADIUS,
        }
    }
}

/// Denoises, converts to grayscale and binarizes with Otsu's threshold.
#[derive(Debug, Clone, Default)]
pub struct ImagePreprocessor {
    config: PreprocessConfig,
}

impl ImagePreprocessor {
    /// Creates a preprocessor with the given configuration.
    pub fn new(config: PreprocessConfig) -> Self {
        Self { config }
    }

    /// Runs the preprocessing stage. Never fails for a decoded image.
    pub fn process(&self, image: &DynamicImage) -> GrayImage {
        let radius = self.config.denoise_radius;
        let gray = if radius > 0 {
            let denoised = imageproc::filter::median_filter(&image.to_rgb8(), radius, radius);
            DynamicImage::ImageRgb8(denoised).to_luma8()
        } else {
            image.to_luma8()
        };

        if gray.width() == 0 || gray.height() == 0 {
            return gray;
        }

        let level = imageproc::contrast::otsu_level(&gray);
        debug!(level, "Binarizing at Otsu level");
        imageproc::contrast::threshold(&gray, level, threshold_type(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn two_tone_card() -> DynamicImage {
        let mut img = RgbImage::from_pixel(40, 30, Rgb([235, 230, 220]));
        for x in 5..35 {
            for y in 12..18 {
                img.put_pixel(x, y, Rgb([20, 25, 40]));
            }
        }
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn test_output_is_binary_with_same_dimensions() {
        let output = ImagePreprocessor::default().process(&two_tone_card());
        assert_eq!(output.dimensions(), (40, 30));
        assert!(output.pixels().all(|p| p[0] == 0 || p[0] == 255));
        assert_eq!(output.get_pixel(0, 0)[0], 255);
        assert_eq!(output.get_pixel(20, 15)[0], 0);
    }

    #[test]
    fn test_denoise_removes_isolated_speck() {
        let mut img = RgbImage::from_pixel(20, 20, Rgb([240, 240, 240]));
        for x in 0..10 {
            for y in 0..20 {
                img.put_pixel(x, y, Rgb([10, 10, 10]));
            }
        }
        img.put_pixel(15, 10, Rgb([0, 0, 0]));
        let output = ImagePreprocessor::default().process(&DynamicImage::ImageRgb8(img));
        assert_eq!(output.get_pixel(15, 10)[0], 255);
    }

    #[test]
    fn test_config_validation() {
        assert!(PreprocessConfig::default().validate().is_ok());
        assert!(PreprocessConfig { denoise_radius: 40 }.validate().is_err());
    }
}
