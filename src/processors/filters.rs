//! Low-level image filters shared by the preprocessing, deskew and quality stages.
//!
//! Thresholding and dilation go through `imageproc`. The Laplacian and the
//! rotation follow OpenCV border conventions, which `imageproc` does not offer:
//! reflect-101 borders for the Laplacian, bicubic sampling with replicated
//! borders for the rotation.

use image::{DynamicImage, GrayImage, ImageBuffer, Luma, Pixel};
use imageproc::contrast::{ThresholdType, otsu_level, threshold};
use imageproc::morphology::{Mask, grayscale_dilate};

/// Returns the Gaussian sigma OpenCV derives for a kernel of size `kernel_size`.
pub fn sigma_for_kernel(kernel_size: u32) -> f32 {
    0.3 * ((kernel_size as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Thresholds a grayscale image at its Otsu level.
///
/// Pixels strictly above the level become 255 and all others 0. With
/// `invert` set, the output is flipped.
pub fn otsu_binarize(gray: &GrayImage, invert: bool) -> GrayImage {
    let level = otsu_level(gray);
    threshold(gray, level, threshold_type(invert))
}

/// Maps the inversion flag onto the `imageproc` threshold mode.
pub fn threshold_type(invert: bool) -> ThresholdType {
    if invert {
        ThresholdType::BinaryInverted
    } else {
        ThresholdType::Binary
    }
}

/// Largest side accepted by [`rect_mask`].
pub const MAX_MASK_SIDE: u32 = 511;

/// Builds a `width` x `height` rectangular structuring element anchored at
/// `(width / 2, height / 2)`.
///
/// Both sides must be in `1..=MAX_MASK_SIDE`.
pub fn rect_mask(width: u32, height: u32) -> Mask {
    let element = GrayImage::from_pixel(width, height, Luma([255]));
    Mask::from_image(&element, (width / 2) as u8, (height / 2) as u8)
}

/// Dilates a binary image `iterations` times with a rectangular element.
///
/// Pixels outside the image never contribute.
pub fn dilate_rect(image: &GrayImage, width: u32, height: u32, iterations: u32) -> GrayImage {
    let mask = rect_mask(width, height);
    (0..iterations).fold(image.clone(), |current, _| grayscale_dilate(&current, &mask))
}

#[inline]
fn reflect_101(index: i64, len: u32) -> u32 {
    let n = len as i64;
    if n == 1 {
        return 0;
    }
    let mut i = index;
    while i < 0 || i >= n {
        if i < 0 {
            i = -i;
        }
        if i >= n {
            i = 2 * n - 2 - i;
        }
    }
    i as u32
}

/// Population variance of the 4-neighbour Laplacian response.
///
/// Returns 0.0 for an empty image.
pub fn laplacian_variance(gray: &GrayImage) -> f64 {
    let (w, h) = gray.dimensions();
    if w == 0 || h == 0 {
        return 0.0;
    }

    let at = |x: i64, y: i64| -> f64 { gray.get_pixel(reflect_101(x, w), reflect_101(y, h))[0] as f64 };

    let count = (w as f64) * (h as f64);
    let mut sum = 0.0;
    let mut sum_sq = 0.0;
    for y in 0..h as i64 {
        for x in 0..w as i64 {
            let response =
                at(x, y - 1) + at(x - 1, y) + at(x + 1, y) + at(x, y + 1) - 4.0 * at(x, y);
            sum += response;
            sum_sq += response * response;
        }
    }

    let mean = sum / count;
    (sum_sq / count - mean * mean).max(0.0)
}

/// Mean brightness in `[0, 255]`.
///
/// Color images use the HSV value channel (the per-pixel maximum of R, G and
/// B); grayscale images use their intensity. Returns 0.0 for an empty image.
pub fn mean_brightness(image: &DynamicImage) -> f64 {
    if image.width() == 0 || image.height() == 0 {
        return 0.0;
    }

    let count = image.width() as f64 * image.height() as f64;
    let total: f64 = match image {
        DynamicImage::ImageLuma8(gray) => gray.pixels().map(|p| p[0] as f64).sum(),
        DynamicImage::ImageLumaA8(gray) => gray.pixels().map(|p| p[0] as f64).sum(),
        other => other
            .to_rgb8()
            .pixels()
            .map(|p| p.0.iter().copied().max().unwrap_or(0) as f64)
            .sum(),
    };
    total / count
}

const BICUBIC_A: f32 = -0.75;

fn cubic_weights(t: f32) -> [f32; 4] {
    let a = BICUBIC_A;
    let w0 = ((a * (t + 1.0) - 5.0 * a) * (t + 1.0) + 8.0 * a) * (t + 1.0) - 4.0 * a;
    let w1 = ((a + 2.0) * t - (a + 3.0)) * t * t + 1.0;
    let u = 1.0 - t;
    let w2 = ((a + 2.0) * u - (a + 3.0)) * u * u + 1.0;
    [w0, w1, w2, 1.0 - w0 - w1 - w2]
}

/// Rotates an image about its center by `degrees`, keeping its dimensions.
///
/// Positive angles rotate counter-clockwise as the image is viewed. The center
/// is `(width / 2, height / 2)` in integer pixels. Samples are bicubic and
/// coordinates that fall outside the source replicate the nearest edge pixel.
pub fn rotate_about_center<P>(image: &ImageBuffer<P, Vec<u8>>, degrees: f32) -> ImageBuffer<P, Vec<u8>>
where
    P: Pixel<Subpixel = u8>,
{
    let (w, h) = image.dimensions();
    let mut output = ImageBuffer::<P, Vec<u8>>::new(w, h);
    if w == 0 || h == 0 {
        return output;
    }

    let cx = (w / 2) as f32;
    let cy = (h / 2) as f32;
    let (sin, cos) = degrees.to_radians().sin_cos();
    let channels = P::CHANNEL_COUNT as usize;
    let clamp_x = |v: i64| v.clamp(0, w as i64 - 1) as u32;
    let clamp_y = |v: i64| v.clamp(0, h as i64 - 1) as u32;

    let mut acc = vec![0f32; channels];
    for (x, y, pixel) in output.enumerate_pixels_mut() {
        let dx = x as f32 - cx;
        let dy = y as f32 - cy;
        let src_x = cx + cos * dx - sin * dy;
        let src_y = cy + sin * dx + cos * dy;

        let x0 = src_x.floor();
        let y0 = src_y.floor();
        let wx = cubic_weights(src_x - x0);
        let wy = cubic_weights(src_y - y0);
        let (x0, y0) = (x0 as i64, y0 as i64);

        acc.iter_mut().for_each(|v| *v = 0.0);
        for (j, weight_y) in wy.iter().enumerate() {
            let sy = clamp_y(y0 - 1 + j as i64);
            for (i, weight_x) in wx.iter().enumerate() {
                let sx = clamp_x(x0 - 1 + i as i64);
                let weight = weight_x * weight_y;
                for (slot, &value) in acc.iter_mut().zip(image.get_pixel(sx, sy).channels()) {
                    *slot += weight * value as f32;
                }
            }
        }

        for (out, value) in pixel.channels_mut().iter_mut().zip(&acc) {
            *out = value.round().clamp(0.0, 255.0) as u8;
        }
    }

    output
}

/// Rotates any dynamic image, preserving its color type for 8-bit formats.
pub fn rotate_dynamic(image: &DynamicImage, degrees: f32) -> DynamicImage {
    match image {
        DynamicImage::ImageLuma8(img) => DynamicImage::ImageLuma8(rotate_about_center(img, degrees)),
        DynamicImage::ImageLumaA8(img) => DynamicImage::ImageLumaA8(rotate_about_center(img, degrees)),
        DynamicImage::ImageRgb8(img) => DynamicImage::ImageRgb8(rotate_about_center(img, degrees)),
        DynamicImage::ImageRgba8(img) => DynamicImage::ImageRgba8(rotate_about_center(img, degrees)),
        other => DynamicImage::ImageRgba8(rotate_about_center(&other.to_rgba8(), degrees)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_sigma_for_kernel() {
        assert!((sigma_for_kernel(9) - 1.7).abs() < 1e-6);
        assert!((sigma_for_kernel(3) - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_threshold_is_strict() {
        let gray = GrayImage::from_raw(3, 1, vec![10, 128, 129]).unwrap();
        let bin = threshold(&gray, 128, threshold_type(false));
        assert_eq!(bin.as_raw(), &vec![0, 0, 255]);
        let inv = threshold(&gray, 128, threshold_type(true));
        assert_eq!(inv.as_raw(), &vec![255, 255, 0]);
    }

    #[test]
    fn test_otsu_separates_two_levels() {
        let mut gray = GrayImage::from_pixel(10, 10, Luma([30]));
        for x in 5..10 {
            for y in 0..10 {
                gray.put_pixel(x, y, Luma([220]));
            }
        }
        let bin = otsu_binarize(&gray, false);
        assert_eq!(bin.get_pixel(0, 0)[0], 0);
        assert_eq!(bin.get_pixel(9, 9)[0], 255);
    }

    #[test]
    fn test_dilate_rect_extent() {
        let mut img = GrayImage::new(20, 11);
        img.put_pixel(10, 5, Luma([255]));
        let dilated = dilate_rect(&img, 5, 3, 1);

        // Anchor at (2, 1): the dot spreads two pixels left and right, one up and down.
        let lit: Vec<(u32, u32)> = dilated
            .enumerate_pixels()
            .filter(|(_, _, p)| p[0] == 255)
            .map(|(x, y, _)| (x, y))
            .collect();
        assert_eq!(lit.len(), 15);
        assert!(lit.iter().all(|&(x, y)| (8..=12).contains(&x) && (4..=6).contains(&y)));
    }

    #[test]
    fn test_dilate_even_width_anchor() {
        let mut img = GrayImage::new(10, 1);
        img.put_pixel(5, 0, Luma([255]));
        let dilated = dilate_rect(&img, 4, 1, 1);
        let lit: Vec<u32> = (0..10).filter(|&x| dilated.get_pixel(x, 0)[0] == 255).collect();
        assert_eq!(lit, vec![4, 5, 6, 7]);
    }

    #[test]
    fn test_dilate_iterations_compound() {
        let mut img = GrayImage::new(40, 15);
        img.put_pixel(20, 7, Luma([255]));
        let twice = dilate_rect(&img, 5, 3, 2);
        let once_more = dilate_rect(&dilate_rect(&img, 5, 3, 1), 5, 3, 1);
        assert_eq!(twice, once_more);

        let lit = twice.pixels().filter(|p| p[0] == 255).count();
        // Two passes of a 5x3 element cover 9x5.
        assert_eq!(lit, 45);
        assert_eq!(dilate_rect(&img, 5, 3, 0), img);
    }

    #[test]
    fn test_laplacian_variance() {
        let flat = GrayImage::from_pixel(8, 8, Luma([120]));
        assert_eq!(laplacian_variance(&flat), 0.0);
        assert_eq!(laplacian_variance(&GrayImage::new(0, 0)), 0.0);

        let checker = GrayImage::from_fn(8, 8, |x, y| {
            if (x + y) % 2 == 0 { Luma([0]) } else { Luma([255]) }
        });
        assert!(laplacian_variance(&checker) > 100.0);
    }

    #[test]
    fn test_mean_brightness_uses_max_channel() {
        let rgb = RgbImage::from_pixel(4, 4, Rgb([10, 200, 30]));
        assert!((mean_brightness(&DynamicImage::ImageRgb8(rgb)) - 200.0).abs() < 1e-9);

        let gray = GrayImage::from_pixel(4, 4, Luma([77]));
        assert!((mean_brightness(&DynamicImage::ImageLuma8(gray)) - 77.0).abs() < 1e-9);
    }

    #[test]
    fn test_rotate_zero_is_identity() {
        let img = GrayImage::from_fn(9, 7, |x, y| Luma([((x * 13 + y * 7) % 256) as u8]));
        let rotated = rotate_about_center(&img, 0.0);
        assert_eq!(rotated, img);
    }

    #[test]
    fn test_rotate_quarter_turn_is_counter_clockwise() {
        let mut img = GrayImage::from_pixel(21, 21, Luma([0]));
        // A bright pixel to the right of the center.
        img.put_pixel(15, 10, Luma([255]));
        let rotated = rotate_about_center(&img, 90.0);
        // Counter-clockwise on screen moves it above the center.
        assert_eq!(rotated.get_pixel(10, 5)[0], 255);
        assert_eq!(rotated.get_pixel(15, 10)[0], 0);
    }
}
