//! YOLOv8-style object detector for fraud indicators.
//!
//! The model sees a 640x640 letterboxed RGB tensor scaled to `[0, 1]` and
//! emits a `[1, 4 + C, N]` tensor: for each of the `N` candidates, a center-size
//! box followed by `C` class scores. Candidates are filtered by confidence,
//! suppressed per class and mapped back to source-image pixels.
//!
//! Pre- and post-processing are plain functions; the ONNX Runtime session is
//! only compiled with the `onnx` feature.

use image::{DynamicImage, Rgb, RgbImage, imageops::FilterType};
use itertools::Itertools;

use crate::domain::Detection;

/// Side length of the square model input.
pub const INPUT_SIZE: u32 = 640;
/// Gray value used for letterbox padding.
const PAD_VALUE: u8 = 114;
/// Candidates at or below this class confidence are discarded.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.25;
/// Overlap above which a lower-scoring box of the same class is suppressed.
pub const DEFAULT_IOU_THRESHOLD: f32 = 0.45;

/// Placement of the source image inside the letterboxed input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Letterbox {
    pub scale: f32,
    pub pad_x: f32,
    pub pad_y: f32,
    pub source_width: u32,
    pub source_height: u32,
}

impl Letterbox {
    /// Maps an `[x1, y1, x2, y2]` box from model space back to the source image.
    pub fn unmap(&self, bbox: [f32; 4]) -> [f32; 4] {
        let max_x = self.source_width as f32;
        let max_y = self.source_height as f32;
        [
            ((bbox[0] - self.pad_x) / self.scale).clamp(0.0, max_x),
            ((bbox[1] - self.pad_y) / self.scale).clamp(0.0, max_y),
            ((bbox[2] - self.pad_x) / self.scale).clamp(0.0, max_x),
            ((bbox[3] - self.pad_y) / self.scale).clamp(0.0, max_y),
        ]
    }
}

/// Resizes `image` to fit `size` x `size` keeping its aspect ratio, padding the rest.
pub fn letterbox(image: &DynamicImage, size: u32) -> (RgbImage, Letterbox) {
    let (w, h) = (image.width().max(1), image.height().max(1));
    let scale = (size as f32 / w as f32).min(size as f32 / h as f32);
    let new_w = ((w as f32 * scale).round() as u32).clamp(1, size);
    let new_h = ((h as f32 * scale).round() as u32).clamp(1, size);

    let resized = image::imageops::resize(&image.to_rgb8(), new_w, new_h, FilterType::Triangle);
    let pad_x = (size - new_w) / 2;
    let pad_y = (size - new_h) / 2;

    let mut canvas = RgbImage::from_pixel(size, size, Rgb([PAD_VALUE; 3]));
    image::imageops::replace(&mut canvas, &resized, pad_x as i64, pad_y as i64);

    (
        canvas,
        Letterbox {
            scale,
            pad_x: pad_x as f32,
            pad_y: pad_y as f32,
            source_width: image.width(),
            source_height: image.height(),
        },
    )
}

/// A decoded candidate in model-input coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub class_id: usize,
    pub confidence: f32,
    pub bbox: [f32; 4],
}

/// Decodes a channel-major `[4 + C, N]` output into candidates above `threshold`.
pub fn decode_output(
    data: &[f32],
    num_classes: usize,
    num_anchors: usize,
    threshold: f32,
) -> Vec<Candidate> {
    if data.len() < (4 + num_classes) * num_anchors || num_classes == 0 {
        return Vec::new();
    }
    let at = |row: usize, anchor: usize| data[row * num_anchors + anchor];

    (0..num_anchors)
        .filter_map(|anchor| {
            let (class_id, confidence) = (0..num_classes)
                .map(|c| (c, at(4 + c, anchor)))
                .max_by(|a, b| a.1.total_cmp(&b.1))?;
            if !(confidence > threshold) {
                return None;
            }

            let (cx, cy, w, h) = (at(0, anchor), at(1, anchor), at(2, anchor), at(3, anchor));
            Some(Candidate {
                class_id,
                confidence,
                bbox: [cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0],
            })
        })
        .collect()
}

fn iou(a: &[f32; 4], b: &[f32; 4]) -> f32 {
    let ix = (a[2].min(b[2]) - a[0].max(b[0])).max(0.0);
    let iy = (a[3].min(b[3]) - a[1].max(b[1])).max(0.0);
    let inter = ix * iy;
    let area_a = (a[2] - a[0]).max(0.0) * (a[3] - a[1]).max(0.0);
    let area_b = (b[2] - b[0]).max(0.0) * (b[3] - b[1]).max(0.0);
    let union = area_a + area_b - inter;
    if union <= 0.0 { 0.0 } else { inter / union }
}

/// Per-class non-maximum suppression. Output is sorted by descending confidence.
pub fn non_max_suppression(candidates: Vec<Candidate>, iou_threshold: f32) -> Vec<Candidate> {
    let sorted = candidates
        .into_iter()
        .sorted_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut kept: Vec<Candidate> = Vec::new();
    for candidate in sorted {
        let suppressed = kept.iter().any(|k| {
            k.class_id == candidate.class_id && iou(&k.bbox, &candidate.bbox) > iou_threshold
        });
        if !suppressed {
            kept.push(candidate);
        }
    }
    kept
}

/// Turns kept candidates into labeled detections in source coordinates.
///
/// Candidates whose class id has no configured name are labeled `class_<id>`.
pub fn to_detections(
    candidates: &[Candidate],
    letterbox: &Letterbox,
    class_names: &[String],
) -> Vec<Detection> {
    candidates
        .iter()
        .map(|c| {
            let class = class_names
                .get(c.class_id)
                .cloned()
                .unwrap_or_else(|| format!("class_{}", c.class_id));
            Detection::new(class, c.confidence as f64, letterbox.unmap(c.bbox))
        })
        .collect()
}

#[cfg(feature = "onnx")]
pub use onnx::OnnxFraudDetector;

#[cfg(feature = "onnx")]
mod onnx {
    use super::*;
    use ndarray::Array4;
    use ort::logging::LogLevel;
    use ort::session::Session;
    use ort::value::TensorRef;
    use std::sync::Mutex;
    use tracing::debug;

    use crate::core::config::DetectorSettings;
    use crate::core::constants::DETECTOR_SERVICE;
    use crate::core::errors::{VerifyError, VerifyResult};
    use crate::core::traits::FraudDetector;

    /// Fraud-indicator detector backed by an ONNX Runtime session.
    pub struct OnnxFraudDetector {
        session: Mutex<Session>,
        input_name: String,
        output_name: String,
        class_names: Vec<String>,
        confidence_threshold: f32,
        iou_threshold: f32,
    }

    impl std::fmt::Debug for OnnxFraudDetector {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("OnnxFraudDetector")
                .field("input_name", &self.input_name)
                .field("output_name", &self.output_name)
                .field("class_names", &self.class_names)
                .finish()
        }
    }

    impl OnnxFraudDetector {
        /// Loads the model named in `settings`.
        pub fn new(settings: &DetectorSettings) -> VerifyResult<Self> {
            let path = &settings.model_path;
            let load_error = |e: ort::Error| {
                VerifyError::collaborator_with_source(
                    DETECTOR_SERVICE,
                    format!("failed to load model '{}'", path.display()),
                    e,
                )
            };

            let session = Session::builder()
                .map_err(load_error)?
                .with_log_level(LogLevel::Error)
                .map_err(load_error)?
                .commit_from_file(path)
                .map_err(load_error)?;

            let input_name = session
                .inputs
                .first()
                .map(|input| input.name.clone())
                .ok_or_else(|| VerifyError::collaborator(DETECTOR_SERVICE, "model has no inputs"))?;
            let output_name = session
                .outputs
                .first()
                .map(|output| output.name.clone())
                .ok_or_else(|| VerifyError::collaborator(DETECTOR_SERVICE, "model has no outputs"))?;

            Ok(Self {
                session: Mutex::new(session),
                input_name,
                output_name,
                class_names: settings.class_names.clone(),
                confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
                iou_threshold: DEFAULT_IOU_THRESHOLD,
            })
        }

        fn to_tensor(image: &RgbImage) -> Array4<f32> {
            let (w, h) = image.dimensions();
            let mut tensor = Array4::<f32>::zeros((1, 3, h as usize, w as usize));
            for (x, y, pixel) in image.enumerate_pixels() {
                for c in 0..3 {
                    tensor[[0, c, y as usize, x as usize]] = pixel[c] as f32 / 255.0;
                }
            }
            tensor
        }
    }

    impl FraudDetector for OnnxFraudDetector {
        fn detect(&self, image: &DynamicImage) -> VerifyResult<Vec<Detection>> {
            let (input, placement) = letterbox(image, INPUT_SIZE);
            let tensor = Self::to_tensor(&input);

            let input_tensor = TensorRef::from_array_view(tensor.view()).map_err(|e| {
                VerifyError::collaborator_with_source(DETECTOR_SERVICE, "tensor conversion", e)
            })?;
            let inputs = ort::inputs![self.input_name.as_str() => input_tensor];

            let mut session = self.session.lock().map_err(|_| {
                VerifyError::collaborator(DETECTOR_SERVICE, "session lock poisoned")
            })?;
            let outputs = session.run(inputs).map_err(|e| {
                VerifyError::collaborator_with_source(DETECTOR_SERVICE, "forward pass", e)
            })?;

            let (shape, data) = outputs[self.output_name.as_str()]
                .try_extract_tensor::<f32>()
                .map_err(|e| {
                    VerifyError::collaborator_with_source(DETECTOR_SERVICE, "output extraction", e)
                })?;

            if shape.len() != 3 || shape[1] < 5 {
                return Err(VerifyError::collaborator(
                    DETECTOR_SERVICE,
                    format!("unexpected output shape {shape:?}"),
                ));
            }
            let num_classes = shape[1] as usize - 4;
            let num_anchors = shape[2] as usize;

            let candidates =
                decode_output(data, num_classes, num_anchors, self.confidence_threshold);
            let kept = non_max_suppression(candidates, self.iou_threshold);
            debug!(detections = kept.len(), "Detector finished");

            Ok(to_detections(&kept, &placement, &self.class_names))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letterbox_wide_image() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(1280, 640, Rgb([255, 0, 0])));
        let (canvas, placement) = letterbox(&image, INPUT_SIZE);

        assert_eq!(canvas.dimensions(), (640, 640));
        assert_eq!(placement.scale, 0.5);
        assert_eq!(placement.pad_x, 0.0);
        assert_eq!(placement.pad_y, 160.0);
        assert_eq!(canvas.get_pixel(10, 10), &Rgb([PAD_VALUE; 3]));
        let center = canvas.get_pixel(320, 320);
        assert!(center[0] > 250 && center[1] < 5 && center[2] < 5);
    }

    #[test]
    fn test_unmap_inverts_letterbox() {
        let placement = Letterbox {
            scale: 0.5,
            pad_x: 0.0,
            pad_y: 160.0,
            source_width: 1280,
            source_height: 640,
        };
        assert_eq!(placement.unmap([100.0, 200.0, 300.0, 400.0]), [200.0, 80.0, 600.0, 480.0]);
        assert_eq!(placement.unmap([-10.0, 0.0, 700.0, 640.0]), [0.0, 0.0, 1280.0, 640.0]);
    }

    #[test]
    fn test_decode_output_filters_and_converts() {
        // Two classes, three anchors, channel-major.
        #[rustfmt::skip]
        let data = vec![
            100.0, 200.0, 300.0, // cx
            100.0, 200.0, 300.0, // cy
            20.0,  40.0,  10.0,  // w
            10.0,  20.0,  10.0,  // h
            0.9,   0.1,   0.2,   // class 0
            0.05,  0.8,   0.1,   // class 1
        ];
        let candidates = decode_output(&data, 2, 3, DEFAULT_CONFIDENCE_THRESHOLD);
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].class_id, 0);
        assert_eq!(candidates[0].bbox, [90.0, 95.0, 110.0, 105.0]);
        assert_eq!(candidates[1].class_id, 1);
        assert!((candidates[1].confidence - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_decode_output_rejects_short_buffer() {
        assert!(decode_output(&[0.0; 5], 2, 3, 0.25).is_empty());
    }

    #[test]
    fn test_nms_is_per_class() {
        let boxes = vec![
            Candidate { class_id: 0, confidence: 0.6, bbox: [0.0, 0.0, 10.0, 10.0] },
            Candidate { class_id: 0, confidence: 0.9, bbox: [1.0, 1.0, 11.0, 11.0] },
            Candidate { class_id: 1, confidence: 0.7, bbox: [0.0, 0.0, 10.0, 10.0] },
            Candidate { class_id: 0, confidence: 0.5, bbox: [50.0, 50.0, 60.0, 60.0] },
        ];
        let kept = non_max_suppression(boxes, DEFAULT_IOU_THRESHOLD);
        let summary: Vec<(usize, f32)> = kept.iter().map(|c| (c.class_id, c.confidence)).collect();
        assert_eq!(summary, vec![(0, 0.9), (1, 0.7), (0, 0.5)]);
    }

    #[test]
    fn test_to_detections_uses_class_names() {
        let placement = Letterbox {
            scale: 1.0,
            pad_x: 0.0,
            pad_y: 0.0,
            source_width: 640,
            source_height: 640,
        };
        let names = vec!["tampered_text".to_string(), "face".to_string()];
        let candidates = [
            Candidate { class_id: 1, confidence: 0.5, bbox: [1.0, 2.0, 3.0, 4.0] },
            Candidate { class_id: 7, confidence: 0.4, bbox: [1.0, 2.0, 3.0, 4.0] },
        ];
        let detections = to_detections(&candidates, &placement, &names);
        assert_eq!(detections[0].class, "face");
        assert_eq!(detections[1].class, "class_7");
        assert_eq!(detections[0].bbox, [1.0, 2.0, 3.0, 4.0]);
    }
}
