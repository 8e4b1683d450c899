//! # Stage Definition: Verification Pipeline
//!
//! This controller is considered "Done" when it fulfills the following contract:
//!
//! - **Inputs**: The uploaded image bytes.
//! - **Outputs**: [`VerificationOutcome`] holding the [`VerificationResponse`] and a
//!   per-stage summary that marks each signal as computed or defaulted.
//! - **Logging**: Debug-level progress per stage, info for the decision, warn for
//!   defaulted collaborators, error for collaborator call failures.
//! - **Invariants**:
//!     - Decoding and recognition failures abort the request; nothing else does.
//!     - Detector and anomaly failures degrade to neutral defaults (no detections, 0.0).
//!     - Quality, detection and recognition run concurrently and are joined before
//!       normalization and fusion. Recognition runs on its own scoped thread; the
//!       image and detector branches run on the rayon pool.
//!     - Validation and confidence use the normalized fields; only the reported
//!       `extracted_data` passes through text correction.

use image::DynamicImage;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use super::config::PipelineConfig;
use super::stage::{StageMetrics, StageResult, StageSummary};
use crate::core::constants::{ANOMALY_SERVICE, CORRECTION_SERVICE, DETECTOR_SERVICE, RECOGNITION_SERVICE};
use crate::core::errors::VerifyResult;
use crate::core::traits::{AnomalyScorer, ForgeryInput, FraudDetector, RecognitionService, TextCorrector};
use crate::domain::{Detection, ExtractedFields, QualityReport, RecognitionResult, VerificationResponse};
use crate::fields::{FieldNormalizer, FieldValidator};
use crate::processors::{ImagePreprocessor, QualityAssessor, SkewCorrector};
use crate::scoring::{ConfidenceEngine, FraudSignalAggregator, RiskFusionEngine};
use crate::utils::decode_image;

/// Stage names used in summaries and logs.
pub mod stage_names {
    pub const PREPROCESS: &str = "preprocess";
    pub const DESKEW: &str = "deskew";
    pub const QUALITY: &str = "quality";
    pub const ANOMALY: &str = "anomaly";
    pub const DETECTOR: &str = "detector";
    pub const RECOGNITION: &str = "recognition";
    pub const FRAUD: &str = "fraud";
    pub const CORRECTION: &str = "text_correction";
}

/// Everything a verification produced.
#[derive(Debug, Clone, Serialize)]
pub struct VerificationOutcome {
    /// The caller-facing response.
    pub response: VerificationResponse,
    /// Estimated skew in degrees.
    pub skew_angle: f32,
    /// One entry per stage, in execution order.
    pub stages: Vec<StageSummary>,
}

impl VerificationOutcome {
    /// Returns the summary of the named stage.
    pub fn stage(&self, name: &str) -> Option<&StageSummary> {
        self.stages.iter().find(|s| s.stage == name)
    }
}

/// Output of the image branch: preprocess, deskew, then quality and anomaly.
struct ImageBranch {
    skew_angle: f32,
    quality: QualityReport,
    anomaly: StageResult<f64>,
    summaries: Vec<StageSummary>,
}

/// Runs the verification stages for one document at a time.
///
/// Holds no per-request state, so one controller can serve concurrent requests.
pub struct PipelineController {
    pub(super) config: PipelineConfig,
    pub(super) preprocessor: ImagePreprocessor,
    pub(super) skew_corrector: SkewCorrector,
    pub(super) quality_assessor: QualityAssessor,
    pub(super) normalizer: FieldNormalizer,
    pub(super) validator: FieldValidator,
    pub(super) confidence: ConfidenceEngine,
    pub(super) fraud: FraudSignalAggregator,
    pub(super) fusion: RiskFusionEngine,
    pub(super) recognition: Option<Arc<dyn RecognitionService>>,
    pub(super) text_corrector: Option<Arc<dyn TextCorrector>>,
    pub(super) detector: Option<Arc<dyn FraudDetector>>,
    pub(super) anomaly_scorer: Option<Arc<dyn AnomalyScorer>>,
}

impl std::fmt::Debug for PipelineController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineController")
            .field("config", &self.config)
            .field("recognition", &self.recognition.is_some())
            .field("text_corrector", &self.text_corrector.is_some())
            .field("detector", &self.detector.is_some())
            .field("anomaly_scorer", &self.anomaly_scorer.is_some())
            .finish()
    }
}

impl PipelineController {
    /// Returns a builder with default configuration and no collaborators.
    pub fn builder() -> super::builder::PipelineControllerBuilder {
        super::builder::PipelineControllerBuilder::new()
    }

    /// The configuration this controller was built with.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Verifies one uploaded document.
    ///
    /// # Errors
    ///
    /// Fails when the bytes cannot be decoded or the recognition service
    /// fails. Use [`crate::core::errors::VerifyError::caller_message`] to get
    /// the message that may be shown to the caller.
    pub fn verify(&self, image_bytes: &[u8]) -> VerifyResult<VerificationOutcome> {
        let start = Instant::now();
        let result = self.run(image_bytes);
        match &result {
            Ok(outcome) => info!(
                decision = %outcome.response.decision,
                risk = outcome.response.scores.final_risk_score,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Verification finished"
            ),
            Err(e) => error!("Error processing request: {e}"),
        }
        result
    }

    fn run(&self, image_bytes: &[u8]) -> VerifyResult<VerificationOutcome> {
        let image = decode_image(image_bytes)?;
        debug!(width = image.width(), height = image.height(), "Decoded upload");

        let (image_branch, detections, recognition) = std::thread::scope(|scope| {
            // Recognition blocks on network polling and must not occupy a pool worker.
            let recognition = scope.spawn(|| self.run_recognition(image_bytes));
            let (image_branch, detections) =
                rayon::join(|| self.run_image_branch(&image), || self.run_detector(&image));
            let recognition = recognition
                .join()
                .unwrap_or_else(|panic| std::panic::resume_unwind(panic));
            (image_branch, detections, recognition)
        });
        let recognition = recognition?;

        let fields = self.normalizer.normalize(&recognition.data);
        let validation_report = self.validator.validate(&fields);
        let ocr_confidence = self.confidence.ocr_confidence(&recognition.data);
        debug!(
            validation_score = validation_report.validation_score,
            ocr_confidence, "Fields checked"
        );

        let fraud_start = Instant::now();
        let forgery_score = self.fraud.forgery_score(&ForgeryInput {
            raw_bytes: image_bytes,
            recognition: Some(&recognition.data),
        });
        let detector_computed = detections.status.is_computed();
        let fraud_signal = self.fraud.aggregate(
            detector_computed.then(|| detections.data.clone()),
            forgery_score,
        );
        let fraud = StageResult::computed((), StageMetrics::since(fraud_start));

        let (scores, decision) = self.fusion.fuse(
            ocr_confidence,
            fraud_signal.fraud_score,
            image_branch.anomaly.data,
        );

        let corrected = self.run_correction(&fields);

        let mut stages = image_branch.summaries;
        stages.push(image_branch.anomaly.summary(stage_names::ANOMALY));
        stages.push(detections.summary(stage_names::DETECTOR));
        stages.push(recognition.summary(stage_names::RECOGNITION));
        stages.push(fraud.summary(stage_names::FRAUD));
        stages.push(corrected.summary(stage_names::CORRECTION));

        Ok(VerificationOutcome {
            response: VerificationResponse {
                extracted_data: corrected.data,
                validation_report,
                quality_metrics: image_branch.quality,
                scores,
                decision,
                fraud_details: fraud_signal.detections,
            },
            skew_angle: image_branch.skew_angle,
            stages,
        })
    }

    fn run_image_branch(&self, image: &DynamicImage) -> ImageBranch {
        let start = Instant::now();
        let binary = DynamicImage::ImageLuma8(self.preprocessor.process(image));
        let preprocess = StageResult::computed((), StageMetrics::since(start));

        let start = Instant::now();
        let deskewed = self.skew_corrector.correct(&binary);
        let deskew = StageResult::computed(
            (),
            StageMetrics::since(start).with_info("angle", format!("{:.2}", deskewed.angle)),
        );

        let ((quality_report, quality), anomaly) = rayon::join(
            || {
                let start = Instant::now();
                let report = self.quality_assessor.assess(&deskewed.image);
                (report, StageResult::computed((), StageMetrics::since(start)))
            },
            || self.run_anomaly(&deskewed.image),
        );

        ImageBranch {
            skew_angle: deskewed.angle,
            quality: quality_report,
            anomaly,
            summaries: vec![
                preprocess.summary(stage_names::PREPROCESS),
                deskew.summary(stage_names::DESKEW),
                quality.summary(stage_names::QUALITY),
            ],
        }
    }

    fn run_anomaly(&self, image: &DynamicImage) -> StageResult<f64> {
        let start = Instant::now();
        let Some(scorer) = &self.anomaly_scorer else {
            return StageResult::defaulted(0.0, format!("{ANOMALY_SERVICE} not configured"), StageMetrics::since(start));
        };

        match scorer.score(image) {
            Ok(score) if score.is_finite() => {
                StageResult::computed(score.clamp(0.0, 1.0), StageMetrics::since(start))
            }
            Ok(score) => {
                warn!("Anomaly scorer returned {score}; using 0.0");
                StageResult::defaulted(0.0, "non-finite anomaly score", StageMetrics::since(start))
            }
            Err(e) => {
                error!("Error in anomaly detection: {e}");
                StageResult::defaulted(0.0, e.to_string(), StageMetrics::since(start))
            }
        }
    }

    fn run_detector(&self, image: &DynamicImage) -> StageResult<Vec<Detection>> {
        let start = Instant::now();
        let Some(detector) = &self.detector else {
            return StageResult::defaulted(
                Vec::new(),
                format!("{DETECTOR_SERVICE} not configured"),
                StageMetrics::since(start),
            );
        };

        match detector.detect(image) {
            Ok(detections) => {
                debug!(count = detections.len(), "Detector returned");
                StageResult::computed(detections, StageMetrics::since(start))
            }
            Err(e) => {
                error!("Error in fraud detection: {e}");
                StageResult::defaulted(Vec::new(), e.to_string(), StageMetrics::since(start))
            }
        }
    }

    fn run_recognition(&self, image_bytes: &[u8]) -> VerifyResult<StageResult<RecognitionResult>> {
        let start = Instant::now();
        let Some(service) = &self.recognition else {
            warn!("Recognition service not configured; continuing without documents");
            return Ok(StageResult::defaulted(
                RecognitionResult::empty(),
                format!("{RECOGNITION_SERVICE} not configured"),
                StageMetrics::since(start),
            ));
        };

        let result = service.analyze(image_bytes)?;
        Ok(StageResult::computed(
            result,
            StageMetrics::since(start),
        ))
    }

    fn run_correction(&self, fields: &ExtractedFields) -> StageResult<ExtractedFields> {
        let start = Instant::now();
        let Some(corrector) = &self.text_corrector else {
            return StageResult::defaulted(
                fields.clone(),
                format!("{CORRECTION_SERVICE} not configured"),
                StageMetrics::since(start),
            );
        };

        match corrector.correct(fields) {
            Ok(corrected) => StageResult::computed(corrected, StageMetrics::since(start)),
            Err(e) => {
                error!("Error refining fields: {e}");
                StageResult::defaulted(fields.clone(), e.to_string(), StageMetrics::since(start))
            }
        }
    }
}
