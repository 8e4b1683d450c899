//! Builder pattern implementation for the verification pipeline.

use std::sync::Arc;
use tracing::{info, warn};

use super::config::PipelineConfig;
use super::controller::PipelineController;
use crate::core::config::{ConfigValidator, Settings};
use crate::core::errors::VerifyResult;
use crate::core::traits::{AnomalyScorer, ForgeryCheck, FraudDetector, RecognitionService, TextCorrector};
use crate::fields::{FieldNormalizer, FieldValidator};
use crate::processors::{ImagePreprocessor, QualityAssessor, SkewCorrector};
use crate::scoring::{ConfidenceEngine, FraudSignalAggregator, RiskFusionEngine};
use crate::services::{AzureRecognitionClient, AzureTextCorrector, PlaceholderAnomalyScorer};

/// Builder for creating [`PipelineController`] instances.
///
/// Every collaborator is optional. A controller built without any of them
/// still runs the local stages and reports the missing signals as defaulted.
#[derive(Default)]
pub struct PipelineControllerBuilder {
    config: PipelineConfig,
    recognition: Option<Arc<dyn RecognitionService>>,
    text_corrector: Option<Arc<dyn TextCorrector>>,
    detector: Option<Arc<dyn FraudDetector>>,
    anomaly_scorer: Option<Arc<dyn AnomalyScorer>>,
    forgery_checks: Option<Vec<Box<dyn ForgeryCheck>>>,
    current_year: Option<i32>,
}

impl std::fmt::Debug for PipelineControllerBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineControllerBuilder")
            .field("config", &self.config)
            .field("recognition", &self.recognition.is_some())
            .field("text_corrector", &self.text_corrector.is_some())
            .field("detector", &self.detector.is_some())
            .field("anomaly_scorer", &self.anomaly_scorer.is_some())
            .field("current_year", &self.current_year)
            .finish()
    }
}

impl PipelineControllerBuilder {
    /// Creates a builder with the default configuration and no collaborators.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder wired to the collaborators described by `settings`.
    ///
    /// Collaborators whose settings are absent stay disabled. A detector model
    /// that fails to load is logged and left disabled as well.
    ///
    /// # Errors
    ///
    /// Returns an error when an HTTP client cannot be constructed.
    pub fn from_settings(settings: &Settings) -> VerifyResult<Self> {
        let mut builder = Self::new().anomaly_scorer(PlaceholderAnomalyScorer::default());

        if let Some(recognition) = &settings.recognition {
            builder = builder.recognition(AzureRecognitionClient::new(recognition.clone())?);
            info!(model = %recognition.model_id, "Recognition service configured");
        }
        if let Some(correction) = &settings.correction {
            builder = builder.text_corrector(AzureTextCorrector::new(correction.clone())?);
            info!(deployment = %correction.deployment, "Text correction configured");
        }
        if let Some(detector) = &settings.detector {
            builder = builder.with_detector_settings(detector);
        }

        Ok(builder)
    }

    #[cfg(feature = "onnx")]
    fn with_detector_settings(self, settings: &crate::core::config::DetectorSettings) -> Self {
        match crate::services::OnnxFraudDetector::new(settings) {
            Ok(detector) => {
                info!(model = %settings.model_path.display(), "Fraud detector loaded");
                self.detector(detector)
            }
            Err(e) => {
                warn!("Error loading fraud detector: {e}; continuing without it");
                self
            }
        }
    }

    #[cfg(not(feature = "onnx"))]
    fn with_detector_settings(self, settings: &crate::core::config::DetectorSettings) -> Self {
        warn!(
            model = %settings.model_path.display(),
            "Detector model configured but the `onnx` feature is disabled; continuing without it"
        );
        self
    }

    /// Sets the configuration of the local stages.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the recognition service.
    pub fn recognition(mut self, service: impl RecognitionService + 'static) -> Self {
        self.recognition = Some(Arc::new(service));
        self
    }

    /// Sets the text-correction service.
    pub fn text_corrector(mut self, corrector: impl TextCorrector + 'static) -> Self {
        self.text_corrector = Some(Arc::new(corrector));
        self
    }

    /// Sets the fraud detector.
    pub fn detector(mut self, detector: impl FraudDetector + 'static) -> Self {
        self.detector = Some(Arc::new(detector));
        self
    }

    /// Sets the anomaly scorer.
    pub fn anomaly_scorer(mut self, scorer: impl AnomalyScorer + 'static) -> Self {
        self.anomaly_scorer = Some(Arc::new(scorer));
        self
    }

    /// Replaces the built-in forgery checks.
    pub fn forgery_checks(mut self, checks: Vec<Box<dyn ForgeryCheck>>) -> Self {
        self.forgery_checks = Some(checks);
        self
    }

    /// Pins the year used by the date-of-birth check.
    pub fn current_year(mut self, year: i32) -> Self {
        self.current_year = Some(year);
        self
    }

    /// Validates the configuration and builds the controller.
    ///
    /// # Returns
    ///
    /// The controller, or a configuration error naming the offending field.
    pub fn build(self) -> VerifyResult<PipelineController> {
        self.config.validate()?;
        let config = self.config;

        let mut fraud = FraudSignalAggregator::new(config.fraud_rules);
        if let Some(checks) = self.forgery_checks {
            fraud = fraud.with_checks(checks);
        }

        let validator = match self.current_year {
            Some(year) => FieldValidator::new().with_current_year(year),
            None => FieldValidator::new(),
        };

        Ok(PipelineController {
            config,
            preprocessor: ImagePreprocessor::new(config.preprocess),
            skew_corrector: SkewCorrector::new(config.deskew),
            quality_assessor: QualityAssessor::new(config.quality),
            normalizer: FieldNormalizer::new(),
            validator,
            confidence: ConfidenceEngine::new(),
            fraud,
            fusion: RiskFusionEngine::new(config.fusion),
            recognition: self.recognition,
            text_corrector: self.text_corrector,
            detector: self.detector,
            anomaly_scorer: self.anomaly_scorer,
        })
    }
}
