//! Process-wide settings read from environment-style variables.
//!
//! Every collaborator setting is optional. A missing endpoint or key disables
//! that collaborator with a logged warning; startup never aborts because of it.

use std::path::PathBuf;
use tracing::warn;

use super::errors::ConfigError;
use crate::core::constants::{
    CORRECTION_SERVICE, DEFAULT_CORRECTION_API_VERSION, DEFAULT_DETECTOR_CLASSES,
    DEFAULT_LOG_LEVEL, DEFAULT_RECOGNITION_API_VERSION, DEFAULT_RECOGNITION_MODEL,
    DETECTOR_SERVICE, RECOGNITION_SERVICE,
};

/// Connection settings for the document recognition service.
#[derive(Debug, Clone, PartialEq)]
pub struct RecognitionSettings {
    pub endpoint: String,
    pub key: String,
    pub model_id: String,
    pub api_version: String,
}

/// Connection settings for the text-correction service.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrectionSettings {
    pub endpoint: String,
    pub key: String,
    pub deployment: String,
    pub api_version: String,
}

/// Settings for the object-detection fraud classifier.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorSettings {
    pub model_path: PathBuf,
    /// Class names in model output order.
    pub class_names: Vec<String>,
}

/// Write-once process configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub recognition: Option<RecognitionSettings>,
    pub correction: Option<CorrectionSettings>,
    pub detector: Option<DetectorSettings>,
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            recognition: None,
            correction: None,
            detector: None,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl Settings {
    /// Reads settings from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through an arbitrary key lookup.
    ///
    /// Blank values are treated as absent.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let recognition = match (
            get("AZURE_FORM_RECOGNIZER_ENDPOINT"),
            get("AZURE_FORM_RECOGNIZER_KEY"),
        ) {
            (Some(endpoint), Some(key)) => Some(RecognitionSettings {
                endpoint,
                key,
                model_id: get("AZURE_FORM_RECOGNIZER_MODEL")
                    .unwrap_or_else(|| DEFAULT_RECOGNITION_MODEL.to_string()),
                api_version: get("AZURE_FORM_RECOGNIZER_API_VERSION")
                    .unwrap_or_else(|| DEFAULT_RECOGNITION_API_VERSION.to_string()),
            }),
            _ => {
                log_disabled(RECOGNITION_SERVICE, "endpoint or key not set");
                None
            }
        };

        let correction = match (
            get("AZURE_OPENAI_ENDPOINT"),
            get("AZURE_OPENAI_KEY"),
            get("AZURE_OPENAI_DEPLOYMENT_NAME"),
        ) {
            (Some(endpoint), Some(key), Some(deployment)) => Some(CorrectionSettings {
                endpoint,
                key,
                deployment,
                api_version: get("AZURE_OPENAI_API_VERSION")
                    .unwrap_or_else(|| DEFAULT_CORRECTION_API_VERSION.to_string()),
            }),
            _ => {
                log_disabled(CORRECTION_SERVICE, "endpoint, key or deployment not set");
                None
            }
        };

        let detector = match get("YOLO_MODEL_PATH") {
            Some(path) => Some(DetectorSettings {
                model_path: PathBuf::from(path),
                class_names: get("YOLO_CLASS_NAMES")
                    .map(|names| parse_class_names(&names))
                    .unwrap_or_else(|| {
                        DEFAULT_DETECTOR_CLASSES
                            .iter()
                            .map(|s| s.to_string())
                            .collect()
                    }),
            }),
            None => {
                log_disabled(DETECTOR_SERVICE, "model path not set");
                None
            }
        };

        Self {
            recognition,
            correction,
            detector,
            log_level: get("LOG_LEVEL")
                .map(|level| level.to_lowercase())
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
        }
    }
}

fn log_disabled(service: &'static str, reason: &str) {
    let error = ConfigError::MissingCredentials {
        service,
        message: reason.to_string(),
    };
    warn!("{error}; collaborator disabled");
}

fn parse_class_names(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_empty_environment_disables_everything() {
        let settings = Settings::from_lookup(|_| None);
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_recognition_requires_endpoint_and_key() {
        let settings = Settings::from_lookup(lookup_from(&[(
            "AZURE_FORM_RECOGNIZER_ENDPOINT",
            "https://example.cognitiveservices.azure.com",
        )]));
        assert!(settings.recognition.is_none());

        let settings = Settings::from_lookup(lookup_from(&[
            (
                "AZURE_FORM_RECOGNIZER_ENDPOINT",
                "https://example.cognitiveservices.azure.com",
            ),
            ("AZURE_FORM_RECOGNIZER_KEY", "secret"),
        ]));
        let recognition = settings.recognition.expect("recognition configured");
        assert_eq!(recognition.model_id, DEFAULT_RECOGNITION_MODEL);
        assert_eq!(recognition.key, "secret");
    }

    #[test]
    fn test_blank_values_are_absent() {
        let settings = Settings::from_lookup(lookup_from(&[
            ("AZURE_OPENAI_ENDPOINT", "  "),
            ("AZURE_OPENAI_KEY", "key"),
            ("AZURE_OPENAI_DEPLOYMENT_NAME", "gpt"),
        ]));
        assert!(settings.correction.is_none());
    }

    #[test]
    fn test_detector_class_names() {
        let settings = Settings::from_lookup(lookup_from(&[
            ("YOLO_MODEL_PATH", "models/fraud.onnx"),
            ("YOLO_CLASS_NAMES", "tampered_text, qr_code,,emblem"),
            ("LOG_LEVEL", "DEBUG"),
        ]));
        let detector = settings.detector.expect("detector configured");
        assert_eq!(detector.class_names, vec!["tampered_text", "qr_code", "emblem"]);
        assert_eq!(settings.log_level, "debug");
    }
}
