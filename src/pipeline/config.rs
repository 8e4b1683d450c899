//! Tunable configuration for the verification pipeline.
//!
//! Every section has defaults that reproduce the reference thresholds, so a
//! JSON file only needs to name the values it changes:
//!
//! ```json
//! { "fusion": { "safe_threshold": 35.0 }, "quality": { "blur_threshold": 80.0 } }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::config::{ConfigError, ConfigValidator};
use crate::processors::{DeskewConfig, PreprocessConfig, QualityConfig};
use crate::scoring::{FraudRulesConfig, FusionConfig};

/// Configuration of all locally-owned stages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub preprocess: PreprocessConfig,
    pub deskew: DeskewConfig,
    pub quality: QualityConfig,
    pub fraud_rules: FraudRulesConfig,
    pub fusion: FusionConfig,
}

impl ConfigValidator for PipelineConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.preprocess.validate()?;
        self.deskew.validate()?;
        self.quality.validate()?;
        self.fraud_rules.validate()?;
        self.fusion.validate()
    }

    fn get_defaults() -> Self {
        Self::default()
    }
}

impl PipelineConfig {
    /// Parses and validates a JSON configuration.
    pub fn load_from_json(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(content).map_err(|e| ConfigError::InvalidConfig {
            message: format!("failed to parse JSON config: {e}"),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON configuration file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::load_from_json(&content).map_err(|e| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Serializes the configuration as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::InvalidConfig {
            message: format!("failed to serialize config: {e}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.fusion.safe_threshold, 40.0);
        assert_eq!(config.deskew.dilate_width, 30);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config =
            PipelineConfig::load_from_json(r#"{"fusion": {"safe_threshold": 35.0}}"#).unwrap();
        assert_eq!(config.fusion.safe_threshold, 35.0);
        assert_eq!(config.fusion.review_threshold, 70.0);
        assert_eq!(config.quality, QualityConfig::default());
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let err = PipelineConfig::load_from_json(
            r#"{"fusion": {"safe_threshold": 90.0, "review_threshold": 70.0}}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("safe_threshold"));
        assert!(PipelineConfig::load_from_json("not json").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"quality": {{"blur_threshold": 80.0}}}}"#).unwrap();

        let config = PipelineConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.quality.blur_threshold, 80.0);

        let missing = PipelineConfig::load_from_file(Path::new("/nonexistent/pipeline.json"));
        assert!(matches!(missing, Err(ConfigError::LoadFailed { .. })));
    }

    #[test]
    fn test_json_round_trip() {
        let config = PipelineConfig::default();
        let json = config.to_json().unwrap();
        assert_eq!(PipelineConfig::load_from_json(&json).unwrap(), config);
    }
}
