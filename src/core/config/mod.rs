//! Configuration management for the verification pipeline.
//!
//! This module provides the validation trait shared by every tunable section
//! and the environment-style [`Settings`] that enable or disable collaborators.

pub mod errors;
pub mod settings;

pub use errors::{ConfigError, ConfigValidator};
pub use settings::{CorrectionSettings, DetectorSettings, RecognitionSettings, Settings};
