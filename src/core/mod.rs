//! The core module of the verification pipeline.
//!
//! This module contains the fundamental components of the pipeline, including:
//! - Configuration management and process settings
//! - Constants used throughout the pipeline
//! - Error handling
//! - Traits describing the external collaborators
//!
//! It also provides re-exports of commonly used types for convenience.

pub mod config;
pub mod constants;
pub mod errors;
pub mod traits;

pub use config::{ConfigError, ConfigValidator, Settings};
pub use errors::{ProcessingStage, VerifyError, VerifyResult};
pub use traits::{
    AnomalyScorer, ForgeryCheck, ForgeryInput, FraudDetector, RecognitionService, TextCorrector,
};
