//! The verification pipeline module.
//!
//! This module wires the local stages (preprocessing, deskew, quality,
//! normalization, validation, scoring) together with the external
//! collaborators into a single [`PipelineController`].

mod builder;
mod config;
mod controller;
pub mod stage;

pub use builder::PipelineControllerBuilder;
pub use config::PipelineConfig;
pub use controller::{PipelineController, VerificationOutcome, stage_names};
pub use stage::{StageMetrics, StageResult, StageStatus, StageSummary};
