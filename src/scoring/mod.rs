//! Signal scoring: recognition confidence, fraud evidence and risk fusion.

pub mod confidence;
pub mod fraud;
pub mod risk;

pub use confidence::ConfidenceEngine;
pub use fraud::{FontConsistencyCheck, FraudRulesConfig, FraudSignalAggregator, MetadataTamperCheck};
pub use risk::{FusionConfig, RiskFusionEngine};
