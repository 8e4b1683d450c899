//! Shared types for pipeline stage results.

use serde::Serialize;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Whether a stage computed its output or fell back to a default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StageStatus {
    /// The stage ran and produced real output.
    Computed,
    /// The stage could not run; `data` holds a neutral default.
    Defaulted {
        /// Why the default was used.
        reason: String,
    },
}

impl StageStatus {
    pub fn defaulted(reason: impl Into<String>) -> Self {
        Self::Defaulted {
            reason: reason.into(),
        }
    }

    pub fn is_computed(&self) -> bool {
        matches!(self, Self::Computed)
    }
}

/// Result wrapper for stage processing operations.
///
/// Carries the data together with a computed/defaulted flag, so callers can
/// tell a real score from a fallback without inspecting logs.
#[derive(Debug, Clone)]
pub struct StageResult<T> {
    /// The processed data from the stage
    pub data: T,
    /// Whether `data` was computed or defaulted
    pub status: StageStatus,
    /// Timing and stage-specific details
    pub metrics: StageMetrics,
}

impl<T> StageResult<T> {
    /// A computed result.
    pub fn computed(data: T, metrics: StageMetrics) -> Self {
        Self {
            data,
            status: StageStatus::Computed,
            metrics,
        }
    }

    /// A defaulted result.
    pub fn defaulted(data: T, reason: impl Into<String>, metrics: StageMetrics) -> Self {
        Self {
            data,
            status: StageStatus::defaulted(reason),
            metrics,
        }
    }

    /// Summarizes this result under `stage`.
    pub fn summary(&self, stage: &'static str) -> StageSummary {
        StageSummary {
            stage,
            status: self.status.clone(),
            elapsed_ms: self
                .metrics
                .processing_time
                .map(|d| d.as_micros() as f64 / 1000.0)
                .unwrap_or(0.0),
        }
    }
}

/// Metrics collected during stage processing.
#[derive(Debug, Clone, Default)]
pub struct StageMetrics {
    /// Time taken to process the stage
    pub processing_time: Option<Duration>,
    /// Additional stage-specific metrics
    pub additional_info: HashMap<String, String>,
}

impl StageMetrics {
    /// Metrics for a stage that started at `start`.
    pub fn since(start: Instant) -> Self {
        Self {
            processing_time: Some(start.elapsed()),
            additional_info: HashMap::new(),
        }
    }

    /// Add additional information to the metrics
    pub fn with_info<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.additional_info.insert(key.into(), value.into());
        self
    }
}

/// Per-stage line of the verification report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageSummary {
    pub stage: &'static str,
    #[serde(flatten)]
    pub status: StageStatus,
    pub elapsed_ms: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_carries_status() {
        let result = StageResult::defaulted(0.0, "detector not configured", StageMetrics::default());
        let summary = result.summary("detector");
        assert_eq!(summary.stage, "detector");
        assert!(!summary.status.is_computed());
        assert_eq!(summary.elapsed_ms, 0.0);
    }

    #[test]
    fn test_summary_serialization() {
        let metrics = StageMetrics {
            processing_time: Some(Duration::from_millis(12)),
            ..StageMetrics::default()
        }
        .with_info("angle", "1.5");
        let result = StageResult::computed((), metrics);
        assert_eq!(result.metrics.additional_info["angle"], "1.5");

        let json = serde_json::to_value(result.summary("deskew")).unwrap();
        assert_eq!(json["stage"], "deskew");
        assert_eq!(json["status"], "computed");
        assert_eq!(json["elapsed_ms"], 12.0);

        let defaulted = StageResult::defaulted((), "timeout", StageMetrics::default());
        let json = serde_json::to_value(defaulted.summary("anomaly")).unwrap();
        assert_eq!(json["status"], "defaulted");
        assert_eq!(json["reason"], "timeout");
    }
}
