//! Trait definitions for the verification pipeline.
//!
//! The pipeline never owns its external collaborators; it only sees them
//! through the capability traits in [`collaborators`], so production clients
//! and test doubles are interchangeable.

pub mod collaborators;

pub use collaborators::{
    AnomalyScorer, ForgeryCheck, ForgeryInput, FraudDetector, RecognitionService, TextCorrector,
};
