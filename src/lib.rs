//! # Aadhaar Verify
//!
//! A Rust library that verifies photographs of Aadhaar identity cards.
//! It combines image-quality checks, field recognition, rule-based field
//! validation and fraud signals into a single risk score and decision.
//!
//! ## Features
//!
//! - Denoising, binarization and skew correction of the uploaded image
//! - Blur and lighting metrics on the corrected image
//! - Canonical identity fields mapped from a document recognition service
//! - Structural validation of ID number, date of birth and gender
//! - Fraud signals from an optional object detector and rule-based checks
//! - Weighted risk fusion with SAFE / REVIEW / FRAUD thresholds
//!
//! ## Modules
//!
//! * [`core`] - Errors, configuration, settings and collaborator traits
//! * [`domain`] - Request-scoped value types and the response
//! * [`processors`] - Image preprocessing, deskew and quality assessment
//! * [`fields`] - Field normalization and validation
//! * [`scoring`] - Confidence, fraud aggregation and risk fusion
//! * [`services`] - Clients for the recognition, correction and detection collaborators
//! * [`pipeline`] - The controller that runs all stages for one request
//! * [`utils`] - Image decoding and logging setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use aadhaar_verify::prelude::*;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = Settings::from_env();
//! init_tracing(&settings.log_level);
//!
//! let controller = PipelineControllerBuilder::from_settings(&settings)?.build()?;
//! let bytes = load_image_bytes(std::path::Path::new("card.jpg"))?;
//!
//! match controller.verify(&bytes) {
//!     Ok(outcome) => println!("{}", serde_json::to_string_pretty(&outcome.response)?),
//!     Err(e) => eprintln!("{}", e.caller_message()),
//! }
//! # Ok(())
//! # }
//! ```

// Core modules
pub mod core;
pub mod domain;

pub mod fields;
pub mod pipeline;
pub mod processors;
pub mod scoring;
pub mod services;
pub mod utils;

/// Prelude module for convenient imports.
///
/// ```rust
/// use aadhaar_verify::prelude::*;
/// ```
///
/// Included items cover the common path: building a controller from
/// settings, running it, and reading the response. Collaborator traits and
/// stage types live in [`core::traits`] and [`pipeline`].
pub mod prelude {
    pub use crate::pipeline::{
        PipelineConfig, PipelineController, PipelineControllerBuilder, VerificationOutcome,
    };

    pub use crate::core::{Settings, VerifyError, VerifyResult};

    pub use crate::domain::{Decision, ExtractedFields, VerificationResponse};

    pub use crate::utils::{init_tracing, load_image_bytes};
}
