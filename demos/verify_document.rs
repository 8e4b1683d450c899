//! Document Verification Example
//!
//! This example runs the full verification pipeline on one or more card
//! images and prints the response as JSON. Collaborators are configured
//! through environment variables (see the README); any that are missing are
//! skipped and reported as defaulted stages.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example verify_document -- [OPTIONS] <IMAGES>...
//! ```
//!
//! # Arguments
//!
//! * `-c, --config` - JSON file overriding the pipeline thresholds
//! * `--stages` - Include per-stage status and timings in the output
//! * `--year` - Year used as the upper bound of the date-of-birth check
//! * `<IMAGES>...` - Paths to the card images to verify
//!
//! # Example
//!
//! ```bash
//! AZURE_FORM_RECOGNIZER_ENDPOINT=https://example.cognitiveservices.azure.com \
//! AZURE_FORM_RECOGNIZER_KEY=... \
//! cargo run --example verify_document -- --stages card_front.jpg
//! ```

use aadhaar_verify::prelude::*;
use clap::Parser;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{error, info};

/// Command-line arguments for the verification example
#[derive(Parser)]
#[command(name = "verify_document")]
#[command(about = "Verifies identity-card images and prints the risk decision")]
struct Args {
    /// Paths to the card images to verify
    #[arg(required = true)]
    images: Vec<PathBuf>,

    /// JSON file overriding the pipeline thresholds
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Include per-stage status and timings in the output
    #[arg(long)]
    stages: bool,

    /// Year used as the upper bound of the date-of-birth check
    #[arg(long)]
    year: Option<i32>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let settings = Settings::from_env();
    init_tracing(&settings.log_level);

    let config = match &args.config {
        Some(path) => PipelineConfig::load_from_file(path)?,
        None => PipelineConfig::default(),
    };

    let mut builder = PipelineControllerBuilder::from_settings(&settings)?.config(config);
    if let Some(year) = args.year {
        builder = builder.current_year(year);
    }
    let controller = builder.build()?;

    let mut failures = 0usize;
    for path in &args.images {
        info!("Verifying {}", path.display());
        let start = Instant::now();

        let bytes = match load_image_bytes(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                error!("Failed to read {}: {e}", path.display());
                failures += 1;
                continue;
            }
        };

        match controller.verify(&bytes) {
            Ok(outcome) => {
                let output = if args.stages {
                    serde_json::to_string_pretty(&outcome)?
                } else {
                    serde_json::to_string_pretty(&outcome.response)?
                };
                println!("{output}");
                info!(
                    "{}: {} (risk {:.2}) in {:.2?}",
                    path.display(),
                    outcome.response.decision,
                    outcome.response.scores.final_risk_score,
                    start.elapsed()
                );
            }
            Err(e) => {
                let body = serde_json::json!({ "error": e.caller_message() });
                println!("{}", serde_json::to_string_pretty(&body)?);
                failures += 1;
            }
        }
    }

    if failures > 0 {
        error!("{failures} of {} images failed", args.images.len());
        std::process::exit(1);
    }
    Ok(())
}
