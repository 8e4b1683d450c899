//! Utility functions for the verification pipeline.
//!
//! This module provides image decoding helpers and logging setup.

pub mod image;

pub use self::image::{decode_image, load_image_bytes};

/// Initializes the tracing subscriber for logging.
///
/// `RUST_LOG` takes precedence when set; otherwise `default_level` (for
/// example the configured `LOG_LEVEL`) is used. Calling this more than once
/// is harmless: later calls leave the first subscriber in place.
pub fn init_tracing(default_level: &str) {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new(crate::core::constants::DEFAULT_LOG_LEVEL));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
