//! Image processing stages of the verification pipeline.
//!
//! This module provides the locally-owned image stages and the primitives they
//! are built from.
//!
//! # Modules
//!
//! * `geometry` - Points, polygons, convex hull and minimum-area rectangles
//! * `filters` - Thresholding, dilation, Laplacian, brightness and rotation
//! * `preprocess` - Denoising and Otsu binarization
//! * `deskew` - Skew estimation and correction
//! * `quality` - Blur and lighting assessment

pub mod deskew;
pub mod filters;
pub mod geometry;
pub mod preprocess;
pub mod quality;

pub use deskew::{DeskewConfig, DeskewResult, SkewCorrector};
pub use geometry::{MinAreaRect, Point, Polygon};
pub use preprocess::{ImagePreprocessor, PreprocessConfig};
pub use quality::{QualityAssessor, QualityConfig};
