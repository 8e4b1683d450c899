//! Identity-field normalization and validation.

pub mod normalizer;
pub mod validator;

pub use normalizer::{FieldNormalizer, extract_pincode, normalize_aadhaar};
pub use validator::{FieldValidator, aadhaar_valid, dob_valid, dob_valid_in_year, gender_valid};
