//! Rule-based checks on the canonical identity fields.
//!
//! Every predicate is total: malformed or missing input yields `false`, never
//! an error. The combined outcome is a [`ValidationReport`].

use chrono::{Datelike, NaiveDate};

use super::normalizer::normalize_aadhaar;
use crate::domain::{ExtractedFields, ValidationReport};

/// Date layouts accepted for the date of birth.
const DOB_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d-%m-%Y", "%d/%m/%Y"];

/// Gender values accepted after upper-casing.
const ACCEPTED_GENDERS: [&str; 6] = ["MALE", "FEMALE", "TRANSGENDER", "M", "F", "T"];

/// Length of an Aadhaar number in digits.
const AADHAAR_LENGTH: usize = 12;

/// Returns true for a 12-digit number that does not start with 0 or 1.
///
/// Non-digit characters are ignored.
pub fn aadhaar_valid(value: &str) -> bool {
    let digits = normalize_aadhaar(value);
    digits.len() == AADHAAR_LENGTH && !digits.starts_with(['0', '1'])
}

/// Date-of-birth check against the current calendar year.
pub fn dob_valid(value: &str) -> bool {
    dob_valid_in_year(value, chrono::Local::now().year())
}

/// Date-of-birth check against an explicit `current_year`.
///
/// Valid when any accepted layout parses and `1900 < year < current_year`.
pub fn dob_valid_in_year(value: &str, current_year: i32) -> bool {
    DOB_FORMATS.iter().any(|format| {
        NaiveDate::parse_from_str(value, format)
            .map(|date| 1900 < date.year() && date.year() < current_year)
            .unwrap_or(false)
    })
}

/// Returns true for one of the accepted gender markers, ignoring case.
pub fn gender_valid(value: &str) -> bool {
    let upper = value.to_uppercase();
    ACCEPTED_GENDERS.contains(&upper.as_str())
}

fn present(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.is_empty())
}

/// Runs all field checks and builds the report.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldValidator {
    /// Overrides the current year for date checks.
    current_year: Option<i32>,
}

impl FieldValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pins the year used as the upper bound of the date-of-birth check.
    pub fn with_current_year(mut self, year: i32) -> Self {
        self.current_year = Some(year);
        self
    }

    pub fn validate(&self, fields: &ExtractedFields) -> ValidationReport {
        let year = self
            .current_year
            .unwrap_or_else(|| chrono::Local::now().year());

        ValidationReport::new(
            fields.aadhaar_number.as_deref().is_some_and(aadhaar_valid),
            fields
                .dob
                .as_deref()
                .is_some_and(|dob| dob_valid_in_year(dob, year)),
            fields.gender.as_deref().is_some_and(gender_valid),
            present(fields.name.as_deref()),
            present(fields.address.as_deref()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aadhaar_valid() {
        assert!(aadhaar_valid("234567890123"));
        assert!(aadhaar_valid("2345 6789 0123"));
        assert!(!aadhaar_valid("123456789012"));
        assert!(!aadhaar_valid("034567890123"));
        assert!(!aadhaar_valid("12345"));
        assert!(!aadhaar_valid("2345678901234"));
        assert!(!aadhaar_valid(""));
    }

    #[test]
    fn test_dob_valid() {
        assert!(dob_valid("1990-05-10"));
        assert!(dob_valid("10-05-1990"));
        assert!(dob_valid("10/05/1990"));
        assert!(!dob_valid("1700-01-01"));
        assert!(!dob_valid("31/02/2020"));
        assert!(!dob_valid("not a date"));
        assert!(!dob_valid(""));
    }

    #[test]
    fn test_dob_year_bounds_are_exclusive() {
        assert!(!dob_valid_in_year("1900-06-01", 2025));
        assert!(dob_valid_in_year("1901-06-01", 2025));
        assert!(dob_valid_in_year("2024-12-31", 2025));
        assert!(!dob_valid_in_year("2025-01-01", 2025));
    }

    #[test]
    fn test_gender_valid() {
        for value in ["MALE", "female", "Transgender", "m", "F", "t"] {
            assert!(gender_valid(value), "{value}");
        }
        assert!(!gender_valid("X"));
        assert!(!gender_valid(" M"));
        assert!(!gender_valid(""));
    }

    #[test]
    fn test_report_from_fields() {
        let fields = ExtractedFields {
            aadhaar_number: Some("234567890123".to_string()),
            name: Some("RAVI".to_string()),
            dob: Some("1990-05-10".to_string()),
            gender: Some("M".to_string()),
            address: None,
            pincode: None,
        };
        let report = FieldValidator::new().with_current_year(2025).validate(&fields);
        assert!(report.aadhaar_valid);
        assert!(report.dob_valid);
        assert!(report.gender_valid);
        assert!(report.name_present);
        assert!(!report.address_present);
        assert_eq!(report.validation_score, 80.0);
    }

    #[test]
    fn test_empty_fields_fail_every_check() {
        let fields = ExtractedFields {
            name: Some(String::new()),
            ..ExtractedFields::default()
        };
        let report = FieldValidator::new().validate(&fields);
        assert!(!report.name_present);
        assert_eq!(report.validation_score, 0.0);
    }
}
