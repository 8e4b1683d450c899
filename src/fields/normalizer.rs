//! Mapping from the recognition service's field bag to [`ExtractedFields`].

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::domain::{ExtractedFields, RecognitionResult, field_keys};

/// A standalone Indian postal index number: six ASCII digits, not starting with 0.
static PINCODE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[1-9][0-9]{5}\b").unwrap_or_else(|e| panic!("invalid pincode pattern: {e}"))
});

/// Removes every non-digit character from an ID number.
///
/// Idempotent: normalizing an already-normalized value returns it unchanged.
pub fn normalize_aadhaar(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

/// Extracts the postal code from an address when it is unambiguous.
///
/// Returns `None` unless the address contains exactly one standalone
/// six-digit PIN.
pub fn extract_pincode(address: &str) -> Option<String> {
    let mut matches = PINCODE_PATTERN.find_iter(address);
    let first = matches.next()?;
    if matches.next().is_some() {
        return None;
    }
    Some(first.as_str().to_string())
}

/// Builds the canonical identity fields from the primary recognized document.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldNormalizer;

impl FieldNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// Maps the first document of `result` onto the canonical schema.
    ///
    /// Missing source fields stay `None`; a result without documents yields
    /// all-`None` fields.
    pub fn normalize(&self, result: &RecognitionResult) -> ExtractedFields {
        let Some(document) = result.primary() else {
            debug!("Recognition result has no documents");
            return ExtractedFields::default();
        };

        let aadhaar_number = document
            .value(field_keys::DOCUMENT_NUMBER)
            .map(normalize_aadhaar)
            .filter(|digits| !digits.is_empty());

        let name = match (
            document.value(field_keys::FIRST_NAME),
            document.value(field_keys::LAST_NAME),
        ) {
            (Some(first), Some(last)) => Some(format!("{first} {last}")),
            (Some(only), None) | (None, Some(only)) => Some(only.to_string()),
            (None, None) => None,
        };

        let address = document.value(field_keys::ADDRESS).map(str::to_string);
        let pincode = address.as_deref().and_then(extract_pincode);

        ExtractedFields {
            aadhaar_number,
            name,
            dob: document.value(field_keys::DATE_OF_BIRTH).map(str::to_string),
            gender: document.value(field_keys::SEX).map(str::to_string),
            address,
            pincode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{RecognizedDocument, RecognizedField};

    fn result_with(document: RecognizedDocument) -> RecognitionResult {
        RecognitionResult {
            documents: vec![document],
        }
    }

    #[test]
    fn test_normalize_aadhaar_strips_spacing() {
        assert_eq!(normalize_aadhaar("2345 6789 0123"), "234567890123");
        assert_eq!(normalize_aadhaar("2345-6789-0123"), "234567890123");
        let once = normalize_aadhaar("2345 6789 0123");
        assert_eq!(normalize_aadhaar(&once), once);
        assert_eq!(normalize_aadhaar(""), "");
    }

    #[test]
    fn test_full_document() {
        let document = RecognizedDocument::default()
            .with_field(field_keys::DOCUMENT_NUMBER, RecognizedField::new("234 567 890 123", 0.95))
            .with_field(field_keys::FIRST_NAME, RecognizedField::new("RAVI", 0.9))
            .with_field(field_keys::LAST_NAME, RecognizedField::new("KUMAR", 0.9))
            .with_field(field_keys::DATE_OF_BIRTH, RecognizedField::new("1990-05-10", 0.92))
            .with_field(field_keys::SEX, RecognizedField::new("M", 0.88))
            .with_field(
                field_keys::ADDRESS,
                RecognizedField::new("12 MG Road, Bengaluru, Karnataka 560001", 0.8),
            );

        let fields = FieldNormalizer::new().normalize(&result_with(document));
        assert_eq!(fields.aadhaar_number.as_deref(), Some("234567890123"));
        assert_eq!(fields.name.as_deref(), Some("RAVI KUMAR"));
        assert_eq!(fields.dob.as_deref(), Some("1990-05-10"));
        assert_eq!(fields.gender.as_deref(), Some("M"));
        assert_eq!(fields.pincode.as_deref(), Some("560001"));
    }

    #[test]
    fn test_name_falls_back_to_single_part() {
        let first_only = RecognizedDocument::default()
            .with_field(field_keys::FIRST_NAME, RecognizedField::new("RAVI", 0.9));
        let fields = FieldNormalizer::new().normalize(&result_with(first_only));
        assert_eq!(fields.name.as_deref(), Some("RAVI"));

        let last_only = RecognizedDocument::default()
            .with_field(field_keys::LAST_NAME, RecognizedField::new("KUMAR", 0.9));
        let fields = FieldNormalizer::new().normalize(&result_with(last_only));
        assert_eq!(fields.name.as_deref(), Some("KUMAR"));
    }

    #[test]
    fn test_missing_fields_stay_absent() {
        let document = RecognizedDocument::default()
            .with_field(field_keys::DOCUMENT_NUMBER, RecognizedField::new("N/A", 0.4));
        let fields = FieldNormalizer::new().normalize(&result_with(document));
        assert_eq!(fields.aadhaar_number, None);
        assert_eq!(fields.name, None);
        assert_eq!(fields.address, None);
        assert_eq!(fields.pincode, None);
    }

    #[test]
    fn test_no_documents() {
        let fields = FieldNormalizer::new().normalize(&RecognitionResult::empty());
        assert_eq!(fields, ExtractedFields::default());
    }

    #[test]
    fn test_pincode_requires_single_match() {
        assert_eq!(extract_pincode("Sector 5, Noida 201301").as_deref(), Some("201301"));
        assert_eq!(extract_pincode("PIN 201301 or 110001"), None);
        assert_eq!(extract_pincode("House 012345"), None);
        assert_eq!(extract_pincode("Phone 9876543210"), None);
    }

    #[test]
    fn test_non_ascii_digits_are_ignored_like_id_numbers() {
        assert_eq!(normalize_aadhaar("२३४५ 6789"), "6789");
        assert_eq!(extract_pincode("Lucknow २२६००१"), None);
        assert_eq!(
            extract_pincode("Lucknow २२६००१, PIN 226001").as_deref(),
            Some("226001")
        );
    }
}
