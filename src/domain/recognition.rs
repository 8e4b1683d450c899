//! Recognition-service results and the canonical identity-field schema.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Field names produced by the recognition service's identity-document model.
pub mod field_keys {
    pub const DOCUMENT_NUMBER: &str = "DocumentNumber";
    pub const FIRST_NAME: &str = "FirstName";
    pub const LAST_NAME: &str = "LastName";
    pub const DATE_OF_BIRTH: &str = "DateOfBirth";
    pub const SEX: &str = "Sex";
    pub const ADDRESS: &str = "Address";
}

/// A single recognized field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecognizedField {
    /// The field's value in string form, if the service produced one.
    pub value: Option<String>,
    /// Recognition confidence in `[0, 1]`, if reported.
    pub confidence: Option<f64>,
}

impl RecognizedField {
    /// Creates a field with a value and a confidence.
    pub fn new(value: impl Into<String>, confidence: f64) -> Self {
        Self {
            value: Some(value.into()),
            confidence: Some(confidence),
        }
    }
}

/// One document found by the recognition service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecognizedDocument {
    pub doc_type: Option<String>,
    pub confidence: Option<f64>,
    /// Field bag keyed by semantic field name.
    pub fields: BTreeMap<String, RecognizedField>,
}

impl RecognizedDocument {
    /// Adds a field, builder style.
    pub fn with_field(mut self, name: impl Into<String>, field: RecognizedField) -> Self {
        self.fields.insert(name.into(), field);
        self
    }

    /// Returns the non-empty value of the named field.
    pub fn value(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .and_then(|f| f.value.as_deref())
            .filter(|v| !v.is_empty())
    }
}

/// Everything the recognition service returned for one image.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecognitionResult {
    pub documents: Vec<RecognizedDocument>,
}

impl RecognitionResult {
    /// A result with no documents, used when the service is not configured.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The first (primary) document, if any.
    pub fn primary(&self) -> Option<&RecognizedDocument> {
        self.documents.first()
    }
}

/// Canonical identity fields. Absent source data is `None`, never a guess.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedFields {
    pub aadhaar_number: Option<String>,
    pub name: Option<String>,
    pub dob: Option<String>,
    pub gender: Option<String>,
    pub address: Option<String>,
    pub pincode: Option<String>,
}
