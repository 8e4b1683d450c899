//! Recognition confidence aggregation.

use tracing::debug;

use crate::domain::RecognitionResult;

/// Averages the field confidences of the primary recognized document.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfidenceEngine;

impl ConfidenceEngine {
    pub fn new() -> Self {
        Self
    }

    /// Mean field confidence of the first document.
    ///
    /// Returns 0.0 when there is no document, the document has no fields, or
    /// any field lacks a finite confidence.
    pub fn ocr_confidence(&self, result: &RecognitionResult) -> f64 {
        let Some(document) = result.primary() else {
            return 0.0;
        };
        if document.fields.is_empty() {
            return 0.0;
        }

        let confidences: Option<Vec<f64>> = document
            .fields
            .values()
            .map(|field| field.confidence.filter(|c| c.is_finite()))
            .collect();

        match confidences {
            Some(values) => values.iter().sum::<f64>() / values.len() as f64,
            None => {
                debug!("A recognized field has no usable confidence");
                0.0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{RecognizedDocument, RecognizedField};

    fn result_with(fields: &[(&str, Option<f64>)]) -> RecognitionResult {
        let document = fields.iter().fold(RecognizedDocument::default(), |doc, (name, conf)| {
            doc.with_field(
                *name,
                RecognizedField {
                    value: Some("x".to_string()),
                    confidence: *conf,
                },
            )
        });
        RecognitionResult {
            documents: vec![document],
        }
    }

    #[test]
    fn test_mean_of_field_confidences() {
        let result = result_with(&[
            ("DocumentNumber", Some(0.95)),
            ("FirstName", Some(0.9)),
            ("Sex", Some(0.88)),
            ("DateOfBirth", Some(0.92)),
        ]);
        assert!((ConfidenceEngine::new().ocr_confidence(&result) - 0.9125).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_inputs_score_zero() {
        let engine = ConfidenceEngine::new();
        assert_eq!(engine.ocr_confidence(&RecognitionResult::empty()), 0.0);
        assert_eq!(engine.ocr_confidence(&result_with(&[])), 0.0);
        assert_eq!(
            engine.ocr_confidence(&result_with(&[("Sex", Some(0.9)), ("Address", None)])),
            0.0
        );
        assert_eq!(
            engine.ocr_confidence(&result_with(&[("Sex", Some(f64::NAN))])),
            0.0
        );
    }

    #[test]
    fn test_only_first_document_counts() {
        let mut result = result_with(&[("Sex", Some(0.5))]);
        result
            .documents
            .push(RecognizedDocument::default().with_field("Sex", RecognizedField::new("M", 1.0)));
        assert_eq!(ConfidenceEngine::new().ocr_confidence(&result), 0.5);
    }
}
