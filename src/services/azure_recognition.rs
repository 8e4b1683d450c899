//! Azure AI Document Intelligence client for identity-document recognition.
//!
//! The analyze call is asynchronous on the service side: the image is posted,
//! the service answers with an `Operation-Location` URL, and that URL is polled
//! until the analysis succeeds or fails.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::core::config::RecognitionSettings;
use crate::core::constants::RECOGNITION_SERVICE;
use crate::core::errors::{VerifyError, VerifyResult};
use crate::core::traits::RecognitionService;
use crate::domain::{RecognitionResult, RecognizedDocument, RecognizedField, field_keys};

const SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";
const OPERATION_LOCATION_HEADER: &str = "operation-location";
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
const DEFAULT_MAX_POLLS: u32 = 60;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeOperation {
    status: String,
    #[serde(default)]
    analyze_result: Option<AnalyzeResult>,
    #[serde(default)]
    error: Option<ServiceError>,
}

#[derive(Debug, Deserialize)]
struct ServiceError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct AnalyzeResult {
    #[serde(default)]
    documents: Vec<AnalyzedDocument>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzedDocument {
    #[serde(default)]
    doc_type: Option<String>,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default)]
    fields: BTreeMap<String, DocumentField>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DocumentField {
    #[serde(default)]
    value_string: Option<String>,
    #[serde(default)]
    value_date: Option<String>,
    #[serde(default)]
    value_country_region: Option<String>,
    #[serde(default)]
    value_phone_number: Option<String>,
    #[serde(default)]
    value_number: Option<f64>,
    #[serde(default)]
    value_integer: Option<i64>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    confidence: Option<f64>,
}

impl DocumentField {
    /// The typed value in string form, falling back to the raw content.
    ///
    /// Addresses always use their content: the structured address value has
    /// no single-string form.
    fn value(&self, name: &str) -> Option<String> {
        let typed = if name == field_keys::ADDRESS {
            None
        } else {
            self.value_string
                .clone()
                .or_else(|| self.value_date.clone())
                .or_else(|| self.value_country_region.clone())
                .or_else(|| self.value_phone_number.clone())
                .or_else(|| self.value_integer.filter(|v| *v != 0).map(|v| v.to_string()))
                .or_else(|| self.value_number.filter(|v| *v != 0.0).map(|v| v.to_string()))
        };

        typed
            .filter(|v| !v.is_empty())
            .or_else(|| self.content.clone())
    }
}

impl From<AnalyzeResult> for RecognitionResult {
    fn from(result: AnalyzeResult) -> Self {
        let documents = result
            .documents
            .into_iter()
            .map(|doc| RecognizedDocument {
                doc_type: doc.doc_type,
                confidence: doc.confidence,
                fields: doc
                    .fields
                    .iter()
                    .map(|(name, field)| {
                        (
                            name.clone(),
                            RecognizedField {
                                value: field.value(name),
                                confidence: field.confidence,
                            },
                        )
                    })
                    .collect(),
            })
            .collect();
        Self { documents }
    }
}

/// State of a polled analyze operation.
#[derive(Debug)]
enum OperationState {
    Pending,
    Succeeded(RecognitionResult),
}

/// Parses one poll response body.
fn parse_operation(body: &str) -> VerifyResult<OperationState> {
    let operation: AnalyzeOperation = serde_json::from_str(body).map_err(|e| {
        VerifyError::collaborator_with_source(RECOGNITION_SERVICE, "invalid analyze response", e)
    })?;

    match operation.status.as_str() {
        "notStarted" | "running" => Ok(OperationState::Pending),
        "succeeded" => Ok(OperationState::Succeeded(
            operation.analyze_result.unwrap_or_default().into(),
        )),
        "failed" => {
            let detail = operation
                .error
                .map(|e| {
                    format!(
                        "{}: {}",
                        e.code.unwrap_or_else(|| "unknown".to_string()),
                        e.message.unwrap_or_default()
                    )
                })
                .unwrap_or_else(|| "no error details".to_string());
            Err(VerifyError::collaborator(
                RECOGNITION_SERVICE,
                format!("analysis failed ({detail})"),
            ))
        }
        other => Err(VerifyError::collaborator(
            RECOGNITION_SERVICE,
            format!("unexpected operation status '{other}'"),
        )),
    }
}

/// Blocking client for the prebuilt identity-document model.
#[derive(Debug, Clone)]
pub struct AzureRecognitionClient {
    settings: RecognitionSettings,
    client: reqwest::blocking::Client,
    poll_interval: Duration,
    max_polls: u32,
}

impl AzureRecognitionClient {
    /// Creates a client for the configured endpoint.
    pub fn new(settings: RecognitionSettings) -> VerifyResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| {
                VerifyError::collaborator_with_source(
                    RECOGNITION_SERVICE,
                    "failed to build HTTP client",
                    e,
                )
            })?;

        Ok(Self {
            settings,
            client,
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_polls: DEFAULT_MAX_POLLS,
        })
    }

    fn analyze_url(&self) -> String {
        format!(
            "{}/formrecognizer/documentModels/{}:analyze?api-version={}",
            self.settings.endpoint.trim_end_matches('/'),
            self.settings.model_id,
            self.settings.api_version
        )
    }

    fn http_error(message: &'static str) -> impl FnOnce(reqwest::Error) -> VerifyError {
        move |e| VerifyError::collaborator_with_source(RECOGNITION_SERVICE, message, e)
    }

    fn submit(&self, image_bytes: &[u8]) -> VerifyResult<String> {
        let response = self
            .client
            .post(self.analyze_url())
            .header(SUBSCRIPTION_KEY_HEADER, &self.settings.key)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(image_bytes.to_vec())
            .send()
            .map_err(Self::http_error("failed to submit document"))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(VerifyError::collaborator(
                RECOGNITION_SERVICE,
                format!("analyze request rejected with {status}: {body}"),
            ));
        }

        response
            .headers()
            .get(OPERATION_LOCATION_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| {
                VerifyError::collaborator(
                    RECOGNITION_SERVICE,
                    "analyze response has no Operation-Location header",
                )
            })
    }

    fn poll(&self, operation_url: &str) -> VerifyResult<RecognitionResult> {
        for attempt in 1..=self.max_polls {
            std::thread::sleep(self.poll_interval);

            let response = self
                .client
                .get(operation_url)
                .header(SUBSCRIPTION_KEY_HEADER, &self.settings.key)
                .send()
                .map_err(Self::http_error("failed to poll analyze operation"))?;

            let status = response.status();
            let body = response
                .text()
                .map_err(Self::http_error("failed to read analyze response"))?;
            if !status.is_success() {
                return Err(VerifyError::collaborator(
                    RECOGNITION_SERVICE,
                    format!("poll rejected with {status}: {body}"),
                ));
            }

            match parse_operation(&body)? {
                OperationState::Pending => debug!(attempt, "Analyze operation still running"),
                OperationState::Succeeded(result) => return Ok(result),
            }
        }

        Err(VerifyError::collaborator(
            RECOGNITION_SERVICE,
            format!("analysis did not finish after {} polls", self.max_polls),
        ))
    }
}

impl RecognitionService for AzureRecognitionClient {
    fn analyze(&self, image_bytes: &[u8]) -> VerifyResult<RecognitionResult> {
        info!(model = %self.settings.model_id, bytes = image_bytes.len(), "Submitting document for recognition");
        let result = self
            .submit(image_bytes)
            .and_then(|operation_url| self.poll(&operation_url));

        match &result {
            Ok(recognition) => debug!(documents = recognition.documents.len(), "Recognition finished"),
            Err(e) => error!("Error analyzing document: {e}"),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUCCEEDED: &str = r#"{
        "status": "succeeded",
        "analyzeResult": {
            "apiVersion": "2023-07-31",
            "modelId": "prebuilt-idDocument",
            "documents": [{
                "docType": "idDocument.nationalIdentityCard",
                "confidence": 0.99,
                "fields": {
                    "DocumentNumber": {"type": "string", "valueString": "2345 6789 0123", "content": "2345 6789 0123", "confidence": 0.95},
                    "FirstName": {"type": "string", "valueString": "RAVI", "content": "RAVI", "confidence": 0.9},
                    "DateOfBirth": {"type": "date", "valueDate": "1990-05-10", "content": "10/05/1990", "confidence": 0.92},
                    "Sex": {"type": "string", "content": "M", "confidence": 0.88},
                    "Address": {"type": "address", "valueAddress": {"postalCode": "560001"}, "content": "MG Road, Bengaluru 560001", "confidence": 0.8}
                }
            }]
        }
    }"#;

    fn settings() -> RecognitionSettings {
        RecognitionSettings {
            endpoint: "https://example.cognitiveservices.azure.com/".to_string(),
            key: "secret".to_string(),
            model_id: "prebuilt-idDocument".to_string(),
            api_version: "2023-07-31".to_string(),
        }
    }

    #[test]
    fn test_parse_succeeded_operation() {
        let OperationState::Succeeded(result) = parse_operation(SUCCEEDED).unwrap() else {
            panic!("expected a finished operation");
        };
        let document = result.primary().unwrap();
        assert_eq!(document.doc_type.as_deref(), Some("idDocument.nationalIdentityCard"));
        assert_eq!(document.value(field_keys::DOCUMENT_NUMBER), Some("2345 6789 0123"));
        assert_eq!(document.value(field_keys::DATE_OF_BIRTH), Some("1990-05-10"));
        assert_eq!(document.value(field_keys::SEX), Some("M"));
        assert_eq!(document.value(field_keys::ADDRESS), Some("MG Road, Bengaluru 560001"));
        assert_eq!(document.fields[field_keys::FIRST_NAME].confidence, Some(0.9));
    }

    #[test]
    fn test_parse_pending_and_failed() {
        assert!(matches!(
            parse_operation(r#"{"status": "running"}"#).unwrap(),
            OperationState::Pending
        ));

        let err = parse_operation(
            r#"{"status": "failed", "error": {"code": "InvalidImage", "message": "corrupt"}}"#,
        )
        .unwrap_err();
        assert!(err.is_collaborator(RECOGNITION_SERVICE));
        assert!(err.to_string().contains("InvalidImage"));
    }

    #[test]
    fn test_parse_garbage_is_collaborator_error() {
        let err = parse_operation("<html>").unwrap_err();
        assert!(err.is_collaborator(RECOGNITION_SERVICE));
    }

    #[test]
    fn test_succeeded_without_documents() {
        let OperationState::Succeeded(result) =
            parse_operation(r#"{"status": "succeeded", "analyzeResult": {}}"#).unwrap()
        else {
            panic!("expected a finished operation");
        };
        assert!(result.documents.is_empty());
    }

    #[test]
    fn test_analyze_url() {
        let client = AzureRecognitionClient::new(settings()).unwrap();
        assert_eq!(
            client.analyze_url(),
            "https://example.cognitiveservices.azure.com/formrecognizer/documentModels/prebuilt-idDocument:analyze?api-version=2023-07-31"
        );
    }
}
