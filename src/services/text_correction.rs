//! Azure OpenAI client that corrects recognition mistakes in extracted fields.
//!
//! The model receives the canonical fields as JSON and must answer with the
//! same keys. It is told never to invent values, so absent fields stay null.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};

use crate::core::config::CorrectionSettings;
use crate::core::constants::CORRECTION_SERVICE;
use crate::core::errors::{VerifyError, VerifyResult};
use crate::core::traits::TextCorrector;
use crate::domain::ExtractedFields;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

const SYSTEM_PROMPT: &str = "You fix text-recognition errors in fields read from Indian Aadhaar cards. \
You receive a JSON object and return the same object with corrected values.\n\
Rules:\n\
- Never add information. A field that is null or unreadable stays null.\n\
- Fix characters that recognition engines commonly confuse, such as 0 and O, 1 and I, 5 and S.\n\
- Put the address in a clean, conventional format.\n\
- Keep exactly the keys you were given.\n\
- Reply with JSON only.";

fn user_prompt(fields_json: &str) -> String {
    format!(
        "Extracted fields:\n{fields_json}\n\n\
         Correct 'name', 'address', 'gender', 'dob' and 'aadhaar_number' where they look wrong. \
         Return only the corrected JSON object."
    )
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    messages: Vec<Message<'a>>,
    temperature: f64,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Parses the model's reply into fields.
///
/// Tolerates surrounding prose or code fences by reading from the first `{`
/// to the last `}`.
fn parse_corrected_fields(content: &str) -> VerifyResult<ExtractedFields> {
    let json = match (content.find('{'), content.rfind('}')) {
        (Some(start), Some(end)) if start < end => &content[start..=end],
        _ => content,
    };

    serde_json::from_str(json).map_err(|e| {
        VerifyError::collaborator_with_source(CORRECTION_SERVICE, "reply is not valid field JSON", e)
    })
}

/// Blocking chat-completions client for a single Azure OpenAI deployment.
#[derive(Debug, Clone)]
pub struct AzureTextCorrector {
    settings: CorrectionSettings,
    client: reqwest::blocking::Client,
}

impl AzureTextCorrector {
    pub fn new(settings: CorrectionSettings) -> VerifyResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| {
                VerifyError::collaborator_with_source(
                    CORRECTION_SERVICE,
                    "failed to build HTTP client",
                    e,
                )
            })?;
        Ok(Self { settings, client })
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.settings.endpoint.trim_end_matches('/'),
            self.settings.deployment,
            self.settings.api_version
        )
    }

    fn call_chat(&self, fields_json: &str) -> VerifyResult<String> {
        let prompt = user_prompt(fields_json);
        let request = ChatRequest {
            messages: vec![
                Message {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                Message {
                    role: "user",
                    content: &prompt,
                },
            ],
            temperature: 0.0,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };

        let response = self
            .client
            .post(self.completions_url())
            .header("api-key", &self.settings.key)
            .json(&request)
            .send()
            .map_err(|e| {
                VerifyError::collaborator_with_source(CORRECTION_SERVICE, "request failed", e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            if body.contains("DeploymentNotFound") {
                error!(
                    "Deployment '{}' not found; check AZURE_OPENAI_DEPLOYMENT_NAME",
                    self.settings.deployment
                );
            }
            return Err(VerifyError::collaborator(
                CORRECTION_SERVICE,
                format!("service returned {status}: {body}"),
            ));
        }

        let chat: ChatResponse = response.json().map_err(|e| {
            VerifyError::collaborator_with_source(CORRECTION_SERVICE, "invalid response body", e)
        })?;

        chat.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| VerifyError::collaborator(CORRECTION_SERVICE, "empty completion"))
    }
}

impl TextCorrector for AzureTextCorrector {
    fn correct(&self, fields: &ExtractedFields) -> VerifyResult<ExtractedFields> {
        let fields_json = serde_json::to_string(fields).map_err(|e| {
            VerifyError::collaborator_with_source(CORRECTION_SERVICE, "failed to encode fields", e)
        })?;

        let content = self.call_chat(&fields_json)?;
        let corrected = parse_corrected_fields(&content)?;
        debug!("Text correction applied");
        Ok(corrected)
    }
}
