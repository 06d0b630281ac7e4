use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::client::{LanguageModel, MediaPart, PromptPair};
use crate::LlmError;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_TEMPERATURE: f32 = 0.2;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    pub base_url: String,
    pub model: String,
    #[serde(skip)]
    pub api_key: Option<String>,
    /// Low by default: digests and reports should be literal and reproducible.
    pub temperature: f32,
    /// Client-side timeout. `None` leaves it to the service.
    pub request_timeout_secs: Option<u64>,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            temperature: DEFAULT_TEMPERATURE,
            request_timeout_secs: None,
        }
    }
}

impl GeminiConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(model) = std::env::var("HACKJUDGE_MODEL") {
            if !model.is_empty() {
                config.model = model;
            }
        }

        if let Ok(url) = std::env::var("HACKJUDGE_BASE_URL") {
            if !url.is_empty() {
                config.base_url = url;
            }
        }

        if let Ok(temperature) = std::env::var("HACKJUDGE_TEMPERATURE") {
            if let Ok(value) = temperature.parse::<f32>() {
                config.temperature = value.clamp(0.0, 2.0);
            }
        }

        if let Ok(timeout) = std::env::var("HACKJUDGE_TIMEOUT_SECS") {
            if let Ok(seconds) = timeout.parse::<u64>() {
                config.request_timeout_secs = Some(seconds);
            }
        }

        config.api_key = std::env::var("GOOGLE_API_KEY")
            .or_else(|_| std::env::var("GEMINI_API_KEY"))
            .ok()
            .filter(|k| !k.is_empty());

        config
    }
}

#[derive(Clone)]
pub struct GeminiClient {
    base_url: String,
    model: String,
    api_key: String,
    temperature: f32,
    client: reqwest::Client,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text {
        text: &'a str,
    },
    Media {
        #[serde(rename = "inlineData")]
        inline_data: InlineData<'a>,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData<'a> {
    mime_type: &'a str,
    data: &'a str,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self, LlmError> {
        let api_key = config.api_key.ok_or(LlmError::MissingApiKey)?;

        let mut builder = reqwest::Client::builder();
        if let Some(seconds) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(seconds));
        }
        let client = builder.build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model,
            api_key,
            temperature: config.temperature,
            client,
        })
    }

    async fn generate(&self, request: &GenerateRequest<'_>) -> Result<String, LlmError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| LlmError::MalformedResponse(e.to_string()))?;

        extract_text(parsed)
    }
}

fn extract_text(response: GenerateResponse) -> Result<String, LlmError> {
    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(LlmError::Rejected { reason });
    }

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or(LlmError::EmptyResponse)?;

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.is_empty() {
        return Err(match candidate.finish_reason {
            Some(reason) if reason != "STOP" => LlmError::Rejected { reason },
            _ => LlmError::EmptyResponse,
        });
    }

    Ok(text)
}

#[async_trait]
impl LanguageModel for GeminiClient {
    async fn complete(&self, prompt: &PromptPair) -> Result<String, LlmError> {
        debug!(
            model = %self.model,
            system_chars = prompt.system.len(),
            user_chars = prompt.user.len(),
            "Sending text generation request"
        );

        let request = GenerateRequest {
            system_instruction: Some(Content {
                role: None,
                parts: vec![Part::Text {
                    text: &prompt.system,
                }],
            }),
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part::Text { text: &prompt.user }],
            }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
            },
        };

        self.generate(&request).await
    }

    async fn describe_media(
        &self,
        instruction: &str,
        media: &MediaPart,
    ) -> Result<String, LlmError> {
        debug!(
            model = %self.model,
            mime_type = %media.mime_type,
            encoded_bytes = media.data_base64.len(),
            "Sending media description request"
        );

        let request = GenerateRequest {
            system_instruction: None,
            contents: vec![Content {
                role: Some("user"),
                parts: vec![
                    Part::Text { text: instruction },
                    Part::Media {
                        inline_data: InlineData {
                            mime_type: &media.mime_type,
                            data: &media.data_base64,
                        },
                    },
                ],
            }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
            },
        };

        self.generate(&request).await
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(json: serde_json::Value) -> GenerateResponse {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_extract_text_joins_parts() {
        let parsed = response(serde_json::json!({
            "candidates": [{
                "content": {"parts": [{"text": "TECHNICAL SUMMARY: "}, {"text": "ok"}]},
                "finishReason": "STOP"
            }]
        }));
        assert_eq!(extract_text(parsed).unwrap(), "TECHNICAL SUMMARY: ok");
    }

    #[test]
    fn test_extract_text_blocked_prompt() {
        let parsed = response(serde_json::json!({
            "candidates": [],
            "promptFeedback": {"blockReason": "SAFETY"}
        }));
        match extract_text(parsed) {
            Err(LlmError::Rejected { reason }) => assert_eq!(reason, "SAFETY"),
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn test_extract_text_no_candidates() {
        let parsed = response(serde_json::json!({}));
        assert!(matches!(extract_text(parsed), Err(LlmError::EmptyResponse)));
    }

    #[test]
    fn test_new_requires_api_key() {
        let result = GeminiClient::new(GeminiConfig::default());
        assert!(matches!(result, Err(LlmError::MissingApiKey)));
    }

    #[test]
    fn test_request_serializes_inline_data() {
        let request = GenerateRequest {
            system_instruction: None,
            contents: vec![Content {
                role: Some("user"),
                parts: vec![
                    Part::Text { text: "describe" },
                    Part::Media {
                        inline_data: InlineData {
                            mime_type: "video/mp4",
                            data: "AAAA",
                        },
                    },
                ],
            }],
            generation_config: GenerationConfig { temperature: 0.2 },
        };

        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("systemInstruction").is_none());
        assert_eq!(value["contents"][0]["parts"][1]["inlineData"]["mimeType"], "video/mp4");
        assert_eq!(value["contents"][0]["parts"][1]["inlineData"]["data"], "AAAA");
        assert!(value["generationConfig"]["temperature"].is_number());
    }
}
