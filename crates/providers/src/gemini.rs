use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use shared::errors::ServiceError;
use shared::settings::ModelProvider;
use std::time::Duration;

use crate::service::{ContentPart, GenerateRequest, GenerationConfig, ResponseService};

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    role: String,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPart {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<GeminiInlineData>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiInlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiThinkingConfig {
    thinking_budget: u32,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    thinking_config: Option<GeminiThinkingConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GeminiGenerationConfig>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidatePart {
    #[serde(default)]
    text: Option<String>,
    /// Set on reasoning summaries, which are not part of the answer
    #[serde(default)]
    thought: bool,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiCandidatePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiCandidateContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

fn generation_config(config: &GenerationConfig) -> Option<GeminiGenerationConfig> {
    if config.is_empty() {
        return None;
    }
    Some(GeminiGenerationConfig {
        thinking_config: config
            .thinking_budget
            .map(|thinking_budget| GeminiThinkingConfig { thinking_budget }),
        max_output_tokens: config.max_output_tokens,
    })
}

fn build_request(request: &GenerateRequest) -> GeminiRequest {
    let parts = request
        .parts
        .iter()
        .map(|part| match part {
            ContentPart::InlineImage(image) => GeminiPart {
                inline_data: Some(GeminiInlineData {
                    mime_type: image.mime_type.clone(),
                    data: image.data.clone(),
                }),
                ..Default::default()
            },
            ContentPart::Text(text) => GeminiPart {
                text: Some(text.clone()),
                ..Default::default()
            },
        })
        .collect();

    GeminiRequest {
        contents: vec![GeminiContent {
            role: "user".to_string(),
            parts,
        }],
        generation_config: generation_config(&request.config),
    }
}

/// Answer text of the first candidate, without thought parts.
fn extract_text(body: GeminiResponse) -> Option<String> {
    let text: String = body
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| {
            c.parts
                .into_iter()
                .filter(|p| !p.thought)
                .filter_map(|p| p.text)
                .collect()
        })
        .unwrap_or_default();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn truncate_body(body: &str) -> String {
    let body = body.trim();
    if body.chars().count() > 800 {
        format!("{}...", body.chars().take(800).collect::<String>())
    } else {
        body.to_string()
    }
}

pub struct GeminiClient {
    http: Client,
    auth_token: String,
    timeout: Duration,
}

impl GeminiClient {
    pub fn new(auth_token: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            http: Client::builder().timeout(timeout).build()?,
            auth_token: auth_token.into(),
            timeout,
        })
    }

    pub fn from_settings(settings: &ModelProvider) -> Result<Self> {
        let auth_token = settings
            .gemini_auth
            .resolve_api_key()
            .ok_or_else(|| anyhow!("No Gemini API key configured"))?;
        Self::new(auth_token, Duration::from_secs(settings.request_timeout_secs))
    }

    /// The request URL carries the key, so it is stripped from the message.
    fn map_transport(&self, err: reqwest::Error) -> ServiceError {
        let err = err.without_url();
        if err.is_timeout() {
            ServiceError::Timeout {
                after: self.timeout,
            }
        } else {
            ServiceError::Transport(err.to_string())
        }
    }
}

#[async_trait]
impl ResponseService for GeminiClient {
    fn id(&self) -> &'static str {
        "gemini"
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<Option<String>, ServiceError> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            API_BASE, request.model, self.auth_token
        );
        let req = build_request(request);
        let resp = self
            .http
            .post(url)
            .json(&req)
            .send()
            .await
            .map_err(|e| self.map_transport(e))?;

        let status = resp.status();
        if !status.is_success() {
            let body = truncate_body(&resp.text().await.unwrap_or_default());
            let body = if body.is_empty() {
                status.to_string()
            } else {
                body
            };
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ServiceError::Unauthorized {
                    status: status.as_u16(),
                    body,
                },
                _ => ServiceError::Status {
                    status: status.as_u16(),
                    body,
                },
            });
        }

        let body: GeminiResponse = resp
            .json()
            .await
            .map_err(|e| ServiceError::Decode(e.without_url().to_string()))?;
        Ok(extract_text(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use shared::chat::EncodedImage;

    #[test]
    fn test_request_with_image_and_thinking() {
        let image = EncodedImage::new("image/png", "AAAA");
        let req = GenerateRequest::new(
            "gemini-3-pro-preview",
            "Analyze this image.",
            Some(&image),
            GenerationConfig::for_mode(true, 32768, Some(512)),
        );
        let value = serde_json::to_value(build_request(&req)).unwrap();
        assert_eq!(
            value,
            json!({
                "contents": [{
                    "role": "user",
                    "parts": [
                        {"inlineData": {"mimeType": "image/png", "data": "AAAA"}},
                        {"text": "Analyze this image."}
                    ]
                }],
                "generationConfig": {"thinkingConfig": {"thinkingBudget": 32768}}
            })
        );
    }

    #[test]
    fn test_plain_request_omits_generation_config() {
        let req = GenerateRequest::new("m", "Check stock", None, GenerationConfig::default());
        let value = serde_json::to_value(build_request(&req)).unwrap();
        assert!(value.get("generationConfig").is_none());
        assert_eq!(value["contents"][0]["parts"], json!([{"text": "Check stock"}]));
    }

    #[test]
    fn test_extract_text_skips_thoughts() {
        let body: GeminiResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {"parts": [
                    {"text": "weighing the options", "thought": true},
                    {"text": "12 units "},
                    {"text": "available."}
                ]}
            }]
        }))
        .unwrap();
        assert_eq!(extract_text(body).as_deref(), Some("12 units available."));
    }

    #[test]
    fn test_extract_text_empty_response() {
        let body: GeminiResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(extract_text(body), None);

        let body: GeminiResponse =
            serde_json::from_value(json!({"candidates": [{"finishReason": "SAFETY"}]})).unwrap();
        assert_eq!(extract_text(body), None);
    }

    #[test]
    fn test_extract_text_keeps_whitespace_answer() {
        let body: GeminiResponse = serde_json::from_value(json!({
            "candidates": [{"content": {"parts": [{"text": "\n"}]}}]
        }))
        .unwrap();
        assert_eq!(extract_text(body).as_deref(), Some("\n"));
    }

    #[test]
    fn test_truncate_long_body() {
        let long = "x".repeat(1000);
        let out = truncate_body(&long);
        assert_eq!(out.len(), 803);
        assert!(out.ends_with("..."));
    }
}
