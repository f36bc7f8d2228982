//! Adapter around a `ResponseService` that always resolves to renderable text.
//!
//! Failures are not propagated: they come back as an "Error generating
//! response: ..." string so the caller can show them as a normal model turn.

use shared::chat::EncodedImage;
use shared::errors::ServiceError;
use shared::settings::ModelProvider;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

use crate::gemini::GeminiClient;
use crate::service::{GenerateRequest, GenerationConfig, ResponseService, UnconfiguredService};

pub const NO_RESPONSE_TEXT: &str = "No response generated.";
pub const ERROR_PREFIX: &str = "Error generating response:";

pub struct ResponseAdapter {
    service: Arc<dyn ResponseService>,
    model: String,
    thinking_budget: u32,
    max_output_tokens: Option<u32>,
    timeout: Duration,
    max_retries: u32,
}

impl ResponseAdapter {
    pub fn new(service: Arc<dyn ResponseService>, settings: &ModelProvider) -> Self {
        Self {
            service,
            model: settings.gemini_model.clone(),
            thinking_budget: settings.thinking_budget,
            max_output_tokens: settings.max_output_tokens,
            timeout: Duration::from_secs(settings.request_timeout_secs),
            max_retries: settings.max_retries,
        }
    }

    /// Gemini-backed adapter. Without a usable key every send answers with
    /// the configuration error instead.
    pub fn from_settings(settings: &ModelProvider) -> Self {
        let service: Arc<dyn ResponseService> = match GeminiClient::from_settings(settings) {
            Ok(client) => Arc::new(client),
            Err(e) => {
                warn!(error = %e, "Gemini client unavailable");
                Arc::new(UnconfiguredService::new(e.to_string()))
            }
        };
        Self::new(service, settings)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn build_request(
        &self,
        prompt: &str,
        image: Option<&EncodedImage>,
        reasoning_mode: bool,
    ) -> GenerateRequest {
        let config =
            GenerationConfig::for_mode(reasoning_mode, self.thinking_budget, self.max_output_tokens);
        GenerateRequest::new(self.model.clone(), prompt, image, config)
    }

    /// Send one prompt. Resolves to the answer, the fallback text when the
    /// model returned no text at all, or an error description. Whitespace-only
    /// answers are passed through unchanged.
    pub async fn send(
        &self,
        prompt: &str,
        image: Option<&EncodedImage>,
        reasoning_mode: bool,
    ) -> String {
        if prompt.trim().is_empty() && image.is_none() {
            return format!("{} the prompt is empty", ERROR_PREFIX);
        }

        let request = self.build_request(prompt, image, reasoning_mode);
        debug!(
            provider = self.service.id(),
            model = %self.model,
            reasoning_mode,
            has_image = image.is_some(),
            "sending prompt"
        );

        match self.generate_with_retry(&request).await {
            Ok(Some(text)) if !text.is_empty() => text,
            Ok(_) => NO_RESPONSE_TEXT.to_string(),
            Err(e) => {
                error!(provider = self.service.id(), error = %e, "generation failed");
                format!("{} {}", ERROR_PREFIX, e)
            }
        }
    }

    async fn generate_with_retry(
        &self,
        request: &GenerateRequest,
    ) -> Result<Option<String>, ServiceError> {
        let mut attempt = 0;
        loop {
            let result = match tokio::time::timeout(self.timeout, self.service.generate(request)).await
            {
                Ok(result) => result,
                Err(_) => Err(ServiceError::Timeout {
                    after: self.timeout,
                }),
            };

            match result {
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    attempt += 1;
                    warn!(provider = self.service.id(), error = %e, attempt, "retrying request");
                }
                other => return other,
            }
        }
    }
}
