//! The remote generation call and the request it carries.

use async_trait::async_trait;
use shared::chat::EncodedImage;
use shared::errors::ServiceError;

/// One element of the prompt, in the order the model should read it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentPart {
    InlineImage(EncodedImage),
    Text(String),
}

/// Per-request model options.
///
/// A thinking budget and an output cap are never set together: asking for
/// extended reasoning lifts the cap.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationConfig {
    pub thinking_budget: Option<u32>,
    pub max_output_tokens: Option<u32>,
}

impl GenerationConfig {
    pub fn for_mode(reasoning: bool, thinking_budget: u32, max_output_tokens: Option<u32>) -> Self {
        if reasoning {
            Self {
                thinking_budget: Some(thinking_budget),
                max_output_tokens: None,
            }
        } else {
            Self {
                thinking_budget: None,
                max_output_tokens,
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.thinking_budget.is_none() && self.max_output_tokens.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateRequest {
    pub model: String,
    pub parts: Vec<ContentPart>,
    pub config: GenerationConfig,
}

impl GenerateRequest {
    /// Image part first (when present), then the text part.
    pub fn new(
        model: impl Into<String>,
        prompt: &str,
        image: Option<&EncodedImage>,
        config: GenerationConfig,
    ) -> Self {
        let mut parts = Vec::with_capacity(2);
        if let Some(image) = image {
            parts.push(ContentPart::InlineImage(image.clone()));
        }
        parts.push(ContentPart::Text(prompt.to_string()));
        Self {
            model: model.into(),
            parts,
            config,
        }
    }

    pub fn prompt_text(&self) -> Option<&str> {
        self.parts.iter().find_map(|p| match p {
            ContentPart::Text(t) => Some(t.as_str()),
            ContentPart::InlineImage(_) => None,
        })
    }

    pub fn image(&self) -> Option<&EncodedImage> {
        self.parts.iter().find_map(|p| match p {
            ContentPart::InlineImage(img) => Some(img),
            ContentPart::Text(_) => None,
        })
    }
}

/// A remote model able to answer one prompt.
///
/// `Ok(None)` means the service answered without any text.
#[async_trait]
pub trait ResponseService: Send + Sync {
    /// Provider identifier, for logs
    fn id(&self) -> &'static str;

    async fn generate(&self, request: &GenerateRequest) -> Result<Option<String>, ServiceError>;
}

/// Stand-in used when no credential is available, so sends still produce a
/// readable error turn.
pub struct UnconfiguredService {
    reason: String,
}

impl UnconfiguredService {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl ResponseService for UnconfiguredService {
    fn id(&self) -> &'static str {
        "unconfigured"
    }

    async fn generate(&self, _request: &GenerateRequest) -> Result<Option<String>, ServiceError> {
        Err(ServiceError::NotConfigured(self.reason.clone()))
    }
}
