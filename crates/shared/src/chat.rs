//! Conversation data shared between the assistant core, providers and the UI.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::AttachmentError;

/// Media type assumed when a payload carries no data-URL header.
pub const FALLBACK_MIME_TYPE: &str = "image/jpeg";

/// Who authored a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

/// Identifier of a turn; strictly increasing within one conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TurnId(pub u64);

impl std::fmt::Display for TurnId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An image ready for transmission: base64 payload without any header, plus
/// its media type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedImage {
    pub mime_type: String,
    pub data: String,
}

impl EncodedImage {
    pub fn new(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    /// Header-prefixed form usable as a displayable image source.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }

    /// Accepts either a `data:<mime>;base64,<payload>` URL or a bare payload.
    pub fn from_data_url(source: &str) -> Self {
        let Some(rest) = source.strip_prefix("data:") else {
            return Self::new(FALLBACK_MIME_TYPE, source.trim());
        };
        match rest.split_once(',') {
            Some((header, payload)) => {
                let mime = header.split(';').next().unwrap_or_default().trim();
                let mime = if mime.contains('/') {
                    mime
                } else {
                    FALLBACK_MIME_TYPE
                };
                Self::new(mime, payload.trim())
            }
            None => Self::new(FALLBACK_MIME_TYPE, rest.trim()),
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, AttachmentError> {
        STANDARD
            .decode(self.data.as_bytes())
            .map_err(|e| AttachmentError::InvalidEncoding(e.to_string()))
    }
}

/// One message in the conversation. Never mutated after it is appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub id: TurnId,
    pub role: Role,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<EncodedImage>,
    /// Reasoning mode captured when the originating send was dispatched.
    /// Only set on model turns that answer a send.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning_used: Option<bool>,
    pub created_at: DateTime<Utc>,
}

impl ChatTurn {
    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }

    pub fn thought_deeply(&self) -> bool {
        self.role == Role::Model && self.reasoning_used == Some(true)
    }

    /// Short clock label shown next to the message.
    pub fn time_label(&self) -> String {
        self.created_at.format("%H:%M").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_url_keeps_mime_and_payload() {
        let image = EncodedImage::new("image/png", "iVBORw0KGgo=");
        assert_eq!(image.data_url(), "data:image/png;base64,iVBORw0KGgo=");

        let parsed = EncodedImage::from_data_url(&image.data_url());
        assert_eq!(parsed, image);
    }

    #[test]
    fn test_bare_payload_falls_back_to_jpeg() {
        let parsed = EncodedImage::from_data_url("/9j/4AAQSkZJRg==");
        assert_eq!(parsed.mime_type, "image/jpeg");
        assert_eq!(parsed.data, "/9j/4AAQSkZJRg==");
    }

    #[test]
    fn test_header_without_mime_falls_back() {
        let parsed = EncodedImage::from_data_url("data:;base64,AAAA");
        assert_eq!(parsed.mime_type, FALLBACK_MIME_TYPE);
        assert_eq!(parsed.data, "AAAA");
    }

    #[test]
    fn test_invalid_base64_is_an_attachment_error() {
        let image = EncodedImage::new("image/png", "not base64 !!");
        assert!(matches!(
            image.to_bytes(),
            Err(AttachmentError::InvalidEncoding(_))
        ));
    }

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Model).unwrap(), "\"model\"");
    }
}
