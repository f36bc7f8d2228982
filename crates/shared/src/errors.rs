//! Error types for the assistant flow.

use std::path::PathBuf;
use std::time::Duration;

/// Rejections of a user action. None of these change the conversation.
#[derive(Debug, thiserror::Error)]
pub enum AssistantError {
    #[error("Nothing to send: add a message or attach an image")]
    EmptyTurn,

    #[error("A request is already in progress")]
    Busy,

    #[error(transparent)]
    Attachment(#[from] AttachmentError),
}

/// Failures while turning a picked file into a sendable image.
#[derive(Debug, thiserror::Error)]
pub enum AttachmentError {
    #[error("The selected file is empty")]
    Empty,

    #[error("Could not read {}: {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("The selected file is not a supported image")]
    UnsupportedFormat,

    #[error("The image could not be decoded: {0}")]
    Corrupt(String),

    #[error("Invalid image encoding: {0}")]
    InvalidEncoding(String),
}

/// Failures of the remote generation call. They never leave the adapter;
/// they become the text of a model turn.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    NotConfigured(String),

    #[error("request failed: {0}")]
    Transport(String),

    #[error("request timed out after {after:?}")]
    Timeout { after: Duration },

    #[error("unauthorized ({status}): {body}")]
    Unauthorized { status: u16, body: String },

    #[error("service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unexpected response: {0}")]
    Decode(String),
}

impl ServiceError {
    /// Worth one more attempt: network trouble, timeouts, throttling and
    /// server-side errors.
    pub fn is_transient(&self) -> bool {
        match self {
            ServiceError::Transport(_) | ServiceError::Timeout { .. } => true,
            ServiceError::Status { status, .. } => *status == 429 || *status >= 500,
            ServiceError::NotConfigured(_)
            | ServiceError::Unauthorized { .. }
            | ServiceError::Decode(_) => false,
        }
    }
}
