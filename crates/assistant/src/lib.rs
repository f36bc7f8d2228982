//! Assistant - the chat flow behind the warehouse assistant screen
//!
//! This crate provides:
//! - Image attachment encoding (`attachment`)
//! - The append-only conversation transcript (`conversation`)
//! - The controller enforcing one request at a time (`controller`)
//! - Background dispatch for UI threads (`worker`)

pub mod attachment;
pub mod controller;
pub mod conversation;
pub mod worker;

pub use attachment::{Attachment, PendingAttachment};
pub use controller::{AssistantController, Dispatch, DEFAULT_IMAGE_PROMPT};
pub use conversation::{ConversationStore, WELCOME_MESSAGE};
pub use worker::{spawn_generation, PendingReply, REQUEST_FAILED_MESSAGE};
