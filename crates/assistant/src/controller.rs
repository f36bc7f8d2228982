//! Assistant controller: encoder -> store -> adapter -> store.
//!
//! State is `idle` or `waiting` (the store's pending flag). A send moves
//! idle -> waiting and appends the user turn before the adapter is called;
//! the resolution appends exactly one model turn and returns to idle. Sends
//! while waiting, or with neither text nor image, change nothing.

use providers::ResponseAdapter;
use shared::chat::{ChatTurn, EncodedImage};
use shared::errors::AssistantError;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::attachment::{self, Attachment, PendingAttachment};
use crate::conversation::ConversationStore;
use crate::worker::{spawn_generation, PendingReply};

/// Prompt used when the user sends an image without any text.
pub const DEFAULT_IMAGE_PROMPT: &str = "Analyze this image.";

/// Everything the adapter needs for one send, captured at dispatch time.
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatch {
    pub prompt: String,
    pub image: Option<EncodedImage>,
    pub reasoning_mode: bool,
}

impl Dispatch {
    pub async fn execute(&self, adapter: &ResponseAdapter) -> String {
        adapter
            .send(&self.prompt, self.image.as_ref(), self.reasoning_mode)
            .await
    }
}

struct InFlight {
    reasoning_mode: bool,
    reply: Option<PendingReply>,
}

pub struct AssistantController {
    store: ConversationStore,
    attachment: PendingAttachment,
    adapter: Arc<ResponseAdapter>,
    in_flight: Option<InFlight>,
}

impl AssistantController {
    pub fn new(adapter: Arc<ResponseAdapter>) -> Self {
        Self {
            store: ConversationStore::seed(),
            attachment: PendingAttachment::default(),
            adapter,
            in_flight: None,
        }
    }

    pub fn turns(&self) -> &[ChatTurn] {
        self.store.turns()
    }

    pub fn is_pending(&self) -> bool {
        self.store.is_pending()
    }

    pub fn reasoning_mode(&self) -> bool {
        self.store.reasoning_mode()
    }

    pub fn toggle_reasoning_mode(&mut self) -> bool {
        self.store.toggle_reasoning_mode()
    }

    pub fn set_reasoning_mode(&mut self, on: bool) {
        self.store.set_reasoning_mode(on);
    }

    pub fn attachment(&self) -> Option<&Attachment> {
        self.attachment.get()
    }

    pub fn adapter(&self) -> &Arc<ResponseAdapter> {
        &self.adapter
    }

    /// Swap the adapter (e.g. after a settings change). A request already in
    /// flight keeps the adapter it started with.
    pub fn replace_adapter(&mut self, adapter: Arc<ResponseAdapter>) {
        self.adapter = adapter;
    }

    /// True when a send would be accepted right now.
    pub fn can_send(&self, text: &str) -> bool {
        !self.is_pending() && (!text.trim().is_empty() || !self.attachment.is_empty())
    }

    /// The user picked an image file. On failure nothing stays attached.
    pub fn on_attachment_selected(&mut self, path: &Path) -> Result<(), AssistantError> {
        let label = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "image".to_string());
        let result = attachment::encode_file(path);
        self.store_attachment(label, result)
    }

    pub fn on_attachment_bytes(
        &mut self,
        label: impl Into<String>,
        bytes: &[u8],
    ) -> Result<(), AssistantError> {
        let result = attachment::encode_bytes(bytes);
        self.store_attachment(label.into(), result)
    }

    fn store_attachment(
        &mut self,
        label: String,
        result: Result<EncodedImage, shared::errors::AttachmentError>,
    ) -> Result<(), AssistantError> {
        match result {
            Ok(image) => {
                debug!(label = %label, mime = %image.mime_type, "image attached");
                self.attachment.set(Attachment { image, label });
                Ok(())
            }
            Err(e) => {
                warn!(label = %label, error = %e, "attachment rejected");
                self.attachment.clear();
                Err(e.into())
            }
        }
    }

    pub fn on_attachment_cleared(&mut self) {
        self.attachment.clear();
    }

    /// Validate and start a send. Appends the user turn right away and
    /// returns what must be sent to the adapter.
    pub fn on_send_requested(&mut self, text: &str) -> Result<Dispatch, AssistantError> {
        if self.store.is_pending() {
            return Err(AssistantError::Busy);
        }
        if text.trim().is_empty() && self.attachment.is_empty() {
            return Err(AssistantError::EmptyTurn);
        }

        let image = self.attachment.take().map(|a| a.image);
        let reasoning_mode = self.store.reasoning_mode();
        self.store.append_user(text, image.clone())?;

        let prompt = if text.trim().is_empty() && image.is_some() {
            DEFAULT_IMAGE_PROMPT.to_string()
        } else {
            text.to_string()
        };

        self.in_flight = Some(InFlight {
            reasoning_mode,
            reply: None,
        });
        debug!(reasoning_mode, has_image = image.is_some(), "send dispatched");

        Ok(Dispatch {
            prompt,
            image,
            reasoning_mode,
        })
    }

    /// The adapter finished. Appends the model turn stamped with the mode
    /// captured at dispatch. Ignored when nothing is in flight.
    pub fn on_response_resolved(&mut self, text: String) -> Option<&ChatTurn> {
        if !self.store.is_pending() {
            warn!("response arrived with no request in flight; dropped");
            return None;
        }
        Some(self.resolve(text))
    }

    fn resolve(&mut self, text: String) -> &ChatTurn {
        let reasoning_mode = self
            .in_flight
            .take()
            .map(|f| f.reasoning_mode)
            .unwrap_or_else(|| self.store.reasoning_mode());
        self.store.append_model(text, reasoning_mode)
    }

    /// Full round trip on the current task.
    pub async fn send(&mut self, text: &str) -> Result<&ChatTurn, AssistantError> {
        let dispatch = self.on_send_requested(text)?;
        let adapter = Arc::clone(&self.adapter);
        let reply = dispatch.execute(&adapter).await;
        Ok(self.resolve(reply))
    }

    /// Start a send whose adapter call runs on a worker thread. Call
    /// [`poll`](Self::poll) to collect the answer.
    pub fn dispatch_in_background(&mut self, text: &str) -> Result<(), AssistantError> {
        let dispatch = self.on_send_requested(text)?;
        let reply = spawn_generation(dispatch, Arc::clone(&self.adapter));
        if let Some(in_flight) = self.in_flight.as_mut() {
            in_flight.reply = Some(reply);
        }
        Ok(())
    }

    /// Non-blocking check for a background answer.
    pub fn poll(&mut self) -> Option<&ChatTurn> {
        let text = self
            .in_flight
            .as_ref()
            .and_then(|f| f.reply.as_ref())
            .and_then(|reply| reply.try_take())?;
        Some(self.resolve(text))
    }
}
