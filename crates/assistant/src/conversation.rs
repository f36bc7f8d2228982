//! Append-only conversation transcript with the in-flight and reasoning flags.

use chrono::Utc;
use shared::chat::{ChatTurn, EncodedImage, Role, TurnId};
use shared::errors::AssistantError;

pub const WELCOME_MESSAGE: &str = "Hello! I am your Nexus AI Warehouse Assistant. I can help you identify products from images, analyze stock levels, or answer complex logistical questions. How can I assist you today?";

#[derive(Debug, Clone)]
pub struct ConversationStore {
    turns: Vec<ChatTurn>,
    pending: bool,
    reasoning_mode: bool,
    next_id: u64,
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::seed()
    }
}

impl ConversationStore {
    /// New session: a single welcome turn, nothing in flight.
    pub fn seed() -> Self {
        let mut store = Self {
            turns: Vec::new(),
            pending: false,
            reasoning_mode: false,
            next_id: 1,
        };
        store.push(Role::Model, WELCOME_MESSAGE.to_string(), None, None);
        store
    }

    fn push(
        &mut self,
        role: Role,
        text: String,
        image: Option<EncodedImage>,
        reasoning_used: Option<bool>,
    ) -> &ChatTurn {
        let id = TurnId(self.next_id);
        self.next_id += 1;
        self.turns.push(ChatTurn {
            id,
            role,
            text,
            image,
            reasoning_used,
            created_at: Utc::now(),
        });
        &self.turns[self.turns.len() - 1]
    }

    /// Append the user's message and mark a request as in flight.
    pub fn append_user(
        &mut self,
        text: &str,
        image: Option<EncodedImage>,
    ) -> Result<&ChatTurn, AssistantError> {
        if text.trim().is_empty() && image.is_none() {
            return Err(AssistantError::EmptyTurn);
        }
        self.pending = true;
        Ok(self.push(Role::User, text.to_string(), image, None))
    }

    /// Append the answer (or error text) and clear the in-flight flag.
    pub fn append_model(&mut self, text: String, reasoning_used: bool) -> &ChatTurn {
        self.pending = false;
        self.push(Role::Model, text, None, Some(reasoning_used))
    }

    pub fn toggle_reasoning_mode(&mut self) -> bool {
        self.reasoning_mode = !self.reasoning_mode;
        self.reasoning_mode
    }

    pub fn set_reasoning_mode(&mut self, on: bool) {
        self.reasoning_mode = on;
    }

    pub fn reasoning_mode(&self) -> bool {
        self.reasoning_mode
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    pub fn last_turn(&self) -> Option<&ChatTurn> {
        self.turns.last()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}
