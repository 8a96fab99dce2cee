use crate::models::{ChatMessage, ChatStep};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

pub const MAX_MESSAGE_CHARS: usize = 8000;

fn validate_messages(messages: &[ChatMessage]) -> Result<(), ValidationError> {
    if messages.is_empty() {
        return Err(ValidationError::new("messages_empty"));
    }
    if messages
        .iter()
        .any(|m| m.content.trim().is_empty() || m.content.chars().count() > MAX_MESSAGE_CHARS)
    {
        return Err(ValidationError::new("message_length"));
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChatRequest {
    pub exhibition_id: Option<String>,

    #[serde(default = "default_step")]
    pub step: ChatStep,

    #[validate(custom(function = "validate_messages"))]
    pub messages: Vec<ChatMessage>,
}

fn default_step() -> ChatStep {
    ChatStep::Title
}

/// Payload of the final `done` event.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ChatDone {
    pub input_tokens: i32,
    pub output_tokens: i32,
    pub finish_reason: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatErrorEvent {
    pub error: String,
}
