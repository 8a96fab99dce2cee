//! AI provider abstractions and implementations.
//!
//! Text, vision and image generation sit behind traits so the handlers can
//! run against Gemini/Imagen in production and deterministic mocks in tests.

pub mod gemini;
pub mod imagen;
pub mod mock;

use crate::models::ChatMessage;
use async_trait::async_trait;
use service_core::error::AppError;
use std::pin::Pin;
use thiserror::Error;
use tokio_stream::Stream;

/// Error type for provider operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Content filtered")]
    ContentFiltered,

    #[error("Network error: {0}")]
    NetworkError(String),
}

impl ProviderError {
    /// Short label used in metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderError::NotConfigured(_) => "not_configured",
            ProviderError::ApiError(_) => "api_error",
            ProviderError::InvalidRequest(_) => "invalid_request",
            ProviderError::RateLimited => "rate_limited",
            ProviderError::ContentFiltered => "content_filtered",
            ProviderError::NetworkError(_) => "network_error",
        }
    }
}

impl From<ProviderError> for AppError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::RateLimited => AppError::TooManyRequests(
                "The AI provider is busy, please retry shortly".to_string(),
                Some(30),
            ),
            ProviderError::ContentFiltered => {
                AppError::bad_request("The request was blocked by the AI provider's safety filters")
            }
            ProviderError::InvalidRequest(msg) => AppError::bad_request(msg),
            other => AppError::BadGateway(other.to_string()),
        }
    }
}

/// Reason why generation stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Complete,
    Length,
    ContentFilter,
    Error,
}

impl FinishReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FinishReason::Complete => "complete",
            FinishReason::Length => "length",
            FinishReason::ContentFilter => "content_filter",
            FinishReason::Error => "error",
        }
    }

    pub(crate) fn from_gemini(reason: Option<&str>) -> Self {
        match reason {
            Some("MAX_TOKENS") => FinishReason::Length,
            Some("SAFETY") | Some("PROHIBITED_CONTENT") | Some("BLOCKLIST") => {
                FinishReason::ContentFilter
            }
            _ => FinishReason::Complete,
        }
    }
}

/// Result of a non-streaming completion.
#[derive(Debug, Clone)]
pub struct ProviderResponse {
    pub text: String,
    pub input_tokens: i32,
    pub output_tokens: i32,
    pub finish_reason: FinishReason,
}

/// Stream chunk for streaming responses.
#[derive(Debug, Clone)]
pub enum StreamChunk {
    Text(String),

    /// Final completion with usage stats.
    Complete {
        input_tokens: i32,
        output_tokens: i32,
        finish_reason: FinishReason,
    },
}

pub type ProviderStream = Pin<Box<dyn Stream<Item = Result<StreamChunk, ProviderError>> + Send>>;

/// Generation parameters for AI requests.
#[derive(Debug, Clone, Default)]
pub struct GenerationParams {
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub max_tokens: Option<i32>,
    /// Ask the model for a JSON reply.
    pub json_output: bool,
}

impl GenerationParams {
    pub fn json() -> Self {
        Self {
            json_output: true,
            ..Default::default()
        }
    }

    pub fn creative() -> Self {
        Self {
            temperature: Some(0.9),
            ..Default::default()
        }
    }
}

/// A system instruction plus the conversation to complete.
#[derive(Debug, Clone, Default)]
pub struct CompletionRequest {
    pub system: Option<String>,
    pub messages: Vec<ChatMessage>,
    pub params: GenerationParams,
}

impl CompletionRequest {
    /// Single-turn request.
    pub fn single(system: impl Into<String>, prompt: impl Into<String>, params: GenerationParams) -> Self {
        Self {
            system: Some(system.into()),
            messages: vec![ChatMessage::user(prompt)],
            params,
        }
    }

    /// Content of the last user message, if any.
    pub fn last_user_message(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == crate::models::ChatRole::User)
            .map(|m| m.content.as_str())
    }
}

/// Raw image handed to a vision model.
#[derive(Debug, Clone)]
pub struct ImageInput {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Image produced by an image model.
#[derive(Debug, Clone)]
pub struct GeneratedImage {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Trait for text/JSON generation providers (e.g., Gemini).
#[async_trait]
pub trait TextProvider: Send + Sync {
    async fn generate(&self, request: &CompletionRequest) -> Result<ProviderResponse, ProviderError>;

    async fn generate_stream(&self, request: &CompletionRequest) -> Result<ProviderStream, ProviderError>;

    async fn health_check(&self) -> Result<(), ProviderError>;
}

/// Trait for image understanding providers.
#[async_trait]
pub trait VisionProvider: Send + Sync {
    async fn describe(&self, prompt: &str, image: &ImageInput) -> Result<ProviderResponse, ProviderError>;
}

/// Trait for image generation providers (e.g., Imagen).
#[async_trait]
pub trait ImageProvider: Send + Sync {
    async fn generate_image(
        &self,
        prompt: &str,
        aspect_ratio: &str,
    ) -> Result<GeneratedImage, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn provider_errors_map_to_http_statuses() {
        assert_eq!(
            AppError::from(ProviderError::RateLimited).status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            AppError::from(ProviderError::ContentFiltered).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::from(ProviderError::InvalidRequest("bad".into())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::from(ProviderError::NetworkError("reset".into())).status(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn gemini_finish_reasons() {
        assert_eq!(FinishReason::from_gemini(Some("STOP")), FinishReason::Complete);
        assert_eq!(FinishReason::from_gemini(Some("MAX_TOKENS")), FinishReason::Length);
        assert_eq!(
            FinishReason::from_gemini(Some("SAFETY")),
            FinishReason::ContentFilter
        );
        assert_eq!(FinishReason::from_gemini(None), FinishReason::Complete);
    }

    #[test]
    fn last_user_message_skips_assistant_turns() {
        let request = CompletionRequest {
            system: None,
            messages: vec![
                ChatMessage::user("first"),
                ChatMessage::user("second"),
                ChatMessage::assistant("reply"),
            ],
            params: GenerationParams::default(),
        };
        assert_eq!(request.last_user_message(), Some("second"));
    }
}
