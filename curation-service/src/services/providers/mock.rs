//! Mock provider implementations for testing and offline demos.

use super::{
    CompletionRequest, FinishReason, GeneratedImage, ImageInput, ImageProvider, ProviderError,
    ProviderResponse, ProviderStream, StreamChunk, TextProvider, VisionProvider,
};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// Mock text provider.
///
/// Replies queued with [`MockTextProvider::push_reply`] are returned in order;
/// once the queue is empty it echoes the last user message. Every request is
/// recorded for inspection. [`MockTextProvider::fail_next_stream`] makes the
/// next stream break off with a network error after its first chunk.
pub struct MockTextProvider {
    enabled: bool,
    replies: Mutex<VecDeque<String>>,
    requests: Mutex<Vec<CompletionRequest>>,
    fail_stream: AtomicBool,
}

impl MockTextProvider {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            replies: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            fail_stream: AtomicBool::new(false),
        }
    }

    pub fn fail_next_stream(&self) {
        self.fail_stream.store(true, Ordering::SeqCst);
    }

    pub fn push_reply(&self, reply: impl Into<String>) {
        if let Ok(mut replies) = self.replies.lock() {
            replies.push_back(reply.into());
        }
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    fn next_reply(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
        if !self.enabled {
            return Err(ProviderError::NotConfigured(
                "Mock text provider not enabled".to_string(),
            ));
        }
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        let scripted = self.replies.lock().ok().and_then(|mut r| r.pop_front());
        Ok(scripted.unwrap_or_else(|| {
            format!(
                "Mock response for: {}",
                request.last_user_message().unwrap_or_default()
            )
        }))
    }
}

fn estimate_tokens(text: &str) -> i32 {
    (text.len() / 4) as i32
}

#[async_trait]
impl TextProvider for MockTextProvider {
    async fn generate(&self, request: &CompletionRequest) -> Result<ProviderResponse, ProviderError> {
        let text = self.next_reply(request)?;
        Ok(ProviderResponse {
            input_tokens: estimate_tokens(request.last_user_message().unwrap_or_default()),
            output_tokens: estimate_tokens(&text),
            text,
            finish_reason: FinishReason::Complete,
        })
    }

    async fn generate_stream(&self, request: &CompletionRequest) -> Result<ProviderStream, ProviderError> {
        let text = self.next_reply(request)?;
        let input_tokens = estimate_tokens(request.last_user_message().unwrap_or_default());
        let output_tokens = estimate_tokens(&text);

        let mut chunks: Vec<Result<StreamChunk, ProviderError>> = text
            .split_inclusive(' ')
            .map(|word| Ok(StreamChunk::Text(word.to_string())))
            .collect();

        if self.fail_stream.swap(false, Ordering::SeqCst) {
            chunks.truncate(1);
            chunks.push(Err(ProviderError::NetworkError("connection reset".to_string())));
            return Ok(Box::pin(tokio_stream::iter(chunks)));
        }

        chunks.push(Ok(StreamChunk::Complete {
            input_tokens,
            output_tokens,
            finish_reason: FinishReason::Complete,
        }));

        Ok(Box::pin(tokio_stream::iter(chunks)))
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        if self.enabled {
            Ok(())
        } else {
            Err(ProviderError::NotConfigured(
                "Mock text provider not enabled".to_string(),
            ))
        }
    }
}

/// Mock vision provider returning a fixed reply.
pub struct MockVisionProvider {
    reply: String,
}

impl MockVisionProvider {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
        }
    }
}

impl Default for MockVisionProvider {
    fn default() -> Self {
        Self::new(
            r#"{"title":"Untitled study","description":"A muted composition of overlapping planes.","medium":"oil on canvas","mood":"contemplative","keywords":["abstraction","planes"]}"#,
        )
    }
}

#[async_trait]
impl VisionProvider for MockVisionProvider {
    async fn describe(&self, _prompt: &str, image: &ImageInput) -> Result<ProviderResponse, ProviderError> {
        if image.bytes.is_empty() {
            return Err(ProviderError::InvalidRequest("Image is empty".to_string()));
        }
        Ok(ProviderResponse {
            text: self.reply.clone(),
            input_tokens: 258,
            output_tokens: estimate_tokens(&self.reply),
            finish_reason: FinishReason::Complete,
        })
    }
}

/// Mock image provider producing a tiny PNG header.
pub struct MockImageProvider {
    enabled: bool,
}

impl MockImageProvider {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

#[async_trait]
impl ImageProvider for MockImageProvider {
    async fn generate_image(
        &self,
        prompt: &str,
        _aspect_ratio: &str,
    ) -> Result<GeneratedImage, ProviderError> {
        if !self.enabled {
            return Err(ProviderError::NotConfigured(
                "Mock image provider not enabled".to_string(),
            ));
        }
        if prompt.trim().is_empty() {
            return Err(ProviderError::InvalidRequest("Prompt is empty".to_string()));
        }
        Ok(GeneratedImage {
            mime_type: "image/png".to_string(),
            bytes: vec![0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::providers::GenerationParams;
    use futures::StreamExt;

    #[tokio::test]
    async fn scripted_replies_are_returned_in_order() {
        let provider = MockTextProvider::new(true);
        provider.push_reply("first");
        provider.push_reply("second");

        let request = CompletionRequest::single("system", "hello", GenerationParams::default());
        assert_eq!(provider.generate(&request).await.unwrap().text, "first");
        assert_eq!(provider.generate(&request).await.unwrap().text, "second");
        assert_eq!(
            provider.generate(&request).await.unwrap().text,
            "Mock response for: hello"
        );
        assert_eq!(provider.requests().len(), 3);
    }

    #[tokio::test]
    async fn stream_ends_with_completion() {
        let provider = MockTextProvider::new(true);
        provider.push_reply("two words");

        let request = CompletionRequest::single("system", "hi", GenerationParams::default());
        let chunks: Vec<_> = provider
            .generate_stream(&request)
            .await
            .unwrap()
            .collect()
            .await;

        assert_eq!(chunks.len(), 3);
        assert!(matches!(&chunks[0], Ok(StreamChunk::Text(t)) if t == "two "));
        assert!(matches!(chunks[2], Ok(StreamChunk::Complete { .. })));
    }

    #[tokio::test]
    async fn disabled_provider_fails() {
        let provider = MockTextProvider::new(false);
        let request = CompletionRequest::single("system", "hi", GenerationParams::default());
        assert!(provider.generate(&request).await.is_err());
        assert!(provider.health_check().await.is_err());
    }
}
