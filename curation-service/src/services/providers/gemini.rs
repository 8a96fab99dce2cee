//! Gemini provider implementation.
//!
//! Text generation (plain and SSE streaming) and image understanding through
//! the `generateContent` family of endpoints.

use super::{
    CompletionRequest, FinishReason, GenerationParams, ImageInput, ProviderError,
    ProviderResponse, ProviderStream, StreamChunk, TextProvider, VisionProvider,
};
use crate::models::{ChatMessage, ChatRole};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

/// Gemini API base URL.
pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
}

/// Gemini provider bound to one model. The same type serves text and vision.
pub struct GeminiProvider {
    config: GeminiConfig,
    client: Client,
    base_url: String,
}

impl GeminiProvider {
    pub fn new(config: GeminiConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .map_err(|e| ProviderError::NotConfigured(format!("HTTP client: {}", e)))?;

        Ok(Self {
            config,
            client,
            base_url: GEMINI_API_BASE.to_string(),
        })
    }

    fn api_url(&self, method: &str) -> String {
        format!(
            "{}/models/{}:{}?key={}",
            self.base_url, self.config.model, method, self.config.api_key
        )
    }

    fn build_request(&self, request: &CompletionRequest) -> GenerateContentRequest {
        GenerateContentRequest {
            system_instruction: request.system.as_ref().map(|system| Content {
                role: None,
                parts: vec![ContentPart::Text {
                    text: system.clone(),
                }],
            }),
            contents: request.messages.iter().map(message_to_content).collect(),
            generation_config: Some(build_generation_config(&request.params)),
        }
    }

    async fn post(&self, url: &str, body: &GenerateContentRequest) -> Result<reqwest::Response, ProviderError> {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();

            return Err(match status.as_u16() {
                429 => ProviderError::RateLimited,
                400 => ProviderError::InvalidRequest(format!("Gemini rejected the request: {}", error_text)),
                _ => ProviderError::ApiError(format!("Gemini API error {}: {}", status, error_text)),
            });
        }

        Ok(response)
    }

    async fn generate_content(&self, body: &GenerateContentRequest) -> Result<ProviderResponse, ProviderError> {
        let response = self.post(&self.api_url("generateContent"), body).await?;

        let api_response: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ApiError(format!("Failed to parse response: {}", e)))?;

        into_provider_response(api_response)
    }
}

fn message_to_content(message: &ChatMessage) -> Content {
    let role = match message.role {
        ChatRole::User => "user",
        ChatRole::Assistant => "model",
    };
    Content {
        role: Some(role.to_string()),
        parts: vec![ContentPart::Text {
            text: message.content.clone(),
        }],
    }
}

fn build_generation_config(params: &GenerationParams) -> GenerationConfig {
    GenerationConfig {
        temperature: params.temperature,
        top_p: params.top_p,
        max_output_tokens: params.max_tokens,
        response_mime_type: params
            .json_output
            .then(|| "application/json".to_string()),
    }
}

fn into_provider_response(api_response: GenerateContentResponse) -> Result<ProviderResponse, ProviderError> {
    if let Some(feedback) = &api_response.prompt_feedback {
        if feedback.block_reason.is_some() {
            return Err(ProviderError::ContentFiltered);
        }
    }

    let candidate = api_response.candidates.first();
    let finish_reason =
        FinishReason::from_gemini(candidate.and_then(|c| c.finish_reason.as_deref()));

    if finish_reason == FinishReason::ContentFilter {
        return Err(ProviderError::ContentFiltered);
    }

    let text = candidate.map(candidate_text).unwrap_or_default();
    let usage = api_response.usage_metadata.unwrap_or_default();

    Ok(ProviderResponse {
        text,
        input_tokens: usage.prompt_token_count.unwrap_or(0),
        output_tokens: usage.candidates_token_count.unwrap_or(0),
        finish_reason,
    })
}

fn candidate_text(candidate: &Candidate) -> String {
    candidate
        .content
        .as_ref()
        .map(|content| {
            content
                .parts
                .iter()
                .filter_map(|p| match p {
                    ContentPart::Text { text } => Some(text.as_str()),
                    ContentPart::InlineData { .. } => None,
                })
                .collect::<String>()
        })
        .unwrap_or_default()
}

/// Split complete server-sent events off the front of `buffer`, returning
/// their `data:` payloads. An incomplete trailing event stays in the buffer.
pub(crate) fn drain_sse_events(buffer: &mut Vec<u8>) -> Vec<String> {
    let mut payloads = Vec::new();
    while let Some((event_end, separator)) = event_boundary(buffer) {
        let event: Vec<u8> = buffer.drain(..event_end + separator).collect();
        // Only whole events are decoded, so multibyte characters split
        // across network chunks arrive intact.
        let event = String::from_utf8_lossy(&event[..event_end]);
        let data: Vec<&str> = event
            .lines()
            .filter_map(|line| line.strip_prefix("data:"))
            .map(|d| d.strip_prefix(' ').unwrap_or(d))
            .collect();
        if !data.is_empty() {
            payloads.push(data.join("\n"));
        }
    }
    payloads
}

/// Position and length of the first blank-line separator.
fn event_boundary(buffer: &[u8]) -> Option<(usize, usize)> {
    let lf = buffer.windows(2).position(|w| w == b"\n\n").map(|i| (i, 2));
    let crlf = buffer.windows(4).position(|w| w == b"\r\n\r\n").map(|i| (i, 4));
    match (lf, crlf) {
        (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
        (a, b) => a.or(b),
    }
}

#[async_trait]
impl TextProvider for GeminiProvider {
    async fn generate(&self, request: &CompletionRequest) -> Result<ProviderResponse, ProviderError> {
        tracing::debug!(
            model = %self.config.model,
            messages = request.messages.len(),
            "Sending request to Gemini API"
        );

        self.generate_content(&self.build_request(request)).await
    }

    async fn generate_stream(&self, request: &CompletionRequest) -> Result<ProviderStream, ProviderError> {
        let body = self.build_request(request);
        let url = format!("{}&alt=sse", self.api_url("streamGenerateContent"));

        tracing::debug!(
            model = %self.config.model,
            messages = request.messages.len(),
            "Starting streaming request to Gemini API"
        );

        let response = self.post(&url, &body).await?;
        let (tx, rx) = mpsc::channel(32);

        tokio::spawn(async move {
            let mut stream = response.bytes_stream();
            let mut buffer: Vec<u8> = Vec::new();
            let mut input_tokens = 0i32;
            let mut output_tokens = 0i32;
            let mut finish_reason = FinishReason::Complete;

            while let Some(chunk_result) = stream.next().await {
                let chunk = match chunk_result {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        let _ = tx.send(Err(ProviderError::NetworkError(e.to_string()))).await;
                        return;
                    }
                };
                buffer.extend_from_slice(&chunk);

                for data in drain_sse_events(&mut buffer) {
                    let Ok(event) = serde_json::from_str::<GenerateContentResponse>(&data) else {
                        tracing::debug!(payload = %data, "Skipping unparseable SSE payload");
                        continue;
                    };

                    if let Some(usage) = &event.usage_metadata {
                        input_tokens = usage.prompt_token_count.unwrap_or(input_tokens);
                        output_tokens = usage.candidates_token_count.unwrap_or(output_tokens);
                    }

                    if let Some(candidate) = event.candidates.first() {
                        let text = candidate_text(candidate);
                        if !text.is_empty() && tx.send(Ok(StreamChunk::Text(text))).await.is_err() {
                            // Receiver dropped: the client went away.
                            return;
                        }
                        if candidate.finish_reason.is_some() {
                            finish_reason =
                                FinishReason::from_gemini(candidate.finish_reason.as_deref());
                        }
                    }
                }
            }

            let _ = tx
                .send(Ok(StreamChunk::Complete {
                    input_tokens,
                    output_tokens,
                    finish_reason,
                }))
                .await;
        });

        Ok(Box::pin(ReceiverStream::new(rx)) as ProviderStream)
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        if self.config.api_key.is_empty() {
            return Err(ProviderError::NotConfigured(
                "Gemini API key not configured".to_string(),
            ));
        }

        let url = format!("{}/models?key={}", self.base_url, self.config.api_key);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(ProviderError::ApiError(format!(
                "Health check failed: {}",
                response.status()
            )))
        }
    }
}

#[async_trait]
impl VisionProvider for GeminiProvider {
    async fn describe(&self, prompt: &str, image: &ImageInput) -> Result<ProviderResponse, ProviderError> {
        if image.bytes.is_empty() {
            return Err(ProviderError::InvalidRequest("Image is empty".to_string()));
        }

        let body = GenerateContentRequest {
            system_instruction: None,
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![
                    ContentPart::InlineData {
                        inline_data: InlineData {
                            mime_type: image.mime_type.clone(),
                            data: BASE64.encode(&image.bytes),
                        },
                    },
                    ContentPart::Text {
                        text: prompt.to_string(),
                    },
                ],
            }],
            generation_config: Some(build_generation_config(&GenerationParams::json())),
        };

        tracing::debug!(
            model = %self.config.model,
            image_bytes = image.bytes.len(),
            "Sending vision request to Gemini API"
        );

        self.generate_content(&body).await
    }
}

// Gemini API request/response types

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<ContentPart>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum ContentPart {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    prompt_token_count: Option<i32>,
    candidates_token_count: Option<i32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_sse_events_keeps_partial_event() {
        let mut buffer = b"data: {\"a\":1}\n\ndata: {\"b\"".to_vec();
        let events = drain_sse_events(&mut buffer);
        assert_eq!(events, vec!["{\"a\":1}".to_string()]);
        assert_eq!(buffer, b"data: {\"b\"");
    }

    #[test]
    fn drain_sse_events_handles_crlf() {
        let mut buffer = b"data: one\r\n\r\ndata: two\r\n\r\n".to_vec();
        assert_eq!(drain_sse_events(&mut buffer), vec!["one", "two"]);
        assert!(buffer.is_empty());
    }

    #[test]
    fn drain_sse_events_joins_character_split_across_chunks() {
        let event = "data: {\"text\":\"전시\"}\n\n".as_bytes();
        let split = event.iter().position(|&b| b >= 0x80).unwrap() + 1;

        let mut buffer = event[..split].to_vec();
        assert!(drain_sse_events(&mut buffer).is_empty());

        buffer.extend_from_slice(&event[split..]);
        assert_eq!(drain_sse_events(&mut buffer), vec!["{\"text\":\"전시\"}"]);
        assert!(buffer.is_empty());
    }

    #[test]
    fn response_text_concatenates_parts() {
        let raw = r#"{
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "Hello, "}, {"text": "curator"}]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 12, "candidatesTokenCount": 3}
        }"#;
        let parsed: GenerateContentResponse = serde_json::from_str(raw).unwrap();
        let response = into_provider_response(parsed).unwrap();
        assert_eq!(response.text, "Hello, curator");
        assert_eq!(response.input_tokens, 12);
        assert_eq!(response.output_tokens, 3);
    }

    #[test]
    fn safety_finish_is_content_filtered() {
        let raw = r#"{"candidates": [{"finishReason": "SAFETY"}]}"#;
        let parsed: GenerateContentResponse = serde_json::from_str(raw).unwrap();
        assert!(matches!(
            into_provider_response(parsed),
            Err(ProviderError::ContentFiltered)
        ));
    }

    #[test]
    fn blocked_prompt_is_content_filtered() {
        let raw = r#"{"promptFeedback": {"blockReason": "OTHER"}}"#;
        let parsed: GenerateContentResponse = serde_json::from_str(raw).unwrap();
        assert!(matches!(
            into_provider_response(parsed),
            Err(ProviderError::ContentFiltered)
        ));
    }

    #[test]
    fn assistant_messages_use_model_role() {
        let content = message_to_content(&ChatMessage::assistant("hi"));
        assert_eq!(content.role.as_deref(), Some("model"));
    }
}
