use crate::dtos::{ChatDone, ChatErrorEvent, ChatRequest};
use crate::handlers::{ensure_step, load_owned};
use crate::middleware::AuthUser;
use crate::models::{ChatMessage, ChatRole};
use crate::services::metrics;
use crate::services::prompts::{chat_prompt, rag_query};
use crate::services::providers::{
    CompletionRequest, GenerationParams, ProviderError, StreamChunk,
};
use crate::startup::AppState;
use axum::{
    Json,
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::StreamExt;
use service_core::error::AppError;
use std::convert::Infallible;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use validator::Validate;

type EventSender = mpsc::Sender<Result<Event, Infallible>>;

/// Keep the most recent `limit` messages, starting at a user turn.
pub(crate) fn trim_history(messages: Vec<ChatMessage>, limit: usize) -> Vec<ChatMessage> {
    let skip = messages.len().saturating_sub(limit.max(1));
    messages
        .into_iter()
        .skip(skip)
        .skip_while(|m| m.role == ChatRole::Assistant)
        .collect()
}

fn user_facing_error(error: &ProviderError) -> &'static str {
    match error {
        ProviderError::RateLimited => "The assistant is busy, please try again shortly",
        ProviderError::ContentFiltered => "The request was blocked by the AI provider's safety filters",
        _ => "The assistant is unavailable, please try again",
    }
}

fn error_event(error: &ProviderError) -> Event {
    let payload = ChatErrorEvent {
        error: user_facing_error(error).to_string(),
    };
    Event::default()
        .event("error")
        .json_data(payload)
        .unwrap_or_else(|_| Event::default().event("error").data("error"))
}

/// Conversation with the curation assistant, streamed back as server-sent
/// events: `token` for each text chunk, then `done` or `error`.
pub async fn chat(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<ChatRequest>,
) -> Result<Sse<ReceiverStream<Result<Event, Infallible>>>, AppError> {
    payload.validate()?;

    let exhibition = match payload.exhibition_id.as_deref() {
        Some(id) => {
            let exhibition = load_owned(&state, id, user.id()).await?;
            ensure_step(&state, &exhibition, payload.step).await?;
            Some(exhibition)
        }
        None => None,
    };

    let messages = trim_history(payload.messages, state.config.chat_history_limit);
    if messages.is_empty() {
        return Err(AppError::bad_request("The conversation needs a user message"));
    }

    let mut request = CompletionRequest {
        system: None,
        messages,
        params: GenerationParams::creative(),
    };
    let last_user = request.last_user_message().unwrap_or_default().to_string();
    let terms = rag_query(exhibition.as_ref(), &[last_user.as_str()]);
    let rag = state
        .library
        .retrieve(&terms, state.config.rag.max_passages)
        .render(state.config.rag.max_chars);
    request.system = Some(chat_prompt(payload.step, exhibition.as_ref(), &rag));

    tracing::info!(
        user_id = %user.id(),
        exhibition_id = exhibition.as_ref().map(|e| e.id.as_str()).unwrap_or("-"),
        step = payload.step.as_str(),
        messages = request.messages.len(),
        "Starting chat stream"
    );

    let (tx, rx) = mpsc::channel(32);
    tokio::spawn(stream_reply(state, request, tx));

    Ok(Sse::new(ReceiverStream::new(rx)).keep_alive(KeepAlive::default()))
}

async fn stream_reply(state: AppState, request: CompletionRequest, tx: EventSender) {
    let start = Instant::now();

    let mut provider_stream = match state.text.generate_stream(&request).await {
        Ok(stream) => stream,
        Err(e) => {
            metrics::record_ai_request("chat", e.kind(), start.elapsed());
            tracing::error!(error = %e, "Failed to start chat stream");
            let _ = tx.send(Ok(error_event(&e))).await;
            return;
        }
    };

    while let Some(chunk) = provider_stream.next().await {
        let event = match chunk {
            Ok(StreamChunk::Text(text)) => {
                // SSE framing cannot carry bare carriage returns.
                Event::default().event("token").data(text.replace('\r', ""))
            }
            Ok(StreamChunk::Complete {
                input_tokens,
                output_tokens,
                finish_reason,
            }) => {
                metrics::record_ai_request("chat", "success", start.elapsed());
                metrics::record_tokens("chat", input_tokens, output_tokens);
                tracing::info!(
                    input_tokens,
                    output_tokens,
                    finish_reason = finish_reason.as_str(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Chat stream completed"
                );
                let done = ChatDone {
                    input_tokens,
                    output_tokens,
                    finish_reason: finish_reason.as_str().to_string(),
                };
                match Event::default().event("done").json_data(done) {
                    Ok(event) => event,
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to encode done event");
                        break;
                    }
                }
            }
            Err(e) => {
                metrics::record_ai_request("chat", e.kind(), start.elapsed());
                tracing::error!(error = %e, "Chat stream failed");
                let _ = tx.send(Ok(error_event(&e))).await;
                break;
            }
        };

        if tx.send(Ok(event)).await.is_err() {
            tracing::debug!("Chat client disconnected");
            break;
        }
    }
}
