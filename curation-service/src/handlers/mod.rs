pub mod admin;
pub mod artworks;
pub mod auth;
pub mod chat;
pub mod contact;
pub mod content;
pub mod exhibitions;
pub mod generation;
pub mod health;
pub mod notices;

use crate::models::{ChatStep, Exhibition, ProgressSnapshot};
use crate::services::metrics;
use crate::services::providers::{CompletionRequest, ProviderResponse};
use crate::startup::AppState;
use axum::{
    Json,
    body::Bytes,
    extract::{FromRequest, Request},
};
use serde::de::DeserializeOwned;
use service_core::error::AppError;
use std::time::Instant;

/// JSON body that may be left out entirely. An empty body yields
/// `T::default()`; anything else must parse as `T` or the request is a 400.
pub struct OptionalJson<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for OptionalJson<T>
where
    T: DeserializeOwned + Default,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| AppError::bad_request(e.body_text()))?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self(T::default()));
        }
        let Json(value) =
            Json::<T>::from_bytes(&bytes).map_err(|e| AppError::bad_request(e.body_text()))?;
        Ok(Self(value))
    }
}

/// Fetch an exhibition the caller may look at. Private exhibitions of other
/// users are reported as missing.
pub(crate) async fn load_viewable(
    state: &AppState,
    exhibition_id: &str,
    viewer: Option<&str>,
) -> Result<Exhibition, AppError> {
    state
        .store
        .find_exhibition(exhibition_id)
        .await?
        .filter(|e| e.can_view(viewer))
        .ok_or_else(|| AppError::not_found("Exhibition not found"))
}

/// Fetch an exhibition the caller owns: 404 when missing, 403 when owned by
/// someone else.
pub(crate) async fn load_owned(
    state: &AppState,
    exhibition_id: &str,
    user_id: &str,
) -> Result<Exhibition, AppError> {
    let exhibition = state
        .store
        .find_exhibition(exhibition_id)
        .await?
        .ok_or_else(|| AppError::not_found("Exhibition not found"))?;

    if !exhibition.is_owned_by(user_id) {
        tracing::warn!(
            exhibition_id = %exhibition_id,
            user_id = %user_id,
            "Rejected modification of another user's exhibition"
        );
        return Err(AppError::forbidden("You do not own this exhibition"));
    }
    Ok(exhibition)
}

/// Reject entering `step` before the exhibition has what the step builds on.
pub(crate) async fn ensure_step(
    state: &AppState,
    exhibition: &Exhibition,
    step: ChatStep,
) -> Result<(), AppError> {
    let progress = ProgressSnapshot {
        has_title: exhibition.has_title(),
        content_blocks: match step {
            ChatStep::Poster => state.store.list_content(&exhibition.id).await?.len(),
            _ => 0,
        },
        artworks: match step {
            ChatStep::Gallery => state.store.list_artworks(&exhibition.id).await?.len(),
            _ => 0,
        },
    };

    step.requirement(&progress).map_err(|reason| {
        tracing::info!(
            exhibition_id = %exhibition.id,
            step = step.as_str(),
            reason = %reason,
            "Step not yet available"
        );
        AppError::bad_request(reason)
    })
}

/// Run a text completion, recording metrics for `operation`.
pub(crate) async fn complete(
    state: &AppState,
    operation: &'static str,
    request: &CompletionRequest,
) -> Result<ProviderResponse, AppError> {
    let start = Instant::now();
    match state.text.generate(request).await {
        Ok(response) => {
            metrics::record_ai_request(operation, "success", start.elapsed());
            metrics::record_tokens(operation, response.input_tokens, response.output_tokens);
            tracing::info!(
                operation,
                input_tokens = response.input_tokens,
                output_tokens = response.output_tokens,
                duration_ms = start.elapsed().as_millis() as u64,
                "AI completion finished"
            );
            Ok(response)
        }
        Err(e) => {
            metrics::record_ai_request(operation, e.kind(), start.elapsed());
            tracing::error!(operation, error = %e, "AI completion failed");
            Err(e.into())
        }
    }
}
