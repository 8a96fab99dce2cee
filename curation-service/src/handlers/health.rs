use crate::services::metrics::get_metrics;
use crate::startup::AppState;
use axum::{Json, extract::State, http::header, response::IntoResponse};
use serde_json::{Value, json};
use service_core::error::AppError;

pub async fn health_check(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    state.store.health_check().await.map_err(|e| {
        tracing::error!(error = %e, "Store health check failed");
        AppError::ServiceUnavailable
    })?;

    Ok(Json(json!({
        "status": "healthy",
        "service": "curation-service",
        "store": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    })))
}

/// Ready once both the store and the text model answer.
pub async fn readiness(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    state.store.health_check().await.map_err(|e| {
        tracing::warn!(error = %e, "Store not ready");
        AppError::ServiceUnavailable
    })?;
    state.text.health_check().await.map_err(|e| {
        tracing::warn!(error = %e, "Text provider not ready");
        AppError::ServiceUnavailable
    })?;

    Ok(Json(json!({ "status": "ready" })))
}

pub async fn metrics_endpoint() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        get_metrics(),
    )
}
