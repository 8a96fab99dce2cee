use crate::dtos::{ContactRequest, ContactResponse};
use crate::models::ContactInquiry;
use crate::startup::AppState;
use axum::{Json, extract::State, http::StatusCode};
use service_core::error::AppError;
use validator::Validate;

pub async fn submit_inquiry(
    State(state): State<AppState>,
    Json(payload): Json<ContactRequest>,
) -> Result<(StatusCode, Json<ContactResponse>), AppError> {
    payload.validate()?;

    let name = payload.name.trim().to_string();
    let message = payload.message.trim().to_string();
    if name.is_empty() || message.is_empty() {
        return Err(AppError::bad_request("Name and message are required"));
    }

    let inquiry = ContactInquiry::new(
        name,
        payload.email.trim().to_string(),
        payload
            .subject
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()),
        message,
    );
    state.store.insert_inquiry(&inquiry).await?;

    tracing::info!(inquiry_id = %inquiry.id, "Contact inquiry received");
    Ok((
        StatusCode::CREATED,
        Json(ContactResponse {
            success: true,
            id: inquiry.id,
        }),
    ))
}
