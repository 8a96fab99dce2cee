use crate::dtos::{LoginRequest, SignUpRequest};
use crate::models::RegistrationNotification;
use crate::services::auth_provider::AuthSession;
use crate::startup::AppState;
use axum::{Json, extract::State, http::StatusCode};
use service_core::error::AppError;
use validator::Validate;

pub async fn sign_up(
    State(state): State<AppState>,
    Json(payload): Json<SignUpRequest>,
) -> Result<(StatusCode, Json<AuthSession>), AppError> {
    payload.validate()?;

    let display_name = payload
        .display_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty());

    let session = state
        .auth
        .sign_up(&payload.email, &payload.password, display_name)
        .await?;

    let notification = RegistrationNotification::new(
        session.user.id.clone(),
        session
            .user
            .email
            .clone()
            .unwrap_or_else(|| payload.email.clone()),
        display_name.map(str::to_string),
    );
    // The account already exists at the provider; a lost notification only
    // costs the admins a heads-up.
    if let Err(e) = state.store.insert_registration(&notification).await {
        tracing::error!(user_id = %session.user.id, error = %e, "Failed to record registration notification");
    }

    tracing::info!(user_id = %session.user.id, "User signed up");
    Ok((StatusCode::CREATED, Json(session)))
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthSession>, AppError> {
    payload.validate()?;

    let session = state.auth.sign_in(&payload.email, &payload.password).await.map_err(|e| {
        tracing::info!(error = %e, "Login failed");
        e
    })?;

    tracing::info!(user_id = %session.user.id, "User logged in");
    Ok(Json(session))
}
