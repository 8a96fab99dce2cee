//! Administrator endpoints: contact inquiries, notices and sign-up
//! notifications.

use crate::dtos::admin::{InquiryResponse, RegistrationResponse, UpdateInquiryRequest};
use crate::dtos::{CreateNoticeRequest, NoticeResponse, UpdateNoticeRequest};
use crate::middleware::AdminUser;
use crate::models::{Notice, notice::sort_notices};
use crate::startup::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use service_core::error::AppError;
use validator::Validate;

pub async fn list_inquiries(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<Vec<InquiryResponse>>, AppError> {
    let inquiries = state.store.list_inquiries().await?;
    Ok(Json(inquiries.into_iter().map(Into::into).collect()))
}

pub async fn update_inquiry(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdateInquiryRequest>,
) -> Result<StatusCode, AppError> {
    if !state.store.update_inquiry_status(&id, payload.status).await? {
        return Err(AppError::not_found("Inquiry not found"));
    }
    tracing::info!(inquiry_id = %id, admin_id = %admin.sub, status = ?payload.status, "Inquiry status updated");
    Ok(StatusCode::NO_CONTENT)
}

/// Every notice, drafts included.
pub async fn list_all_notices(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<Vec<NoticeResponse>>, AppError> {
    let mut notices = state.store.list_notices(true).await?;
    sort_notices(&mut notices);
    Ok(Json(notices.into_iter().map(Into::into).collect()))
}

pub async fn create_notice(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(payload): Json<CreateNoticeRequest>,
) -> Result<(StatusCode, Json<NoticeResponse>), AppError> {
    payload.validate()?;

    let notice = Notice::new(
        admin.sub.clone(),
        payload.title.trim().to_string(),
        payload.body,
        payload.pinned,
        payload.published,
    );
    state.store.insert_notice(&notice).await?;

    tracing::info!(notice_id = %notice.id, admin_id = %admin.sub, "Notice created");
    Ok((StatusCode::CREATED, Json(notice.into())))
}

pub async fn update_notice(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdateNoticeRequest>,
) -> Result<Json<NoticeResponse>, AppError> {
    payload.validate()?;

    let mut notice = state
        .store
        .find_notice(&id)
        .await?
        .ok_or_else(|| AppError::not_found("Notice not found"))?;

    if let Some(title) = payload.title {
        notice.title = title.trim().to_string();
    }
    if let Some(body) = payload.body {
        notice.body = body;
    }
    if let Some(pinned) = payload.pinned {
        notice.pinned = pinned;
    }
    if let Some(published) = payload.published {
        notice.published = published;
    }
    notice.updated_at = chrono::Utc::now();

    if !state.store.replace_notice(&notice).await? {
        return Err(AppError::not_found("Notice not found"));
    }

    tracing::info!(notice_id = %notice.id, admin_id = %admin.sub, "Notice updated");
    Ok(Json(notice.into()))
}

pub async fn delete_notice(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    if !state.store.delete_notice(&id).await? {
        return Err(AppError::not_found("Notice not found"));
    }
    tracing::info!(notice_id = %id, admin_id = %admin.sub, "Notice deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_registrations(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<Vec<RegistrationResponse>>, AppError> {
    let registrations = state.store.list_registrations().await?;
    Ok(Json(registrations.into_iter().map(Into::into).collect()))
}

pub async fn mark_registration_read(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    if !state.store.mark_registration_read(&id).await? {
        return Err(AppError::not_found("Registration not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}
