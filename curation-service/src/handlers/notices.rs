use crate::dtos::NoticeResponse;
use crate::middleware::AuthUser;
use crate::models::notice::sort_notices;
use crate::startup::AppState;
use axum::{
    Json,
    extract::{Path, State},
};
use service_core::error::AppError;

pub async fn list_notices(
    State(state): State<AppState>,
) -> Result<Json<Vec<NoticeResponse>>, AppError> {
    let mut notices = state.store.list_notices(false).await?;
    sort_notices(&mut notices);
    Ok(Json(notices.into_iter().map(Into::into).collect()))
}

/// Unpublished notices are only visible to administrators.
pub async fn get_notice(
    State(state): State<AppState>,
    viewer: Option<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<NoticeResponse>, AppError> {
    let is_admin = viewer.as_ref().is_some_and(|user| user.0.is_admin());
    let notice = state
        .store
        .find_notice(&id)
        .await?
        .filter(|notice| notice.published || is_admin)
        .ok_or_else(|| AppError::not_found("Notice not found"))?;
    Ok(Json(notice.into()))
}
