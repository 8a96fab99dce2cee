use crate::dtos::{
    CreateExhibitionRequest, ExhibitionListResponse, ExhibitionResponse, PublicListParams,
    UpdateExhibitionRequest,
};
use crate::handlers::{load_owned, load_viewable};
use crate::middleware::AuthUser;
use crate::models::{Exhibition, exhibition::normalize_keywords};
use crate::startup::AppState;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use service_core::error::AppError;
use std::collections::HashMap;
use validator::Validate;

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub async fn list_mine(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<ExhibitionResponse>>, AppError> {
    let exhibitions = state.store.list_exhibitions_by_owner(user.id()).await?;
    Ok(Json(exhibitions.into_iter().map(Into::into).collect()))
}

pub async fn list_public(
    State(state): State<AppState>,
    Query(params): Query<PublicListParams>,
) -> Result<Json<ExhibitionListResponse>, AppError> {
    let (page, page_size) = params.normalized();
    let (exhibitions, total) = state.store.list_public_exhibitions(page, page_size).await?;

    Ok(Json(ExhibitionListResponse {
        exhibitions: exhibitions.into_iter().map(Into::into).collect(),
        total,
        page,
        page_size,
        total_pages: total.div_ceil(page_size),
    }))
}

pub async fn create_exhibition(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateExhibitionRequest>,
) -> Result<(StatusCode, Json<ExhibitionResponse>), AppError> {
    payload.validate()?;

    let mut exhibition = Exhibition::new(user.id().to_string(), payload.keywords);
    exhibition.title = non_blank(payload.title);
    exhibition.description = non_blank(payload.description);

    state.store.insert_exhibition(&exhibition).await?;

    tracing::info!(
        exhibition_id = %exhibition.id,
        owner_id = %exhibition.owner_id,
        keywords = exhibition.keywords.len(),
        "Exhibition created"
    );
    Ok((StatusCode::CREATED, Json(exhibition.into())))
}

pub async fn get_exhibition(
    State(state): State<AppState>,
    viewer: Option<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<ExhibitionResponse>, AppError> {
    let exhibition = load_viewable(&state, &id, viewer.as_ref().map(AuthUser::id)).await?;
    Ok(Json(exhibition.into()))
}

pub async fn update_exhibition(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdateExhibitionRequest>,
) -> Result<Json<ExhibitionResponse>, AppError> {
    payload.validate()?;

    let mut exhibition = load_owned(&state, &id, user.id()).await?;

    if let Some(title) = payload.title {
        exhibition.title = non_blank(Some(title));
    }
    if let Some(subtitle) = payload.subtitle {
        exhibition.subtitle = non_blank(Some(subtitle));
    }
    if let Some(keywords) = payload.keywords {
        exhibition.keywords = normalize_keywords(keywords);
    }
    if let Some(description) = payload.description {
        exhibition.description = non_blank(Some(description));
    }
    if let Some(status) = payload.status {
        exhibition.status = status;
    }
    if let Some(visibility) = payload.visibility {
        exhibition.visibility = visibility;
    }
    exhibition.touch();

    if !state.store.replace_exhibition(&exhibition).await? {
        return Err(AppError::not_found("Exhibition not found"));
    }

    tracing::info!(exhibition_id = %exhibition.id, "Exhibition updated");
    Ok(Json(exhibition.into()))
}

pub async fn delete_exhibition(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let exhibition = load_owned(&state, &id, user.id()).await?;

    let artworks = state.store.delete_artworks_by_exhibition(&exhibition.id).await?;
    let blocks = state.store.delete_content_by_exhibition(&exhibition.id).await?;

    // Orphaned objects are preferable to a half-deleted exhibition.
    let prefix = exhibition.storage_prefix();
    match state.storage.list(&prefix).await {
        Ok(objects) if !objects.is_empty() => {
            let keys: Vec<String> = objects.into_iter().map(|o| o.key).collect();
            if let Err(e) = state.storage.delete(&keys).await {
                tracing::error!(exhibition_id = %exhibition.id, error = %e, "Failed to delete exhibition images");
            }
        }
        Ok(_) => {}
        Err(e) => {
            tracing::error!(exhibition_id = %exhibition.id, error = %e, "Failed to list exhibition images");
        }
    }

    state.store.delete_exhibition(&exhibition.id).await?;

    tracing::info!(
        exhibition_id = %exhibition.id,
        artworks,
        content_blocks = blocks,
        "Exhibition deleted"
    );
    Ok(StatusCode::NO_CONTENT)
}

/// Copy an exhibition with its artworks and content into a new private draft.
pub async fn duplicate_exhibition(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<ExhibitionResponse>), AppError> {
    let source = load_owned(&state, &id, user.id()).await?;
    let copy = source.duplicate_for(user.id());

    let artworks = state.store.list_artworks(&source.id).await?;
    let mut artwork_ids = HashMap::with_capacity(artworks.len());
    let copied_artworks: Vec<_> = artworks
        .iter()
        .map(|artwork| {
            let duplicate = artwork.duplicate_into(&copy.id, user.id());
            artwork_ids.insert(artwork.id.clone(), duplicate.id.clone());
            duplicate
        })
        .collect();

    let copied_content: Vec<_> = state
        .store
        .list_content(&source.id)
        .await?
        .iter()
        .filter_map(|block| block.duplicate_into(&copy.id, &artwork_ids))
        .collect();

    state.store.insert_exhibition(&copy).await?;
    state.store.insert_artworks(&copied_artworks).await?;
    state.store.insert_contents(&copied_content).await?;

    tracing::info!(
        source_id = %source.id,
        exhibition_id = %copy.id,
        artworks = copied_artworks.len(),
        content_blocks = copied_content.len(),
        "Exhibition duplicated"
    );
    Ok((StatusCode::CREATED, Json(copy.into())))
}
