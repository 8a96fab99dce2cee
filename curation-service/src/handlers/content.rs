use crate::dtos::{ContentResponse, GalleryResponse, UpsertContentRequest};
use crate::handlers::{load_owned, load_viewable};
use crate::middleware::AuthUser;
use crate::models::{ContentKind, ExhibitionContent};
use crate::services::gallery::{DEFAULT_WALLS, GalleryLayout};
use crate::startup::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use service_core::error::AppError;
use validator::Validate;

pub async fn list_content(
    State(state): State<AppState>,
    viewer: Option<AuthUser>,
    Path(exhibition_id): Path<String>,
) -> Result<Json<Vec<ContentResponse>>, AppError> {
    let exhibition = load_viewable(&state, &exhibition_id, viewer.as_ref().map(AuthUser::id)).await?;
    let blocks = state.store.list_content(&exhibition.id).await?;
    Ok(Json(blocks.into_iter().map(Into::into).collect()))
}

/// Create or update a block. An explicit `id` updates that block; sections are
/// always added; every other kind keeps one block per exhibition (per artwork
/// for labels).
pub async fn upsert_content(
    State(state): State<AppState>,
    user: AuthUser,
    Path(exhibition_id): Path<String>,
    Json(payload): Json<UpsertContentRequest>,
) -> Result<Json<ContentResponse>, AppError> {
    payload.validate()?;
    let mut exhibition = load_owned(&state, &exhibition_id, user.id()).await?;

    let artwork_id = if payload.kind.is_per_artwork() {
        let artwork_id = payload
            .artwork_id
            .ok_or_else(|| AppError::bad_request("artwork_label blocks need an artwork_id"))?;
        let belongs = state
            .store
            .find_artwork(&artwork_id)
            .await?
            .is_some_and(|a| a.exhibition_id == exhibition.id);
        if !belongs {
            return Err(AppError::bad_request("Artwork is not part of this exhibition"));
        }
        Some(artwork_id)
    } else {
        None
    };
    let heading = payload
        .heading
        .map(|h| h.trim().to_string())
        .filter(|h| !h.is_empty());

    let existing = state.store.list_content(&exhibition.id).await?;

    let saved = if let Some(id) = payload.id {
        let clashes = existing.iter().any(|b| {
            b.id != id
                && b.kind == payload.kind
                && b.kind != ContentKind::Section
                && b.artwork_id == artwork_id
        });
        let mut block = existing
            .into_iter()
            .find(|b| b.id == id)
            .ok_or_else(|| AppError::not_found("Content block not found"))?;
        if block.kind != payload.kind {
            return Err(AppError::bad_request(format!(
                "Content block is {}; kind cannot be changed",
                block.kind.as_str()
            )));
        }
        if clashes {
            return Err(AppError::bad_request("That artwork already has a label"));
        }
        block.artwork_id = artwork_id;
        block.heading = heading;
        block.body = payload.body;
        if let Some(position) = payload.position {
            block.position = position;
        }
        block.updated_at = chrono::Utc::now();
        state.store.replace_content(&block).await?;
        block
    } else {
        let position = payload.position.unwrap_or_else(|| {
            existing.iter().filter(|b| b.kind == payload.kind).count() as i32
        });
        let block = ExhibitionContent::new(
            exhibition.id.clone(),
            payload.kind,
            artwork_id,
            heading,
            payload.body,
            position,
        );
        if payload.kind == ContentKind::Section {
            state.store.insert_content(&block).await?;
            block
        } else {
            state.store.upsert_content(block).await?
        }
    };

    exhibition.touch();
    state.store.replace_exhibition(&exhibition).await?;

    tracing::info!(
        exhibition_id = %exhibition.id,
        content_id = %saved.id,
        kind = saved.kind.as_str(),
        "Content saved"
    );
    Ok(Json(saved.into()))
}

pub async fn delete_content(
    State(state): State<AppState>,
    user: AuthUser,
    Path((exhibition_id, content_id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    let exhibition = load_owned(&state, &exhibition_id, user.id()).await?;

    if !state.store.delete_content(&exhibition.id, &content_id).await? {
        return Err(AppError::not_found("Content block not found"));
    }

    tracing::info!(exhibition_id = %exhibition.id, content_id = %content_id, "Content deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Virtual gallery arrangement of the exhibition's artworks.
pub async fn gallery(
    State(state): State<AppState>,
    viewer: Option<AuthUser>,
    Path(exhibition_id): Path<String>,
) -> Result<Json<GalleryResponse>, AppError> {
    let exhibition = load_viewable(&state, &exhibition_id, viewer.as_ref().map(AuthUser::id)).await?;
    let artworks = state.store.list_artworks(&exhibition.id).await?;
    let layout = GalleryLayout::arrange(&artworks, DEFAULT_WALLS);

    Ok(Json(GalleryResponse {
        exhibition_id: exhibition.id,
        title: exhibition.title,
        layout,
    }))
}
