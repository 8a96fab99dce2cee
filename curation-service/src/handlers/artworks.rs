use crate::dtos::{
    AnalyzeArtworkRequest, AnalyzeArtworkResponse, ArtworkAnalysis, ArtworkResponse,
    CreateArtworkRequest, MAX_IMAGE_BYTES, StoredImageResponse, UpdateArtworkRequest,
};
use crate::handlers::{OptionalJson, load_owned, load_viewable};
use crate::middleware::AuthUser;
use crate::models::{Artwork, ContentKind};
use crate::services::json_extract::extract_json;
use crate::services::metrics;
use crate::services::prompts::artwork_analysis_prompt;
use crate::services::providers::ImageInput;
use crate::services::storage::{content_type_for, object_key};
use crate::startup::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use service_core::error::AppError;
use std::time::Instant;
use validator::Validate;

const ACCEPTED_IMAGE_TYPES: [&str; 5] = [
    "image/png",
    "image/jpeg",
    "image/jpg",
    "image/webp",
    "image/gif",
];

/// Split an optional `data:<type>;base64,` prefix off an inline image.
fn split_data_url(encoded: &str) -> (Option<&str>, &str) {
    match encoded.strip_prefix("data:").and_then(|rest| rest.split_once(',')) {
        Some((meta, data)) => (meta.strip_suffix(";base64"), data),
        None => (None, encoded),
    }
}

fn decode_image(encoded: &str, declared_type: Option<&str>) -> Result<(Vec<u8>, String), AppError> {
    let (prefix_type, data) = split_data_url(encoded.trim());
    let content_type = declared_type
        .or(prefix_type)
        .map(|t| t.trim().to_ascii_lowercase())
        .ok_or_else(|| AppError::bad_request("content_type is required for inline images"))?;

    if !ACCEPTED_IMAGE_TYPES.contains(&content_type.as_str()) {
        return Err(AppError::bad_request(format!(
            "Unsupported image type: {}",
            content_type
        )));
    }

    let bytes = STANDARD
        .decode(data.trim())
        .map_err(|_| AppError::bad_request("image_base64 is not valid base64"))?;
    if bytes.is_empty() {
        return Err(AppError::bad_request("Image is empty"));
    }
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(AppError::bad_request(format!(
            "Image exceeds {} MB",
            MAX_IMAGE_BYTES / (1024 * 1024)
        )));
    }
    Ok((bytes, content_type))
}

/// Resolve an artwork and check the caller owns its exhibition.
async fn load_owned_artwork(state: &AppState, artwork_id: &str, user_id: &str) -> Result<Artwork, AppError> {
    let artwork = state
        .store
        .find_artwork(artwork_id)
        .await?
        .ok_or_else(|| AppError::not_found("Artwork not found"))?;
    load_owned(state, &artwork.exhibition_id, user_id).await?;
    Ok(artwork)
}

pub async fn list_artworks(
    State(state): State<AppState>,
    viewer: Option<AuthUser>,
    Path(exhibition_id): Path<String>,
) -> Result<Json<Vec<ArtworkResponse>>, AppError> {
    let exhibition = load_viewable(&state, &exhibition_id, viewer.as_ref().map(AuthUser::id)).await?;
    let artworks = state.store.list_artworks(&exhibition.id).await?;
    Ok(Json(artworks.into_iter().map(Into::into).collect()))
}

pub async fn create_artwork(
    State(state): State<AppState>,
    user: AuthUser,
    Path(exhibition_id): Path<String>,
    Json(payload): Json<CreateArtworkRequest>,
) -> Result<(StatusCode, Json<ArtworkResponse>), AppError> {
    payload.validate()?;
    let mut exhibition = load_owned(&state, &exhibition_id, user.id()).await?;

    let (image_url, storage_key) = match (payload.image_url, payload.image_base64) {
        (Some(_), Some(_)) => {
            return Err(AppError::bad_request(
                "Provide either image_url or image_base64, not both",
            ));
        }
        (None, None) => {
            return Err(AppError::bad_request("An image_url or image_base64 is required"));
        }
        (Some(url), None) => (url, None),
        (None, Some(encoded)) => {
            let (bytes, content_type) = decode_image(&encoded, payload.content_type.as_deref())?;
            let key = object_key(&exhibition.id, &content_type);
            let size = bytes.len();
            let url = state.storage.upload(&key, bytes, &content_type).await?;
            tracing::info!(exhibition_id = %exhibition.id, key = %key, size, "Artwork image stored");
            (url, Some(key))
        }
    };

    let position = match payload.position {
        Some(position) => position,
        None => state.store.list_artworks(&exhibition.id).await?.len() as i32,
    };

    let mut artwork = Artwork::new(
        exhibition.id.clone(),
        user.id().to_string(),
        payload.title.trim().to_string(),
        image_url,
        storage_key,
        position,
    );
    artwork.artist = payload.artist;
    artwork.year = payload.year;
    artwork.medium = payload.medium;
    artwork.dimensions = payload.dimensions;
    artwork.description = payload.description;

    state.store.insert_artwork(&artwork).await?;

    exhibition.touch();
    state.store.replace_exhibition(&exhibition).await?;

    tracing::info!(artwork_id = %artwork.id, exhibition_id = %exhibition.id, "Artwork added");
    Ok((StatusCode::CREATED, Json(artwork.into())))
}

/// Objects stored under the exhibition's prefix.
pub async fn list_images(
    State(state): State<AppState>,
    user: AuthUser,
    Path(exhibition_id): Path<String>,
) -> Result<Json<Vec<StoredImageResponse>>, AppError> {
    let exhibition = load_owned(&state, &exhibition_id, user.id()).await?;
    let objects = state.storage.list(&exhibition.storage_prefix()).await?;

    Ok(Json(
        objects
            .into_iter()
            .map(|object| StoredImageResponse {
                url: state.storage.public_url(&object.key),
                key: object.key,
                size: object.size,
            })
            .collect(),
    ))
}

pub async fn update_artwork(
    State(state): State<AppState>,
    user: AuthUser,
    Path(artwork_id): Path<String>,
    Json(payload): Json<UpdateArtworkRequest>,
) -> Result<Json<ArtworkResponse>, AppError> {
    payload.validate()?;
    let mut artwork = load_owned_artwork(&state, &artwork_id, user.id()).await?;

    if let Some(title) = payload.title {
        artwork.title = title.trim().to_string();
    }
    if payload.artist.is_some() {
        artwork.artist = payload.artist;
    }
    if payload.year.is_some() {
        artwork.year = payload.year;
    }
    if payload.medium.is_some() {
        artwork.medium = payload.medium;
    }
    if payload.dimensions.is_some() {
        artwork.dimensions = payload.dimensions;
    }
    if payload.description.is_some() {
        artwork.description = payload.description;
    }
    if let Some(position) = payload.position {
        artwork.position = position;
    }
    artwork.updated_at = chrono::Utc::now();

    if !state.store.replace_artwork(&artwork).await? {
        return Err(AppError::not_found("Artwork not found"));
    }
    Ok(Json(artwork.into()))
}

pub async fn delete_artwork(
    State(state): State<AppState>,
    user: AuthUser,
    Path(artwork_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let artwork = load_owned_artwork(&state, &artwork_id, user.id()).await?;

    state.store.delete_artwork(&artwork.id).await?;

    // Labels describing the removed work go with it.
    for block in state.store.list_content(&artwork.exhibition_id).await? {
        if block.kind == ContentKind::ArtworkLabel && block.artwork_id.as_deref() == Some(artwork.id.as_str()) {
            state.store.delete_content(&artwork.exhibition_id, &block.id).await?;
        }
    }

    if let Some(key) = &artwork.storage_key {
        if let Err(e) = state.storage.delete(std::slice::from_ref(key)).await {
            tracing::error!(artwork_id = %artwork.id, key = %key, error = %e, "Failed to delete artwork image");
        }
    }

    tracing::info!(artwork_id = %artwork.id, exhibition_id = %artwork.exhibition_id, "Artwork deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Storage key of the artwork's image. Copies made by duplication carry no
/// key of their own, so the key is recovered from a URL the storage serves.
fn stored_image_key(state: &AppState, artwork: &Artwork) -> Option<String> {
    if let Some(key) = &artwork.storage_key {
        return Some(key.clone());
    }
    let base = state.storage.public_url("");
    artwork
        .image_url
        .strip_prefix(base.as_str())
        .filter(|key| !key.is_empty())
        .map(str::to_string)
}

pub async fn analyze_artwork(
    State(state): State<AppState>,
    user: AuthUser,
    Path(artwork_id): Path<String>,
    OptionalJson(payload): OptionalJson<AnalyzeArtworkRequest>,
) -> Result<Json<AnalyzeArtworkResponse>, AppError> {
    let mut artwork = load_owned_artwork(&state, &artwork_id, user.id()).await?;

    let key = stored_image_key(&state, &artwork).ok_or_else(|| {
        AppError::bad_request("Only uploaded images can be analyzed")
    })?;
    let image = ImageInput {
        mime_type: content_type_for(&key).to_string(),
        bytes: state.storage.download(&key).await?,
    };

    let start = Instant::now();
    let response = match state
        .vision
        .describe(&artwork_analysis_prompt(&artwork), &image)
        .await
    {
        Ok(response) => {
            metrics::record_ai_request("analyze_artwork", "success", start.elapsed());
            metrics::record_tokens("analyze_artwork", response.input_tokens, response.output_tokens);
            response
        }
        Err(e) => {
            metrics::record_ai_request("analyze_artwork", e.kind(), start.elapsed());
            tracing::error!(artwork_id = %artwork.id, error = %e, "Artwork analysis failed");
            return Err(e.into());
        }
    };

    let analysis: ArtworkAnalysis = extract_json(&response.text)?;

    if payload.apply {
        artwork.description = Some(analysis.description.clone());
        if let Some(medium) = analysis.medium.clone().filter(|m| !m.trim().is_empty()) {
            artwork.medium = Some(medium);
        }
        artwork.updated_at = chrono::Utc::now();
        state.store.replace_artwork(&artwork).await?;
    }

    tracing::info!(artwork_id = %artwork.id, applied = payload.apply, "Artwork analyzed");
    Ok(Json(AnalyzeArtworkResponse {
        analysis,
        applied: payload.apply,
        artwork: artwork.into(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_url_prefix_is_split() {
        let (content_type, data) = split_data_url("data:image/png;base64,iVBORw0KGgo=");
        assert_eq!(content_type, Some("image/png"));
        assert_eq!(data, "iVBORw0KGgo=");

        let (content_type, data) = split_data_url("iVBORw0KGgo=");
        assert_eq!(content_type, None);
        assert_eq!(data, "iVBORw0KGgo=");
    }

    #[test]
    fn inline_image_requires_known_type() {
        let encoded = STANDARD.encode(b"\x89PNG\r\n\x1a\n");
        assert!(decode_image(&encoded, None).is_err());
        assert!(decode_image(&encoded, Some("application/pdf")).is_err());

        let (bytes, content_type) = decode_image(&encoded, Some("image/PNG")).unwrap();
        assert_eq!(content_type, "image/png");
        assert_eq!(bytes.len(), 8);
    }

    #[test]
    fn invalid_base64_is_rejected() {
        assert!(decode_image("not base64!!", Some("image/png")).is_err());
    }
}
