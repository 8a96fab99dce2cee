use crate::dtos::{
    ContentReply, GenerateContentRequest, GenerateContentResponse, GeneratePosterRequest,
    GeneratePosterResponse, GenerateTitlesRequest, GenerateTitlesResponse, TitleReply,
};
use crate::handlers::{OptionalJson, complete, ensure_step, load_owned};
use crate::middleware::AuthUser;
use crate::models::{
    ChatStep, ContentKind, Exhibition, ExhibitionContent, ExhibitionStatus,
    exhibition::normalize_keywords,
};
use crate::services::json_extract::extract_json;
use crate::services::metrics;
use crate::services::prompts::{
    CURATOR_SYSTEM_PROMPT, TITLE_CANDIDATES, content_prompt, poster_prompt, rag_query,
    title_prompt,
};
use crate::services::providers::imagen::SUPPORTED_ASPECT_RATIOS;
use crate::services::providers::{CompletionRequest, GenerationParams};
use crate::services::storage::object_key;
use crate::startup::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use service_core::error::AppError;
use std::collections::HashSet;
use std::time::Instant;
use validator::Validate;

const DEFAULT_POSTER_ASPECT_RATIO: &str = "3:4";

fn reference_for(state: &AppState, terms: &[String]) -> String {
    state
        .library
        .retrieve(terms, state.config.rag.max_passages)
        .render(state.config.rag.max_chars)
}

fn mark_in_progress(exhibition: &mut Exhibition) {
    if exhibition.status == ExhibitionStatus::Draft {
        exhibition.status = ExhibitionStatus::InProgress;
    }
    exhibition.touch();
}

pub async fn generate_titles(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<GenerateTitlesRequest>,
) -> Result<Json<GenerateTitlesResponse>, AppError> {
    payload.validate()?;

    let keywords = normalize_keywords(payload.keywords);
    if keywords.is_empty() {
        return Err(AppError::bad_request("Provide at least one keyword"));
    }
    let description = payload
        .description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty());

    let exhibition = match payload.exhibition_id.as_deref() {
        Some(id) => Some(load_owned(&state, id, user.id()).await?),
        None => None,
    };

    let mut terms = keywords.clone();
    terms.extend(description.clone());
    let rag = reference_for(&state, &terms);

    let request = CompletionRequest::single(
        CURATOR_SYSTEM_PROMPT,
        title_prompt(&keywords, description.as_deref(), &rag),
        GenerationParams::json(),
    );
    let response = complete(&state, "generate_titles", &request).await?;

    let reply: TitleReply = extract_json(&response.text)?;
    let titles: Vec<_> = reply
        .titles
        .into_iter()
        .filter(|candidate| !candidate.title.trim().is_empty())
        .take(TITLE_CANDIDATES)
        .collect();
    if titles.is_empty() {
        return Err(AppError::BadGateway("Model returned no title candidates".to_string()));
    }

    let exhibition = match exhibition {
        Some(mut exhibition) => {
            exhibition.keywords = keywords;
            if description.is_some() {
                exhibition.description = description;
            }
            mark_in_progress(&mut exhibition);
            state.store.replace_exhibition(&exhibition).await?;
            Some(exhibition.into())
        }
        None => None,
    };

    tracing::info!(user_id = %user.id(), candidates = titles.len(), "Generated title candidates");
    Ok(Json(GenerateTitlesResponse { titles, exhibition }))
}

pub async fn generate_content(
    State(state): State<AppState>,
    user: AuthUser,
    Path(exhibition_id): Path<String>,
    OptionalJson(payload): OptionalJson<GenerateContentRequest>,
) -> Result<(StatusCode, Json<GenerateContentResponse>), AppError> {
    let mut exhibition = load_owned(&state, &exhibition_id, user.id()).await?;
    ensure_step(&state, &exhibition, ChatStep::Content).await?;

    let mut kinds = payload
        .kinds
        .filter(|kinds| !kinds.is_empty())
        .unwrap_or_else(|| ContentKind::DEFAULT_GENERATED.to_vec());
    kinds.sort();
    kinds.dedup();

    let artworks = state.store.list_artworks(&exhibition.id).await?;
    let kind_names: Vec<&str> = kinds.iter().map(|k| k.as_str()).collect();
    let rag = reference_for(&state, &rag_query(Some(&exhibition), &kind_names));

    let request = CompletionRequest::single(
        CURATOR_SYSTEM_PROMPT,
        content_prompt(&exhibition, &kinds, &artworks, &rag),
        GenerationParams::json(),
    );
    let response = complete(&state, "generate_content", &request).await?;
    let reply: ContentReply = extract_json(&response.text)?;

    let known_artworks: HashSet<&str> = artworks.iter().map(|a| a.id.as_str()).collect();
    let mut labelled = HashSet::new();
    let mut sections = state
        .store
        .list_content(&exhibition.id)
        .await?
        .iter()
        .filter(|b| b.kind == ContentKind::Section)
        .count() as i32;
    let mut saved = Vec::new();
    let mut skipped = 0;

    for block in reply.blocks {
        let kind = match block.kind.parse::<ContentKind>() {
            Ok(kind) if kinds.contains(&kind) && !block.body.trim().is_empty() => kind,
            _ => {
                skipped += 1;
                continue;
            }
        };

        let artwork_id = if kind.is_per_artwork() {
            match block.artwork_id {
                Some(id) if known_artworks.contains(id.as_str()) && labelled.insert(id.clone()) => {
                    Some(id)
                }
                _ => {
                    skipped += 1;
                    continue;
                }
            }
        } else {
            None
        };

        let heading = block
            .heading
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty());
        let position = match kind {
            ContentKind::Section => {
                sections += 1;
                sections - 1
            }
            _ => 0,
        };
        let content = ExhibitionContent::new(
            exhibition.id.clone(),
            kind,
            artwork_id,
            heading,
            block.body.trim().to_string(),
            position,
        );

        let stored = if kind == ContentKind::Section {
            state.store.insert_content(&content).await?;
            content
        } else {
            state.store.upsert_content(content).await?
        };
        saved.push(stored);
    }

    if saved.is_empty() {
        return Err(AppError::BadGateway("Model returned no usable content".to_string()));
    }

    mark_in_progress(&mut exhibition);
    state.store.replace_exhibition(&exhibition).await?;

    tracing::info!(
        exhibition_id = %exhibition.id,
        saved = saved.len(),
        skipped,
        "Generated exhibition content"
    );
    Ok((
        StatusCode::CREATED,
        Json(GenerateContentResponse {
            blocks: saved.into_iter().map(Into::into).collect(),
            skipped,
        }),
    ))
}

pub async fn generate_poster(
    State(state): State<AppState>,
    user: AuthUser,
    Path(exhibition_id): Path<String>,
    OptionalJson(payload): OptionalJson<GeneratePosterRequest>,
) -> Result<(StatusCode, Json<GeneratePosterResponse>), AppError> {
    let mut exhibition = load_owned(&state, &exhibition_id, user.id()).await?;
    ensure_step(&state, &exhibition, ChatStep::Poster).await?;

    let aspect_ratio = payload
        .aspect_ratio
        .as_deref()
        .map(str::trim)
        .unwrap_or(DEFAULT_POSTER_ASPECT_RATIO);
    if !SUPPORTED_ASPECT_RATIOS.contains(&aspect_ratio) {
        return Err(AppError::bad_request(format!(
            "Unsupported aspect ratio {}; use one of {}",
            aspect_ratio,
            SUPPORTED_ASPECT_RATIOS.join(", ")
        )));
    }

    let content = state.store.list_content(&exhibition.id).await?;
    let prompt = poster_prompt(&exhibition, &content);

    let start = Instant::now();
    let image = match state.images.generate_image(&prompt, aspect_ratio).await {
        Ok(image) => {
            metrics::record_ai_request("generate_poster", "success", start.elapsed());
            image
        }
        Err(e) => {
            metrics::record_ai_request("generate_poster", e.kind(), start.elapsed());
            tracing::error!(exhibition_id = %exhibition.id, error = %e, "Poster generation failed");
            return Err(e.into());
        }
    };

    let key = object_key(&exhibition.id, &image.mime_type);
    let poster_url = state.storage.upload(&key, image.bytes, &image.mime_type).await?;

    let previous = exhibition.poster_storage_key.replace(key.clone());
    exhibition.poster_url = Some(poster_url.clone());
    mark_in_progress(&mut exhibition);
    if let Err(e) = state.store.replace_exhibition(&exhibition).await {
        // The stored record still points at the previous poster; drop the new upload.
        if let Err(cleanup) = state.storage.delete(&[key.clone()]).await {
            tracing::warn!(exhibition_id = %exhibition.id, key = %key, error = %cleanup, "Failed to delete unsaved poster");
        }
        return Err(e);
    }

    if let Some(previous) = previous {
        if let Err(e) = state.storage.delete(&[previous.clone()]).await {
            tracing::warn!(exhibition_id = %exhibition.id, key = %previous, error = %e, "Failed to delete previous poster");
        }
    }

    tracing::info!(
        exhibition_id = %exhibition.id,
        aspect_ratio,
        duration_ms = start.elapsed().as_millis() as u64,
        "Poster generated"
    );
    Ok((
        StatusCode::CREATED,
        Json(GeneratePosterResponse {
            poster_url,
            prompt,
            exhibition: exhibition.into(),
        }),
    ))
}
