use crate::models::Artwork;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Largest accepted decoded image.
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Serialize, Deserialize)]
pub struct ArtworkResponse {
    pub id: String,
    pub exhibition_id: String,
    pub title: String,
    pub artist: Option<String>,
    pub year: Option<String>,
    pub medium: Option<String>,
    pub dimensions: Option<String>,
    pub description: Option<String>,
    pub image_url: String,
    pub position: i32,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Artwork> for ArtworkResponse {
    fn from(artwork: Artwork) -> Self {
        Self {
            id: artwork.id,
            exhibition_id: artwork.exhibition_id,
            title: artwork.title,
            artist: artwork.artist,
            year: artwork.year,
            medium: artwork.medium,
            dimensions: artwork.dimensions,
            description: artwork.description,
            image_url: artwork.image_url,
            position: artwork.position,
            created_at: artwork.created_at.to_rfc3339(),
            updated_at: artwork.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateArtworkRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,

    #[validate(length(max = 200))]
    pub artist: Option<String>,

    #[validate(length(max = 50))]
    pub year: Option<String>,

    #[validate(length(max = 200))]
    pub medium: Option<String>,

    #[validate(length(max = 100))]
    pub dimensions: Option<String>,

    #[validate(length(max = 2000))]
    pub description: Option<String>,

    /// Externally hosted image.
    #[validate(url(message = "Invalid image URL"))]
    pub image_url: Option<String>,

    /// Inline image, uploaded to object storage.
    pub image_base64: Option<String>,

    pub content_type: Option<String>,

    pub position: Option<i32>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateArtworkRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: Option<String>,

    #[validate(length(max = 200))]
    pub artist: Option<String>,

    #[validate(length(max = 50))]
    pub year: Option<String>,

    #[validate(length(max = 200))]
    pub medium: Option<String>,

    #[validate(length(max = 100))]
    pub dimensions: Option<String>,

    #[validate(length(max = 2000))]
    pub description: Option<String>,

    pub position: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AnalyzeArtworkRequest {
    /// Write description and medium back to the artwork.
    #[serde(default)]
    pub apply: bool,
}

/// What the vision model reports about an artwork.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArtworkAnalysis {
    #[serde(default)]
    pub title: Option<String>,
    pub description: String,
    #[serde(default)]
    pub medium: Option<String>,
    #[serde(default)]
    pub mood: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeArtworkResponse {
    pub analysis: ArtworkAnalysis,
    pub applied: bool,
    pub artwork: ArtworkResponse,
}

#[derive(Debug, Serialize)]
pub struct StoredImageResponse {
    pub key: String,
    pub size: u64,
    pub url: String,
}
