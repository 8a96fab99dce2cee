use crate::models::{ContentKind, ExhibitionContent};
use crate::services::gallery::GalleryLayout;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Serialize, Deserialize)]
pub struct ContentResponse {
    pub id: String,
    pub exhibition_id: String,
    pub kind: ContentKind,
    pub artwork_id: Option<String>,
    pub heading: Option<String>,
    pub body: String,
    pub position: i32,
    pub updated_at: String,
}

impl From<ExhibitionContent> for ContentResponse {
    fn from(content: ExhibitionContent) -> Self {
        Self {
            id: content.id,
            exhibition_id: content.exhibition_id,
            kind: content.kind,
            artwork_id: content.artwork_id,
            heading: content.heading,
            body: content.body,
            position: content.position,
            updated_at: content.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpsertContentRequest {
    /// Update this block instead of matching by kind.
    pub id: Option<String>,

    pub kind: ContentKind,

    pub artwork_id: Option<String>,

    #[validate(length(max = 200))]
    pub heading: Option<String>,

    #[validate(length(min = 1, max = 20000, message = "Body must be 1-20000 characters"))]
    pub body: String,

    pub position: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct GalleryResponse {
    pub exhibition_id: String,
    pub title: Option<String>,
    #[serde(flatten)]
    pub layout: GalleryLayout,
}
