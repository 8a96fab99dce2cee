use crate::models::{Exhibition, ExhibitionStatus, Visibility};
use serde::{Deserialize, Serialize};
use validator::Validate;

pub const DEFAULT_PAGE_SIZE: u64 = 12;
pub const MAX_PAGE_SIZE: u64 = 50;
pub const MAX_PAGE: u64 = 10_000;

#[derive(Debug, Serialize, Deserialize)]
pub struct ExhibitionResponse {
    pub id: String,
    pub owner_id: String,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub keywords: Vec<String>,
    pub description: Option<String>,
    pub status: ExhibitionStatus,
    pub visibility: Visibility,
    pub poster_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Exhibition> for ExhibitionResponse {
    fn from(exhibition: Exhibition) -> Self {
        Self {
            id: exhibition.id,
            owner_id: exhibition.owner_id,
            title: exhibition.title,
            subtitle: exhibition.subtitle,
            keywords: exhibition.keywords,
            description: exhibition.description,
            status: exhibition.status,
            visibility: exhibition.visibility,
            poster_url: exhibition.poster_url,
            created_at: exhibition.created_at.to_rfc3339(),
            updated_at: exhibition.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateExhibitionRequest {
    #[validate(length(max = 20, message = "At most 20 keywords"))]
    #[serde(default)]
    pub keywords: Vec<String>,

    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: Option<String>,

    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateExhibitionRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: Option<String>,

    #[validate(length(max = 200, message = "Subtitle must be at most 200 characters"))]
    pub subtitle: Option<String>,

    #[validate(length(max = 20, message = "At most 20 keywords"))]
    pub keywords: Option<Vec<String>>,

    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,

    pub status: Option<ExhibitionStatus>,
    pub visibility: Option<Visibility>,
}

#[derive(Debug, Deserialize)]
pub struct PublicListParams {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

impl PublicListParams {
    /// Page is clamped to 1..=10000; size to 1..=50.
    pub fn normalized(&self) -> (u64, u64) {
        let page = self.page.unwrap_or(1).clamp(1, MAX_PAGE);
        let page_size = self
            .page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        (page, page_size)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExhibitionListResponse {
    pub exhibitions: Vec<ExhibitionResponse>,
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
    pub total_pages: u64,
}
