use crate::models::Notice;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Serialize, Deserialize)]
pub struct NoticeResponse {
    pub id: String,
    pub title: String,
    pub body: String,
    pub pinned: bool,
    pub published: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Notice> for NoticeResponse {
    fn from(notice: Notice) -> Self {
        Self {
            id: notice.id,
            title: notice.title,
            body: notice.body,
            pinned: notice.pinned,
            published: notice.published,
            created_at: notice.created_at.to_rfc3339(),
            updated_at: notice.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateNoticeRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,

    #[validate(length(min = 1, max = 20000, message = "Body must be 1-20000 characters"))]
    pub body: String,

    #[serde(default)]
    pub pinned: bool,

    #[serde(default = "default_published")]
    pub published: bool,
}

fn default_published() -> bool {
    true
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateNoticeRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: Option<String>,

    #[validate(length(min = 1, max = 20000, message = "Body must be 1-20000 characters"))]
    pub body: Option<String>,

    pub pinned: Option<bool>,
    pub published: Option<bool>,
}
