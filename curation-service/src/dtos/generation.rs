use crate::models::ContentKind;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{ContentResponse, ExhibitionResponse};

#[derive(Debug, Deserialize, Validate)]
pub struct GenerateTitlesRequest {
    #[validate(length(min = 1, max = 20, message = "Provide 1-20 keywords"))]
    pub keywords: Vec<String>,

    #[validate(length(max = 2000))]
    pub description: Option<String>,

    pub exhibition_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TitleCandidate {
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub rationale: Option<String>,
}

/// Shape the model is asked to return.
#[derive(Debug, Deserialize)]
pub struct TitleReply {
    pub titles: Vec<TitleCandidate>,
}

#[derive(Debug, Serialize)]
pub struct GenerateTitlesResponse {
    pub titles: Vec<TitleCandidate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exhibition: Option<ExhibitionResponse>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GenerateContentRequest {
    pub kinds: Option<Vec<ContentKind>>,
}

/// A block as the model wrote it. `kind` stays a string so one invented kind
/// does not sink the whole reply.
#[derive(Debug, Clone, Deserialize)]
pub struct GeneratedBlock {
    pub kind: String,
    #[serde(default)]
    pub heading: Option<String>,
    pub body: String,
    #[serde(default)]
    pub artwork_id: Option<String>,
}

/// Shape the model is asked to return.
#[derive(Debug, Deserialize)]
pub struct ContentReply {
    pub blocks: Vec<GeneratedBlock>,
}

#[derive(Debug, Serialize)]
pub struct GenerateContentResponse {
    pub blocks: Vec<ContentResponse>,
    pub skipped: usize,
}

#[derive(Debug, Default, Deserialize)]
pub struct GeneratePosterRequest {
    pub aspect_ratio: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GeneratePosterResponse {
    pub poster_url: String,
    pub prompt: String,
    pub exhibition: ExhibitionResponse,
}
