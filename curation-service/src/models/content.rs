use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Introduction,
    CuratorialEssay,
    Section,
    ArtworkLabel,
    PressRelease,
    PosterCopy,
}

impl ContentKind {
    pub const DEFAULT_GENERATED: [ContentKind; 3] = [
        ContentKind::Introduction,
        ContentKind::CuratorialEssay,
        ContentKind::ArtworkLabel,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Introduction => "introduction",
            ContentKind::CuratorialEssay => "curatorial_essay",
            ContentKind::Section => "section",
            ContentKind::ArtworkLabel => "artwork_label",
            ContentKind::PressRelease => "press_release",
            ContentKind::PosterCopy => "poster_copy",
        }
    }

    /// Guidance handed to the model for this kind of text.
    pub fn guidance(&self) -> &'static str {
        match self {
            ContentKind::Introduction => {
                "a welcoming wall text of 120-180 words introducing the exhibition theme"
            }
            ContentKind::CuratorialEssay => {
                "a curatorial essay of 350-500 words developing the concept and its context"
            }
            ContentKind::Section => "a short section text of 80-120 words for one room",
            ContentKind::ArtworkLabel => {
                "one extended label of 40-70 words per artwork, each tied to its artwork_id"
            }
            ContentKind::PressRelease => {
                "a press release of 200-300 words with a headline and practical details"
            }
            ContentKind::PosterCopy => "a poster tagline of at most 12 words",
        }
    }

    /// Artwork labels are the only kind attached to an individual artwork.
    pub fn is_per_artwork(&self) -> bool {
        matches!(self, ContentKind::ArtworkLabel)
    }
}

impl std::str::FromStr for ContentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "introduction" => Ok(ContentKind::Introduction),
            "curatorial_essay" => Ok(ContentKind::CuratorialEssay),
            "section" => Ok(ContentKind::Section),
            "artwork_label" => Ok(ContentKind::ArtworkLabel),
            "press_release" => Ok(ContentKind::PressRelease),
            "poster_copy" => Ok(ContentKind::PosterCopy),
            other => Err(format!("Unknown content kind: {}", other)),
        }
    }
}

/// A block of exhibition text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExhibitionContent {
    #[serde(rename = "_id")]
    pub id: String,
    pub exhibition_id: String,
    pub kind: ContentKind,
    pub artwork_id: Option<String>,
    pub heading: Option<String>,
    pub body: String,
    pub position: i32,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl ExhibitionContent {
    pub fn new(
        exhibition_id: String,
        kind: ContentKind,
        artwork_id: Option<String>,
        heading: Option<String>,
        body: String,
        position: i32,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            exhibition_id,
            kind,
            artwork_id,
            heading,
            body,
            position,
            created_at: now,
            updated_at: now,
        }
    }

    /// Copy into another exhibition, remapping the artwork reference through
    /// `artwork_ids` (source id -> copy id). Labels whose artwork was not
    /// copied are dropped.
    pub fn duplicate_into(
        &self,
        exhibition_id: &str,
        artwork_ids: &HashMap<String, String>,
    ) -> Option<Self> {
        let artwork_id = match &self.artwork_id {
            Some(source_id) => Some(artwork_ids.get(source_id)?.clone()),
            None => None,
        };

        let now = Utc::now();
        Some(Self {
            id: Uuid::new_v4().to_string(),
            exhibition_id: exhibition_id.to_string(),
            artwork_id,
            created_at: now,
            updated_at: now,
            ..self.clone()
        })
    }
}
